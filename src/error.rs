//! Unified error type.

use std::fmt;

/// The error type returned by trellis's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures (binding a port, accepting a connection), chain
/// authoring defects, and failures bubbling out of handlers and middleware.
#[derive(Debug)]
pub enum Error {
    /// An I/O failure below the pipeline: bind, accept, read.
    Io(std::io::Error),
    /// A middleware invoked its continuation more than once.
    ///
    /// Raised by the dispatch chain the moment a `next.run` call would
    /// re-enter an already-executed position. Never swallowed by the chain
    /// itself — double dispatch means double side effects downstream.
    DoubleNext {
        /// Chain position the second invocation tried to re-enter.
        index: usize,
    },
    /// A handler or middleware failed.
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an application-level failure so it can flow through the chain.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }

    /// Shortcut for ad-hoc failures with a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into().into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::DoubleNext { index } => {
                write!(f, "next() invoked more than once (chain position {index})")
            }
            Self::Handler(e) => write!(f, "handler: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::DoubleNext { .. } => None,
            Self::Handler(e) => Some(e.as_ref()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
