//! Core error types.
//!
//! Chain assembly and dispatch are both fail-fast: nothing here is retried.

use std::fmt;

/// Boxed error produced by user code inside a handler or a declaration block.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A registry lookup found no entry for the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    type_name: &'static str,
}

impl ResolutionError {
    /// Create a resolution error for the given type name.
    pub fn new(type_name: &'static str) -> Self {
        Self { type_name }
    }

    /// Create a resolution error for `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Name of the type that could not be resolved.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no registry entry for {}", self.type_name)
    }
}

impl std::error::Error for ResolutionError {}

/// Errors raised while assembling a chain.
///
/// Any of these aborts the whole build; no partial chain is ever produced.
#[derive(Debug)]
pub enum ChainBuildError {
    /// A handler or chain module referenced by type is not registered.
    Resolution(ResolutionError),

    /// A path pattern could not be parsed.
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// A redirect was declared with a non-3xx status.
    InvalidRedirect { code: u16 },

    /// A header predicate names an invalid header.
    InvalidHeader { name: String },

    /// A declaration block failed.
    Declaration(BoxError),
}

impl ChainBuildError {
    /// Wrap an arbitrary error raised by a declaration block.
    pub fn declaration(err: impl Into<BoxError>) -> Self {
        ChainBuildError::Declaration(err.into())
    }
}

impl fmt::Display for ChainBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainBuildError::Resolution(e) => write!(f, "resolution failed: {}", e),
            ChainBuildError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid path pattern '{}': {}", pattern, reason)
            }
            ChainBuildError::InvalidRedirect { code } => {
                write!(f, "invalid redirect status {}: expected 3xx", code)
            }
            ChainBuildError::InvalidHeader { name } => write!(f, "invalid header name '{}'", name),
            ChainBuildError::Declaration(e) => write!(f, "declaration failed: {}", e),
        }
    }
}

impl std::error::Error for ChainBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainBuildError::Resolution(e) => Some(e),
            ChainBuildError::Declaration(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<ResolutionError> for ChainBuildError {
    fn from(e: ResolutionError) -> Self {
        ChainBuildError::Resolution(e)
    }
}

impl From<std::io::Error> for ChainBuildError {
    fn from(e: std::io::Error) -> Self {
        ChainBuildError::Declaration(Box::new(e))
    }
}

impl From<String> for ChainBuildError {
    fn from(msg: String) -> Self {
        ChainBuildError::Declaration(msg.into())
    }
}

impl From<&str> for ChainBuildError {
    fn from(msg: &str) -> Self {
        ChainBuildError::Declaration(msg.into())
    }
}

/// Errors raised while a request travels through a compiled chain.
///
/// These are not recovered here; the framework boundary decides what the
/// client sees.
#[derive(Debug)]
pub enum DispatchError {
    /// A handler failed.
    Handler(BoxError),

    /// A handler looked up a registry entry that does not exist.
    Resolution(ResolutionError),

    /// A response was rendered twice for the same exchange.
    AlreadyCommitted,

    /// Every holder of the context went away without rendering a response.
    Unhandled,

    /// No response was rendered before the request timeout elapsed.
    Timeout { duration_ms: u64 },
}

impl DispatchError {
    /// Wrap an arbitrary handler error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        DispatchError::Handler(err.into())
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler(e) => write!(f, "handler error: {}", e),
            DispatchError::Resolution(e) => write!(f, "resolution failed: {}", e),
            DispatchError::AlreadyCommitted => write!(f, "response already committed"),
            DispatchError::Unhandled => write!(f, "request was not handled"),
            DispatchError::Timeout { duration_ms } => {
                write!(f, "request timeout after {}ms", duration_ms)
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(e) => Some(e.as_ref()),
            DispatchError::Resolution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResolutionError> for DispatchError {
    fn from(e: ResolutionError) -> Self {
        DispatchError::Resolution(e)
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        DispatchError::Handler(Box::new(e))
    }
}

impl From<http::Error> for DispatchError {
    fn from(e: http::Error) -> Self {
        DispatchError::Handler(Box::new(e))
    }
}

impl From<String> for DispatchError {
    fn from(msg: String) -> Self {
        DispatchError::Handler(msg.into())
    }
}

impl From<&str> for DispatchError {
    fn from(msg: &str) -> Self {
        DispatchError::Handler(msg.into())
    }
}
