//! Central error types for ccflow.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations.
//!
//! Invariant violations inside the core (cyclic AST parents, positional
//! access outside the token range, malformed pattern commands) are hard
//! errors that abort the current analysis pass; they carry the offending
//! token so callers can point diagnostics at a source location. I/O and
//! XML problems from the project-file layer are wrapped with `#[from]`.

use thiserror::Error;

use crate::stream::TokenId;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CcflowError {
    /// An internal invariant was violated during matching or AST construction.
    #[error("internal error at token {token:?} '{lexeme}': {message}")]
    Internal {
        /// Token the violation was detected at, when one is available.
        token: Option<TokenId>,
        /// Lexeme of that token (empty when no token is available).
        lexeme: String,
        message: String,
    },

    /// IO operation failed (project-file read/write).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML in a project file.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute decoding failed.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Configuration error (e.g. an unknown `--enable` id).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using CcflowError.
pub type Result<T> = std::result::Result<T, CcflowError>;

impl CcflowError {
    /// Create an internal error anchored at a token.
    #[inline]
    pub fn internal(token: Option<TokenId>, lexeme: impl Into<String>, message: impl Into<String>) -> Self {
        CcflowError::Internal {
            token,
            lexeme: lexeme.into(),
            message: message.into(),
        }
    }
}
