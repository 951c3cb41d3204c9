//! Error types for classgraph-analysis
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

/// Main error type for analysis operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A capability was requested that the analyzer does not provide
    /// (e.g. a backward dual for a forward-only analysis).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A declared type could not be resolved against the classpath.
    /// Fatal to the current run: silently skipping the call edge would
    /// lose facts unsoundly.
    #[error("unresolved reference: type `{type_name}` required by {context}")]
    UnresolvedReference { type_name: String, context: String },

    /// The application graph reported a call site without an extractable
    /// call expression. Contract violation in the graph provider.
    #[error("malformed call site at {statement}: {reason}")]
    MalformedCallSite { statement: String, reason: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        AnalysisError::UnsupportedOperation(msg.into())
    }

    pub fn unresolved(type_name: impl Into<String>, context: impl Into<String>) -> Self {
        AnalysisError::UnresolvedReference {
            type_name: type_name.into(),
            context: context.into(),
        }
    }

    pub fn malformed_call_site(statement: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedCallSite {
            statement: statement.into(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
