/*!
# Error taxonomy

Shape errors come out of the raw decoder, reconstruction errors out of the
graph reconstructor. Both are fatal for the payload they belong to; nothing in
this crate retries or substitutes placeholder nodes.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::raw::SrcError;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Error,
    Warning,
}

impl ErrorLevel {
    pub fn from_warn_flag(warn: bool) -> Self {
        if warn {
            ErrorLevel::Warning
        } else {
            ErrorLevel::Error
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLevel::Error => write!(f, "error"),
            ErrorLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A payload that is not well-formed JSON or does not have the expected
/// primitive shape (missing key, wrong primitive type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadError {
    pub file: String,
    pub message: String,
    /// Byte offset into the payload text.
    pub offset: usize,
    /// One-based line of the offending input.
    pub line: usize,
    /// One-based column of the offending input.
    pub column: usize,
    /// The offending source line.
    pub excerpt: String,
    pub level: ErrorLevel,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}\n{}:{}:{}:\n{}",
            self.level, self.message, self.file, self.line, self.column, self.excerpt
        )
    }
}

impl std::error::Error for PayloadError {}

/// Failure while turning raw node/scope arrays into the linked graph.
///
/// `owner` is the Pascal-case name of the node kind (or `Scope`) whose field
/// failed, `index` is the position of that node or scope in its raw array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructError {
    #[error("unknown node type: {tag}")]
    UnknownNodeType { tag: String, index: usize },

    #[error("type mismatch at {owner}::{field}")]
    TypeMismatch {
        owner: &'static str,
        field: &'static str,
        index: usize,
    },

    #[error("dangling reference at {owner}::{field}: index {target} out of {len}")]
    DanglingReference {
        owner: &'static str,
        field: &'static str,
        index: usize,
        target: u64,
        len: usize,
    },

    #[error("missing field {owner}::{field}")]
    MissingField {
        owner: &'static str,
        field: &'static str,
        index: usize,
    },

    #[error("ast must be Program")]
    MissingRoot,
}

impl ReconstructError {
    /// Raw array index of the node (or scope) the error is attached to.
    pub fn index(&self) -> Option<usize> {
        match self {
            ReconstructError::UnknownNodeType { index, .. }
            | ReconstructError::TypeMismatch { index, .. }
            | ReconstructError::DanglingReference { index, .. }
            | ReconstructError::MissingField { index, .. } => Some(*index),
            ReconstructError::MissingRoot => None,
        }
    }

    /// `Owner::field` for field-addressed errors.
    pub fn field_path(&self) -> Option<String> {
        match self {
            ReconstructError::TypeMismatch { owner, field, .. }
            | ReconstructError::DanglingReference { owner, field, .. }
            | ReconstructError::MissingField { owner, field, .. } => {
                Some(format!("{owner}::{field}"))
            }
            _ => None,
        }
    }
}

/// Everything that can go wrong between a payload on disk and a linked `Ast`.
#[derive(Debug, Error)]
pub enum AstError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    #[error("front end reported errors\n{0}")]
    Frontend(SrcError),

    #[error("payload carries no ast")]
    MissingAst,

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One finding attached to an input file, as collected by batch commands.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
    pub level: ErrorLevel,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.file, self.message)
    }
}

/// Error collection and reporting
#[derive(Debug, Default, Serialize)]
pub struct ErrorCollector {
    pub diagnostics: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: impl Into<String>, message: impl Into<String>, level: ErrorLevel) {
        self.diagnostics.push(Diagnostic {
            file: file.into(),
            message: message.into(),
            level,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == ErrorLevel::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.level == ErrorLevel::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.level == ErrorLevel::Warning).count()
    }

    pub fn merge(&mut self, other: ErrorCollector) {
        self.diagnostics.extend(other.diagnostics);
    }
}

impl fmt::Display for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message_is_field_addressed() {
        let err = ReconstructError::TypeMismatch { owner: "Binary", field: "left", index: 4 };
        assert_eq!(err.to_string(), "type mismatch at Binary::left");
        assert_eq!(err.index(), Some(4));
        assert_eq!(err.field_path().as_deref(), Some("Binary::left"));
    }

    #[test]
    fn missing_root_message() {
        assert_eq!(ReconstructError::MissingRoot.to_string(), "ast must be Program");
        assert_eq!(ReconstructError::MissingRoot.index(), None);
    }

    #[test]
    fn collector_counts_by_level() {
        let mut c = ErrorCollector::new();
        c.add("a.json", "bad", ErrorLevel::Error);
        c.add("b.json", "meh", ErrorLevel::Warning);
        assert!(c.has_errors());
        assert_eq!(c.error_count(), 1);
        assert_eq!(c.warning_count(), 1);
        assert_eq!(c.to_string(), "[error] a.json: bad\n[warning] b.json: meh\n");
    }
}
