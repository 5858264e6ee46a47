use std::fmt;

use crate::block::{BlockPath, MalformedBlock, ValueError};

/// Fatal errors: the whole call fails and produces no output.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),
    #[error("Invalid block document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("unknown CSS framework: {0}")]
    UnknownFramework(String),
    #[error("unknown output target: {0}")]
    UnknownOutputTarget(String),
    #[error("unknown content handling mode: {0}")]
    UnknownContentHandling(String),
    #[error("unknown optimization level: {0}")]
    UnknownOptimizationLevel(String),
    #[error("the custom CSS framework requires a custom class map")]
    MissingCustomClassMap,
    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),
}

/// A handler could not render its block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("attribute `{name}`: {source}")]
    InvalidAttribute {
        name: &'static str,
        source: ValueError,
    },
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn invalid(name: &'static str) -> impl FnOnce(ValueError) -> HandlerError {
        move |source| HandlerError::InvalidAttribute { name, source }
    }
}

/// Non-fatal problem with one block. The block renders as empty output and
/// its siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: BlockPath,
    pub block_name: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Malformed(MalformedBlock),
    HandlerFailed(HandlerError),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.block_name.is_empty() {
            "<unnamed>"
        } else {
            &self.block_name
        };
        match &self.kind {
            DiagnosticKind::Malformed(e) => {
                write!(f, "block {} ({name}) is malformed: {e}", self.path)
            }
            DiagnosticKind::HandlerFailed(e) => {
                write!(f, "block {} ({name}) failed to render: {e}", self.path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_names_path_and_block() {
        let d = Diagnostic {
            path: BlockPath::root(1).child(2),
            block_name: "core/image".into(),
            kind: DiagnosticKind::HandlerFailed(HandlerError::MissingAttribute("url")),
        };
        assert_eq!(
            d.to_string(),
            "block 1.2 (core/image) failed to render: missing required attribute `url`"
        );
    }

    #[test]
    fn unnamed_block_display() {
        let d = Diagnostic {
            path: BlockPath::root(0),
            block_name: String::new(),
            kind: DiagnosticKind::Malformed(MalformedBlock::MissingName),
        };
        assert_eq!(d.to_string(), "block 0 (<unnamed>) is malformed: block has no name");
    }
}
