use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,
    ConfigAlreadyExists,

    ValidationInvalidArgument,

    CorpusNotFound,

    ScanMalformedWildcard,
    ScanParenUnderflow,

    DocumentReadFailed,
    DocumentWriteFailed,
    DocumentNotFound,

    RenameConflict,
    RenameInvalidState,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ConfigAlreadyExists => "config.already_exists",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::CorpusNotFound => "corpus.not_found",

            ErrorCode::ScanMalformedWildcard => "scan.malformed_wildcard",
            ErrorCode::ScanParenUnderflow => "scan.paren_underflow",

            ErrorCode::DocumentReadFailed => "document.read_failed",
            ErrorCode::DocumentWriteFailed => "document.write_failed",
            ErrorCode::DocumentNotFound => "document.not_found",

            ErrorCode::RenameConflict => "rename.conflict",
            ErrorCode::RenameInvalidState => "rename.invalid_state",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFaultDetails {
    pub document: String,
    pub offset: usize,
    pub line: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIoDetails {
    pub document: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameConflictDetails {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn corpus_not_found(root: impl Into<String>) -> Self {
        let root = root.into();
        Self::new(
            ErrorCode::CorpusNotFound,
            format!("Corpus root '{}' is not a directory", root),
            serde_json::json!({ "root": root }),
        )
        .with_hint("Pass --path <dir> or run from inside the wildcard directory")
    }

    pub fn malformed_wildcard(document: impl Into<String>, offset: usize, line: usize) -> Self {
        let details = to_details(ScanFaultDetails {
            document: document.into(),
            offset,
            line,
        });

        Self::new(
            ErrorCode::ScanMalformedWildcard,
            "Malformed wildcard: unpaired __ detected",
            details,
        )
    }

    pub fn paren_underflow(document: impl Into<String>, offset: usize, line: usize) -> Self {
        let details = to_details(ScanFaultDetails {
            document: document.into(),
            offset,
            line,
        });

        Self::new(
            ErrorCode::ScanParenUnderflow,
            "Unbalanced parenthesis: ')' without matching '('",
            details,
        )
    }

    pub fn document_read(document: impl Into<String>, error: impl Into<String>) -> Self {
        let details = to_details(DocumentIoDetails {
            document: document.into(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::DocumentReadFailed,
            "Could not read document",
            details,
        )
    }

    pub fn document_write(document: impl Into<String>, error: impl Into<String>) -> Self {
        let details = to_details(DocumentIoDetails {
            document: document.into(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::DocumentWriteFailed,
            "Could not write document",
            details,
        )
    }

    pub fn document_not_found(document: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DocumentNotFound,
            "Document not found",
            serde_json::json!({ "document": document.into() }),
        )
    }

    pub fn rename_conflict(from: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        let details = to_details(RenameConflictDetails {
            from: from.into(),
            to: to.clone(),
        });

        Self::new(
            ErrorCode::RenameConflict,
            format!("Rename target '{}' already exists", to),
            details,
        )
        .with_hint("Pick another wildcard name or merge the two documents by hand first")
    }

    pub fn rename_invalid_state(operation: &str, state: &str) -> Self {
        Self::new(
            ErrorCode::RenameInvalidState,
            format!("Cannot {} while rename session is {}", operation, state),
            serde_json::json!({ "operation": operation, "state": state }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn config_already_exists(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigAlreadyExists,
            "Configuration file already exists",
            serde_json::json!({ "path": path.into() }),
        )
        .with_hint("Re-run with --force to overwrite it")
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// One-line description used in run reports: message plus the details
    /// that identify where it happened.
    pub fn summary(&self) -> String {
        let field = |key: &str| self.details.get(key).and_then(Value::as_str).map(str::to_string);

        if let Some(err) = field("error") {
            return format!("{}: {}", self.message, err);
        }
        if let Some(line) = self.details.get("line").and_then(Value::as_u64) {
            return format!("{} (line {})", self.message, line);
        }
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dotted() {
        assert_eq!(
            ErrorCode::ScanMalformedWildcard.as_str(),
            "scan.malformed_wildcard"
        );
        assert_eq!(ErrorCode::RenameConflict.as_str(), "rename.conflict");
    }

    #[test]
    fn rename_conflict_carries_hint_and_paths() {
        let err = Error::rename_conflict("color.txt", "hue.txt");
        assert_eq!(err.code, ErrorCode::RenameConflict);
        assert_eq!(err.details["to"], "hue.txt");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn summary_includes_io_error() {
        let err = Error::document_write("a.txt", "permission denied");
        assert_eq!(err.summary(), "Could not write document: permission denied");

        let err = Error::malformed_wildcard("a.txt", 4, 2);
        assert_eq!(
            err.summary(),
            "Malformed wildcard: unpaired __ detected (line 2)"
        );
    }
}
