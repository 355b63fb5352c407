use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigInvalidJson,
    ConfigInvalidValue,

    VersionNotFound,
    ShortcutTemplateInvalid,

    ProcessFailed,
    ProcessTimeout,
    ProcessSpawnFailed,

    OperatorCancelled,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigNotFound => "config.not_found",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::VersionNotFound => "version.not_found",
            ErrorCode::ShortcutTemplateInvalid => "shortcut.template_invalid",

            ErrorCode::ProcessFailed => "process.failed",
            ErrorCode::ProcessTimeout => "process.timeout",
            ErrorCode::ProcessSpawnFailed => "process.spawn_failed",

            ErrorCode::OperatorCancelled => "operator.cancelled",

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
pub struct ConfigNotFoundDetails {
    pub path: String,
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionNotFoundDetails {
    pub path: String,
    pub prefix: String,
    pub suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutTemplateInvalidDetails {
    pub template: String,
    pub placeholder: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFailedDetails {
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTimeoutDetails {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
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

    pub fn config_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Config file not found: {}", path),
            to_details(ConfigNotFoundDetails { path }),
        )
        .with_hint("Run 'mtgdb-release config show' to print the built-in defaults")
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn version_not_found(details: VersionNotFoundDetails) -> Self {
        let message = format!("Failed to parse version from {}", details.path);
        Self::new(ErrorCode::VersionNotFound, message, to_details(details))
    }

    pub fn shortcut_template_invalid(
        template: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        let placeholder = placeholder.into();
        Self::new(
            ErrorCode::ShortcutTemplateInvalid,
            format!("Shortcut template does not contain placeholder '{}'", placeholder),
            to_details(ShortcutTemplateInvalidDetails {
                template: template.into(),
                placeholder,
            }),
        )
    }

    pub fn process_failed(details: ProcessFailedDetails) -> Self {
        let message = format!(
            "{} exited with status {}",
            details.program, details.exit_code
        );
        Self::new(ErrorCode::ProcessFailed, message, to_details(details))
    }

    pub fn process_timeout(details: ProcessTimeoutDetails) -> Self {
        let message = format!(
            "{} did not finish within {}s",
            details.program, details.timeout_secs
        );
        Self::new(ErrorCode::ProcessTimeout, message, to_details(details))
    }

    pub fn process_spawn_failed(program: impl Into<String>, error: impl Into<String>) -> Self {
        let program = program.into();
        Self::new(
            ErrorCode::ProcessSpawnFailed,
            format!("Failed to start {}", program),
            serde_json::json!({ "program": program, "error": error.into() }),
        )
        .with_hint("Check that the tool is installed and the configured path is correct")
    }

    pub fn operator_cancelled(stage: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OperatorCancelled,
            "Release cancelled by operator",
            serde_json::json!({ "stage": stage.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
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

    /// Process exit status for this error.
    ///
    /// A failed tool propagates its own status so the release exits the same
    /// way the tool did.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::ProcessFailed => self
                .details
                .get("exitCode")
                .and_then(Value::as_i64)
                .map(|code| code.clamp(1, 255) as i32)
                .unwrap_or(1),
            ErrorCode::ProcessTimeout => 124,
            ErrorCode::ProcessSpawnFailed => 127,
            ErrorCode::OperatorCancelled => 130,
            ErrorCode::ConfigNotFound
            | ErrorCode::ConfigInvalidJson
            | ErrorCode::ConfigInvalidValue => 2,
            ErrorCode::VersionNotFound | ErrorCode::ShortcutTemplateInvalid => 3,
            ErrorCode::InternalIoError
            | ErrorCode::InternalJsonError
            | ErrorCode::InternalUnexpected => 1,
        }
    }
}
