//! Error types shared by the gateway, the controllers and the front-ends.
//!
//! - `RemoteError`: anything that went wrong talking to the backend
//! - `ValidationError`: caught before any network call is made
//! - `AppError`: what the binary reports on exit (message + exit code)

/// Exit code for usage and validation failures.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for remote, terminal and file failures.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::new(EXIT_RUNTIME, err.message)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(EXIT_USAGE, err.to_string())
    }
}

/// Where a remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Network unreachable, body unreadable, or body not the expected JSON.
    Transport,
    /// Non-2xx response.
    Server { status: u16 },
}

/// Uniform failure shape for every gateway operation.
///
/// `message` is what the user sees: the server's `error` field when it sent one,
/// otherwise a generic per-operation message.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Server { status },
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RemoteError {}

/// Input problems detected client-side. These never reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Upload roles with no file bound (in role order).
    MissingUploadFiles(Vec<&'static str>),
    NoMaterialSelected,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingUploadFiles(roles) => write!(
                f,
                "Please select all three files (missing: {}).",
                roles.join(", ")
            ),
            ValidationError::NoMaterialSelected => write!(f, "Please select a material first."),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_maps_to_runtime_exit_code() {
        let err: AppError = RemoteError::server(404, "No data for material 'M9'").into();
        assert_eq!(err.exit_code(), EXIT_RUNTIME);
        assert_eq!(err.to_string(), "No data for material 'M9'");
    }

    #[test]
    fn missing_files_message_lists_roles() {
        let err = ValidationError::MissingUploadFiles(vec!["prices", "vendors"]);
        assert_eq!(
            err.to_string(),
            "Please select all three files (missing: prices, vendors)."
        );
    }
}
