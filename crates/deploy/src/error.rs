use derive_more::{Display, Error, From};
use tokio::task::JoinError;

use crate::{bundle::BundleError, hook::HookError, request::ArgumentError};

/// Failure reported by a storage or platform client.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[display(fmt = "{}", message)]
pub struct ClientError {
    /// Service-specific error code, if one was returned.
    code: Option<String>,

    /// Human-readable error description.
    message: String,
}

impl ClientError {
    /// Create new [`ClientError`] without an error code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Attach a service-specific error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Service-specific error code.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Invalid or ambiguous deployment configuration.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[display(fmt = "Invalid configuration: no applications with name {}", _0)]
    ApplicationNotFound(#[error(not(source))] String),

    #[display(fmt = "Invalid configuration: multiple applications with name {}", _0)]
    DuplicateApplication(#[error(not(source))] String),

    #[display(
        fmt = "Invalid configuration: application {} has no environment named {}",
        application,
        environment
    )]
    EnvironmentNotFound {
        application: String,
        environment: String,
    },

    #[display(
        fmt = "Invalid configuration: application {} has multiple environments with name {}",
        application,
        environment
    )]
    DuplicateEnvironment {
        application: String,
        environment: String,
    },

    #[display(
        fmt = "Invalid configuration: application {} environment {} has neither a commit hash nor a git branch",
        application,
        environment
    )]
    MissingCommitSource {
        application: String,
        environment: String,
    },
}

/// Errors that abort a deploy attempt.
///
/// None of these are retried. The first one raised by any stage ends the
/// execution, and environments that were already updated stay updated.
#[derive(Debug, Display, From, Error)]
pub enum DeployError {
    Configuration(ConfigurationError),

    Argument(ArgumentError),

    #[display(fmt = "unable to resolve commit: {}", _0)]
    Repository(git2::Error),

    #[display(fmt = "unable to build application bundle: {}", _0)]
    Bundle(BundleError),

    #[display(fmt = "unable to upload application bundle: {}", _0)]
    #[from(ignore)]
    Upload(ClientError),

    #[display(fmt = "unable to create application version: {}", _0)]
    #[from(ignore)]
    VersionCreation(ClientError),

    #[display(fmt = "application version {} is not ready: {}", label, reason)]
    #[from(ignore)]
    VersionNotReady { label: String, reason: String },

    #[display(fmt = "unable to update environment: {}", _0)]
    #[from(ignore)]
    EnvironmentUpdate(ClientError),

    #[display(
        fmt = "All commit hashes must be equal when deploying multiple environments simultaneously ({} vs {})",
        first,
        second
    )]
    #[from(ignore)]
    CommitMismatch { first: String, second: String },

    #[display(fmt = "pre-deploy hook failed: {}", _0)]
    PreHook(HookError),

    #[display(fmt = "background task failed: {}", _0)]
    Join(JoinError),
}

#[cfg(test)]
mod tests {
    use super::ClientError;

    #[test]
    fn client_error_keeps_code_out_of_message() {
        let err = ClientError::new("Application Version app-1 already exists.")
            .with_code("InvalidParameterValue");

        assert_eq!(err.code(), Some("InvalidParameterValue"));
        assert_eq!(err.to_string(), "Application Version app-1 already exists.");
        assert_eq!(ClientError::new("Access Denied").code(), None);
    }
}
