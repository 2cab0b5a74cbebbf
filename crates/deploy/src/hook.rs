use std::{io, process::Stdio};

use async_trait::async_trait;
use common::config;
use derive_more::{Display, Error, From};
use tokio::process::Command;
use tracing::info;

use crate::target::DeployTarget;

/// Pre-deploy hook errors.
#[derive(Debug, Display, From, Error)]
pub enum HookError {
    /// Unable to spawn or wait for the hook process.
    Io(io::Error),

    /// Unable to serialize deploy targets.
    Json(serde_json::Error),

    /// The hook refused the deploy.
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Rejected(#[error(not(source))] String),
}

/// Callback invoked once before any environment is touched.
///
/// For multi-application deploys it receives every target together with the
/// single commit that all of them agreed on.
#[async_trait]
pub trait PreDeployHook: Send + Sync {
    async fn run(&self, targets: &[DeployTarget], commit: &str) -> Result<(), HookError>;
}

/// Hook running an external command.
///
/// The command receives `DEPLOY_COMMIT`, `DEPLOY_ENVIRONMENT` and a JSON array
/// of targets in `DEPLOY_TARGETS`. A non-zero exit status rejects the deploy.
pub struct CommandHook {
    command: String,
    args: Vec<String>,
}

impl CommandHook {
    pub fn new(config: &config::PreHook) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl PreDeployHook for CommandHook {
    async fn run(&self, targets: &[DeployTarget], commit: &str) -> Result<(), HookError> {
        let environment = targets
            .first()
            .map(|target| target.env_name.as_str())
            .unwrap_or_default();

        info!(command = %self.command, commit, "running pre-deploy hook");

        let status = Command::new(&self.command)
            .args(&self.args)
            .env("DEPLOY_COMMIT", commit)
            .env("DEPLOY_ENVIRONMENT", environment)
            .env("DEPLOY_TARGETS", serde_json::to_string(targets)?)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if !status.success() {
            return Err(HookError::Rejected(format!(
                "{} exited with {status}",
                self.command
            )));
        }

        Ok(())
    }
}
