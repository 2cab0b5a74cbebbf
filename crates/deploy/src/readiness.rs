//! Waiting for application versions to become deployable.
//!
//! Elastic Beanstalk processes new application versions asynchronously, and an
//! environment update issued too early fails. [`FixedDelay`] reproduces the
//! long-standing behavior of sleeping for a settling interval, while
//! [`PollUntilProcessed`] queries the version status instead.

use std::{convert::identity, sync::Arc, time::Duration};

use async_trait::async_trait;
use common::config::{self, ReadinessStrategy};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::{
    client::{Platform, VersionStatus},
    error::DeployError,
};

/// Wait until a freshly registered application version can be deployed.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn wait(
        &self,
        platform: &dyn Platform,
        application_name: &str,
        version_label: &str,
    ) -> Result<(), DeployError>;
}

/// Create the [`Readiness`] implementation selected in the configuration.
pub fn from_config(config: &config::Readiness) -> Arc<dyn Readiness> {
    match config.strategy {
        ReadinessStrategy::Fixed => Arc::new(FixedDelay::new(Duration::from_secs(
            config.settle_secs,
        ))),
        ReadinessStrategy::Poll => Arc::new(PollUntilProcessed::new(
            Duration::from_secs(config.poll_interval_secs),
            Duration::from_secs(config.timeout_secs),
        )),
    }
}

/// Sleep for a fixed settling interval.
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Readiness for FixedDelay {
    async fn wait(
        &self,
        _platform: &dyn Platform,
        _application_name: &str,
        version_label: &str,
    ) -> Result<(), DeployError> {
        info!(
            version_label,
            delay = ?self.delay,
            "sleeping to allow application version to finalize before updating environment"
        );
        sleep(self.delay).await;

        Ok(())
    }
}

/// Poll the application version status until it is processed.
///
/// Failed status queries are retried until the timeout elapses.
pub struct PollUntilProcessed {
    interval: Duration,
    timeout: Duration,
}

impl PollUntilProcessed {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

#[async_trait]
impl Readiness for PollUntilProcessed {
    async fn wait(
        &self,
        platform: &dyn Platform,
        application_name: &str,
        version_label: &str,
    ) -> Result<(), DeployError> {
        let poll = async {
            loop {
                match platform
                    .describe_version(application_name, version_label)
                    .await
                {
                    Ok(Some(version)) if version.status == VersionStatus::Processed => {
                        info!(version_label, "application version processed");
                        return Ok(());
                    }
                    Ok(Some(version)) if version.status == VersionStatus::Failed => {
                        return Err(DeployError::VersionNotReady {
                            label: version_label.to_owned(),
                            reason: String::from("processing failed"),
                        });
                    }
                    Ok(_) => info!(version_label, "application version is still processing"),
                    Err(err) => warn!(%err, "unable to query application version status"),
                }

                sleep(self.interval).await;
            }
        };

        timeout(self.timeout, poll)
            .await
            .map_err(|_| DeployError::VersionNotReady {
                label: version_label.to_owned(),
                reason: format!("not processed within {:?}", self.timeout),
            })
            .and_then(identity)
    }
}
