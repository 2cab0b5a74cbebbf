//! # Deployer
//!
//! Command-line entrypoint deploying configured applications to their
//! Elastic Beanstalk environments.

use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use common::{config::Config, logging};
use deploy::{
    client::AwsClientFactory,
    hook::CommandHook,
    readiness,
    service::DeployService,
};
use tracing::info;

/// Command-line arguments.
mod cli;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let request = cli.request()?;

    let config = Config::new(cli.config_file)?;

    logging::init(&config);

    let clients = AwsClientFactory::new(
        config.credentials.clone(),
        config.deploy.endpoint_url.clone(),
    );

    let mut service = DeployService::new(
        config.deploy,
        config.folders,
        Arc::new(clients),
        readiness::from_config(&config.readiness),
    );

    if let Some(pre_hook) = &config.pre_hook {
        service = service.with_pre_hook(Arc::new(CommandHook::new(pre_hook)));
    }

    for outcome in service.deploy(&request).await? {
        info!(
            app = %outcome.target.app_name,
            env = %outcome.target.env_name,
            version_label = %outcome.artifact.version_label,
            "deploy finished"
        );
    }

    Ok(())
}
