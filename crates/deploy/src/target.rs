use common::config;
use serde::Serialize;

use crate::error::ConfigurationError;

/// A single (application, environment) pair resolved from the configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeployTarget {
    /// AWS region of the environment.
    pub region: String,

    /// S3 bucket receiving application bundles.
    pub bucket: String,

    /// Local application name.
    pub app_name: String,

    /// Elastic Beanstalk application name.
    pub eb_application_name: String,

    /// Local environment name.
    pub env_name: String,

    /// Elastic Beanstalk environment name.
    pub eb_environment_name: String,

    /// Elastic Beanstalk environment identifier.
    pub eb_environment_id: String,

    /// Branch to take the commit from when none is passed explicitly.
    pub git_branch: Option<String>,
}

impl DeployTarget {
    /// Find exactly one application and exactly one of its environments by name.
    pub fn find(
        config: &config::Deploy,
        app_name: &str,
        env_name: &str,
    ) -> Result<Self, ConfigurationError> {
        let app = match config
            .applications
            .iter()
            .filter(|app| app.name == app_name)
            .collect::<Vec<_>>()[..]
        {
            [app] => app,
            [] => return Err(ConfigurationError::ApplicationNotFound(app_name.to_owned())),
            _ => return Err(ConfigurationError::DuplicateApplication(app_name.to_owned())),
        };

        let env = match app
            .environments
            .iter()
            .filter(|env| env.name == env_name)
            .collect::<Vec<_>>()[..]
        {
            [env] => env,
            [] => {
                return Err(ConfigurationError::EnvironmentNotFound {
                    application: app.name.clone(),
                    environment: env_name.to_owned(),
                })
            }
            _ => {
                return Err(ConfigurationError::DuplicateEnvironment {
                    application: app.name.clone(),
                    environment: env_name.to_owned(),
                })
            }
        };

        Ok(Self {
            region: config.region.clone(),
            bucket: config.bucket.clone(),
            app_name: app.name.clone(),
            eb_application_name: app.eb_application_name.clone(),
            env_name: env.name.clone(),
            eb_environment_name: env.eb_environment_name.clone(),
            eb_environment_id: env.eb_environment_id.clone(),
            git_branch: env.git_branch.clone(),
        })
    }

    /// Elastic Beanstalk console page of this environment.
    pub fn dashboard_url(&self) -> String {
        format!(
            "https://console.aws.amazon.com/elasticbeanstalk/home?region={}#/environment/dashboard?applicationName={}&environmentId={}",
            self.region, self.eb_application_name, self.eb_environment_id
        )
    }
}
