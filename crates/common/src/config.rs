use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// AWS access key pair used by both storage and platform clients.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Access key identifier.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,
}

/// A single Elastic Beanstalk environment of an application.
#[derive(Clone, Debug, Deserialize)]
pub struct Environment {
    /// Local environment name, as passed on the command line.
    pub name: String,

    /// Environment name on the Elastic Beanstalk side.
    pub eb_environment_name: String,

    /// Environment identifier on the Elastic Beanstalk side.
    pub eb_environment_id: String,

    /// Git branch used to resolve a commit when none is passed explicitly.
    #[serde(default)]
    pub git_branch: Option<String>,
}

/// A deployable application with its environments.
#[derive(Clone, Debug, Deserialize)]
pub struct Application {
    /// Local application name, which is also the template directory name.
    pub name: String,

    /// Application name on the Elastic Beanstalk side.
    pub eb_application_name: String,

    /// Environments that this application can be deployed to.
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// Deployment configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Deploy {
    /// AWS region name.
    pub region: String,

    /// S3 bucket name for application bundles.
    pub bucket: String,

    /// Custom S3 endpoint URL, for S3-compatible storage.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Known applications.
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Filesystem roots.
#[derive(Clone, Debug, Deserialize)]
pub struct Folders {
    /// Directory containing a folder with a `Dockerrun.aws.json` template per application.
    #[serde(default = "default_apps_folder")]
    pub apps: PathBuf,

    /// Git repository root.
    #[serde(default = "default_git_root")]
    pub git_root: PathBuf,
}

impl Default for Folders {
    fn default() -> Self {
        Self {
            apps: default_apps_folder(),
            git_root: default_git_root(),
        }
    }
}

fn default_apps_folder() -> PathBuf {
    PathBuf::from("apps")
}

fn default_git_root() -> PathBuf {
    PathBuf::from(".")
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
        }
    }
}

/// How to wait for a freshly created application version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStrategy {
    /// Sleep for a fixed settling interval.
    #[default]
    Fixed,

    /// Poll the application version status until it is processed.
    Poll,
}

/// Application version readiness configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Readiness {
    /// Selected strategy.
    #[serde(default)]
    pub strategy: ReadinessStrategy,

    /// Settling interval of the fixed strategy, in seconds.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Delay between status queries of the polling strategy, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Max polling duration, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            strategy: ReadinessStrategy::default(),
            settle_secs: default_settle_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Elastic Beanstalk processes new versions asynchronously. Ten seconds
// was enough for single-file Docker bundles in practice.
fn default_settle_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    600
}

/// External pre-deploy hook command.
#[derive(Clone, Debug, Deserialize)]
pub struct PreHook {
    /// Executable path or name.
    pub command: String,

    /// Additional command arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// AWS credentials.
    pub credentials: Credentials,

    /// Deployment targets.
    pub deploy: Deploy,

    /// Filesystem roots.
    #[serde(default)]
    pub folders: Folders,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,

    /// Application version readiness configuration.
    #[serde(default)]
    pub readiness: Readiness,

    /// Pre-deploy hook, if any.
    #[serde(default)]
    pub pre_hook: Option<PreHook>,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// Nested values can be overridden with double underscores,
    /// for example `DEPLOY_CREDENTIALS__ACCESS_KEY_ID`.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Deploy.toml"))))
            .merge(Env::prefixed("DEPLOY_").split("__"))
            .extract()
    }
}
