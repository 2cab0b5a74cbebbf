use derive_more::{Display, Error};
use itertools::Itertools;

/// Length of a full git commit hash.
pub const COMMIT_HASH_LENGTH: usize = 40;

/// Malformed command-line input.
///
/// Messages are matched by wrapper scripts, keep them stable.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[display(fmt = "Invalid argv - option -a / --application required")]
    MissingApplication,

    #[display(fmt = "Invalid argv - option -e / --environment required")]
    MissingEnvironment,

    #[display(
        fmt = "Invalid argv - option -c / --commit-hash must be a full length git hash of 40 characters"
    )]
    InvalidCommitHashOption,

    #[display(fmt = "Invalid argument {} - Must be in format {{appName}}:{{envName}}", _0)]
    InvalidTarget(#[error(not(source))] String),

    #[display(
        fmt = "Invalid argument {} - Must be a valid, full-length git commit hash",
        _0
    )]
    InvalidCommitHash(#[error(not(source))] String),
}

/// A single deploy invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployRequest {
    app_names: Vec<String>,
    env_name: String,
    commit_hash: Option<String>,
    run_pre_hook: bool,
}

impl DeployRequest {
    /// Build a request from the option-style arguments.
    ///
    /// `application` is a comma-separated list of application names. Repeated
    /// names are deployed once, in order of their first appearance.
    pub fn from_options(
        application: Option<&str>,
        environment: Option<&str>,
        commit_hash: Option<&str>,
        run_pre_hook: bool,
    ) -> Result<Self, ArgumentError> {
        let app_names = application
            .map(|apps| {
                apps.split(',')
                    .map(str::trim)
                    .filter(|app| !app.is_empty())
                    .unique()
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|apps| !apps.is_empty())
            .ok_or(ArgumentError::MissingApplication)?;

        let env_name = environment
            .filter(|env| !env.is_empty())
            .ok_or(ArgumentError::MissingEnvironment)?;

        if commit_hash.is_some_and(|hash| hash.len() != COMMIT_HASH_LENGTH) {
            return Err(ArgumentError::InvalidCommitHashOption);
        }

        Ok(Self {
            app_names,
            env_name: env_name.to_owned(),
            commit_hash: commit_hash.map(String::from),
            run_pre_hook,
        })
    }

    /// Build a request from the positional `{appName}:{envName} [commitHash]` form.
    pub fn from_target(
        target: &str,
        commit_hash: Option<&str>,
        run_pre_hook: bool,
    ) -> Result<Self, ArgumentError> {
        let (app_name, env_name) = match target.split(':').collect::<Vec<_>>()[..] {
            [app, env] if !app.is_empty() && !env.is_empty() => (app, env),
            _ => return Err(ArgumentError::InvalidTarget(target.to_owned())),
        };

        if let Some(hash) = commit_hash.filter(|hash| hash.len() != COMMIT_HASH_LENGTH) {
            return Err(ArgumentError::InvalidCommitHash(hash.to_owned()));
        }

        Ok(Self {
            app_names: vec![app_name.to_owned()],
            env_name: env_name.to_owned(),
            commit_hash: commit_hash.map(String::from),
            run_pre_hook,
        })
    }

    /// Requested application names, never empty.
    pub fn app_names(&self) -> &[String] {
        &self.app_names
    }

    /// Environment name shared by all applications.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Explicitly requested commit, if any.
    pub fn commit_hash(&self) -> Option<&str> {
        self.commit_hash.as_deref()
    }

    /// Whether the pre-deploy hook was requested.
    pub fn run_pre_hook(&self) -> bool {
        self.run_pre_hook
    }
}
