use std::path::PathBuf;

use clap::Parser;
use deploy::request::{ArgumentError, DeployRequest};

/// Deploy applications to Elastic Beanstalk environments.
///
/// Either pass `-a` and `-e`, or a single `<app>:<env> [commit]` target.
#[derive(Parser)]
#[command(about)]
pub(crate) struct Cli {
    /// Configuration file path.
    #[arg(long = "config", default_value = "Deploy.toml")]
    pub config_file: Option<PathBuf>,

    /// Comma-separated application names.
    #[arg(short, long)]
    application: Option<String>,

    /// Environment name.
    #[arg(short, long)]
    environment: Option<String>,

    /// Full-length git commit hash, instead of the environment's branch tip.
    #[arg(short, long)]
    commit_hash: Option<String>,

    /// Run the configured pre-deploy hook.
    #[arg(short = 'p', long)]
    run_pre_hook: bool,

    /// `{appName}:{envName}` target.
    #[arg(conflicts_with_all = ["application", "environment", "commit_hash"])]
    target: Option<String>,

    /// Commit hash of the positional target.
    #[arg(requires = "target")]
    commit: Option<String>,
}

impl Cli {
    /// Validate the arguments into a deploy request.
    pub fn request(&self) -> Result<DeployRequest, ArgumentError> {
        match &self.target {
            Some(target) => {
                DeployRequest::from_target(target, self.commit.as_deref(), self.run_pre_hook)
            }
            None => DeployRequest::from_options(
                self.application.as_deref(),
                self.environment.as_deref(),
                self.commit_hash.as_deref(),
                self.run_pre_hook,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use deploy::request::ArgumentError;

    use super::Cli;

    const HASH: &str = "ab5e9e3a4959bc91adfa3028b09226e47331504d";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["deployer"].iter().chain(args)).unwrap()
    }

    #[test]
    fn parses_options() {
        let cli = parse(&["-a", "web,web-with-tag", "-e", "staging", "-c", HASH, "-p"]);
        let request = cli.request().unwrap();

        assert_eq!(request.app_names(), ["web", "web-with-tag"]);
        assert_eq!(request.env_name(), "staging");
        assert_eq!(request.commit_hash(), Some(HASH));
        assert!(request.run_pre_hook());
        assert_eq!(cli.config_file, Some(PathBuf::from("Deploy.toml")));
    }

    #[test]
    fn parses_long_options() {
        let cli = parse(&[
            "--config",
            "ci/Deploy.toml",
            "--application",
            "web",
            "--environment",
            "production",
        ]);
        let request = cli.request().unwrap();

        assert_eq!(request.app_names(), ["web"]);
        assert_eq!(request.commit_hash(), None);
        assert!(!request.run_pre_hook());
        assert_eq!(cli.config_file, Some(PathBuf::from("ci/Deploy.toml")));
    }

    #[test]
    fn reports_missing_options() {
        let err = parse(&["-e", "staging"]).request().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argv - option -a / --application required"
        );

        let err = parse(&["-a", "web"]).request().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argv - option -e / --environment required"
        );

        let err = parse(&["-a", "web", "-e", "staging", "-c", "ab5e9e3"])
            .request()
            .unwrap_err();
        assert_eq!(err, ArgumentError::InvalidCommitHashOption);
    }

    #[test]
    fn parses_positional_target() {
        let request = parse(&["web:staging", HASH]).request().unwrap();

        assert_eq!(request.app_names(), ["web"]);
        assert_eq!(request.env_name(), "staging");
        assert_eq!(request.commit_hash(), Some(HASH));

        let request = parse(&["-p", "web:production"]).request().unwrap();
        assert_eq!(request.commit_hash(), None);
        assert!(request.run_pre_hook());
    }

    #[test]
    fn reports_invalid_positional_target() {
        let err = parse(&["web-staging"]).request().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument web-staging - Must be in format {appName}:{envName}"
        );

        let err = parse(&["web:staging", "1234"]).request().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument 1234 - Must be a valid, full-length git commit hash"
        );
    }

    #[test]
    fn positional_target_conflicts_with_options() {
        assert!(Cli::try_parse_from(["deployer", "-a", "web", "web:staging"]).is_err());
    }
}
