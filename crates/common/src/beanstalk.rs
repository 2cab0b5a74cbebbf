//! Elastic Beanstalk management API client.

pub use aws_sdk_elasticbeanstalk::{
    error::{DisplayErrorContext, ProvideErrorMetadata},
    types::{ApplicationVersionDescription, ApplicationVersionStatus},
    Error,
};
use aws_config::BehaviorVersion;
use aws_sdk_elasticbeanstalk::{
    config::{Credentials, Region},
    types::S3Location,
    Client,
};

use crate::config;

/// Error code returned for invalid parameters, including duplicate version labels.
const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";

/// Outcome of an application version registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionCreated {
    /// A new application version was registered.
    Created,

    /// The version label was already registered earlier.
    AlreadyExists,
}

/// Elastic Beanstalk client bound to a single region.
pub struct ConfiguredClient {
    client: Client,
}

impl ConfiguredClient {
    /// Create new [`ConfiguredClient`] for the provided region.
    pub async fn new(credentials: &config::Credentials, region: &str) -> ConfiguredClient {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                None,
                None,
                "deploy-config",
            ))
            .load()
            .await;

        ConfiguredClient {
            client: Client::new(&sdk_config),
        }
    }

    /// Register an uploaded bundle as a new application version.
    ///
    /// The application itself is never created implicitly, and the bundled
    /// configuration is validated by Elastic Beanstalk.
    pub async fn create_application_version(
        &self,
        application_name: &str,
        version_label: &str,
        description: &str,
        bucket: &str,
        key: &str,
    ) -> Result<VersionCreated, Error> {
        let response = self
            .client
            .create_application_version()
            .application_name(application_name)
            .version_label(version_label)
            .description(description)
            .source_bundle(S3Location::builder().s3_bucket(bucket).s3_key(key).build())
            .auto_create_application(false)
            .process(true)
            .send()
            .await;

        match response {
            Ok(_) => Ok(VersionCreated::Created),
            Err(err) if is_version_already_exists(&err, version_label) => {
                Ok(VersionCreated::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Describe a single application version.
    pub async fn describe_application_version(
        &self,
        application_name: &str,
        version_label: &str,
    ) -> Result<Option<ApplicationVersionDescription>, Error> {
        let output = self
            .client
            .describe_application_versions()
            .application_name(application_name)
            .version_labels(version_label)
            .send()
            .await?;

        Ok(output.application_versions().first().cloned())
    }

    /// Point an environment at the provided version label.
    pub async fn update_environment(
        &self,
        application_name: &str,
        environment_id: &str,
        environment_name: &str,
        version_label: &str,
    ) -> Result<(), Error> {
        self.client
            .update_environment()
            .application_name(application_name)
            .environment_id(environment_id)
            .environment_name(environment_name)
            .version_label(version_label)
            .send()
            .await?;

        Ok(())
    }
}

/// Check whether an error reports that the provided version label is already taken.
fn is_version_already_exists<E: ProvideErrorMetadata>(error: &E, version_label: &str) -> bool {
    error.code() == Some(INVALID_PARAMETER_VALUE)
        && error.message()
            == Some(&*format!("Application Version {version_label} already exists."))
}
