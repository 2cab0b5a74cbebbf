//! Storage and platform seams.
//!
//! Execution units talk to S3 and Elastic Beanstalk only through
//! [`ArtifactStore`] and [`Platform`], so the whole pipeline can run against
//! in-memory clients in tests.

use async_trait::async_trait;
use common::{
    beanstalk::{self, ApplicationVersionStatus},
    config, s3,
};

pub use common::beanstalk::VersionCreated;

use crate::{error::ClientError, target::DeployTarget};

/// Application version registration parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateVersion {
    pub application_name: String,
    pub version_label: String,
    pub description: String,
    pub bucket: String,
    pub key: String,
}

/// Environment update parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEnvironment {
    pub application_name: String,
    pub environment_id: String,
    pub environment_name: String,
    pub version_label: String,
}

/// Processing state of an application version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionStatus {
    /// Still being processed or validated.
    Pending,

    /// Ready to be deployed.
    Processed,

    /// Validation of the bundle failed.
    Failed,
}

/// Registered application version details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    pub status: VersionStatus,
    pub description: Option<String>,
}

/// Object storage for application bundles, bound to a single bucket.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Bucket name the bundles are uploaded to.
    fn bucket(&self) -> &str;

    /// Upload bundle bytes under the provided key.
    async fn put(&self, key: &str, bundle: Vec<u8>) -> Result<(), ClientError>;
}

/// Managed platform API.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Register a new application version.
    ///
    /// A version label that already exists is reported as
    /// [`VersionCreated::AlreadyExists`] rather than an error.
    async fn create_application_version(
        &self,
        request: &CreateVersion,
    ) -> Result<VersionCreated, ClientError>;

    /// Describe an application version, if it exists.
    async fn describe_version(
        &self,
        application_name: &str,
        version_label: &str,
    ) -> Result<Option<VersionInfo>, ClientError>;

    /// Point an environment at a registered application version.
    async fn update_environment(&self, request: &UpdateEnvironment) -> Result<(), ClientError>;
}

/// Client handles owned by a single execution unit.
pub struct Clients {
    pub store: Box<dyn ArtifactStore>,
    pub platform: Box<dyn Platform>,
}

/// Creates client handles for a deploy target.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(&self, target: &DeployTarget) -> Clients;
}

/// [`ClientFactory`] creating AWS SDK clients from static credentials.
pub struct AwsClientFactory {
    credentials: config::Credentials,
    endpoint_url: Option<String>,
}

impl AwsClientFactory {
    pub fn new(credentials: config::Credentials, endpoint_url: Option<String>) -> Self {
        Self {
            credentials,
            endpoint_url,
        }
    }
}

#[async_trait]
impl ClientFactory for AwsClientFactory {
    async fn create(&self, target: &DeployTarget) -> Clients {
        let store = s3::ConfiguredClient::new(
            &self.credentials,
            &target.region,
            &target.bucket,
            self.endpoint_url.as_deref(),
        )
        .await;

        let platform = beanstalk::ConfiguredClient::new(&self.credentials, &target.region).await;

        Clients {
            store: Box::new(store),
            platform: Box::new(platform),
        }
    }
}

impl From<s3::Error> for ClientError {
    fn from(err: s3::Error) -> Self {
        ClientError::new(s3::DisplayErrorContext(&err).to_string())
    }
}

impl From<beanstalk::Error> for ClientError {
    fn from(err: beanstalk::Error) -> Self {
        let client_error = ClientError::new(beanstalk::DisplayErrorContext(&err).to_string());

        match beanstalk::ProvideErrorMetadata::code(&err) {
            Some(code) => client_error.with_code(code),
            None => client_error,
        }
    }
}

#[async_trait]
impl ArtifactStore for s3::ConfiguredClient {
    fn bucket(&self) -> &str {
        s3::ConfiguredClient::bucket(self)
    }

    async fn put(&self, key: &str, bundle: Vec<u8>) -> Result<(), ClientError> {
        Ok(self.upload_bundle(key, bundle).await?)
    }
}

#[async_trait]
impl Platform for beanstalk::ConfiguredClient {
    async fn create_application_version(
        &self,
        request: &CreateVersion,
    ) -> Result<VersionCreated, ClientError> {
        Ok(beanstalk::ConfiguredClient::create_application_version(
            self,
            &request.application_name,
            &request.version_label,
            &request.description,
            &request.bucket,
            &request.key,
        )
        .await?)
    }

    async fn describe_version(
        &self,
        application_name: &str,
        version_label: &str,
    ) -> Result<Option<VersionInfo>, ClientError> {
        let version = self
            .describe_application_version(application_name, version_label)
            .await?;

        Ok(version.map(|version| VersionInfo {
            status: match version.status() {
                Some(ApplicationVersionStatus::Processed) => VersionStatus::Processed,
                Some(ApplicationVersionStatus::Failed) => VersionStatus::Failed,
                _ => VersionStatus::Pending,
            },
            description: version.description().map(String::from),
        }))
    }

    async fn update_environment(&self, request: &UpdateEnvironment) -> Result<(), ClientError> {
        Ok(beanstalk::ConfiguredClient::update_environment(
            self,
            &request.application_name,
            &request.environment_id,
            &request.environment_name,
            &request.version_label,
        )
        .await?)
    }
}
