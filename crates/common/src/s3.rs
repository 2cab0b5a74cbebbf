pub use aws_sdk_s3::{error::DisplayErrorContext, Error};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::config;

/// S3 client bound to a single bucket.
pub struct ConfiguredClient {
    bucket: String,
    client: Client,
}

impl ConfiguredClient {
    /// Create new [`ConfiguredClient`] for the provided bucket.
    ///
    /// `endpoint_url` is only needed for S3-compatible storage, AWS endpoints
    /// are derived from the region otherwise.
    pub async fn new(
        credentials: &config::Credentials,
        region: &str,
        bucket: &str,
        endpoint_url: Option<&str>,
    ) -> ConfiguredClient {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                None,
                None,
                "deploy-config",
            ));

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        ConfiguredClient {
            bucket: bucket.to_owned(),
            client: Client::new(&loader.load().await),
        }
    }

    /// Bucket name this client uploads to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload an application bundle under the provided key.
    pub async fn upload_bundle(&self, key: &str, bundle: Vec<u8>) -> Result<(), Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/zip")
            .body(ByteStream::from(bundle))
            .send()
            .await?;

        Ok(())
    }
}
