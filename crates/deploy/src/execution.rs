use std::sync::Arc;

use common::{config, hash};
use tracing::{error, info, instrument, warn};

use crate::{
    artifact::ArtifactDescriptor,
    bundle,
    client::{Clients, CreateVersion, UpdateEnvironment, VersionCreated},
    commit::{self, missing_commit_source},
    error::DeployError,
    readiness::Readiness,
    target::DeployTarget,
};

/// Bundle built for a resolved commit, ready to be uploaded.
struct PreparedBundle {
    commit: String,
    bytes: Vec<u8>,
    digest: String,
}

/// Bundle that was uploaded to the artifact store.
struct UploadedArtifact {
    commit: String,
    artifact: ArtifactDescriptor,
    digest: String,
}

/// Successfully finished deploy of a single target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Deployed target.
    pub target: DeployTarget,

    /// Deployed commit.
    pub commit: String,

    /// Uploaded artifact.
    pub artifact: ArtifactDescriptor,

    /// Whether the application version was registered by this deploy.
    pub version: VersionCreated,
}

/// Deploy pipeline of a single target.
pub struct DeployExecution {
    target: DeployTarget,
    commit_hash: Option<String>,
    folders: Arc<config::Folders>,
    clients: Clients,
    readiness: Arc<dyn Readiness>,
}

impl DeployExecution {
    pub fn new(
        target: DeployTarget,
        commit_hash: Option<String>,
        folders: Arc<config::Folders>,
        clients: Clients,
        readiness: Arc<dyn Readiness>,
    ) -> Self {
        Self {
            target,
            commit_hash,
            folders,
            clients,
            readiness,
        }
    }

    pub fn target(&self) -> &DeployTarget {
        &self.target
    }

    /// Check that a commit can be determined without touching the network.
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.commit_hash.is_none() && self.target.git_branch.is_none() {
            return Err(missing_commit_source(&self.target).into());
        }

        Ok(())
    }

    /// Commit this execution would deploy.
    pub async fn commit(&self) -> Result<String, DeployError> {
        commit::resolve_commit(
            &self.target,
            self.commit_hash.as_deref(),
            &self.folders.git_root,
        )
        .await
    }

    /// Run the full pipeline, resolving the commit along the way.
    pub async fn deploy(&self) -> Result<DeployOutcome, DeployError> {
        self.run(None).await
    }

    /// Run the full pipeline for an already resolved commit.
    pub async fn deploy_at(&self, commit: String) -> Result<DeployOutcome, DeployError> {
        self.run(Some(commit)).await
    }

    #[instrument(
        skip_all,
        fields(app = %self.target.app_name, env = %self.target.env_name)
    )]
    async fn run(&self, commit: Option<String>) -> Result<DeployOutcome, DeployError> {
        self.validate()?;

        info!(
            eb_application_name = %self.target.eb_application_name,
            eb_environment_name = %self.target.eb_environment_name,
            "attempting to deploy application"
        );

        let prepared = self.prepare(commit).await?;
        let uploaded = self.upload(prepared).await?;
        let version = self.create_version(&uploaded).await?;

        self.readiness
            .wait(
                &*self.clients.platform,
                &self.target.eb_application_name,
                &uploaded.artifact.version_label,
            )
            .await?;

        self.update_environment(&uploaded).await?;

        Ok(DeployOutcome {
            target: self.target.clone(),
            commit: uploaded.commit,
            artifact: uploaded.artifact,
            version,
        })
    }

    /// Resolve the commit and read the template concurrently, then build the bundle.
    async fn prepare(&self, commit: Option<String>) -> Result<PreparedBundle, DeployError> {
        let resolve = async move {
            match commit {
                Some(commit) => Ok(commit),
                None => self.commit().await,
            }
        };

        let read_template = async {
            bundle::read_template(&self.folders.apps, &self.target.app_name)
                .await
                .map_err(DeployError::from)
        };

        let (commit, template) = tokio::try_join!(resolve, read_template)?;

        info!(%commit, "commit resolved");

        let bytes = bundle::build_bundle(&template, &commit)?;
        let digest = hash::tagged_digest(&bytes);

        Ok(PreparedBundle {
            commit,
            bytes,
            digest,
        })
    }

    async fn upload(&self, prepared: PreparedBundle) -> Result<UploadedArtifact, DeployError> {
        let artifact =
            ArtifactDescriptor::new(&self.target.eb_application_name, &prepared.commit);

        info!(
            key = %artifact.key,
            bucket = %self.clients.store.bucket(),
            "uploading application bundle"
        );

        if let Err(err) = self.clients.store.put(&artifact.key, prepared.bytes).await {
            error!(%err, "failed uploading application bundle");
            return Err(DeployError::Upload(err));
        }

        Ok(UploadedArtifact {
            commit: prepared.commit,
            artifact,
            digest: prepared.digest,
        })
    }

    async fn create_version(
        &self,
        uploaded: &UploadedArtifact,
    ) -> Result<VersionCreated, DeployError> {
        let request = CreateVersion {
            application_name: self.target.eb_application_name.clone(),
            version_label: uploaded.artifact.version_label.clone(),
            description: uploaded.digest.clone(),
            bucket: self.clients.store.bucket().to_owned(),
            key: uploaded.artifact.key.clone(),
        };

        info!(version_label = %request.version_label, "creating application version");

        match self
            .clients
            .platform
            .create_application_version(&request)
            .await
        {
            Ok(VersionCreated::Created) => {
                info!("application version created");
                Ok(VersionCreated::Created)
            }
            Ok(VersionCreated::AlreadyExists) => {
                info!(version_label = %request.version_label, "application version already exists");
                self.check_existing_digest(uploaded).await;
                Ok(VersionCreated::AlreadyExists)
            }
            Err(err) => {
                error!(%err, code = err.code(), "failed to create application version");
                Err(DeployError::VersionCreation(err))
            }
        }
    }

    /// Warn when an existing version was registered from a different bundle.
    ///
    /// The existing version is still deployed.
    async fn check_existing_digest(&self, uploaded: &UploadedArtifact) {
        let existing = self
            .clients
            .platform
            .describe_version(
                &self.target.eb_application_name,
                &uploaded.artifact.version_label,
            )
            .await;

        match existing {
            Ok(Some(version)) => {
                let existing_digest = version
                    .description
                    .as_deref()
                    .and_then(hash::find_tagged_digest);

                if let Some(existing_digest) =
                    existing_digest.filter(|digest| *digest != uploaded.digest)
                {
                    warn!(
                        existing = existing_digest,
                        uploaded = %uploaded.digest,
                        "existing application version was built from a different bundle"
                    );
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "unable to describe existing application version"),
        }
    }

    async fn update_environment(&self, uploaded: &UploadedArtifact) -> Result<(), DeployError> {
        let request = UpdateEnvironment {
            application_name: self.target.eb_application_name.clone(),
            environment_id: self.target.eb_environment_id.clone(),
            environment_name: self.target.eb_environment_name.clone(),
            version_label: uploaded.artifact.version_label.clone(),
        };

        info!(
            environment_name = %request.environment_name,
            version_label = %request.version_label,
            "updating environment"
        );

        if let Err(err) = self.clients.platform.update_environment(&request).await {
            error!(%err, code = err.code(), "failed to update environment");
            return Err(DeployError::EnvironmentUpdate(err));
        }

        info!(
            dashboard = %self.target.dashboard_url(),
            "environment update started, check the Elastic Beanstalk dashboard to monitor progress"
        );

        Ok(())
    }
}
