/// Storage location and version label of an uploaded application bundle.
///
/// Both values depend only on the Elastic Beanstalk application name and the
/// commit, so redeploying a commit reuses the same version label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// S3 object key.
    pub key: String,

    /// Elastic Beanstalk version label.
    pub version_label: String,
}

impl ArtifactDescriptor {
    pub fn new(eb_application_name: &str, commit: &str) -> Self {
        let version_label = format!("app-{commit}");

        Self {
            key: format!("{eb_application_name}/{version_label}.zip"),
            version_label,
        }
    }
}
