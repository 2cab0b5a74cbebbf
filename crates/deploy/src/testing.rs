use std::{
    cell::Cell,
    collections::VecDeque,
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use common::config;
use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use crate::{
    bundle,
    client::{
        ArtifactStore, ClientFactory, Clients, CreateVersion, Platform, UpdateEnvironment,
        VersionCreated, VersionInfo, VersionStatus,
    },
    error::{ClientError, DeployError},
    execution::DeployExecution,
    hook::{HookError, PreDeployHook},
    readiness::Readiness,
    service::DeployService,
    target::DeployTarget,
};

pub const COMMIT: &str = "ab5e9e3a4959bc91adfa3028b09226e47331504d";

pub const OTHER_COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

pub const TEMPLATE: &str = r#"{
  "AWSEBDockerrunVersion": "1",
  "Image": {
    "Name": "testapp/web{{TAG}}",
    "Update": "true"
  },
  "Ports": [
    {
      "ContainerPort": "8080"
    }
  ]
}
"#;

fn environment(
    app_name: &str,
    name: &str,
    eb_environment_id: &str,
    git_branch: Option<&str>,
) -> config::Environment {
    config::Environment {
        name: name.to_owned(),
        eb_environment_name: format!("testapp-{app_name}-{name}"),
        eb_environment_id: eb_environment_id.to_owned(),
        git_branch: git_branch.map(String::from),
    }
}

fn application(name: &str, environments: Vec<config::Environment>) -> config::Application {
    config::Application {
        name: name.to_owned(),
        eb_application_name: format!("testapp-{name}"),
        environments,
    }
}

pub fn deploy_config() -> config::Deploy {
    config::Deploy {
        region: String::from("us-east-1"),
        bucket: String::from("myBucket"),
        endpoint_url: None,
        applications: vec![
            application(
                "web",
                vec![
                    environment("web", "staging", "e-adsfnk32", Some("master")),
                    environment("web", "production", "e-prod1234", None),
                ],
            ),
            application(
                "web-with-tag",
                vec![
                    environment("web-with-tag", "staging", "e-tag5678", Some("release")),
                    environment("web-with-tag", "production", "e-tagprod9", None),
                ],
            ),
            application(
                "worker",
                vec![environment(
                    "worker",
                    "staging",
                    "e-work0001",
                    Some("master"),
                )],
            ),
        ],
    }
}

pub fn target(app_name: &str, env_name: &str) -> DeployTarget {
    DeployTarget::find(&deploy_config(), app_name, env_name).unwrap()
}

pub fn write_template(apps: &Path, app_name: &str) {
    let path = bundle::template_path(apps, app_name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, TEMPLATE).unwrap();
}

/// Create a root commit and point the provided branch at it.
pub fn commit_on(repo: &Repository, branch: &str, message: &str) -> String {
    let signature = Signature::now("Deployer", "deployer@example.com").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let oid = repo
        .commit(None, &signature, &signature, message, &tree, &[])
        .unwrap();

    point_branch(repo, branch, oid);

    oid.to_string()
}

fn point_branch(repo: &Repository, branch: &str, oid: Oid) {
    repo.reference(&format!("refs/heads/{branch}"), oid, true, "test")
        .unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Put {
        bucket: String,
        key: String,
        bundle: Vec<u8>,
    },
    CreateVersion(CreateVersion),
    DescribeVersion {
        application_name: String,
        version_label: String,
    },
    AwaitReadiness {
        application_name: String,
        version_label: String,
    },
    UpdateEnvironment(UpdateEnvironment),
    Hook {
        app_names: Vec<String>,
        commit: String,
    },
}

/// Calls shared between every mock of a test.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone, Debug, Default)]
pub enum CreateOutcome {
    #[default]
    Created,
    AlreadyExists,
    Fail(ClientError),
}

type Statuses = Arc<Mutex<VecDeque<Result<Option<VersionInfo>, ClientError>>>>;

pub struct MockStore {
    bucket: String,
    recorder: Recorder,
    fail: bool,
}

#[async_trait]
impl ArtifactStore for MockStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, bundle: Vec<u8>) -> Result<(), ClientError> {
        self.recorder.record(Call::Put {
            bucket: self.bucket.clone(),
            key: key.to_owned(),
            bundle,
        });

        if self.fail {
            return Err(ClientError::new("Access Denied"));
        }

        Ok(())
    }
}

/// In-memory platform.
///
/// Describe calls pop queued statuses and report a pending version once the
/// queue is empty.
#[derive(Clone, Default)]
pub struct MockPlatform {
    recorder: Recorder,
    statuses: Statuses,
    create_outcome: CreateOutcome,
    fail_update: bool,
}

impl MockPlatform {
    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<Option<VersionInfo>, ClientError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.recorder.calls()
    }

    pub fn describe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::DescribeVersion { .. }))
            .count()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn create_application_version(
        &self,
        request: &CreateVersion,
    ) -> Result<VersionCreated, ClientError> {
        self.recorder.record(Call::CreateVersion(request.clone()));

        match &self.create_outcome {
            CreateOutcome::Created => Ok(VersionCreated::Created),
            CreateOutcome::AlreadyExists => Ok(VersionCreated::AlreadyExists),
            CreateOutcome::Fail(err) => Err(err.clone()),
        }
    }

    async fn describe_version(
        &self,
        application_name: &str,
        version_label: &str,
    ) -> Result<Option<VersionInfo>, ClientError> {
        self.recorder.record(Call::DescribeVersion {
            application_name: application_name.to_owned(),
            version_label: version_label.to_owned(),
        });

        self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(Some(VersionInfo {
            status: VersionStatus::Pending,
            description: None,
        })))
    }

    async fn update_environment(&self, request: &UpdateEnvironment) -> Result<(), ClientError> {
        self.recorder.record(Call::UpdateEnvironment(request.clone()));

        if self.fail_update {
            return Err(ClientError::new(format!(
                "Environment named {} is in an invalid state for this operation",
                request.environment_name
            )));
        }

        Ok(())
    }
}

struct MockFactory {
    platform: MockPlatform,
    fail_upload: bool,
}

#[async_trait]
impl ClientFactory for MockFactory {
    async fn create(&self, target: &DeployTarget) -> Clients {
        Clients {
            store: Box::new(MockStore {
                bucket: target.bucket.clone(),
                recorder: self.platform.recorder.clone(),
                fail: self.fail_upload,
            }),
            platform: Box::new(self.platform.clone()),
        }
    }
}

struct RecordingHook {
    recorder: Recorder,
    reject: bool,
}

#[async_trait]
impl PreDeployHook for RecordingHook {
    async fn run(&self, targets: &[DeployTarget], commit: &str) -> Result<(), HookError> {
        self.recorder.record(Call::Hook {
            app_names: targets.iter().map(|target| target.app_name.clone()).collect(),
            commit: commit.to_owned(),
        });

        if self.reject {
            return Err(HookError::Rejected(String::from("PreHookFunction failed")));
        }

        Ok(())
    }
}

/// Readiness that records the wait and returns immediately.
struct RecordingReadiness {
    recorder: Recorder,
}

#[async_trait]
impl Readiness for RecordingReadiness {
    async fn wait(
        &self,
        _: &dyn Platform,
        application_name: &str,
        version_label: &str,
    ) -> Result<(), DeployError> {
        self.recorder.record(Call::AwaitReadiness {
            application_name: application_name.to_owned(),
            version_label: version_label.to_owned(),
        });

        Ok(())
    }
}

/// Temporary apps folder and git repository with in-memory clients.
///
/// Templates exist for `web` and `web-with-tag`, but not for `worker`.
pub struct TestEnv {
    dir: TempDir,
    repo: Repository,
    commits: Cell<usize>,
    platform: MockPlatform,
    fail_upload: bool,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();

        write_template(&dir.path().join("apps"), "web");
        write_template(&dir.path().join("apps"), "web-with-tag");

        let repo = Repository::init(dir.path().join("repo")).unwrap();

        Self {
            dir,
            repo,
            commits: Cell::new(0),
            platform: MockPlatform::default(),
            fail_upload: false,
        }
    }

    pub fn with_create_outcome(mut self, outcome: CreateOutcome) -> Self {
        self.platform.create_outcome = outcome;
        self
    }

    pub fn with_failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn with_failing_update(mut self) -> Self {
        self.platform.fail_update = true;
        self
    }

    pub fn push_status(&self, status: Result<Option<VersionInfo>, ClientError>) {
        self.platform.statuses.lock().unwrap().push_back(status);
    }

    /// Commit on top of nothing and move the branch there.
    pub fn commit_on(&self, branch: &str) -> String {
        let idx = self.commits.get() + 1;
        self.commits.set(idx);

        commit_on(&self.repo, branch, &format!("commit {idx}"))
    }

    pub fn point_branch(&self, branch: &str, commit: &str) {
        point_branch(&self.repo, branch, Oid::from_str(commit).unwrap());
    }

    pub fn folders(&self) -> config::Folders {
        config::Folders {
            apps: self.dir.path().join("apps"),
            git_root: self.dir.path().join("repo"),
        }
    }

    pub fn service(&self) -> DeployService {
        DeployService::new(
            deploy_config(),
            self.folders(),
            Arc::new(MockFactory {
                platform: self.platform.clone(),
                fail_upload: self.fail_upload,
            }),
            Arc::new(RecordingReadiness {
                recorder: self.platform.recorder.clone(),
            }),
        )
    }

    pub fn hook(&self, reject: bool) -> Arc<dyn PreDeployHook> {
        Arc::new(RecordingHook {
            recorder: self.platform.recorder.clone(),
            reject,
        })
    }

    pub async fn execution(
        &self,
        app_name: &str,
        env_name: &str,
        commit_hash: Option<&str>,
    ) -> DeployExecution {
        self.service()
            .execution(app_name, env_name, commit_hash)
            .await
            .unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.platform.calls()
    }
}
