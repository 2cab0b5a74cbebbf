use std::sync::Arc;

use common::config;
use futures_util::future::{join_all, try_join_all};
use tracing::{error, info, instrument, warn};

use crate::{
    client::ClientFactory,
    error::DeployError,
    execution::{DeployExecution, DeployOutcome},
    hook::PreDeployHook,
    readiness::Readiness,
    request::{ArgumentError, DeployRequest},
    target::DeployTarget,
};

/// Deploys configured applications to their Elastic Beanstalk environments.
pub struct DeployService {
    config: config::Deploy,
    folders: Arc<config::Folders>,
    clients: Arc<dyn ClientFactory>,
    readiness: Arc<dyn Readiness>,
    pre_hook: Option<Arc<dyn PreDeployHook>>,
}

impl DeployService {
    pub fn new(
        config: config::Deploy,
        folders: config::Folders,
        clients: Arc<dyn ClientFactory>,
        readiness: Arc<dyn Readiness>,
    ) -> Self {
        Self {
            config,
            folders: Arc::new(folders),
            clients,
            readiness,
            pre_hook: None,
        }
    }

    /// Attach a hook that runs before any environment is updated.
    ///
    /// The hook only runs for requests that ask for it.
    pub fn with_pre_hook(mut self, pre_hook: Arc<dyn PreDeployHook>) -> Self {
        self.pre_hook = Some(pre_hook);
        self
    }

    /// Look up a target and create its execution unit.
    pub async fn execution(
        &self,
        app_name: &str,
        env_name: &str,
        commit_hash: Option<&str>,
    ) -> Result<DeployExecution, DeployError> {
        let target = DeployTarget::find(&self.config, app_name, env_name)?;
        let clients = self.clients.create(&target).await;

        Ok(DeployExecution::new(
            target,
            commit_hash.map(String::from),
            self.folders.clone(),
            clients,
            self.readiness.clone(),
        ))
    }

    /// Deploy every application of the request.
    ///
    /// Requests with a single application take the single-target path,
    /// everything else goes through [`deploy_multiple`].
    ///
    /// [`deploy_multiple`]: Self::deploy_multiple
    pub async fn deploy(&self, request: &DeployRequest) -> Result<Vec<DeployOutcome>, DeployError> {
        match request.app_names() {
            [app_name] => Ok(vec![self.deploy_single(app_name, request).await?]),
            _ => self.deploy_multiple(request).await,
        }
    }

    /// Deploy a single application.
    #[instrument(skip(self, request), fields(env = %request.env_name()))]
    pub async fn deploy_single(
        &self,
        app_name: &str,
        request: &DeployRequest,
    ) -> Result<DeployOutcome, DeployError> {
        let execution = self
            .execution(app_name, request.env_name(), request.commit_hash())
            .await?;

        execution.validate()?;

        match self.pre_hook(request) {
            Some(pre_hook) => {
                let commit = execution.commit().await?;
                pre_hook
                    .run(std::slice::from_ref(execution.target()), &commit)
                    .await?;
                execution.deploy_at(commit).await
            }
            None => execution.deploy().await,
        }
    }

    /// Deploy the same commit of several applications to one environment.
    ///
    /// Every execution is validated and every commit is resolved before the
    /// hook runs, and the hook finishes before the first upload starts.
    /// Executions then run concurrently. A failed execution does not stop the
    /// others, and the first error is returned once all of them finished.
    #[instrument(skip_all, fields(env = %request.env_name()))]
    pub async fn deploy_multiple(
        &self,
        request: &DeployRequest,
    ) -> Result<Vec<DeployOutcome>, DeployError> {
        let mut executions = Vec::with_capacity(request.app_names().len());

        for app_name in request.app_names() {
            executions.push(
                self.execution(app_name, request.env_name(), request.commit_hash())
                    .await?,
            );
        }

        for execution in &executions {
            execution.validate()?;
        }

        let commits = try_join_all(executions.iter().map(|execution| execution.commit())).await?;
        let commit = agreed_commit(commits)?;

        info!(%commit, apps = ?request.app_names(), "all applications resolved to the same commit");

        if let Some(pre_hook) = self.pre_hook(request) {
            let targets = executions
                .iter()
                .map(|execution| execution.target().clone())
                .collect::<Vec<_>>();

            pre_hook.run(&targets, &commit).await?;
        }

        let results = join_all(
            executions
                .iter()
                .map(|execution| execution.deploy_at(commit.clone())),
        )
        .await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut first_error = None;

        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    error!(%err, "application deploy failed");

                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    }

    /// Hook to run for the provided request, if any.
    fn pre_hook(&self, request: &DeployRequest) -> Option<&dyn PreDeployHook> {
        if !request.run_pre_hook() {
            return None;
        }

        if self.pre_hook.is_none() {
            warn!("pre-deploy hook requested, but none is configured");
        }

        self.pre_hook.as_deref()
    }
}

/// Ensure that all resolved commits are equal.
fn agreed_commit(commits: Vec<String>) -> Result<String, DeployError> {
    let mut commits = commits.into_iter();

    let first = commits.next().ok_or(ArgumentError::MissingApplication)?;

    match commits.find(|commit| *commit != first) {
        Some(second) => Err(DeployError::CommitMismatch { first, second }),
        None => Ok(first),
    }
}
