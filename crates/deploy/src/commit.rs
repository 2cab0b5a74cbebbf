use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Repository};

use crate::{
    error::{ConfigurationError, DeployError},
    target::DeployTarget,
};

/// Remote whose tracking branches are used when no local branch exists.
const REMOTE: &str = "origin";

/// Get the full hash of the tip commit of the provided branch.
///
/// Local branches take precedence over `origin` remote-tracking branches with the same name.
pub fn tip_commit_of(git_root: &Path, branch: &str) -> Result<String, git2::Error> {
    let repo = Repository::open(git_root)?;

    let branch = match repo.find_branch(branch, BranchType::Local) {
        Ok(branch) => branch,
        Err(err) if err.code() == ErrorCode::NotFound => repo
            .find_branch(&format!("{REMOTE}/{branch}"), BranchType::Remote)
            .map_err(|_| err)?,
        Err(err) => return Err(err),
    };

    let commit = branch.get().peel_to_commit()?;

    Ok(commit.id().to_string())
}

/// Resolve the commit that should be deployed to the provided target.
///
/// An explicit commit hash is returned as is, without checking that it exists.
pub async fn resolve_commit(
    target: &DeployTarget,
    commit_hash: Option<&str>,
    git_root: &Path,
) -> Result<String, DeployError> {
    if let Some(commit_hash) = commit_hash {
        return Ok(commit_hash.to_owned());
    }

    let Some(branch) = target.git_branch.clone() else {
        return Err(missing_commit_source(target).into());
    };

    let git_root = PathBuf::from(git_root);

    Ok(tokio::task::spawn_blocking(move || tip_commit_of(&git_root, &branch)).await??)
}

pub(crate) fn missing_commit_source(target: &DeployTarget) -> ConfigurationError {
    ConfigurationError::MissingCommitSource {
        application: target.app_name.clone(),
        environment: target.env_name.clone(),
    }
}
