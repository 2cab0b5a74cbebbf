//! # Elastic Beanstalk deployments
//!
//! A deploy takes a configured application and environment, resolves the
//! commit to ship, renders the application's `Dockerrun.aws.json` template
//! with that commit as the image tag and uploads it as a zip bundle to S3.
//! The bundle is then registered as an application version, and the
//! environment is pointed at it once the version is ready.
//!
//! Several applications can be deployed to the same environment at once,
//! in which case all of them must agree on a single commit before anything
//! is uploaded.

pub mod artifact;
pub mod bundle;
pub mod client;
pub mod commit;
pub mod error;
pub mod execution;
pub mod hook;
pub mod readiness;
pub mod request;
pub mod service;
pub mod target;

#[cfg(test)]
mod testing;
