pub mod config;
pub mod hash;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "s3")]
pub mod s3;

#[cfg(feature = "beanstalk")]
pub mod beanstalk;
