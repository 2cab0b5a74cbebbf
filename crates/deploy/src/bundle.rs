//! # Application bundles
//!
//! Elastic Beanstalk Docker platforms expect a zip archive with a single
//! `Dockerrun.aws.json` file at its root. The file is kept as a template in
//! `<apps>/<appName>/Dockerrun.aws.json`, with a `{{TAG}}` placeholder right
//! after the image name that receives the deployed commit as the image tag.
//!
//! Entries are written with the fixed zip epoch timestamp, so building a bundle
//! twice from the same template and commit yields identical bytes.

use std::{
    io::{self, Cursor, Seek, Write},
    path::{Path, PathBuf},
};

use derive_more::{Display, Error, From};
use zip::{write::FileOptions, DateTime, ZipWriter};

/// Template and archive entry name.
pub const TEMPLATE_FILE_NAME: &str = "Dockerrun.aws.json";

/// Placeholder replaced by `:<commit>`.
pub const TAG_PLACEHOLDER: &str = "{{TAG}}";

/// Errors that may occur during the bundle creation process.
#[derive(Debug, Display, From, Error)]
pub enum BundleError {
    /// [`zip`]-crate specific error.
    Zip(zip::result::ZipError),

    /// IO error.
    Io(io::Error),

    /// Application has no template file.
    #[display(fmt = "template file {} not found", _0)]
    #[from(ignore)]
    TemplateNotFound(#[error(not(source))] String),
}

/// Path of the template file for the provided application.
pub fn template_path(apps: &Path, app_name: &str) -> PathBuf {
    apps.join(app_name).join(TEMPLATE_FILE_NAME)
}

/// Read the template file of the provided application.
pub async fn read_template(apps: &Path, app_name: &str) -> Result<String, BundleError> {
    let path = template_path(apps, app_name);

    match tokio::fs::read_to_string(&path).await {
        Ok(template) => Ok(template),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(BundleError::TemplateNotFound(
            path.display().to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Substitute the first tag placeholder with the provided commit.
pub fn render_template(template: &str, commit: &str) -> String {
    template.replacen(TAG_PLACEHOLDER, &format!(":{commit}"), 1)
}

/// Render the template and archive it into a new in-memory zip file.
pub fn build_bundle(template: &str, commit: &str) -> Result<Vec<u8>, BundleError> {
    let contents = render_template(template, commit);

    Ok(build_zip_archive(Cursor::new(Vec::new()), &contents)?.into_inner())
}

/// Write a single-entry archive into the provided `file`.
fn build_zip_archive<W: Write + Seek>(file: W, contents: &str) -> Result<W, BundleError> {
    let mut writer = ZipWriter::new(file);

    writer.start_file(
        TEMPLATE_FILE_NAME,
        FileOptions::default().last_modified_time(DateTime::default()),
    )?;
    writer.write_all(contents.as_bytes())?;

    Ok(writer.finish()?)
}
