//! Reading and writing the persisted catalog document.

use super::{Catalog, DashboardData, Metric, MetricId};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};

const LOG_TARGET: &str = "     store";

/// The written form of a catalog: the groups followed by the derived dashboard view.
#[derive(Serialize)]
struct CatalogDocument<'a> {
    usage: &'a BTreeMap<MetricId, Metric>,
    trusted_advisor_regional: &'a BTreeMap<MetricId, Metric>,
    trusted_advisor_global: &'a BTreeMap<MetricId, Metric>,
    dashboard_data: DashboardData<'a>,
}

impl<'a> CatalogDocument<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            usage: &catalog.usage,
            trusted_advisor_regional: &catalog.trusted_advisor_regional,
            trusted_advisor_global: &catalog.trusted_advisor_global,
            dashboard_data: DashboardData::from_catalog(catalog),
        }
    }
}

/// Encode a catalog as YAML.
pub fn to_yaml(catalog: &Catalog) -> Result<String> {
    serde_yaml::to_string(&CatalogDocument::new(catalog)).into_app_err("unable to encode the metrics catalog")
}

/// Decode a catalog from YAML.
pub fn from_yaml(text: &str) -> Result<Catalog> {
    serde_yaml::from_str(text).into_app_err("unable to parse the metrics catalog")
}

/// Load a catalog from a file, returning `None` if the file does not exist.
///
/// A file that exists but cannot be decoded is an error, including an empty file.
pub fn load(path: &Utf8Path) -> Result<Option<Catalog>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!(target: LOG_TARGET, "No existing catalog at '{path}'");
            return Ok(None);
        }
        Err(e) => return Err(e).into_app_err_with(|| format!("unable to read file '{path}'")),
    };

    if text.trim().is_empty() {
        bail!("unable to parse file '{path}': the file is empty");
    }

    let catalog: Catalog = serde_yaml::from_str(&text).into_app_err_with(|| format!("unable to parse file '{path}'"))?;
    log::debug!(target: LOG_TARGET, "Loaded existing catalog from '{path}': {}", catalog.counts());

    Ok(Some(catalog))
}

/// Write a catalog to a file.
///
/// The document is written to a sibling temporary file first and then renamed over `path`,
/// so the target either keeps its previous content or holds the complete new catalog.
pub fn save(catalog: &Catalog, path: &Utf8Path) -> Result<()> {
    let yaml = to_yaml(catalog)?;

    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{parent}'"))?;
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = write_file(&temp_path, &yaml) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).into_app_err_with(|| format!("unable to replace file '{path}'"));
    }

    log::debug!(target: LOG_TARGET, "Wrote catalog to '{path}'");
    Ok(())
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<()> {
    let file = File::create(path).into_app_err_with(|| format!("unable to create file '{path}'"))?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(contents.as_bytes())
        .into_app_err_with(|| format!("unable to write file '{path}'"))?;
    writer.flush().into_app_err_with(|| format!("unable to flush file '{path}'"))?;

    Ok(())
}

fn temp_path_for(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("catalog");
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Combine a freshly discovered catalog with the one persisted at `path`.
///
/// With `overwrite` set the file is not consulted at all.
pub fn reconcile_with_file(path: &Utf8Path, fresh: Catalog, overwrite: bool) -> Result<Catalog> {
    if overwrite {
        log::debug!(target: LOG_TARGET, "Overwriting '{path}' without merging");
        return Ok(fresh);
    }

    Ok(fresh.reconcile(load(path)?))
}
