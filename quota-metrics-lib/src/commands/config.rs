use crate::Result;
use crate::catalog::{Classifier, ProbeErrorPolicy, Statistic, StatisticOverrides, builtin_statistic_overrides};
use camino::Utf8Path;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file picked up from the working directory.
const CONFIG_FILE_NAME: &str = "quota-metrics.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Statistic of `AWS/Usage` metrics that have no entry in `usage_statistic_overrides`
    #[serde(default)]
    pub default_usage_statistic: Statistic,

    /// `AWS/Usage` statistics by service and resource, replacing the built-in table when present
    #[serde(default = "builtin_statistic_overrides")]
    pub usage_statistic_overrides: StatisticOverrides,

    /// What to do when a quota probe fails unexpectedly
    #[serde(default)]
    pub probe_errors: ProbeErrorPolicy,

    /// AWS region to query, overriding the standard AWS configuration chain
    #[serde(default)]
    pub region: Option<String>,

    /// Alternate CloudWatch endpoint
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `quota-metrics.toml` in `base_dir` is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config
            .validate()
            .map_err(|e| e.enrich_with(|| format!("validating configuration file '{final_path}'")))?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is empty or malformed
    pub fn validate(&self) -> Result<()> {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(app_err!("region must not be empty"));
        }

        if let Some(url) = &self.endpoint_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(app_err!("endpoint_url must be an http:// or https:// URL, got '{url}'"));
        }

        for (service, resources) in &self.usage_statistic_overrides {
            if service.is_empty() {
                return Err(app_err!("usage_statistic_overrides contains an empty service name"));
            }

            if resources.keys().any(String::is_empty) {
                return Err(app_err!("usage_statistic_overrides.{service} contains an empty resource name"));
            }
        }

        Ok(())
    }

    /// Build the classifier described by this configuration.
    #[must_use]
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.default_usage_statistic, self.usage_statistic_overrides.clone(), self.probe_errors)
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
