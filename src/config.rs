use failure::{Error, ResultExt};
use std::fs;
use std::path::Path;

/// Everything the report needs to know about where to look and how far
/// back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub azure: AzureConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());

        let src = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;

        Config::from_toml(&src)
    }

    pub fn from_toml(src: &str) -> Result<Config, Error> {
        let cfg = toml::from_str(src).context("Invalid config")?;
        Ok(cfg)
    }

    /// An example config, populated with the defaults.
    pub fn example() -> Config {
        Config::default()
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        let src = toml::to_string_pretty(self).context("Unable to serialize the config")?;
        Ok(src)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct General {
    /// How many days back to search for commits.
    pub days: u32,
    /// The file containing your personal access token. Shell-style
    /// expansions (`~`, `$HOME`) are allowed.
    pub token_file: String,
}

impl General {
    pub const DEFAULT_DAYS: u32 = 1;
    pub const DEFAULT_TOKEN_FILE: &'static str = "~/.ssh/Beckhoff-AzD-pat.txt";
}

impl Default for General {
    fn default() -> General {
        General {
            days: General::DEFAULT_DAYS,
            token_file: General::DEFAULT_TOKEN_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AzureConfig {
    pub host: String,
    pub organization: String,
    pub project: String,
    pub api_version: String,
}

impl AzureConfig {
    pub const DEFAULT_HOST: &'static str = "https://dev.azure.com";
    pub const DEFAULT_ORGANIZATION: &'static str = "BeckhoffUS";
    pub const DEFAULT_PROJECT: &'static str = "TunnelWash";
    pub const DEFAULT_API_VERSION: &'static str = "6.0";
}

impl Default for AzureConfig {
    fn default() -> AzureConfig {
        AzureConfig {
            host: AzureConfig::DEFAULT_HOST.to_string(),
            organization: AzureConfig::DEFAULT_ORGANIZATION.to_string(),
            project: AzureConfig::DEFAULT_PROJECT.to_string(),
            api_version: AzureConfig::DEFAULT_API_VERSION.to_string(),
        }
    }
}
