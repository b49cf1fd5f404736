use clap::ValueEnum;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::ConfigError;

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_INTERVAL_HOURS: u64 = 24;

/// Which capability removes the object behind a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeletionStrategy {
    /// Ask the management API to delete the object.
    #[default]
    Api,
    /// Delete the object directly in the bucket.
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub list: String,
    pub mark_deleted: String,
    pub delete: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PathRules {
    pub base_path: String,
    pub root_path: String,
}

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub paths: PathRules,
    pub strategy: DeletionStrategy,
}

/// Resolves settings in order: command line, environment, default.
struct Sources<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Sources<'_> {
    fn value(&self, cli_value: &Option<String>, env_var: &str) -> Option<String> {
        cli_value.clone().or_else(|| (self.lookup)(env_var))
    }

    fn required(
        &self,
        cli_value: &Option<String>,
        setting: &'static str,
        env_var: &'static str,
    ) -> Result<String, ConfigError> {
        self.value(cli_value, env_var)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing { setting, env_var })
    }

    fn optional(&self, cli_value: &Option<String>, env_var: &str) -> Option<String> {
        self.value(cli_value, env_var).filter(|v| !v.trim().is_empty())
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl ApiConfig {
    fn resolve(cli: &Cli, sources: &Sources) -> Result<Self, ConfigError> {
        let base_url = sources.required(&cli.api_base_url, "API base URL", "CLEANUP_API_BASE_URL")?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                setting: "API base URL",
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        Ok(ApiConfig {
            base_url,
            token: sources.required(&cli.api_token, "API token", "CLEANUP_API_TOKEN")?,
            endpoints: Endpoints {
                list: sources.required(&None, "list endpoint", "CLEANUP_LIST_ENDPOINT")?,
                mark_deleted: sources.required(
                    &None,
                    "mark-deleted endpoint",
                    "CLEANUP_MARK_DELETED_ENDPOINT",
                )?,
                delete: sources.required(&None, "delete endpoint", "CLEANUP_DELETE_ENDPOINT")?,
            },
        })
    }
}

impl StorageConfig {
    pub fn load_from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, &Sources { lookup: &process_env })
    }

    fn resolve(cli: &Cli, sources: &Sources) -> Result<Self, ConfigError> {
        let access_key = sources.optional(&cli.access_key, "STORAGE_ACCESS_KEY");
        let secret_key = sources.optional(&cli.secret_key, "STORAGE_SECRET_KEY");
        if access_key.is_some() != secret_key.is_some() {
            return Err(ConfigError::Invalid {
                setting: "storage credentials",
                reason: "access key and secret key must be provided together".to_string(),
            });
        }

        Ok(StorageConfig {
            bucket: sources.required(&cli.bucket, "bucket", "STORAGE_BUCKET")?,
            region: sources
                .optional(&cli.region, "STORAGE_REGION")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            access_key,
            secret_key,
            endpoint: sources.optional(&cli.endpoint, "STORAGE_URL"),
        })
    }
}

impl PathRules {
    pub fn load_from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, &Sources { lookup: &process_env })
    }

    fn resolve(cli: &Cli, sources: &Sources) -> Result<Self, ConfigError> {
        Ok(PathRules {
            base_path: sources.required(&cli.base_path, "base path", "CLEANUP_BASE_PATH")?,
            // An empty root path is allowed and means "nothing to strip".
            root_path: sources
                .value(&cli.root_path, "CLEANUP_ROOT_PATH")
                .ok_or(ConfigError::Missing {
                    setting: "root path",
                    env_var: "CLEANUP_ROOT_PATH",
                })?,
        })
    }
}

impl CleanupConfig {
    pub fn load_from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, &Sources { lookup: &process_env })
    }

    fn resolve(cli: &Cli, sources: &Sources) -> Result<Self, ConfigError> {
        let strategy = match cli.strategy {
            Some(strategy) => strategy,
            None => match sources.optional(&None, "CLEANUP_DELETION_STRATEGY") {
                Some(raw) => parse_strategy(&raw)?,
                None => DeletionStrategy::default(),
            },
        };

        Ok(CleanupConfig {
            api: ApiConfig::resolve(cli, sources)?,
            storage: StorageConfig::resolve(cli, sources)?,
            paths: PathRules::resolve(cli, sources)?,
            strategy,
        })
    }
}

fn parse_strategy(raw: &str) -> Result<DeletionStrategy, ConfigError> {
    <DeletionStrategy as ValueEnum>::from_str(raw.trim(), true).map_err(|_| ConfigError::Invalid {
        setting: "deletion strategy",
        reason: format!("'{}' is not one of: api, storage", raw),
    })
}

/// Time to wait between two runs of the hosted service.
pub fn cleanup_interval(cli_value: Option<u64>) -> Result<Duration, ConfigError> {
    resolve_interval(cli_value, &Sources { lookup: &process_env })
}

fn resolve_interval(cli_value: Option<u64>, sources: &Sources) -> Result<Duration, ConfigError> {
    let hours = match cli_value {
        Some(hours) => hours,
        None => match sources.optional(&None, "CLEANUP_INTERVAL_HOURS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                setting: "cleanup interval",
                reason: format!("'{}': {}", raw, e),
            })?,
            None => DEFAULT_INTERVAL_HOURS,
        },
    };

    if hours == 0 {
        return Err(ConfigError::Invalid {
            setting: "cleanup interval",
            reason: "must be at least one hour".to_string(),
        });
    }

    Ok(Duration::from_secs(hours * 3600))
}

/// Directory for the rotated JSON log files, if file logging is wanted.
pub fn log_dir(cli: &Cli) -> Option<PathBuf> {
    resolve_log_dir(cli, &Sources { lookup: &process_env })
}

fn resolve_log_dir(cli: &Cli, sources: &Sources) -> Option<PathBuf> {
    cli.log_dir
        .clone()
        .or_else(|| sources.optional(&None, "CLEANUP_LOG_DIR").map(PathBuf::from))
}
