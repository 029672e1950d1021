use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, File, FileFormat};
use config::builder::DefaultState;
use mantis::client::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_UPLOAD_TIMEOUT};
use mantis::client::identity::DEFAULT_REDIRECT_URI;
use mantis::types::{DocumentPollConfig, PollConfig, ThreadPageConfig, TurnConfig};
use serde::de::DeserializeOwned;

/// Environment variables and the keys they override
const ENV_KEYS: &[(&str, &str)] = &[
    ("API_BASE_URL", "api.base_url"),
    ("API_TIMEOUT_MS", "api.timeout_ms"),
    ("API_UPLOAD_TIMEOUT_MS", "api.upload_timeout_ms"),
    ("IDENTITY_DOMAIN", "identity.domain"),
    ("IDENTITY_CLIENT_ID", "identity.client_id"),
    ("IDENTITY_AUDIENCE", "identity.audience"),
    ("IDENTITY_REDIRECT_URI", "identity.redirect_uri"),
    ("APP_TITLE", "app.title"),
    ("APP_ENVIRONMENT", "app.environment"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
    ("STORAGE_PATH", "storage.path"),
    ("POLL_RUN_MAX_ATTEMPTS", "polling.run_max_attempts"),
    ("POLL_RUN_INTERVAL_MS", "polling.run_interval_ms"),
    ("POLL_COMPLETED_DISPLAY_MS", "polling.completed_display_ms"),
    ("POLL_DOCUMENT_MAX_ATTEMPTS", "polling.document_max_attempts"),
    ("POLL_DOCUMENT_INTERVAL_MS", "polling.document_interval_ms"),
    ("POLL_DOCUMENT_MAX_CONSECUTIVE_ERRORS", "polling.document_max_consecutive_errors"),
    ("POLL_DOCUMENT_DEADLINE_MS", "polling.document_deadline_ms"),
    ("POLL_THREAD_PAGE_SIZE", "polling.thread_page_size"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
    Test,
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnvironment::Development),
            "production" | "prod" => Ok(AppEnvironment::Production),
            "test" => Ok(AppEnvironment::Test),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Test => "test",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub upload_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub domain: String,
    pub client_id: String,
    pub audience: Option<String>,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub environment: AppEnvironment,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub turn: TurnConfig,
    pub documents: DocumentPollConfig,
    pub threads: ThreadPageConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub storage_path: PathBuf,
    pub polling: PollingConfig,
    /// Soft problems found while loading; logged once logging is up
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables listed in `ENV_KEYS` (`IDENTITY_DOMAIN`, `POLL_RUN_MAX_ATTEMPTS`, ...)
    ///
    /// Only `identity.domain` and `identity.client_id` are required; every
    /// other key falls back to its default with a warning.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "development".to_string());
        let dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{dir}/default")).required(false))
            .add_source(File::with_name(&format!("{dir}/{env}")).required(false));

        Self::from_builder(with_env_overrides(builder, |var| std::env::var(var).ok())?)
    }

    /// Load config from an inline TOML document (useful for testing)
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::from_builder(ConfigLoader::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let raw = builder.build()?;
        let mut reader = Reader {
            raw: &raw,
            warnings: Vec::new(),
        };

        let identity = IdentityConfig {
            domain: reader.required("identity.domain", "IDENTITY_DOMAIN")?,
            client_id: reader.required("identity.client_id", "IDENTITY_CLIENT_ID")?,
            audience: reader.optional(&["identity.audience"]),
            redirect_uri: reader.soft(&["identity.redirect_uri"], DEFAULT_REDIRECT_URI.to_string()),
        };

        let base_url = match reader.optional::<String>(&["api.base_url"]) {
            Some(url) => url,
            None => {
                reader.warn(format!("api.base_url is not set, using {DEFAULT_BASE_URL}"));
                DEFAULT_BASE_URL.to_string()
            }
        };
        let api = ApiConfig {
            base_url,
            timeout: reader.millis(&["api.timeout_ms"], DEFAULT_TIMEOUT),
            upload_timeout: reader.millis(&["api.upload_timeout_ms"], DEFAULT_UPLOAD_TIMEOUT),
        };

        let environment = reader.soft::<String>(&["app.environment"], "development".to_string());
        let app = AppConfig {
            title: reader.soft(&["app.title"], "Agile Mantis".to_string()),
            environment: environment.parse().unwrap_or_else(|e| {
                reader.warn(format!("app.environment: {e}, using development"));
                AppEnvironment::Development
            }),
        };

        let logging = LoggingConfig {
            level: reader.soft(&["logging.level"], "info".to_string()),
            format: reader.soft(&["logging.format"], "pretty".to_string()),
        };

        let storage_path = PathBuf::from(reader.soft(&["storage.path"], ".mantis/credentials.json".to_string()));

        let run_defaults = PollConfig::default();
        let turn_defaults = TurnConfig::default();
        let doc_defaults = DocumentPollConfig::default();
        let polling = PollingConfig {
            turn: TurnConfig {
                run: PollConfig {
                    max_attempts: reader.soft(&["polling.run_max_attempts"], run_defaults.max_attempts),
                    interval: reader.millis(&["polling.run_interval_ms"], run_defaults.interval),
                },
                completed_display: reader.millis(
                    &["polling.completed_display_ms"],
                    turn_defaults.completed_display,
                ),
            },
            documents: DocumentPollConfig {
                max_attempts: reader.soft(
                    &["polling.document_max_attempts"],
                    doc_defaults.max_attempts,
                ),
                interval: reader.millis(
                    &["polling.document_interval_ms"],
                    doc_defaults.interval,
                ),
                max_consecutive_errors: reader.soft(
                    &["polling.document_max_consecutive_errors"],
                    doc_defaults.max_consecutive_errors,
                ),
                deadline: reader.millis(
                    &["polling.document_deadline_ms"],
                    doc_defaults.deadline,
                ),
            },
            threads: ThreadPageConfig {
                page_size: reader.soft(
                    &["polling.thread_page_size"],
                    ThreadPageConfig::default().page_size,
                ),
            },
        };

        Ok(Config {
            api,
            identity,
            app,
            logging,
            storage_path,
            polling,
            warnings: reader.warnings,
        })
    }
}

/// Layers the variables of `ENV_KEYS` that `lookup` finds over `builder`
fn with_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in ENV_KEYS {
        builder = builder.set_override_option(*key, lookup(var))?;
    }
    Ok(builder)
}

/// Reads keys from the merged sources, recording soft failures
struct Reader<'a> {
    raw: &'a ConfigLoader,
    warnings: Vec<String>,
}

impl Reader<'_> {
    fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// First key (in priority order) holding a valid value
    fn optional<T: DeserializeOwned>(&mut self, keys: &[&str]) -> Option<T> {
        for key in keys {
            match self.raw.get::<T>(key) {
                Ok(value) => return Some(value),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => self.warn(format!("Ignoring invalid value for {key}: {e}")),
            }
        }
        None
    }

    fn soft<T: DeserializeOwned>(&mut self, keys: &[&str], default: T) -> T {
        self.optional(keys).unwrap_or(default)
    }

    fn millis(&mut self, keys: &[&str], default: Duration) -> Duration {
        self.optional::<u64>(keys).map(Duration::from_millis).unwrap_or(default)
    }

    fn required(&mut self, key: &str, env_var: &str) -> Result<String, ConfigError> {
        self.optional::<String>(&[key])
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::Message(format!("{key} is required (set {env_var})")))
    }
}
