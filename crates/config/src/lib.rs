//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory,
//! 3. an explicit config file (TOML, YAML or JSON, chosen by extension),
//! 4. `HELPVAULT_`-prefixed environment variables (a `.env` file is expected
//!    to have been loaded into the environment by the caller),
//! 5. command-line [`Overrides`].

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use helpvault_client::models::{Locale, Locales};
use helpvault_library::{CollisionPolicy, Context, DEFAULT_CONCURRENCY, DEFAULT_LAYOUT, Identity, PathGenerator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::debug;

pub const ENV_PREFIX: &str = "HELPVAULT_";
pub const DEFAULT_LOCALE: &str = "en-us";
pub const DEFAULT_OUTPUT_DIR: &str = "backups";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Platform configuration file, e.g. `~/.config/helpvault/config.toml`.
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "helpvault").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Files settings are read from, lowest precedence first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    /// Per-user `config.toml`; a missing file is skipped.
    pub platform_file: Option<PathBuf>,
    /// Explicitly requested file; must exist.
    pub config_file: Option<PathBuf>,
}

impl Sources {
    /// The platform configuration file plus an optional explicit one.
    pub fn discover(config_file: Option<PathBuf>) -> Self {
        Self {
            platform_file: default_config_file(),
            config_file,
        }
    }
}

/// Locales given either as a list or as a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum LocaleList {
    List(Vec<String>),
    Joined(String),
}
impl LocaleList {
    fn into_locales(self) -> Vec<Locale> {
        let codes = match self {
            Self::List(codes) => codes,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        codes.iter().map(|code| code.trim()).filter(|code| !code.is_empty()).map(Locale::new).collect()
    }
}

/// Settings as merged from every source, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    domain: Option<String>,
    email: Option<String>,
    api_token: Option<String>,
    locales: LocaleList,
    default_locale: String,
    output_dir: PathBuf,
    log_level: String,
    concurrency: i64,
    timeout_secs: i64,
    layout: String,
    collisions: CollisionPolicy,
    identity: Identity,
}
impl Default for RawConfig {
    fn default() -> Self {
        Self {
            domain: None,
            email: None,
            api_token: None,
            locales: LocaleList::List(vec![DEFAULT_LOCALE.to_string()]),
            default_locale: DEFAULT_LOCALE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_level: "info".to_string(),
            concurrency: DEFAULT_CONCURRENCY as i64,
            timeout_secs: DEFAULT_TIMEOUT_SECS as i64,
            layout: DEFAULT_LAYOUT.to_string(),
            collisions: CollisionPolicy::default(),
            identity: Identity::default(),
        }
    }
}

/// Command-line values; unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locales: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collisions: Option<CollisionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

/// Validated configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub domain: String,
    pub email: String,
    pub api_token: String,
    /// Configured locales; always contains `default_locale`.
    pub locales: Vec<Locale>,
    pub default_locale: Locale,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub layout: String,
    pub collisions: CollisionPolicy,
    pub identity: Identity,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("locales", &self.locales)
            .field("default_locale", &self.default_locale)
            .field("output_dir", &self.output_dir)
            .field("log_level", &self.log_level)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("layout", &self.layout)
            .field("collisions", &self.collisions)
            .field("identity", &self.identity)
            .finish()
    }
}

impl Config {
    /// Merges every source into a [`Figment`] without extracting it.
    pub fn figment(sources: &Sources, overrides: &Overrides) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RawConfig::default()));
        if let Some(platform) = &sources.platform_file {
            debug!(path = %platform.display(), "platform config file");
            figment = figment.merge(Toml::file(platform));
        }
        if let Some(path) = sources.config_file.as_deref() {
            if !path.is_file() {
                exn::bail!(ErrorKind::File(path.display().to_string()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::File(path.display().to_string())),
            };
        }
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides)))
    }

    pub fn load(sources: &Sources, overrides: &Overrides) -> Result<Self> {
        Self::from_figment(&Self::figment(sources, overrides)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let raw: RawConfig = figment.extract().or_raise(|| ErrorKind::Load)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        fn required(value: Option<String>, key: &'static str) -> Result<String> {
            match value.map(|v| v.trim().to_string()) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => exn::bail!(ErrorKind::Missing(key)),
            }
        }
        fn at_least_one(value: i64, key: &'static str) -> Result<i64> {
            if value < 1 {
                exn::bail!(ErrorKind::Invalid {
                    key,
                    reason: format!("must be at least 1, got {value}"),
                });
            }
            Ok(value)
        }

        let default_locale = Locale::new(&raw.default_locale);
        if default_locale.as_str().is_empty() {
            exn::bail!(ErrorKind::Missing("default_locale"));
        }
        let mut locales = raw.locales.into_locales();
        if locales.is_empty() {
            exn::bail!(ErrorKind::Invalid {
                key: "locales",
                reason: "no locale configured".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        locales.retain(|locale| seen.insert(locale.clone()));
        if !locales.contains(&default_locale) {
            locales.push(default_locale.clone());
        }
        // Compile once here so a broken layout fails before any request is made.
        raw.layout.parse::<PathGenerator>().or_raise(|| ErrorKind::Invalid {
            key: "layout",
            reason: "template does not compile".to_string(),
        })?;

        Ok(Self {
            domain: required(raw.domain, "domain")?.trim_end_matches('/').to_string(),
            email: required(raw.email, "email")?,
            api_token: required(raw.api_token, "api_token")?,
            locales,
            default_locale,
            output_dir: raw.output_dir,
            log_level: raw.log_level,
            concurrency: at_least_one(raw.concurrency, "concurrency")? as usize,
            timeout_secs: at_least_one(raw.timeout_secs, "timeout_secs")? as u64,
            layout: raw.layout,
            collisions: raw.collisions,
            identity: raw.identity,
        })
    }

    /// Configured locales in the shape returned by the locale endpoint, used
    /// when the platform refuses to list its own.
    pub fn configured_locales(&self) -> Locales {
        Locales {
            locales: self.locales.clone(),
            default_locale: self.default_locale.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pipeline settings for a run.
    pub fn context(&self, default_locale: Locale) -> Result<Context> {
        let layout = self.layout.parse::<PathGenerator>().or_raise(|| ErrorKind::Invalid {
            key: "layout",
            reason: "template does not compile".to_string(),
        })?;
        Ok(Context::new(default_locale)
            .with_concurrency(self.concurrency)
            .with_identity(self.identity)
            .with_collisions(self.collisions)
            .with_layout(layout))
    }

    /// `{output_dir}/YYYY-MM-DD_HH_MM_SS` for a run started at `at` (UTC).
    pub fn backup_dir(&self, at: OffsetDateTime) -> Result<PathBuf> {
        let format = format_description!("[year]-[month]-[day]_[hour]_[minute]_[second]");
        let stamp = at.to_offset(time::UtcOffset::UTC).format(format).or_raise(|| ErrorKind::Invalid {
            key: "output_dir",
            reason: "could not format backup timestamp".to_string(),
        })?;
        Ok(self.output_dir.join(stamp))
    }
}
