use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::DeserializeFromStr;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::tables::{Annotations, SpecialKind, DATE_KEY_FORMAT};

const CONFIG_PATH_ENV_VAR: &str = "HUANGLI_CONFIG_FILE";
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

pub(crate) fn find_configfile_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR) {
        locations.push(PathBuf::from(path));
    }

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("huangli").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".huangli.toml"));
    }

    locations
}

/// A calendar date written as `YYYY-MM-DD` in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr)]
pub struct DateKey(pub NaiveDate);

impl FromStr for DateKey {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map(DateKey)
            .map_err(|e| {
                Error::new(
                    ErrorKind::ConfigParse,
                    &format!("Date '{}' is not of the form YYYY-MM-DD: {}", s, e),
                )
            })
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecialDaySpec {
    pub date: DateKey,
    pub name: String,
    pub kind: SpecialKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketSaleSpec {
    pub date: DateKey,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolarTermSpec {
    pub date: DateKey,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlmanacConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        AlmanacConfig {
            model: "gemini-3-flash-preview".to_owned(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            api_key: None,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_rate_ms: u64,
    pub target_year: i32,
    pub almanac: AlmanacConfig,
    pub special_days: Vec<SpecialDaySpec>,
    pub ticket_sales: Vec<TicketSaleSpec>,
    pub solar_terms: Vec<SolarTermSpec>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            tick_rate_ms: 500,
            target_year: 2026,
            almanac: AlmanacConfig::default(),
            special_days: Vec::new(),
            ticket_sales: Vec::new(),
            solar_terms: Vec::new(),
        }
    }
}

impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl Config {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.almanac.timeout_secs)
    }

    /// API key from the config file, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(self.almanac.api_key.as_deref(), |var| env::var(var).ok())
    }

    pub fn annotations(&self) -> Annotations {
        Annotations::builtin().with_overrides(
            &self.special_days,
            &self.ticket_sales,
            &self.solar_terms,
        )
    }
}

fn resolve_api_key<F>(configured: Option<&str>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    configured
        .map(str::to_owned)
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|var| lookup(var)))
        .map(|key| key.trim().to_owned())
        .find(|key| !key.is_empty())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    content.parse::<Config>().map_err(|e| {
        let msg = format!("{}: {}", path.display(), e.message.as_deref().unwrap_or(""));
        e.with_msg(&msg)
    })
}

pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        log::info!("Loading configuration from {}", path.display());
        return load_config(path);
    }

    for location in find_configfile_locations() {
        if location.is_file() {
            log::info!("Loading configuration from {}", location.display());
            return load_config(&location);
        }
    }

    log::info!("No configuration file found, using defaults");
    Ok(Config::default())
}
