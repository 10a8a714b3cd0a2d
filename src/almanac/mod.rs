//! AI almanac (宜/忌) text for a single day.
//!
//! [`AlmanacClient::fetch`] is blocking; the UI runs it on a worker thread via
//! [`request::spawn_fetch`] and matches replies against the current
//! [`request::Ticket`].

pub mod gemini;
pub mod request;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};

pub use gemini::{GeminiBackend, GenerateRequest, GenerativeBackend};
pub use request::{spawn_fetch, AlmanacReply, RequestTracker, Ticket};

const WEEKDAYS_LONG: [&str; 7] = [
    "星期日", "星期一", "星期二", "星期三", "星期四", "星期五", "星期六",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlmanacData {
    /// 宜
    pub auspicious: Vec<String>,
    /// 忌
    pub inauspicious: Vec<String>,
    pub description: String,
    pub daily_quote: String,
}

static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "auspicious": { "type": "ARRAY", "items": { "type": "STRING" } },
            "inauspicious": { "type": "ARRAY", "items": { "type": "STRING" } },
            "description": { "type": "STRING" },
            "dailyQuote": { "type": "STRING" },
        },
        "required": ["auspicious", "inauspicious", "description", "dailyQuote"],
    })
});

/// `2026年2月17日星期二`
pub fn localized_date(date: &NaiveDate) -> String {
    format!(
        "{}年{}月{}日{}",
        date.year(),
        date.month(),
        date.day(),
        WEEKDAYS_LONG[date.weekday().num_days_from_sunday() as usize]
    )
}

pub fn prompt(date: &NaiveDate) -> String {
    format!(
        "Generate a traditional Chinese Almanac (Huangli) insight for {}.\n\
         The response must be in JSON format and **ALL TEXT MUST BE IN SIMPLIFIED CHINESE**.\n\
         Include:\n\
         1. 'auspicious': An array of 3-4 suitable activities (Yi) in Chinese (e.g., \"出行\", \"嫁娶\").\n\
         2. 'inauspicious': An array of 3-4 unsuitable activities (Ji) in Chinese (e.g., \"动土\", \"安葬\").\n\
         3. 'description': A short, poetic description of the day's energy, season, or solar term effect in Chinese (max 2 sentences).\n\
         4. 'dailyQuote': A wise philosophical quote related to time, nature, or life (Confucian/Taoist/Zen style) in Chinese.\n",
        localized_date(date)
    )
}

#[derive(Clone)]
pub struct AlmanacClient {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    api_key: Option<String>,
}

impl AlmanacClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>, model: &str, api_key: Option<String>) -> Self {
        AlmanacClient {
            backend,
            model: model.to_owned(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = GeminiBackend::new(&config.almanac.endpoint, config.request_timeout())?;
        Ok(Self::new(
            Arc::new(backend),
            &config.almanac.model,
            config.api_key(),
        ))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Replace the key for subsequent requests. Blank input clears it.
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_owned())
        };
    }

    /// Fails with `MissingCredential` (no request made) or `ServiceFailure`.
    pub fn fetch(&self, date: &NaiveDate) -> Result<AlmanacData> {
        self.try_fetch(date).map_err(|e| {
            log::warn!("Almanac for {} failed: {}", date, e);
            e.into_fetch_failure()
        })
    }

    fn try_fetch(&self, date: &NaiveDate) -> Result<AlmanacData> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::MissingCredential, "Set an API key with :key")
        })?;

        log::info!("Requesting almanac for {} from {}", date, self.model);
        let prompt = prompt(date);
        let text = self.backend.generate_json(&GenerateRequest {
            api_key,
            model: &self.model,
            prompt: &prompt,
            schema: &RESPONSE_SCHEMA,
        })?;

        let data: AlmanacData = serde_json::from_str(&text)?;
        log::debug!("Almanac for {} received", date);
        Ok(data)
    }
}
