use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use pulse_core::config::Config;

use crate::domain::types::{DEFAULT_DELIVERY_TIMEOUT_MS, SurveyWindow};

/// Access service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Code table CSV (`code,issued,used`). Env var: `CODES_PATH`.
    #[serde(default = "default_codes_path")]
    pub codes_path: PathBuf,
    /// Issuance log CSV (`identity,code,issued_at`). Env var: `ISSUANCE_LOG_PATH`.
    #[serde(default = "default_issuance_log_path")]
    pub issuance_log_path: PathBuf,
    /// Usage log CSV (`timestamp,event,email,code,source`). Env var: `USAGE_LOG_PATH`.
    #[serde(default = "default_usage_log_path")]
    pub usage_log_path: PathBuf,
    /// Ballot submissions CSV. Env var: `VOTES_PATH`.
    #[serde(default = "default_votes_path")]
    pub votes_path: PathBuf,
    /// Mail relay endpoint. Unset means codes are only logged. Env var: `MAIL_RELAY_URL`.
    #[serde(default)]
    pub mail_relay_url: Option<String>,
    /// Sender address for access code emails. Env var: `MAIL_FROM`.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    /// Upper bound on one delivery attempt. Env var: `DELIVERY_TIMEOUT_MS`.
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    /// Re-send the existing code when an email asks again. Env var: `RESEND_ON_REPEAT`.
    #[serde(default = "default_true")]
    pub resend_on_repeat: bool,
    /// RFC 3339 instant after which code requests and ballots are refused.
    /// Unset keeps the survey open. Env var: `SURVEY_CLOSES_AT`.
    #[serde(default, deserialize_with = "pulse_core::serde::from_rfc3339_opt")]
    pub survey_closes_at: Option<DateTime<Utc>>,
    /// TCP port to listen on (default 3120). Env var: `ACCESS_PORT`.
    #[serde(default = "default_access_port")]
    pub access_port: u16,
}

fn default_codes_path() -> PathBuf {
    PathBuf::from("valid_codes.csv")
}

fn default_issuance_log_path() -> PathBuf {
    PathBuf::from("issued_codes.csv")
}

fn default_usage_log_path() -> PathBuf {
    PathBuf::from("usage_log.csv")
}

fn default_votes_path() -> PathBuf {
    PathBuf::from("votes.csv")
}

fn default_mail_from() -> String {
    "noreply@voterpulse.gy".to_owned()
}

fn default_delivery_timeout_ms() -> u64 {
    DEFAULT_DELIVERY_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_access_port() -> u16 {
    3120
}

impl Config for AccessConfig {}

impl AccessConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn survey_window(&self) -> SurveyWindow {
        SurveyWindow {
            closes_at: self.survey_closes_at,
        }
    }
}
