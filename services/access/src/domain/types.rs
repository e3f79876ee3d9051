use chrono::{DateTime, Utc};
use serde::Serialize;

/// One provisioned access code and its lifecycle flags.
///
/// `issued` and `used` only ever move from `false` to `true`, and `used`
/// implies `issued`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub value: String,
    pub issued: bool,
    pub used: bool,
}

impl Code {
    /// A freshly provisioned code: neither issued nor used.
    pub fn fresh(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued: false,
            used: false,
        }
    }

    pub fn is_redeemable(&self) -> bool {
        self.issued && !self.used
    }
}

/// Binds a requester identity (an email address) to the code handed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRecord {
    pub identity: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

/// Outcome of checking a user-entered code against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationResult {
    Valid,
    NotFound,
    AlreadyUsed,
}

/// When the survey stops accepting code requests and ballots. No closing
/// time means it never closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurveyWindow {
    pub closes_at: Option<DateTime<Utc>>,
}

impl SurveyWindow {
    pub fn closing_at(closes_at: DateTime<Utc>) -> Self {
        Self {
            closes_at: Some(closes_at),
        }
    }

    /// Open up to and including the closing instant.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.closes_at.is_none_or(|closes_at| now <= closes_at)
    }
}

/// Access code length in characters.
pub const CODE_LEN: usize = 12;

/// Charset for generating access codes (uppercase alphanumeric).
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default upper bound on a single delivery attempt, in milliseconds.
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5_000;

/// What happened to a code, as recorded in the usage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEventKind {
    CodeIssued,
    CodeRedeemed,
    VoteCast,
}

impl UsageEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeIssued => "code_issued",
            Self::CodeRedeemed => "code_redeemed",
            Self::VoteCast => "vote_cast",
        }
    }
}

/// One usage log entry. `identity` is empty for events that must not link a
/// code back to its holder, such as a cast vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    pub at: DateTime<Utc>,
    pub kind: UsageEventKind,
    pub identity: String,
    pub code: String,
}
