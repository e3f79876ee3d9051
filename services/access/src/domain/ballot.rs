use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

/// Placeholder option shown before a party is picked.
pub const PARTY_PLACEHOLDER: &str = "-- Select a Party --";

/// Maximum number of top issues a respondent may pick.
pub const MAX_TOP_ISSUES: usize = 3;

/// Answer used when an optional single-choice question is skipped.
pub const PREFER_NOT_TO_SAY: &str = "Prefer not to say";

pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_ACCESS_CODE: &str = "Access Code";
pub const COL_REGION: &str = "Region";
pub const COL_PARTY: &str = "Party";
pub const COL_AGE: &str = "Age";
pub const COL_GENDER: &str = "Gender";
pub const COL_DIASPORA: &str = "Diaspora";
pub const COL_FAIRNESS: &str = "Perception of Fairness";
pub const COL_GECOM_TRUST: &str = "Trust in GECOM (International Standards)";

/// Columns summarised by the results endpoint, in display order.
pub const TALLIED_COLUMNS: [&str; 7] = [
    COL_PARTY,
    COL_REGION,
    COL_AGE,
    COL_GENDER,
    COL_DIASPORA,
    COL_FAIRNESS,
    COL_GECOM_TRUST,
];

fn prefer_not_to_say() -> String {
    PREFER_NOT_TO_SAY.to_owned()
}

/// One survey response, as submitted by the voting form.
#[derive(Debug, Clone, Deserialize)]
pub struct Ballot {
    pub region: String,
    pub party: String,
    #[serde(default)]
    pub party_candidate: String,
    #[serde(default = "prefer_not_to_say")]
    pub age: String,
    #[serde(default = "prefer_not_to_say")]
    pub gender: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub not_voting_for: Vec<String>,
    #[serde(default)]
    pub not_voting_reason: String,
    #[serde(default)]
    pub preferred_candidate: String,
    #[serde(default)]
    pub candidate_reason: String,
    pub diaspora: String,
    #[serde(default)]
    pub top_issues: Vec<String>,
    #[serde(default = "prefer_not_to_say")]
    pub ethnicity: String,
    #[serde(default = "prefer_not_to_say")]
    pub community: String,
    #[serde(default = "prefer_not_to_say")]
    pub voted_last_election: String,
    pub fairness: String,
    pub gecom_trust: String,
}

impl Ballot {
    /// Checks the answers the form treats as mandatory. Returns the reason on failure.
    pub fn check(&self) -> Result<(), String> {
        let required = [
            ("region", &self.region),
            ("diaspora", &self.diaspora),
            ("fairness", &self.fairness),
            ("gecom_trust", &self.gecom_trust),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("{name} is required"));
        }
        let party = self.party.trim();
        if party.is_empty() || party == PARTY_PLACEHOLDER {
            return Err("select a party".to_owned());
        }
        if self.top_issues.len() > MAX_TOP_ISSUES {
            return Err(format!("select up to {MAX_TOP_ISSUES} issues"));
        }
        Ok(())
    }

    /// Flatten into the stored row, stamped with the redeeming code.
    pub fn to_record(&self, access_code: &str, at: DateTime<Utc>) -> SubmissionRecord {
        let mut r = SubmissionRecord::default();
        r.push(COL_TIMESTAMP, at.to_rfc3339_opts(SecondsFormat::Millis, true));
        r.push(COL_ACCESS_CODE, access_code);
        r.push(COL_REGION, self.region.trim());
        r.push(COL_PARTY, self.party.trim());
        r.push("Independent Candidate (if any)", self.party_candidate.trim());
        r.push(COL_AGE, self.age.trim());
        r.push(COL_GENDER, self.gender.trim());
        r.push("Comment", self.comment.trim());
        r.push("Not Voting For", self.not_voting_for.join(", "));
        r.push("Reason for Not Voting", self.not_voting_reason.trim());
        r.push("Preferred Candidate", self.preferred_candidate.trim());
        r.push("Candidate Reason", self.candidate_reason.trim());
        r.push(COL_DIASPORA, self.diaspora.trim());
        r.push("Top Issues", self.top_issues.join(", "));
        r.push("Ethnicity", self.ethnicity.trim());
        r.push("Community", self.community.trim());
        r.push("Voted Last Election", self.voted_last_election.trim());
        r.push(COL_FAIRNESS, self.fairness.trim());
        r.push(COL_GECOM_TRUST, self.gecom_trust.trim());
        r
    }
}

/// A stored submission row: column name → value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRecord {
    columns: Vec<(String, String)>,
}

impl SubmissionRecord {
    pub fn from_columns(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.columns.push((name.to_owned(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }
}
