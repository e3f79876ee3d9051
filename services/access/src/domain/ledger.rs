use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::types::{Code, IssuanceRecord, UsageEvent, ValidationResult};

/// Errors raised by in-memory ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no unissued codes left")]
    Exhausted,
    #[error("unknown code {0:?}")]
    UnknownCode(String),
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),
    #[error("inconsistent ledger data: {0}")]
    Inconsistent(String),
}

/// All provisioned codes plus every issuance record.
///
/// Codes keep their stored order so allocation is deterministic; both
/// collections carry a key index for direct lookup. Usage events recorded
/// during a transaction stay pending until the store persists them; a loaded
/// ledger never has any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    codes: Vec<Code>,
    code_index: HashMap<String, usize>,
    records: Vec<IssuanceRecord>,
    record_index: HashMap<String, usize>,
    pending_events: Vec<UsageEvent>,
}

impl Ledger {
    /// Assemble a ledger from stored rows, rejecting data that breaks the
    /// code lifecycle or uniqueness rules.
    ///
    /// A code marked issued without a matching record is accepted: the code
    /// table is persisted before the issuance log, so an interrupted write
    /// leaves exactly that shape behind.
    pub fn from_parts(
        codes: Vec<Code>,
        records: Vec<IssuanceRecord>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::default();

        for code in codes {
            if code.used && !code.issued {
                return Err(LedgerError::Inconsistent(format!(
                    "code {:?} is used but was never issued",
                    code.value
                )));
            }
            if ledger.code_index.contains_key(&code.value) {
                return Err(LedgerError::Inconsistent(format!(
                    "duplicate code {:?}",
                    code.value
                )));
            }
            ledger
                .code_index
                .insert(code.value.clone(), ledger.codes.len());
            ledger.codes.push(code);
        }

        for record in records {
            match ledger.code(&record.code) {
                None => {
                    return Err(LedgerError::Inconsistent(format!(
                        "identity {:?} holds unknown code {:?}",
                        record.identity, record.code
                    )));
                }
                Some(code) if !code.issued => {
                    return Err(LedgerError::Inconsistent(format!(
                        "identity {:?} holds code {:?} which is not marked issued",
                        record.identity, record.code
                    )));
                }
                Some(_) => {}
            }
            if ledger.record_index.contains_key(&record.identity) {
                return Err(LedgerError::Inconsistent(format!(
                    "duplicate issuance record for {:?}",
                    record.identity
                )));
            }
            ledger
                .record_index
                .insert(record.identity.clone(), ledger.records.len());
            ledger.records.push(record);
        }

        Ok(ledger)
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    pub fn records(&self) -> &[IssuanceRecord] {
        &self.records
    }

    pub fn code(&self, value: &str) -> Option<&Code> {
        self.code_index.get(value).map(|&i| &self.codes[i])
    }

    pub fn record_for(&self, identity: &str) -> Option<&IssuanceRecord> {
        self.record_index.get(identity).map(|&i| &self.records[i])
    }

    pub fn unissued_count(&self) -> usize {
        self.codes.iter().filter(|c| !c.issued).count()
    }

    /// First code in stored order that has not been handed out yet.
    pub fn allocate_unused(&self) -> Result<Code, LedgerError> {
        self.codes
            .iter()
            .find(|c| !c.issued)
            .cloned()
            .ok_or(LedgerError::Exhausted)
    }

    pub fn mark_issued(&mut self, value: &str) -> Result<(), LedgerError> {
        let code = self.code_mut(value)?;
        code.issued = true;
        Ok(())
    }

    /// Mark a code consumed. Calling it twice is a no-op; calling it on a
    /// code that was never issued is a bug in the caller.
    pub fn mark_used(&mut self, value: &str) -> Result<(), LedgerError> {
        let code = self.code_mut(value)?;
        if !code.issued {
            return Err(LedgerError::InvariantViolation(format!(
                "code {value:?} marked used before being issued"
            )));
        }
        code.used = true;
        Ok(())
    }

    /// Hand `value` to `identity`: marks the code issued and records the binding.
    pub fn issue_to(
        &mut self,
        identity: &str,
        value: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuanceRecord, LedgerError> {
        if self.record_index.contains_key(identity) {
            return Err(LedgerError::InvariantViolation(format!(
                "identity {identity:?} already holds a code"
            )));
        }
        if self.code(value).is_some_and(|c| c.issued) {
            return Err(LedgerError::InvariantViolation(format!(
                "code {value:?} is already issued"
            )));
        }
        self.mark_issued(value)?;

        let record = IssuanceRecord {
            identity: identity.to_owned(),
            code: value.to_owned(),
            issued_at,
        };
        self.record_index
            .insert(record.identity.clone(), self.records.len());
        self.records.push(record.clone());
        Ok(record)
    }

    /// Only issued, unused codes are valid; unissued codes look like unknown ones.
    pub fn validate(&self, value: &str) -> ValidationResult {
        match self.code(value) {
            Some(code) if code.used => ValidationResult::AlreadyUsed,
            Some(code) if code.is_redeemable() => ValidationResult::Valid,
            _ => ValidationResult::NotFound,
        }
    }

    pub fn record_event(&mut self, event: UsageEvent) {
        self.pending_events.push(event);
    }

    pub fn pending_events(&self) -> &[UsageEvent] {
        &self.pending_events
    }

    pub fn take_events(&mut self) -> Vec<UsageEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Append a newly provisioned code. Returns `false` if the value already exists.
    pub fn add_code(&mut self, value: &str) -> bool {
        if self.code_index.contains_key(value) {
            return false;
        }
        self.code_index.insert(value.to_owned(), self.codes.len());
        self.codes.push(Code::fresh(value));
        true
    }

    fn code_mut(&mut self, value: &str) -> Result<&mut Code, LedgerError> {
        match self.code_index.get(value) {
            Some(&i) => Ok(&mut self.codes[i]),
            None => Err(LedgerError::UnknownCode(value.to_owned())),
        }
    }
}
