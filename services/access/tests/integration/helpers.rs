use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pulse_access::domain::ballot::{Ballot, PREFER_NOT_TO_SAY, SubmissionRecord};
use pulse_access::domain::ledger::Ledger;
use pulse_access::domain::repository::{CodeDelivery, LedgerStore, SubmissionStore};
use pulse_access::domain::types::{Code, SurveyWindow, UsageEvent};
use pulse_access::error::AccessServiceError;
use pulse_access::usecase::issuance::RequestCodeUseCase;
use pulse_access::usecase::ledger::CodeLedger;

// ── MemoryLedgerStore ────────────────────────────────────────────────────────

/// In-memory ledger store. `None` models a missing code table.
///
/// `load` yields to the scheduler after reading, so unserialized callers
/// would interleave their read-modify-write cycles. Persisted usage events
/// collect in `events`.
#[derive(Clone)]
pub struct MemoryLedgerStore {
    pub ledger: Arc<Mutex<Option<Ledger>>>,
    pub persists: Arc<AtomicUsize>,
    pub events: Arc<Mutex<Vec<UsageEvent>>>,
}

impl MemoryLedgerStore {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Some(ledger))),
            persists: Arc::new(AtomicUsize::new(0)),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn missing() -> Self {
        Self {
            ledger: Arc::new(Mutex::new(None)),
            persists: Arc::new(AtomicUsize::new(0)),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Current stored ledger, for post-execution inspection.
    pub fn current(&self) -> Ledger {
        self.ledger.lock().unwrap().clone().expect("ledger present")
    }

    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Ledger, AccessServiceError> {
        let snapshot = self.ledger.lock().unwrap().clone();
        tokio::task::yield_now().await;
        snapshot.ok_or_else(|| AccessServiceError::Configuration("no code table".to_owned()))
    }

    async fn persist(&self, ledger: &Ledger) -> Result<(), AccessServiceError> {
        tokio::task::yield_now().await;
        let mut stored = ledger.clone();
        self.events.lock().unwrap().extend(stored.take_events());
        *self.ledger.lock().unwrap() = Some(stored);
        self.persists.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── MockDelivery ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockDelivery {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub failing: Arc<AtomicBool>,
    pub delay: Option<Duration>,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let d = Self::default();
        d.set_failing(true);
        d
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl CodeDelivery for MockDelivery {
    async fn send(&self, identity: &str, code: &str) -> Result<(), AccessServiceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessServiceError::Delivery("smtp refused".to_owned()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((identity.to_owned(), code.to_owned()));
        Ok(())
    }
}

// ── MemorySubmissionStore ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemorySubmissionStore {
    pub rows: Arc<Mutex<Vec<SubmissionRecord>>>,
    pub failing: bool,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<SubmissionRecord> {
        self.rows.lock().unwrap().clone()
    }
}

impl SubmissionStore for MemorySubmissionStore {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), AccessServiceError> {
        if self.failing {
            return Err(AccessServiceError::Internal(anyhow::anyhow!("disk full")));
        }
        tokio::task::yield_now().await;
        self.rows.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SubmissionRecord>, AccessServiceError> {
        Ok(self.rows())
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

/// Ledger with the given codes, all unissued and unused.
pub fn fresh_ledger(codes: &[&str]) -> Ledger {
    Ledger::from_parts(codes.iter().map(|c| Code::fresh(*c)).collect(), vec![]).unwrap()
}

pub fn memory_ledger(codes: &[&str]) -> (Arc<CodeLedger<MemoryLedgerStore>>, MemoryLedgerStore) {
    let store = MemoryLedgerStore::new(fresh_ledger(codes));
    (Arc::new(CodeLedger::new(store.clone())), store)
}

pub fn issuer(
    ledger: &Arc<CodeLedger<MemoryLedgerStore>>,
    delivery: MockDelivery,
) -> RequestCodeUseCase<MemoryLedgerStore, MockDelivery> {
    RequestCodeUseCase {
        ledger: Arc::clone(ledger),
        delivery,
        delivery_timeout: Duration::from_secs(2),
        window: SurveyWindow::default(),
        resend_on_repeat: true,
    }
}

pub fn test_ballot() -> Ballot {
    Ballot {
        region: "Region 4".to_owned(),
        party: "A Partnership for National Unity (APNU)".to_owned(),
        party_candidate: String::new(),
        age: "35–44".to_owned(),
        gender: "Male".to_owned(),
        comment: "Cost of living".to_owned(),
        not_voting_for: vec![],
        not_voting_reason: String::new(),
        preferred_candidate: String::new(),
        candidate_reason: String::new(),
        diaspora: "Diaspora (abroad)".to_owned(),
        top_issues: vec!["Jobs".to_owned()],
        ethnicity: PREFER_NOT_TO_SAY.to_owned(),
        community: PREFER_NOT_TO_SAY.to_owned(),
        voted_last_election: "Yes".to_owned(),
        fairness: "Yes".to_owned(),
        gecom_trust: "Not sure".to_owned(),
    }
}
