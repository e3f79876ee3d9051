use std::sync::Arc;
use std::time::Duration;

use crate::config::AccessConfig;
use crate::domain::types::SurveyWindow;
use crate::infra::csv_ledger::CsvLedgerStore;
use crate::infra::delivery::{HttpMailRelay, LogDelivery, Mailer};
use crate::infra::submissions::CsvSubmissionStore;
use crate::usecase::ledger::CodeLedger;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<CodeLedger<CsvLedgerStore>>,
    pub submissions: CsvSubmissionStore,
    pub mailer: Mailer,
    pub delivery_timeout: Duration,
    pub resend_on_repeat: bool,
    pub window: SurveyWindow,
}

impl AppState {
    pub fn from_config(config: &AccessConfig) -> anyhow::Result<Self> {
        let store = CsvLedgerStore::new(
            &config.codes_path,
            &config.issuance_log_path,
            &config.usage_log_path,
        );
        let mailer = match &config.mail_relay_url {
            Some(url) => Mailer::Relay(HttpMailRelay::new(
                url,
                &config.mail_from,
                config.delivery_timeout(),
            )?),
            None => Mailer::Log(LogDelivery),
        };
        Ok(Self {
            ledger: Arc::new(CodeLedger::new(store)),
            submissions: CsvSubmissionStore::new(&config.votes_path),
            mailer,
            delivery_timeout: config.delivery_timeout(),
            resend_on_repeat: config.resend_on_repeat,
            window: config.survey_window(),
        })
    }

    pub fn code_ledger(&self) -> Arc<CodeLedger<CsvLedgerStore>> {
        Arc::clone(&self.ledger)
    }

    pub fn submission_store(&self) -> CsvSubmissionStore {
        self.submissions.clone()
    }

    pub fn mailer(&self) -> Mailer {
        self.mailer.clone()
    }
}
