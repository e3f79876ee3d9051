use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::domain::repository::CodeDelivery;
use crate::error::AccessServiceError;

pub const EMAIL_SUBJECT: &str = "Your Guyana Voter Access Code";

/// Plain-text body of the access code email.
pub fn email_body(code: &str) -> String {
    format!(
        "Thank you for requesting your voting code.\n\
         \n\
         Your one-time access code is: {code}\n\
         \n\
         Please return to the voting platform and enter this code to cast your vote. \
         This code can only be used once.\n\
         \n\
         Guyana Voter Pulse Team\n"
    )
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Sends access code emails through an HTTP mail relay (`POST` JSON message).
#[derive(Clone)]
pub struct HttpMailRelay {
    client: Client,
    url: String,
    from: String,
}

impl HttpMailRelay {
    pub fn new(url: impl Into<String>, from: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build mail relay client")?;
        Ok(Self {
            client,
            url: url.into(),
            from: from.into(),
        })
    }
}

impl CodeDelivery for HttpMailRelay {
    async fn send(&self, identity: &str, code: &str) -> Result<(), AccessServiceError> {
        let message = RelayMessage {
            from: &self.from,
            to: identity,
            subject: EMAIL_SUBJECT,
            text: email_body(code),
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| AccessServiceError::Delivery(format!("mail relay unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AccessServiceError::Delivery(format!(
                "mail relay returned {status}"
            )));
        }
        Ok(())
    }
}

/// Development delivery: records the send in the log instead of emailing.
#[derive(Clone, Default)]
pub struct LogDelivery;

impl CodeDelivery for LogDelivery {
    async fn send(&self, identity: &str, _code: &str) -> Result<(), AccessServiceError> {
        info!(to = %identity, subject = EMAIL_SUBJECT, "access code email (log only)");
        Ok(())
    }
}

/// Delivery backend chosen from configuration.
#[derive(Clone)]
pub enum Mailer {
    Relay(HttpMailRelay),
    Log(LogDelivery),
}

impl CodeDelivery for Mailer {
    async fn send(&self, identity: &str, code: &str) -> Result<(), AccessServiceError> {
        match self {
            Self::Relay(relay) => relay.send(identity, code).await,
            Self::Log(log) => log.send(identity, code).await,
        }
    }
}
