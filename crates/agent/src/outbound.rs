use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use cutquote_core::domain::session::ContactId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("messaging channel unreachable: {0}")]
    Unreachable(String),
    #[error("messaging channel rejected the message with status {0}")]
    Rejected(u16),
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Rejected(status) => *status == 429 || *status >= 500,
        }
    }
}

/// Outbound side of the messaging channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, contact: &ContactId, text: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send(&self, contact: &ContactId, text: &str) -> Result<(), DeliveryError> {
        (**self).send(contact, text).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Wraps a sender with bounded exponential backoff on retryable failures.
pub struct RetryingSender<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MessageSender> RetryingSender<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: MessageSender> MessageSender for RetryingSender<S> {
    async fn send(&self, contact: &ContactId, text: &str) -> Result<(), DeliveryError> {
        let mut attempt = 0;
        loop {
            match self.inner.send(contact, text).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_retryable() && attempt < self.policy.max_retries => {
                    warn!(
                        event_name = "delivery.retry_scheduled",
                        contact_id = %contact,
                        attempt,
                        max_retries = self.policy.max_retries,
                        error = %error,
                        "outbound message failed; retrying"
                    );
                    let delay = self.policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Sends every message in order. Failures are logged and never abort the remaining sends.
/// Returns how many messages were delivered.
pub async fn deliver_all(
    sender: &dyn MessageSender,
    contact: &ContactId,
    messages: &[String],
) -> usize {
    let mut delivered = 0;
    for message in messages {
        match sender.send(contact, message).await {
            Ok(()) => {
                delivered += 1;
                debug!(event_name = "delivery.sent", contact_id = %contact, "message delivered");
            }
            Err(error) => warn!(
                event_name = "delivery.failed",
                contact_id = %contact,
                error = %error,
                "outbound message dropped"
            ),
        }
    }
    delivered
}

/// Records sent messages instead of delivering them. Can be told to fail the next sends.
#[derive(Default)]
pub struct InMemoryOutbox {
    sent: Mutex<Vec<(ContactId, String)>>,
    attempts: AtomicU32,
    failures_remaining: AtomicU32,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, sends: u32) {
        self.failures_remaining.store(sends, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<(ContactId, String)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages_for(&self, contact: &ContactId) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(recipient, _)| recipient == contact)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl MessageSender for InMemoryOutbox {
    async fn send(&self, contact: &ContactId, text: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DeliveryError::Unreachable("outbox set to fail".to_string()));
        }

        match self.sent.lock() {
            Ok(mut sent) => sent.push((contact.clone(), text.to_string())),
            Err(poisoned) => poisoned.into_inner().push((contact.clone(), text.to_string())),
        }
        Ok(())
    }
}
