use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::session::ContactId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Ingress,
    Dialogue,
    Pricing,
    Persistence,
    Supervisor,
    Delivery,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

/// One line of a contact's conversation transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub contact: ContactId,
    pub customer_name: Option<String>,
    pub event_type: String,
    pub category: AuditCategory,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        contact: ContactId,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            contact,
            customer_name: None,
            event_type: event_type.into(),
            category,
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn for_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events_for(&self, contact: &ContactId) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| &event.contact == contact).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink},
        domain::session::ContactId,
    };

    #[test]
    fn in_memory_sink_records_transcript_per_contact() {
        let sink = InMemoryAuditSink::default();
        sink.emit(
            AuditEvent::new(
                ContactId::from("5511999990000"),
                "dialogue.prompt_sent",
                AuditCategory::Dialogue,
                AuditOutcome::Success,
            )
            .for_customer("Ana")
            .with_metadata("state", "awaiting_height"),
        );
        sink.emit(AuditEvent::new(
            ContactId::from("5511888880000"),
            "ingress.message_received",
            AuditCategory::Ingress,
            AuditOutcome::Success,
        ));

        let events = sink.events_for(&ContactId::from("5511999990000"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].customer_name.as_deref(), Some("Ana"));
        assert_eq!(events[0].metadata.get("state").map(String::as_str), Some("awaiting_height"));
        assert_eq!(sink.events().len(), 2);
    }
}
