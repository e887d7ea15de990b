use tracing::info;

use cutquote_core::audit::{AuditEvent, AuditSink};

/// Writes conversation transcript events through `tracing` under the `transcript` target, so
/// they can be filtered or routed separately from operational logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        info!(
            target: "transcript",
            event_name = %event.event_type,
            event_id = %event.event_id,
            contact_id = %event.contact,
            customer_name = event.customer_name.as_deref().unwrap_or("unknown"),
            category = ?event.category,
            outcome = ?event.outcome,
            occurred_at = %event.occurred_at.to_rfc3339(),
            metadata = %metadata,
            "transcript event"
        );
    }
}
