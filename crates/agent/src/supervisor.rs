use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use cutquote_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use cutquote_core::config::InactivityConfig;
use cutquote_core::domain::session::{ContactId, Session};

use crate::messages;
use crate::outbound::{deliver_all, MessageSender};
use crate::session::SessionStore;

/// Contacts touched by one [`InactivitySupervisor::sweep`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub warned: Vec<ContactId>,
    pub closed: Vec<ContactId>,
}

enum Verdict {
    Warn(String),
    Close,
}

/// Background loop that warns idle sessions once and closes them after the final delay.
pub struct InactivitySupervisor {
    sessions: Arc<SessionStore>,
    sender: Arc<dyn MessageSender>,
    audit: Arc<dyn AuditSink>,
    config: InactivityConfig,
}

impl InactivitySupervisor {
    pub fn new(
        sessions: Arc<SessionStore>,
        sender: Arc<dyn MessageSender>,
        audit: Arc<dyn AuditSink>,
        config: InactivityConfig,
    ) -> Self {
        Self { sessions, sender, audit, config }
    }

    /// Decides under the contact's lock, sends after releasing it, so a slow channel never
    /// holds up the contact's next turn.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for contact in self.sessions.contacts().await {
            let verdict = {
                let mut guard = self.sessions.lock(&contact).await;
                let verdict = (*guard).as_mut().and_then(|session| self.judge(session, now));
                if matches!(verdict, Some(Verdict::Close)) {
                    *guard = None;
                }
                verdict
            };

            match verdict {
                Some(Verdict::Warn(prompt)) => {
                    self.emit(&contact, "supervisor.session_warned");
                    let warning = messages::inactivity_warning(&prompt);
                    deliver_all(self.sender.as_ref(), &contact, &[warning]).await;
                    report.warned.push(contact);
                }
                Some(Verdict::Close) => {
                    self.emit(&contact, "supervisor.session_closed");
                    let notice = messages::INACTIVITY_CLOSED.to_string();
                    deliver_all(self.sender.as_ref(), &contact, &[notice]).await;
                    report.closed.push(contact);
                }
                None => {}
            }
        }

        let pruned = self.sessions.prune().await;
        if !report.warned.is_empty() || !report.closed.is_empty() {
            info!(
                event_name = "supervisor.sweep.completed",
                warned = report.warned.len(),
                closed = report.closed.len(),
                pruned,
                "inactivity sweep completed"
            );
        }
        report
    }

    /// Past warning + final the session is closed even when it was never warned; past the
    /// warning alone it is suspended once.
    fn judge(&self, session: &mut Session, now: DateTime<Utc>) -> Option<Verdict> {
        let idle = session.idle_for(now).to_std().unwrap_or_default();
        let warning = self.config.warning_after();

        if idle > warning.saturating_add(self.config.final_after()) {
            return Some(Verdict::Close);
        }
        if idle > warning {
            let suspended = session.phase.suspended()?;
            session.phase = suspended;
            return Some(Verdict::Warn(session.last_prompt.clone()));
        }
        None
    }

    fn emit(&self, contact: &ContactId, event_type: &str) {
        self.audit.emit(AuditEvent::new(
            contact.clone(),
            event_type,
            AuditCategory::Supervisor,
            AuditOutcome::Success,
        ));
    }

    /// Sweeps every poll interval until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            event_name = "supervisor.started",
            warning_secs = self.config.warning_secs,
            final_secs = self.config.final_secs,
            poll_interval_secs = self.config.poll_interval_secs,
            "inactivity supervisor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep(Utc::now()).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(event_name = "supervisor.stopped", "inactivity supervisor stopped");
                        return;
                    }
                }
            }
        }
    }
}
