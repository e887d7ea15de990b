use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{CatalogAttribute, CatalogEntry, MeasurementMode};
use crate::domain::customer::Customer;
use crate::domain::material::MaterialEntry;
use crate::domain::order::{OrderId, PieceDraft, SubOrder};
use crate::flows::states::{DialogueState, SessionPhase};

/// Identifier of the messaging contact a session belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(pub String);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialAnswers {
    pub color: Option<String>,
    pub thickness: Option<String>,
    pub treatment: Option<String>,
    pub resolved: Option<MaterialEntry>,
}

/// Everything the customer has chosen for the configuration in progress.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Answers {
    pub measurement_mode: Option<MeasurementMode>,
    pub catalog: BTreeMap<CatalogAttribute, String>,
    pub project: Option<CatalogEntry>,
    pub height_mm: Option<u32>,
    pub width_mm: Option<u32>,
    pub material: MaterialAnswers,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub contact: ContactId,
    pub customer: Customer,
    pub phase: SessionPhase,
    pub answers: Answers,
    /// Pieces for one unit of the configured project, priced once the quantity is known.
    pub pending_pieces: Vec<PieceDraft>,
    pub accumulated_orders: Vec<SubOrder>,
    /// Text of the last prompt or menu sent, replayed on invalid input and by the warning.
    pub last_prompt: String,
    /// Options shown by the last menu; numeric replies index into it.
    pub last_menu: Vec<String>,
    /// Candidates offered when the catalog could not be narrowed to one entry.
    pub candidates: Vec<CatalogEntry>,
    /// Name and ids of the orders committed in this session, awaiting authorization.
    pub committed: Option<CommittedOrders>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOrders {
    pub name: String,
    pub order_ids: Vec<OrderId>,
}

impl Session {
    pub fn new(contact: ContactId, customer: Customer, now: DateTime<Utc>) -> Self {
        Self {
            contact,
            customer,
            phase: SessionPhase::default(),
            answers: Answers::default(),
            pending_pieces: Vec::new(),
            accumulated_orders: Vec::new(),
            last_prompt: String::new(),
            last_menu: Vec::new(),
            candidates: Vec::new(),
            committed: None,
            last_activity: now,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.phase.state()
    }

    pub fn enter(&mut self, state: DialogueState) {
        self.phase = SessionPhase::Active(state);
    }

    /// Records a menu together with the state that expects a choice from it.
    pub fn show_menu(&mut self, state: DialogueState, prompt: String, options: Vec<String>) {
        self.last_prompt = prompt;
        self.last_menu = options;
        self.enter(state);
    }

    /// Records a free-form prompt; any previous menu stops being valid.
    pub fn ask(&mut self, state: DialogueState, prompt: String) {
        self.last_prompt = prompt;
        self.last_menu.clear();
        self.enter(state);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.last_activity)
    }

    /// Drops the configuration in progress but keeps already priced sub-orders.
    pub fn reset_configuration(&mut self) {
        self.answers = Answers::default();
        self.pending_pieces.clear();
        self.candidates.clear();
    }
}
