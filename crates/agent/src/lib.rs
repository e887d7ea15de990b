//! Conversation runtime for the quoting assistant.
//!
//! One inbound text per turn flows through the [`dialogue::DialogueEngine`], which owns the
//! per-contact [`session::SessionStore`] lock for the whole turn, consults the catalog and
//! formula engines in `cutquote-core`, and commits priced orders through the
//! [`ledger::OrderLedger`]. The [`supervisor::InactivitySupervisor`] shares the same store and
//! warns, suspends or closes idle sessions.
//!
//! # Key Types
//!
//! - `DialogueEngine` - per-turn state machine
//! - `SessionStore` - atomic per-contact session records
//! - `OrderLedger` - id sequencing, commit and status changes
//! - `MessageSender` - pluggable outbound channel with `RetryingSender` for bounded retries
//!
//! Prices and piece sizes are never taken from user text; they always come from the catalog,
//! formula registry and material table.

pub mod dialogue;
pub mod ledger;
pub mod messages;
pub mod outbound;
pub mod session;
pub mod supervisor;

pub use dialogue::{DialogueEngine, TurnOutcome};
pub use ledger::{LedgerError, OrderLedger, StatusChange};
pub use outbound::{
    deliver_all, DeliveryError, InMemoryOutbox, MessageSender, RetryPolicy, RetryingSender,
};
pub use session::SessionStore;
pub use supervisor::{InactivitySupervisor, SweepReport};
