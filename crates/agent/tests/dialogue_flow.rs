use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use cutquote_agent::messages;
use cutquote_agent::{
    DialogueEngine, InMemoryOutbox, InactivitySupervisor, OrderLedger, SessionStore, TurnOutcome,
};
use cutquote_core::audit::InMemoryAuditSink;
use cutquote_core::config::InactivityConfig;
use cutquote_core::cpq::FormulaRegistry;
use cutquote_core::domain::catalog::{
    CatalogAttribute, CatalogEntry, CatalogEntryId, FormulaId, MeasurementMode,
};
use cutquote_core::domain::order::OrderStatus;
use cutquote_core::domain::session::ContactId;
use cutquote_core::flows::{DialogueState, MeasurementField};
use cutquote_db::repositories::{
    InMemoryCatalogRepository, InMemoryCustomerRepository, InMemoryMaterialRepository,
    InMemoryOrderRepository,
};
use cutquote_db::{DemoDataset, OrderRepository};

const ANA: &str = "5511999990000";

struct Harness {
    engine: DialogueEngine,
    orders: Arc<InMemoryOrderRepository>,
    audit: InMemoryAuditSink,
}

fn harness_with(catalog: Vec<CatalogEntry>) -> Harness {
    let orders = Arc::new(InMemoryOrderRepository::default());
    let audit = InMemoryAuditSink::default();
    let engine = DialogueEngine::new(
        Arc::new(SessionStore::new()),
        Arc::new(InMemoryCustomerRepository::new(DemoDataset::customers())),
        Arc::new(InMemoryCatalogRepository::new(catalog)),
        Arc::new(InMemoryMaterialRepository::new(DemoDataset::materials())),
        Arc::new(FormulaRegistry::builtin()),
        Arc::new(OrderLedger::new(orders.clone())),
        Arc::new(audit.clone()),
    );
    Harness { engine, orders, audit }
}

fn harness() -> Harness {
    harness_with(DemoDataset::catalog())
}

fn at(seconds: i64) -> DateTime<Utc> {
    let start = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).single().expect("timestamp");
    start + Duration::seconds(seconds)
}

impl Harness {
    async fn say_at(&self, text: &str, seconds: i64) -> TurnOutcome {
        self.engine.handle_message_at(&ContactId::from(ANA), text, at(seconds)).await
    }

    async fn say(&self, text: &str) -> TurnOutcome {
        self.say_at(text, 0).await
    }

    /// Drives a fresh conversation up to the width prompt for the two-leaf sliding window.
    async fn configure_window_until_width(&self) {
        for reply in ["hi", "1", "1", "1", "1", "1000"] {
            self.say(reply).await;
        }
    }

    /// Full configuration of one priced item: 3 units of 1000 x 1200, clear 8mm tempered.
    async fn price_one_window(&self) -> TurnOutcome {
        self.configure_window_until_width().await;
        for reply in ["1200", "1", "1", "1"] {
            self.say(reply).await;
        }
        self.say("3").await
    }
}

#[tokio::test]
async fn quote_is_configured_priced_committed_and_authorized() {
    let harness = harness();

    let greeting = harness.say("hello").await;
    assert_eq!(greeting.state, Some(DialogueState::ChoosingService));
    assert!(greeting.replies[0].starts_with("Hello, Ana Souza!"));
    assert!(greeting.replies[0].ends_with("1. Request a quote\n2. Check my quotes"));

    assert_eq!(harness.say("1").await.state, Some(DialogueState::ChoosingMeasurementMode));

    let final_mode = harness.say("1").await;
    assert_eq!(final_mode.replies[0], "You chose final measurements.");
    assert_eq!(
        final_mode.state,
        Some(DialogueState::NarrowingCatalog(CatalogAttribute::Category))
    );
    assert!(final_mode.replies[1].contains("1. Window\n2. Shower\n3. Mirror"));

    let line = harness.say("1").await;
    assert_eq!(line.state, Some(DialogueState::NarrowingCatalog(CatalogAttribute::Line)));

    let resolved = harness.say("1").await;
    assert_eq!(resolved.state, Some(DialogueState::AwaitingHeight));
    assert_eq!(resolved.replies, vec!["Enter the height in millimetres (final):".to_string()]);

    assert_eq!(harness.say("1000").await.state, Some(DialogueState::AwaitingWidth));

    let width = harness.say("1200").await;
    assert_eq!(width.state, Some(DialogueState::ChoosingMaterialColor));
    assert!(width.replies[0].contains("1 pcs - Fixed leaf - 975 x 600"));
    assert!(width.replies[0].contains("1 pcs - Sliding leaf - 938 x 650"));

    assert_eq!(harness.say("1").await.state, Some(DialogueState::ChoosingMaterialThickness));
    assert_eq!(harness.say("1").await.state, Some(DialogueState::ChoosingTreatment));
    assert_eq!(harness.say("1").await.state, Some(DialogueState::AwaitingQuantity));

    let priced = harness.say("3").await;
    assert_eq!(priced.state, Some(DialogueState::AwaitingAddMoreDecision));
    assert!(priced.replies[0].contains("3 pcs Fixed leaf - 975 x 600 - 2.00 m² - $ 360.00"));
    assert!(priced.replies[0].contains("Item total: $ 720.00"));

    assert_eq!(harness.say("2").await.state, Some(DialogueState::AwaitingOrderName));

    let saved = harness.say("  kitchen  ").await;
    assert_eq!(saved.state, Some(DialogueState::AwaitingAuthorizationDecision));
    assert!(saved.replies[0].contains("260316_0001"));

    let stored = harness.orders.list_all().await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "kitchen");
    assert_eq!(stored[0].status, OrderStatus::Quote);
    assert_eq!(stored[0].total, Decimal::new(72_000, 2));
    assert_eq!(stored[0].lines.len(), 2);
    assert_eq!(stored[0].lines[1].area_m2, Decimal::new(200, 2));

    let authorized = harness.say("1").await;
    assert_eq!(authorized.state, None);
    assert!(authorized.replies[0].contains("authorized for production"));

    let stored = harness.orders.list_all().await.expect("list");
    assert_eq!(stored[0].status, OrderStatus::Authorized);
    assert_eq!(stored[0].authorized_at, Some(at(0)));
    assert!(harness.engine.sessions().get(&ContactId::from(ANA)).await.is_none());

    let transcript = harness.audit.events_for(&ContactId::from(ANA));
    assert!(transcript.iter().any(|event| event.event_type == "persistence.orders_committed"));
    assert!(transcript.iter().any(|event| event.event_type == "dialogue.session_closed"));
    let status_change = transcript
        .iter()
        .find(|event| event.event_type == "persistence.status_changed")
        .expect("status change recorded");
    assert_eq!(
        status_change.metadata.get("order_ids").map(String::as_str),
        Some("260316_0001")
    );
}

#[tokio::test]
async fn invalid_replies_repeat_the_prompt_without_progress() {
    let harness = harness();
    let greeting = harness.say("hi").await;

    let out_of_range = harness.say("7").await;
    assert_eq!(out_of_range.state, Some(DialogueState::ChoosingService));
    assert_eq!(out_of_range.replies, greeting.replies);

    assert_eq!(harness.say("one").await.replies, greeting.replies);

    harness.say("1").await;
    harness.say("1").await;
    harness.say("1").await;
    harness.say("1").await;
    let expected = vec![messages::field_reask(MeasurementField::Height).to_string()];
    for bad in ["-5", "0", "abc", ""] {
        let reask = harness.say(bad).await;
        assert_eq!(reask.state, Some(DialogueState::AwaitingHeight));
        assert_eq!(reask.replies, expected);
    }

    let session = harness.engine.sessions().get(&ContactId::from(ANA)).await.expect("open");
    assert_eq!(session.answers.height_mm, None);
}

#[tokio::test]
async fn ambiguous_catalog_ties_ask_for_an_explicit_choice() {
    let harness = harness();
    for reply in ["hi", "1", "1"] {
        harness.say(reply).await;
    }

    let candidates = harness.say("3").await;
    assert_eq!(candidates.state, Some(DialogueState::ChoosingCandidate));
    assert!(candidates.replies[0].ends_with("1. Wall mirror\n2. Bathroom mirror"));

    assert_eq!(harness.say("5").await.state, Some(DialogueState::ChoosingCandidate));

    let chosen = harness.say("2").await;
    assert_eq!(chosen.state, Some(DialogueState::AwaitingHeight));
    let session = harness.engine.sessions().get(&ContactId::from(ANA)).await.expect("open");
    let project = session.answers.project.expect("project resolved");
    assert_eq!(project.id, CatalogEntryId("P-07".to_string()));
    assert!(session.candidates.is_empty());
}

#[tokio::test]
async fn opening_measurements_use_their_own_catalog_branch() {
    let harness = harness();
    for reply in ["hi", "1"] {
        harness.say(reply).await;
    }

    let opening = harness.say("2").await;
    assert!(opening.replies[1].ends_with("1. Window"));
    let line = harness.say("1").await;
    assert!(line.replies[0].ends_with("1. Fixed\n2. Sliding 2 leaves"));

    let resolved = harness.say("1").await;
    assert_eq!(resolved.replies, vec!["Enter the height in millimetres (opening):".to_string()]);
    harness.say("1000").await;
    let width = harness.say("800").await;
    assert!(width.replies[0].contains("1 pcs - Fixed piece - 980 x 780"));
}

#[tokio::test]
async fn warned_sessions_resume_where_they_were() {
    let harness = harness();
    let outbox = Arc::new(InMemoryOutbox::new());
    let supervisor = InactivitySupervisor::new(
        harness.engine.sessions().clone(),
        outbox.clone(),
        Arc::new(harness.audit.clone()),
        InactivityConfig { warning_secs: 60, final_secs: 60, poll_interval_secs: 5 },
    );
    let contact = ContactId::from(ANA);

    harness.configure_window_until_width().await;
    let before = harness.engine.sessions().get(&contact).await.expect("open");

    let report = supervisor.sweep(at(61)).await;
    assert_eq!(report.warned, vec![contact.clone()]);
    let warned = harness.engine.sessions().get(&contact).await.expect("open");
    assert!(warned.phase.is_suspended());
    assert_eq!(warned.last_menu, before.last_menu);
    assert_eq!(warned.last_prompt, before.last_prompt);
    assert!(outbox.messages_for(&contact)[0].ends_with(&before.last_prompt));

    let resumed = harness.say_at("1200", 70).await;
    assert_eq!(resumed.state, Some(DialogueState::ChoosingMaterialColor));
    let session = harness.engine.sessions().get(&contact).await.expect("open");
    assert!(!session.phase.is_suspended());
    assert_eq!(session.answers.width_mm, Some(1200));

    assert!(supervisor.sweep(at(100)).await.warned.is_empty());
}

#[tokio::test]
async fn warned_menus_are_answered_from_the_original_options() {
    let harness = harness();
    let outbox = Arc::new(InMemoryOutbox::new());
    let supervisor = InactivitySupervisor::new(
        harness.engine.sessions().clone(),
        outbox.clone(),
        Arc::new(harness.audit.clone()),
        InactivityConfig { warning_secs: 60, final_secs: 60, poll_interval_secs: 5 },
    );
    let contact = ContactId::from(ANA);

    for reply in ["hi", "1", "1"] {
        harness.say(reply).await;
    }
    let lines = harness.say("1").await;
    assert_eq!(lines.state, Some(DialogueState::NarrowingCatalog(CatalogAttribute::Line)));
    let before = harness.engine.sessions().get(&contact).await.expect("open");
    assert_eq!(before.last_menu, vec!["Sliding 2 leaves", "Sliding 4 leaves", "Fixed"]);

    assert_eq!(supervisor.sweep(at(61)).await.warned, vec![contact.clone()]);
    let warning = &outbox.messages_for(&contact)[0];
    assert!(warning.ends_with("1. Sliding 2 leaves\n2. Sliding 4 leaves\n3. Fixed"));
    let warned = harness.engine.sessions().get(&contact).await.expect("open");
    assert_eq!(warned.phase.state(), DialogueState::NarrowingCatalog(CatalogAttribute::Line));
    assert_eq!(warned.last_menu, before.last_menu);

    let resumed = harness.say_at("2", 70).await;
    assert_eq!(resumed.state, Some(DialogueState::AwaitingHeight));
    let session = harness.engine.sessions().get(&contact).await.expect("open");
    assert_eq!(
        session.answers.catalog.get(&CatalogAttribute::Line).map(String::as_str),
        Some("Sliding 4 leaves")
    );
    let project = session.answers.project.expect("project resolved");
    assert_eq!(project.id, CatalogEntryId("P-02".to_string()));
}

#[tokio::test]
async fn closed_sessions_restart_from_the_greeting() {
    let harness = harness();
    let outbox = Arc::new(InMemoryOutbox::new());
    let supervisor = InactivitySupervisor::new(
        harness.engine.sessions().clone(),
        outbox.clone(),
        Arc::new(harness.audit.clone()),
        InactivityConfig { warning_secs: 60, final_secs: 60, poll_interval_secs: 5 },
    );
    let contact = ContactId::from(ANA);

    harness.configure_window_until_width().await;
    supervisor.sweep(at(61)).await;
    let report = supervisor.sweep(at(121)).await;
    assert_eq!(report.closed, vec![contact.clone()]);
    assert!(harness.engine.sessions().get(&contact).await.is_none());

    let fresh = harness.say_at("1200", 130).await;
    assert_eq!(fresh.state, Some(DialogueState::ChoosingService));
    assert!(fresh.replies[0].starts_with("Hello, Ana Souza!"));
    let session = harness.engine.sessions().get(&contact).await.expect("open");
    assert_eq!(session.answers.height_mm, None);
}

#[tokio::test]
async fn persistence_failures_keep_the_priced_items() {
    let harness = harness();
    harness.price_one_window().await;
    harness.say("2").await;
    harness.orders.set_fail_writes(true);

    let failed = harness.say("kitchen").await;
    assert_eq!(failed.state, Some(DialogueState::AwaitingOrderName));
    assert_eq!(failed.replies, vec![messages::COMMIT_FAILED.to_string()]);
    let session = harness.engine.sessions().get(&ContactId::from(ANA)).await.expect("open");
    assert_eq!(session.accumulated_orders.len(), 1);

    harness.orders.set_fail_writes(false);
    let saved = harness.say("kitchen").await;
    assert_eq!(saved.state, Some(DialogueState::AwaitingAuthorizationDecision));
    assert_eq!(harness.orders.list_all().await.expect("list").len(), 1);
}

#[tokio::test]
async fn several_items_share_one_order_name() {
    let harness = harness();
    harness.price_one_window().await;

    let again = harness.say("1").await;
    assert_eq!(again.state, Some(DialogueState::ChoosingMeasurementMode));
    for reply in ["1", "3", "1", "800", "600", "3", "1", "1"] {
        harness.say(reply).await;
    }
    let second = harness.say("2").await;
    assert!(second.replies[0].contains("Item total: $ 90.00"));

    harness.say("2").await;
    harness.say("bathroom").await;
    let kept = harness.say("2").await;
    assert_eq!(kept.state, None);

    let stored = harness.orders.list_by_name("bathroom").await.expect("list");
    let ids: Vec<&str> = stored.iter().map(|order| order.id.0.as_str()).collect();
    assert_eq!(ids, vec!["260316_0001", "260316_0002"]);
    assert!(stored.iter().all(|order| order.status == OrderStatus::Quote));
}

#[tokio::test]
async fn reused_order_names_are_refused() {
    let harness = harness();
    harness.price_one_window().await;
    harness.say("2").await;
    harness.say("kitchen").await;
    harness.say("2").await;

    harness.price_one_window().await;
    harness.say("2").await;
    let refused = harness.say("kitchen").await;
    assert_eq!(refused.state, Some(DialogueState::AwaitingOrderName));
    assert_eq!(refused.replies, vec![messages::NAME_IN_USE.to_string()]);
}

#[tokio::test]
async fn cancelling_before_commit_discards_everything() {
    let harness = harness();
    harness.price_one_window().await;

    let cancelled = harness.say("3").await;
    assert_eq!(cancelled.state, None);
    assert_eq!(cancelled.replies, vec![messages::ORDER_CANCELLED.to_string()]);
    assert!(harness.orders.list_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn cancelling_after_commit_marks_the_order_cancelled() {
    let harness = harness();
    harness.price_one_window().await;
    harness.say("2").await;
    harness.say("kitchen").await;

    let cancelled = harness.say("3").await;
    assert_eq!(cancelled.state, None);
    let stored = harness.orders.list_by_name("kitchen").await.expect("list");
    assert_eq!(stored[0].status, OrderStatus::Cancelled);
    assert_eq!(stored[0].authorized_at, None);
}

#[tokio::test]
async fn check_my_quotes_lists_orders_and_closes() {
    let harness = harness();
    harness.say("hi").await;
    let empty = harness.say("2").await;
    assert_eq!(empty.state, None);
    assert_eq!(empty.replies[0], "You have no quotes yet.");

    harness.price_one_window().await;
    harness.say("2").await;
    harness.say("kitchen").await;
    harness.say("1").await;

    harness.say("hi").await;
    let listing = harness.say("2").await;
    assert!(listing.replies[0].contains("260316_0001 - kitchen - authorized - $ 720.00"));
}

#[tokio::test]
async fn unregistered_contacts_get_no_session() {
    let harness = harness();
    let contact = ContactId::from("5500000000000");

    let outcome = harness.engine.handle_message_at(&contact, "hi", at(0)).await;

    assert_eq!(outcome.state, None);
    assert_eq!(outcome.replies, vec![messages::NOT_REGISTERED.to_string()]);
    assert!(harness.engine.sessions().get(&contact).await.is_none());
}

#[tokio::test]
async fn empty_catalog_ends_the_conversation() {
    let harness = harness_with(Vec::new());
    harness.say("hi").await;
    harness.say("1").await;

    let exhausted = harness.say("1").await;
    assert_eq!(exhausted.state, None);
    assert_eq!(exhausted.replies.last(), Some(&messages::CATALOG_EXHAUSTED.to_string()));
    assert!(harness.engine.sessions().get(&ContactId::from(ANA)).await.is_none());
}

#[tokio::test]
async fn unknown_formulas_restart_the_configuration() {
    let harness = harness_with(vec![CatalogEntry {
        id: CatalogEntryId("X-1".to_string()),
        description: "Experimental panel".to_string(),
        measurement_mode: MeasurementMode::Final,
        category: "Panel".to_string(),
        line: None,
        model: None,
        finish: None,
        formula_id: FormulaId(99),
    }]);
    for reply in ["hi", "1", "1", "1", "1000"] {
        harness.say(reply).await;
    }

    let failed = harness.say("1200").await;
    assert_eq!(failed.replies[0], messages::FORMULA_FAILED);
    assert_eq!(failed.state, Some(DialogueState::ChoosingMeasurementMode));
    let session = harness.engine.sessions().get(&ContactId::from(ANA)).await.expect("open");
    assert!(session.answers.project.is_none());
}
