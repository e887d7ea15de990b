use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use cutquote_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use cutquote_core::cpq::{CatalogFilter, FormulaError, FormulaRegistry, MaterialFilter, Narrowing};
use cutquote_core::domain::catalog::{CatalogAttribute, CatalogEntry, MeasurementMode};
use cutquote_core::domain::order::{OrderStatus, SubOrder};
use cutquote_core::domain::session::{CommittedOrders, ContactId, Session};
use cutquote_core::flows::{
    parse_menu_choice, parse_order_name, parse_positive_integer, DialogueState, ExpectedInput,
    MeasurementField,
};
use cutquote_db::{CatalogRepository, CustomerRepository, MaterialRepository, RepositoryError};

use crate::ledger::{LedgerError, OrderLedger, StatusChange};
use crate::messages::{self, options, render_menu};
use crate::session::SessionStore;

/// Replies produced by one inbound message, in sending order. `state` is `None` when the turn
/// ended the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub replies: Vec<String>,
    pub state: Option<DialogueState>,
}

#[derive(Debug, Error)]
enum TurnError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

enum Disposition {
    Keep,
    Close,
}

type Handled = Result<Disposition, TurnError>;

/// Per-turn conversation state machine.
pub struct DialogueEngine {
    sessions: Arc<SessionStore>,
    customers: Arc<dyn CustomerRepository>,
    catalog: Arc<dyn CatalogRepository>,
    materials: Arc<dyn MaterialRepository>,
    formulas: Arc<FormulaRegistry>,
    ledger: Arc<OrderLedger>,
    audit: Arc<dyn AuditSink>,
}

impl DialogueEngine {
    pub fn new(
        sessions: Arc<SessionStore>,
        customers: Arc<dyn CustomerRepository>,
        catalog: Arc<dyn CatalogRepository>,
        materials: Arc<dyn MaterialRepository>,
        formulas: Arc<FormulaRegistry>,
        ledger: Arc<OrderLedger>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { sessions, customers, catalog, materials, formulas, ledger, audit }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn handle_message(&self, contact: &ContactId, text: &str) -> TurnOutcome {
        self.handle_message_at(contact, text, Utc::now()).await
    }

    /// Runs one turn with the contact's session locked from lookup to write-back, so the
    /// inactivity supervisor never observes a half-applied transition.
    pub async fn handle_message_at(
        &self,
        contact: &ContactId,
        text: &str,
        now: DateTime<Utc>,
    ) -> TurnOutcome {
        let mut guard = self.sessions.lock(contact).await;
        self.audit.emit(
            AuditEvent::new(
                contact.clone(),
                "ingress.message_received",
                AuditCategory::Ingress,
                AuditOutcome::Success,
            )
            .with_metadata("text", text),
        );

        let mut session = match guard.take() {
            Some(session) => session,
            None => match self.open_session(contact, now).await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    return self.finish(contact, None, vec![messages::NOT_REGISTERED.to_string()])
                }
                Err(error) => {
                    warn!(
                        event_name = "dialogue.customer_lookup_failed",
                        contact_id = %contact,
                        error = %error,
                        "customer directory unavailable"
                    );
                    return self.finish(contact, None, vec![messages::DATA_UNAVAILABLE.to_string()]);
                }
            },
        };

        if session.phase.is_suspended() {
            session.phase = session.phase.resumed();
            self.record(&session, "dialogue.session_resumed", AuditOutcome::Success);
        }
        session.touch(now);

        let from = session.state();
        let snapshot = session.clone();
        let mut replies = Vec::new();

        let outcome = match self.dispatch(&mut session, text, &mut replies, now).await {
            Ok(Disposition::Keep) => {
                let state = session.state();
                *guard = Some(session);
                self.finish(contact, Some(state), replies)
            }
            Ok(Disposition::Close) => {
                self.record(&session, "dialogue.session_closed", AuditOutcome::Success);
                self.finish(contact, None, replies)
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.turn.failed",
                    contact_id = %contact,
                    state = %from,
                    error = %error,
                    "turn aborted; session left unchanged"
                );
                self.record(&snapshot, "dialogue.turn_failed", AuditOutcome::Failed);
                *guard = Some(snapshot);
                self.finish(contact, Some(from), vec![messages::DATA_UNAVAILABLE.to_string()])
            }
        };

        info!(
            event_name = "dialogue.turn.handled",
            contact_id = %contact,
            from_state = %from,
            to_state = outcome.state.map(|state| state.name()).unwrap_or("closed"),
            replies = outcome.replies.len(),
            "turn handled"
        );
        outcome
    }

    async fn open_session(
        &self,
        contact: &ContactId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError> {
        let Some(customer) = self.customers.find_by_contact(&contact.0).await? else {
            self.audit.emit(AuditEvent::new(
                contact.clone(),
                "dialogue.customer_unregistered",
                AuditCategory::Dialogue,
                AuditOutcome::Rejected,
            ));
            return Ok(None);
        };

        let session = Session::new(contact.clone(), customer, now);
        self.record(&session, "dialogue.session_started", AuditOutcome::Success);
        Ok(Some(session))
    }

    fn finish(
        &self,
        contact: &ContactId,
        state: Option<DialogueState>,
        replies: Vec<String>,
    ) -> TurnOutcome {
        for reply in &replies {
            self.audit.emit(
                AuditEvent::new(
                    contact.clone(),
                    "dialogue.reply",
                    AuditCategory::Dialogue,
                    AuditOutcome::Success,
                )
                .with_metadata("text", reply.as_str()),
            );
        }
        TurnOutcome { replies, state }
    }

    fn record(&self, session: &Session, event_type: &str, outcome: AuditOutcome) {
        self.audit.emit(
            AuditEvent::new(session.contact.clone(), event_type, AuditCategory::Dialogue, outcome)
                .for_customer(session.customer.name.as_str())
                .with_metadata("state", session.state().name()),
        );
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
        now: DateTime<Utc>,
    ) -> Handled {
        match session.state() {
            DialogueState::Initial | DialogueState::Closed => Ok(self.start(session, replies)),
            DialogueState::ChoosingService => self.on_service(session, text, replies).await,
            DialogueState::ChoosingMeasurementMode => {
                self.on_measurement_mode(session, text, replies).await
            }
            DialogueState::NarrowingCatalog(attribute) => {
                self.on_catalog_choice(session, attribute, text, replies).await
            }
            DialogueState::ChoosingCandidate => Ok(self.on_candidate(session, text, replies)),
            DialogueState::AwaitingHeight => Ok(self.on_height(session, text, replies)),
            DialogueState::AwaitingWidth => self.on_width(session, text, replies).await,
            DialogueState::ChoosingMaterialColor => self.on_color(session, text, replies).await,
            DialogueState::ChoosingMaterialThickness => {
                self.on_thickness(session, text, replies).await
            }
            DialogueState::ChoosingTreatment => self.on_treatment(session, text, replies).await,
            DialogueState::AwaitingQuantity => Ok(self.on_quantity(session, text, replies)),
            DialogueState::AwaitingAddMoreDecision => Ok(self.on_add_more(session, text, replies)),
            DialogueState::AwaitingOrderName => {
                Ok(self.on_order_name(session, text, replies, now).await)
            }
            DialogueState::AwaitingAuthorizationDecision => {
                Ok(self.on_authorization(session, text, replies, now).await)
            }
        }
    }

    /// Greets the customer and shows the service menu. Also the fallback whenever the
    /// collected answers do not support the current state.
    fn start(&self, session: &mut Session, replies: &mut Vec<String>) -> Disposition {
        session.reset_configuration();
        session.accumulated_orders.clear();
        session.committed = None;
        let title = messages::greeting(&session.customer.name);
        let menu = options(&messages::SERVICE_MENU);
        offer(session, replies, DialogueState::ChoosingService, &title, menu);
        Disposition::Keep
    }

    /// Keeps the state and re-asks: the field message for free-form input, the last menu
    /// otherwise.
    fn reject(&self, session: &Session, replies: &mut Vec<String>) -> Disposition {
        self.record(session, "dialogue.invalid_input", AuditOutcome::Rejected);
        let reask = match session.state().expected_input() {
            ExpectedInput::Measurement(field) => messages::field_reask(field).to_string(),
            ExpectedInput::FreeText => messages::order_name_reask().to_string(),
            ExpectedInput::MenuChoice | ExpectedInput::Nothing => session.last_prompt.clone(),
        };
        replies.push(reask);
        Disposition::Keep
    }

    fn exhausted(&self, session: &Session, replies: &mut Vec<String>) -> Disposition {
        self.record(session, "dialogue.catalog_exhausted", AuditOutcome::Rejected);
        replies.push(messages::CATALOG_EXHAUSTED.to_string());
        Disposition::Close
    }

    fn formula_failed(
        &self,
        session: &mut Session,
        replies: &mut Vec<String>,
        error: FormulaError,
    ) -> Disposition {
        warn!(
            event_name = "dialogue.formula_failed",
            contact_id = %session.contact,
            error = %error,
            "piece computation failed; restarting configuration"
        );
        self.audit.emit(
            AuditEvent::new(
                session.contact.clone(),
                "pricing.formula_failed",
                AuditCategory::Pricing,
                AuditOutcome::Failed,
            )
            .for_customer(session.customer.name.as_str())
            .with_metadata("error", error.to_string()),
        );
        replies.push(messages::FORMULA_FAILED.to_string());
        session.reset_configuration();
        offer_measurement(session, replies);
        Disposition::Keep
    }

    async fn catalog_filter(&self) -> Result<CatalogFilter, RepositoryError> {
        Ok(CatalogFilter::new(self.catalog.list_entries().await?))
    }

    async fn material_filter(&self) -> Result<MaterialFilter, RepositoryError> {
        Ok(MaterialFilter::new(self.materials.list_materials().await?))
    }

    async fn on_service(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        match menu_choice(session, text) {
            Some(0) => {
                offer_measurement(session, replies);
                Ok(Disposition::Keep)
            }
            Some(_) => {
                let orders = self.ledger.orders_for(&session.customer.id).await?;
                replies.push(messages::quote_listing(&orders));
                replies.push(messages::FAREWELL.to_string());
                Ok(Disposition::Close)
            }
            None => Ok(self.reject(session, replies)),
        }
    }

    async fn on_measurement_mode(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let mode = match menu_choice(session, text) {
            Some(0) => MeasurementMode::Final,
            Some(_) => MeasurementMode::Opening,
            None => return Ok(self.reject(session, replies)),
        };

        let filter = self.catalog_filter().await?;
        session.answers.measurement_mode = Some(mode);
        session.answers.catalog.clear();
        replies.push(messages::measurement_confirmation(mode));

        let first_level = filter.initial_options(mode);
        if first_level.is_empty() {
            return Ok(self.exhausted(session, replies));
        }
        let title = messages::catalog_title(CatalogAttribute::Category);
        let state = DialogueState::NarrowingCatalog(CatalogAttribute::Category);
        offer(session, replies, state, &title, first_level);
        Ok(Disposition::Keep)
    }

    async fn on_catalog_choice(
        &self,
        session: &mut Session,
        attribute: CatalogAttribute,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let Some(index) = menu_choice(session, text) else {
            return Ok(self.reject(session, replies));
        };
        let Some(mode) = session.answers.measurement_mode else {
            return Ok(self.start(session, replies));
        };

        let filter = self.catalog_filter().await?;
        let value = session.last_menu[index].clone();
        session.answers.catalog.insert(attribute, value);

        match filter.narrow(mode, &session.answers.catalog) {
            Narrowing::Resolved(entry) => Ok(self.select_project(session, replies, entry)),
            Narrowing::NextAttribute { attribute, options } => {
                let title = messages::catalog_title(attribute);
                let state = DialogueState::NarrowingCatalog(attribute);
                offer(session, replies, state, &title, options);
                Ok(Disposition::Keep)
            }
            Narrowing::Ambiguous(candidates) => {
                let labels = candidates.iter().map(|entry| entry.description.clone()).collect();
                session.candidates = candidates;
                let title = messages::candidates_title();
                offer(session, replies, DialogueState::ChoosingCandidate, title, labels);
                Ok(Disposition::Keep)
            }
            Narrowing::Empty => Ok(self.exhausted(session, replies)),
        }
    }

    fn on_candidate(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Disposition {
        let candidate =
            menu_choice(session, text).and_then(|index| session.candidates.get(index).cloned());
        match candidate {
            Some(entry) => self.select_project(session, replies, entry),
            None => self.reject(session, replies),
        }
    }

    fn select_project(
        &self,
        session: &mut Session,
        replies: &mut Vec<String>,
        entry: CatalogEntry,
    ) -> Disposition {
        self.audit.emit(
            AuditEvent::new(
                session.contact.clone(),
                "dialogue.project_resolved",
                AuditCategory::Dialogue,
                AuditOutcome::Success,
            )
            .for_customer(session.customer.name.as_str())
            .with_metadata("project_id", entry.id.0.as_str())
            .with_metadata("formula_id", entry.formula_id.to_string()),
        );
        session.answers.project = Some(entry);
        session.candidates.clear();
        let mode = session.answers.measurement_mode;
        let prompt = messages::field_prompt(MeasurementField::Height, mode);
        ask(session, replies, DialogueState::AwaitingHeight, prompt);
        Disposition::Keep
    }

    fn on_height(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Disposition {
        let Ok(height) = parse_positive_integer(text) else {
            return self.reject(session, replies);
        };
        session.answers.height_mm = Some(height);
        let mode = session.answers.measurement_mode;
        let prompt = messages::field_prompt(MeasurementField::Width, mode);
        ask(session, replies, DialogueState::AwaitingWidth, prompt);
        Disposition::Keep
    }

    async fn on_width(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let Ok(width) = parse_positive_integer(text) else {
            return Ok(self.reject(session, replies));
        };
        let (Some(project), Some(height)) =
            (session.answers.project.clone(), session.answers.height_mm)
        else {
            return Ok(self.start(session, replies));
        };

        let pieces = match self.formulas.compute(project.formula_id, height, width, 1) {
            Ok(pieces) => pieces,
            Err(error) => return Ok(self.formula_failed(session, replies, error)),
        };
        let colors = self.material_filter().await?.colors();

        session.answers.width_mm = Some(width);
        replies.push(messages::piece_breakdown(&project.description, height, width, &pieces));
        session.pending_pieces = pieces;

        if colors.is_empty() {
            return Ok(self.exhausted(session, replies));
        }
        let state = DialogueState::ChoosingMaterialColor;
        offer(session, replies, state, messages::color_title(), colors);
        Ok(Disposition::Keep)
    }

    async fn on_color(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let Some(index) = menu_choice(session, text) else {
            return Ok(self.reject(session, replies));
        };
        let color = session.last_menu[index].clone();
        let thicknesses = self.material_filter().await?.thicknesses(&color);
        if thicknesses.is_empty() {
            return Ok(self.exhausted(session, replies));
        }

        let title = messages::thickness_title(&color);
        session.answers.material.color = Some(color);
        offer(session, replies, DialogueState::ChoosingMaterialThickness, &title, thicknesses);
        Ok(Disposition::Keep)
    }

    async fn on_thickness(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let Some(index) = menu_choice(session, text) else {
            return Ok(self.reject(session, replies));
        };
        let Some(color) = session.answers.material.color.clone() else {
            return Ok(self.start(session, replies));
        };
        let thickness = session.last_menu[index].clone();
        let treatments = self.material_filter().await?.treatments(&color, &thickness);
        if treatments.is_empty() {
            return Ok(self.exhausted(session, replies));
        }

        session.answers.material.thickness = Some(thickness);
        let state = DialogueState::ChoosingTreatment;
        offer(session, replies, state, messages::treatment_title(), treatments);
        Ok(Disposition::Keep)
    }

    async fn on_treatment(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Handled {
        let Some(index) = menu_choice(session, text) else {
            return Ok(self.reject(session, replies));
        };
        let (Some(color), Some(thickness)) =
            (session.answers.material.color.clone(), session.answers.material.thickness.clone())
        else {
            return Ok(self.start(session, replies));
        };
        let treatment = session.last_menu[index].clone();
        let Some(material) =
            self.material_filter().await?.resolve(&color, &thickness, &treatment)
        else {
            return Ok(self.exhausted(session, replies));
        };

        session.answers.material.treatment = Some(treatment);
        session.answers.material.resolved = Some(material);
        let prompt = messages::field_prompt(MeasurementField::Quantity, None);
        ask(session, replies, DialogueState::AwaitingQuantity, prompt);
        Ok(Disposition::Keep)
    }

    fn on_quantity(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Disposition {
        let Ok(units) = parse_positive_integer(text) else {
            return self.reject(session, replies);
        };
        let answers = &session.answers;
        let (Some(project), Some(height), Some(width), Some(material)) = (
            answers.project.clone(),
            answers.height_mm,
            answers.width_mm,
            answers.material.resolved.clone(),
        ) else {
            return self.start(session, replies);
        };
        if session.pending_pieces.is_empty() {
            return self.start(session, replies);
        }

        let Some(pieces) = session
            .pending_pieces
            .iter()
            .map(|piece| piece.times(units))
            .collect::<Option<Vec<_>>>()
        else {
            return self.reject(session, replies);
        };
        let (lines, total) = self.ledger.price(&pieces, material.price_per_m2);
        let sub_order = SubOrder {
            project_id: project.id,
            project_description: project.description,
            material_id: material.id,
            material_description: material.description,
            measurement_mode: project.measurement_mode,
            opening_height_mm: height,
            opening_width_mm: width,
            units,
            lines,
            total,
        };

        self.audit.emit(
            AuditEvent::new(
                session.contact.clone(),
                "pricing.sub_order_priced",
                AuditCategory::Pricing,
                AuditOutcome::Success,
            )
            .for_customer(session.customer.name.as_str())
            .with_metadata("project_id", sub_order.project_id.0.as_str())
            .with_metadata("total", sub_order.total.to_string()),
        );
        replies.push(messages::sub_order_summary(&sub_order));
        session.accumulated_orders.push(sub_order);
        session.reset_configuration();

        let state = DialogueState::AwaitingAddMoreDecision;
        let menu = options(&messages::ADD_MORE_MENU);
        offer(session, replies, state, messages::add_more_title(), menu);
        Disposition::Keep
    }

    fn on_add_more(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
    ) -> Disposition {
        match menu_choice(session, text) {
            Some(0) => {
                session.reset_configuration();
                offer_measurement(session, replies);
                Disposition::Keep
            }
            Some(1) => {
                let prompt = messages::order_name_prompt().to_string();
                ask(session, replies, DialogueState::AwaitingOrderName, prompt);
                Disposition::Keep
            }
            Some(_) => {
                self.record(session, "dialogue.order_cancelled", AuditOutcome::Success);
                replies.push(messages::ORDER_CANCELLED.to_string());
                Disposition::Close
            }
            None => self.reject(session, replies),
        }
    }

    async fn on_order_name(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
        now: DateTime<Utc>,
    ) -> Disposition {
        let Ok(name) = parse_order_name(text) else {
            return self.reject(session, replies);
        };
        if session.accumulated_orders.is_empty() {
            return self.start(session, replies);
        }

        let committed = self
            .ledger
            .commit(&name, &session.customer.id, &session.accumulated_orders, now)
            .await;
        match committed {
            Ok(orders) => {
                self.audit.emit(
                    AuditEvent::new(
                        session.contact.clone(),
                        "persistence.orders_committed",
                        AuditCategory::Persistence,
                        AuditOutcome::Success,
                    )
                    .for_customer(session.customer.name.as_str())
                    .with_metadata("order_name", name.as_str())
                    .with_metadata("order_count", orders.len().to_string()),
                );
                replies.push(messages::order_saved(&name, &orders));
                session.committed = Some(CommittedOrders {
                    name,
                    order_ids: orders.into_iter().map(|order| order.id).collect(),
                });
                session.accumulated_orders.clear();
                let state = DialogueState::AwaitingAuthorizationDecision;
                let menu = options(&messages::AUTHORIZATION_MENU);
                offer(session, replies, state, messages::authorization_title(), menu);
            }
            Err(LedgerError::NameInUse(_)) => {
                replies.push(messages::NAME_IN_USE.to_string());
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.commit_failed",
                    contact_id = %session.contact,
                    order_name = name.as_str(),
                    error = %error,
                    "order commit failed; pending items retained"
                );
                self.audit.emit(
                    AuditEvent::new(
                        session.contact.clone(),
                        "persistence.commit_failed",
                        AuditCategory::Persistence,
                        AuditOutcome::Failed,
                    )
                    .for_customer(session.customer.name.as_str())
                    .with_metadata("error", error.to_string()),
                );
                replies.push(messages::COMMIT_FAILED.to_string());
            }
        }
        Disposition::Keep
    }

    async fn on_authorization(
        &self,
        session: &mut Session,
        text: &str,
        replies: &mut Vec<String>,
        now: DateTime<Utc>,
    ) -> Disposition {
        let Some(choice) = menu_choice(session, text) else {
            return self.reject(session, replies);
        };
        let Some(committed) = session.committed.clone() else {
            return self.start(session, replies);
        };

        let (target, confirmation) = match choice {
            0 => (Some(OrderStatus::Authorized), messages::authorized(&committed.name)),
            1 => (None, messages::kept_as_quote(&committed.name)),
            _ => (Some(OrderStatus::Cancelled), messages::cancelled(&committed.name)),
        };

        let order_ids: Vec<&str> =
            committed.order_ids.iter().map(|id| id.0.as_str()).collect();
        if let Some(status) = target {
            match self.ledger.set_status(&committed.name, status, now).await {
                Ok(change) => {
                    if change == StatusChange::NotFound {
                        warn!(
                            event_name = "dialogue.status_target_missing",
                            contact_id = %session.contact,
                            order_name = committed.name.as_str(),
                            order_ids = %order_ids.join(","),
                            "committed orders not found"
                        );
                    }
                    self.audit.emit(
                        AuditEvent::new(
                            session.contact.clone(),
                            "persistence.status_changed",
                            AuditCategory::Persistence,
                            AuditOutcome::Success,
                        )
                        .for_customer(session.customer.name.as_str())
                        .with_metadata("order_name", committed.name.as_str())
                        .with_metadata("order_ids", order_ids.join(","))
                        .with_metadata("status", status.as_str()),
                    );
                }
                Err(error) => {
                    warn!(
                        event_name = "dialogue.status_change_failed",
                        contact_id = %session.contact,
                        order_name = committed.name.as_str(),
                        error = %error,
                        "order status change failed"
                    );
                    replies.push(messages::STATUS_UPDATE_FAILED.to_string());
                    replies.push(session.last_prompt.clone());
                    return Disposition::Keep;
                }
            }
        }

        replies.push(confirmation);
        replies.push(messages::FAREWELL.to_string());
        Disposition::Close
    }
}

/// Index of the option the reply selects from the last menu.
fn menu_choice(session: &Session, text: &str) -> Option<usize> {
    parse_menu_choice(text, session.last_menu.len()).ok()
}

fn offer(
    session: &mut Session,
    replies: &mut Vec<String>,
    state: DialogueState,
    title: &str,
    options: Vec<String>,
) {
    let prompt = render_menu(title, &options);
    replies.push(prompt.clone());
    session.show_menu(state, prompt, options);
}

fn ask(session: &mut Session, replies: &mut Vec<String>, state: DialogueState, prompt: String) {
    replies.push(prompt.clone());
    session.ask(state, prompt);
}

fn offer_measurement(session: &mut Session, replies: &mut Vec<String>) {
    let state = DialogueState::ChoosingMeasurementMode;
    let menu = options(&messages::MEASUREMENT_MENU);
    offer(session, replies, state, messages::measurement_title(), menu);
}
