use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogAttribute;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    Initial,
    ChoosingService,
    ChoosingMeasurementMode,
    NarrowingCatalog(CatalogAttribute),
    ChoosingCandidate,
    AwaitingHeight,
    AwaitingWidth,
    ChoosingMaterialColor,
    ChoosingMaterialThickness,
    ChoosingTreatment,
    AwaitingQuantity,
    AwaitingAddMoreDecision,
    AwaitingOrderName,
    AwaitingAuthorizationDecision,
    Closed,
}

/// Free-form numeric fields, each with its own re-ask message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementField {
    Height,
    Width,
    Quantity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedInput {
    MenuChoice,
    Measurement(MeasurementField),
    FreeText,
    Nothing,
}

impl DialogueState {
    pub fn expected_input(&self) -> ExpectedInput {
        match self {
            Self::ChoosingService
            | Self::ChoosingMeasurementMode
            | Self::NarrowingCatalog(_)
            | Self::ChoosingCandidate
            | Self::ChoosingMaterialColor
            | Self::ChoosingMaterialThickness
            | Self::ChoosingTreatment
            | Self::AwaitingAddMoreDecision
            | Self::AwaitingAuthorizationDecision => ExpectedInput::MenuChoice,
            Self::AwaitingHeight => ExpectedInput::Measurement(MeasurementField::Height),
            Self::AwaitingWidth => ExpectedInput::Measurement(MeasurementField::Width),
            Self::AwaitingQuantity => ExpectedInput::Measurement(MeasurementField::Quantity),
            Self::AwaitingOrderName => ExpectedInput::FreeText,
            Self::Initial | Self::Closed => ExpectedInput::Nothing,
        }
    }

    /// `Initial` and `Closed` have no suspended variant.
    pub fn can_suspend(&self) -> bool {
        !matches!(self, Self::Initial | Self::Closed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ChoosingService => "choosing_service",
            Self::ChoosingMeasurementMode => "choosing_measurement_mode",
            Self::NarrowingCatalog(CatalogAttribute::Category) => "narrowing_catalog_1",
            Self::NarrowingCatalog(CatalogAttribute::Line) => "narrowing_catalog_2",
            Self::NarrowingCatalog(CatalogAttribute::Model) => "narrowing_catalog_3",
            Self::NarrowingCatalog(CatalogAttribute::Finish) => "narrowing_catalog_4",
            Self::ChoosingCandidate => "choosing_candidate",
            Self::AwaitingHeight => "awaiting_height",
            Self::AwaitingWidth => "awaiting_width",
            Self::ChoosingMaterialColor => "choosing_material_color",
            Self::ChoosingMaterialThickness => "choosing_material_thickness",
            Self::ChoosingTreatment => "choosing_treatment",
            Self::AwaitingQuantity => "awaiting_quantity",
            Self::AwaitingAddMoreDecision => "awaiting_add_more_decision",
            Self::AwaitingOrderName => "awaiting_order_name",
            Self::AwaitingAuthorizationDecision => "awaiting_authorization_decision",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Session state as seen by the dialogue engine and the inactivity supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Active(DialogueState),
    Suspended(DialogueState),
}

impl SessionPhase {
    pub fn state(&self) -> DialogueState {
        match self {
            Self::Active(state) | Self::Suspended(state) => *state,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }

    /// Returns the suspended phase, or `None` when the state has no suspended variant or is
    /// already suspended.
    pub fn suspended(&self) -> Option<Self> {
        match self {
            Self::Active(state) if state.can_suspend() => Some(Self::Suspended(*state)),
            _ => None,
        }
    }

    pub fn resumed(&self) -> Self {
        Self::Active(self.state())
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Active(DialogueState::Initial)
    }
}

#[cfg(test)]
mod tests {
    use super::{DialogueState, ExpectedInput, MeasurementField, SessionPhase};
    use crate::domain::catalog::CatalogAttribute;

    #[test]
    fn suspension_wraps_and_restores_the_original_state() {
        let phase = SessionPhase::Active(DialogueState::NarrowingCatalog(CatalogAttribute::Model));
        let suspended = phase.suspended().expect("narrowing can be suspended");

        assert!(suspended.is_suspended());
        assert_eq!(suspended.state(), DialogueState::NarrowingCatalog(CatalogAttribute::Model));
        assert_eq!(suspended.resumed(), phase);
    }

    #[test]
    fn initial_closed_and_suspended_phases_cannot_be_suspended_again() {
        assert_eq!(SessionPhase::Active(DialogueState::Initial).suspended(), None);
        assert_eq!(SessionPhase::Active(DialogueState::Closed).suspended(), None);
        assert_eq!(SessionPhase::Suspended(DialogueState::AwaitingHeight).suspended(), None);
    }

    #[test]
    fn measurement_states_expect_numeric_fields() {
        assert_eq!(
            DialogueState::AwaitingWidth.expected_input(),
            ExpectedInput::Measurement(MeasurementField::Width)
        );
        assert_eq!(DialogueState::ChoosingTreatment.expected_input(), ExpectedInput::MenuChoice);
        assert_eq!(DialogueState::AwaitingOrderName.expected_input(), ExpectedInput::FreeText);
    }
}
