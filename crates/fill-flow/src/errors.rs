//! Flow-level error taxonomy. Everything except `Busy` is field-scoped and
//! non-fatal: the loop reports it and moves to the next plan item.

use formpilot_core_types::{FieldId, FillAction};
use formpilot_page_port::PageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no resolvable element for field '{field}' ({})", action.label())]
    ElementNotFound { field: FieldId, action: FillAction },

    #[error("no option matched '{requested}' for field '{field}'")]
    OptionNotMatched { field: FieldId, requested: String },

    #[error("field '{field}' did not take the value '{requested}'")]
    VerificationFailed { field: FieldId, requested: String },

    #[error("action {} is not valid for field '{field}'", action.label())]
    UnsupportedAction { field: FieldId, action: FillAction },

    #[error("a fill run is already in progress")]
    Busy,

    #[error(transparent)]
    Page(#[from] PageError),
}

impl FlowError {
    /// Field-scoped errors are reported per item and never abort the run.
    pub fn is_field_scoped(&self) -> bool {
        !matches!(self, FlowError::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_busy_aborts_a_call() {
        let e = FlowError::ElementNotFound {
            field: FieldId::new("email"),
            action: FillAction::Type,
        };
        assert!(e.is_field_scoped());
        assert!(!FlowError::Busy.is_field_scoped());
    }
}
