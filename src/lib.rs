//! FormPilot: scan an uncontrolled web form into canonical field
//! descriptors, then execute an externally produced fill plan against it
//! with human-like pacing, verification and idempotence tracking.
//!
//! The workspace splits along the pipeline: [`page`] is the DOM boundary,
//! [`scanner`] classifies controls, [`locator`] re-finds them, [`interact`]
//! drives them, [`verify`] confirms outcomes, and [`flow`] orchestrates a
//! whole plan. This crate re-exports the surface most callers need.

pub use formpilot_core_types as types;
pub use formpilot_field_locator as locator;
pub use formpilot_field_scanner as scanner;
pub use formpilot_fill_flow as flow;
pub use formpilot_fill_interact as interact;
pub use formpilot_fill_verify as verify;
pub use formpilot_page_port as page;

pub use formpilot_core_types::{
    ControlType, CurrentValue, FieldDescriptor, FieldId, FieldOption, FillAction, FillPlanItem,
    FillValue, SelectorHints, SemanticHint,
};
pub use formpilot_field_scanner::{ScanConfig, Scanner};
pub use formpilot_fill_flow::{
    FillEngine, FillEvent, FlowError, FlowPolicy, SkipReason,
};
pub use formpilot_fill_interact::{HumanTempo, TempoPort, ZeroTempo};
pub use formpilot_page_port::{MemoryPage, NodeSpec, PageFixture, PagePort};
