//! Plan orchestration: the fill engine, its event stream, the idempotence
//! tracker, CAPTCHA suspension and runtime policy.

pub mod captcha;
pub mod engine;
pub mod errors;
pub mod events;
pub mod executor;
pub mod policy;
pub mod tracker;

pub use captcha::captcha_present;
pub use engine::FillEngine;
pub use errors::FlowError;
pub use events::{FillBus, FillEvent, SkipReason};
pub use executor::{run_item, Fallback, StepDisposition};
pub use policy::{CaptchaPolicy, FlowPolicy, ScanPolicy, TempoPolicy};
pub use tracker::{FillTracker, TrackerEntry};
