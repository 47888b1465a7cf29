//! Interaction primitives: one simulator per control family, each firing
//! the event sequence a page's own scripts expect from a real user.

pub mod gestures;
pub mod interactor;
pub mod tempo;

pub use gestures::real_click;
pub use interactor::{InteractOutcome, Interactor};
pub use tempo::{HumanTempo, PausePoint, TempoPort, ZeroTempo};
