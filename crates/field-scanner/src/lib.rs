//! Page scanning: find the interactive controls of an uncontrolled form and
//! describe each one canonically (control family, label, options, locator
//! hints, semantic hint).
//!
//! The scanner never changes form state, with one bounded exception: option
//! discovery for a custom menu may open and re-close the menu when nothing
//! is passively visible (see [`options`]).

pub mod classify;
pub mod hints;
pub mod label;
pub mod options;
pub mod scanner;
pub mod selectors;

pub use classify::{classify, menu_like, question_container};
pub use scanner::{ScanConfig, Scanner};
