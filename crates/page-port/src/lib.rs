//! Boundary between the fill engine and whatever renders the page.
//!
//! The engine never touches a live browser directly; everything goes through
//! the [`PagePort`] trait. `MemoryPage` is an in-memory implementation
//! suitable for unit tests, integration tests and the CLI fixtures.

pub mod errors;
pub mod memory;
pub mod model;
pub mod ports;
pub mod selector;
pub mod visible;

pub use errors::PageError;
pub use memory::{MemoryPage, NodeSpec, PageFixture};
pub use model::{DomEvent, ElementSnapshot, NodeId, OptionSnapshot, Rect, StyleSnapshot};
pub use ports::PagePort;
pub use visible::is_visible;
