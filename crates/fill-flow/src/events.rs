//! The closed set of progress events the engine pushes to observers.

use formpilot_core_types::{FieldId, FillAction};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The tracker holds a prior successful application of this exact key.
    AlreadyFilled,
    /// The control already displays the intended value; nothing was done.
    AlreadyCorrect,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FillEvent {
    FillStarted {
        mode: String,
        items: usize,
    },
    Filling {
        field: FieldId,
        action: FillAction,
    },
    Filled {
        field: FieldId,
    },
    Skipped {
        field: FieldId,
        reason: SkipReason,
    },
    /// A menu pick landed on a non-exact tier; observers may want to show
    /// what was actually chosen.
    SelectFallback {
        field: FieldId,
        requested: String,
        chosen: String,
    },
    ElementNotFound {
        field: FieldId,
        action: FillAction,
    },
    /// Upload actions are delegated; the engine announces and moves on.
    UploadNeeded {
        field: FieldId,
    },
    Error {
        field: FieldId,
        error: String,
    },
    CaptchaDetected,
    Paused {
        at: usize,
    },
    Complete,
}

/// Broadcast fan-out for fill events. Lagging or absent subscribers never
/// block the engine.
pub struct FillBus {
    tx: broadcast::Sender<FillEvent>,
}

impl FillBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FillEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: FillEvent) {
        // Send fails only when nobody is listening; that is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for FillBus {
    fn default() -> Self {
        Self::new(256)
    }
}
