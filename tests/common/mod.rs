//! Shared test doubles for the integration suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use formpilot::interact::{PausePoint, TempoPort};

type Trigger = Box<dyn FnOnce() + Send>;

/// Zero-delay tempo that fires a one-shot callback when the n-th
/// inter-item pause is reached. Lets a test flip engine or page state at a
/// precise point of the run without wall-clock waits.
pub struct TriggerTempo {
    fire_at: usize,
    inter_items: AtomicUsize,
    trigger: Mutex<Option<Trigger>>,
}

impl TriggerTempo {
    pub fn new(fire_at_inter_item: usize) -> Self {
        Self {
            fire_at: fire_at_inter_item,
            inter_items: AtomicUsize::new(0),
            trigger: Mutex::new(None),
        }
    }

    pub fn on_trigger(&self, f: impl FnOnce() + Send + 'static) {
        *self.trigger.lock().unwrap() = Some(Box::new(f));
    }
}

#[async_trait]
impl TempoPort for TriggerTempo {
    async fn pause(&self, point: PausePoint) {
        if point == PausePoint::InterItem {
            let n = self.inter_items.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fire_at {
                if let Some(f) = self.trigger.lock().unwrap().take() {
                    f();
                }
            }
        }
        tokio::task::yield_now().await;
    }
}
