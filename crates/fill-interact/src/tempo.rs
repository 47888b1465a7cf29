//! Pacing. Every wall-clock wait in the engine routes through one port so
//! tests swap in a zero tempo and never sleep.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Named suspension points of the fill loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PausePoint {
    /// After focusing a control, before acting on it.
    FocusSettle,
    /// Between appended characters while typing.
    Keystroke,
    /// After opening a menu, before reading rendered options.
    MenuSettle,
    /// Between plan items.
    InterItem,
}

#[async_trait]
pub trait TempoPort: Send + Sync {
    async fn pause(&self, point: PausePoint);
}

/// Randomized human-ish delays, bounds in milliseconds.
#[derive(Clone, Debug)]
pub struct HumanTempo {
    pub focus_ms: (u64, u64),
    pub keystroke_ms: (u64, u64),
    pub menu_settle_ms: (u64, u64),
    pub inter_item_ms: (u64, u64),
}

impl Default for HumanTempo {
    fn default() -> Self {
        Self {
            focus_ms: (100, 300),
            keystroke_ms: (50, 150),
            menu_settle_ms: (200, 300),
            inter_item_ms: (300, 800),
        }
    }
}

impl HumanTempo {
    fn bounds(&self, point: PausePoint) -> (u64, u64) {
        match point {
            PausePoint::FocusSettle => self.focus_ms,
            PausePoint::Keystroke => self.keystroke_ms,
            PausePoint::MenuSettle => self.menu_settle_ms,
            PausePoint::InterItem => self.inter_item_ms,
        }
    }
}

#[async_trait]
impl TempoPort for HumanTempo {
    async fn pause(&self, point: PausePoint) {
        let (lo, hi) = self.bounds(point);
        // Draw before the await; the rng is not Send.
        let ms = if hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            lo
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// No waiting, but still a scheduler yield so concurrent test tasks can
/// interleave at every named suspension point.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroTempo;

#[async_trait]
impl TempoPort for ZeroTempo {
    async fn pause(&self, _point: PausePoint) {
        tokio::task::yield_now().await;
    }
}
