//! Engine configuration: pacing bounds, CAPTCHA polling, scan behavior.
//! Loadable from YAML; every knob has a default matching production use.

use std::time::Duration;

use formpilot_field_scanner::ScanConfig;
use formpilot_fill_interact::HumanTempo;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoPolicy {
    pub focus_ms: (u64, u64),
    pub keystroke_ms: (u64, u64),
    pub menu_settle_ms: (u64, u64),
    pub inter_item_ms: (u64, u64),
}

impl Default for TempoPolicy {
    fn default() -> Self {
        let tempo = HumanTempo::default();
        Self {
            focus_ms: tempo.focus_ms,
            keystroke_ms: tempo.keystroke_ms,
            menu_settle_ms: tempo.menu_settle_ms,
            inter_item_ms: tempo.inter_item_ms,
        }
    }
}

impl TempoPolicy {
    pub fn to_tempo(&self) -> HumanTempo {
        HumanTempo {
            focus_ms: self.focus_ms,
            keystroke_ms: self.keystroke_ms,
            menu_settle_ms: self.menu_settle_ms,
            inter_item_ms: self.inter_item_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaPolicy {
    /// Periodic probing is off by default; the on-demand probe always works.
    pub enabled: bool,
    pub poll_ms: u64,
}

impl Default for CaptchaPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_ms: 2000,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowPolicy {
    pub tempo: TempoPolicy,
    pub captcha: CaptchaPolicy,
    pub scan: ScanPolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPolicy {
    pub discover_menu_options: bool,
    pub settle_ms: u64,
    pub max_options: usize,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        let config = ScanConfig::default();
        Self {
            discover_menu_options: config.discover_menu_options,
            settle_ms: config.settle.as_millis() as u64,
            max_options: config.max_options,
        }
    }
}

impl FlowPolicy {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            discover_menu_options: self.scan.discover_menu_options,
            settle: Duration::from_millis(self.scan.settle_ms),
            max_options: self.scan.max_options,
        }
    }

    pub fn captcha_poll_interval(&self) -> Duration {
        Duration::from_millis(self.captcha.poll_ms)
    }
}
