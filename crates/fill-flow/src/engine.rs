//! The fill engine: one cooperative async loop over the plan.
//!
//! No two plan items ever run concurrently; pause is checked between items,
//! never mid-item. Shared flags (pause, captcha, running) are atomics so an
//! observer or a background poll can set them from another task, while plan
//! and tracker state stay behind one mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use formpilot_core_types::{FieldDescriptor, FillPlanItem};
use formpilot_field_scanner::Scanner;
use formpilot_fill_interact::{PausePoint, TempoPort};
use formpilot_page_port::PagePort;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::captcha::captcha_present;
use crate::errors::FlowError;
use crate::events::{FillBus, FillEvent, SkipReason};
use crate::executor::{run_item, StepDisposition};
use crate::policy::FlowPolicy;
use crate::tracker::FillTracker;

struct EngineState {
    fields: Vec<FieldDescriptor>,
    plan: Vec<FillPlanItem>,
    cursor: usize,
    tracker: FillTracker,
}

pub struct FillEngine {
    page: Arc<dyn PagePort>,
    tempo: Arc<dyn TempoPort>,
    policy: FlowPolicy,
    bus: FillBus,
    running: AtomicBool,
    paused: AtomicBool,
    captcha_seen: AtomicBool,
    state: Mutex<EngineState>,
}

impl FillEngine {
    pub fn new(page: Arc<dyn PagePort>, tempo: Arc<dyn TempoPort>, policy: FlowPolicy) -> Self {
        Self {
            page,
            tempo,
            policy,
            bus: FillBus::default(),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            captcha_seen: AtomicBool::new(false),
            state: Mutex::new(EngineState {
                fields: Vec::new(),
                plan: Vec::new(),
                cursor: 0,
                tracker: FillTracker::new(String::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FillEvent> {
        self.bus.subscribe()
    }

    /// Scan the page and remember the result for later plan execution.
    pub async fn scan_page(&self) -> Result<Vec<FieldDescriptor>, FlowError> {
        let fields = Scanner::with_config(&*self.page, self.policy.scan_config())
            .scan()
            .await?;
        self.state.lock().fields = fields.clone();
        Ok(fields)
    }

    /// Re-scan after the page mutated (widget hydration, conditional
    /// questions) and replace the stored descriptors.
    pub async fn refresh_metadata(&self) -> Result<Vec<FieldDescriptor>, FlowError> {
        debug!("refreshing field metadata");
        self.scan_page().await
    }

    /// On-demand probe. Works regardless of whether periodic polling is
    /// enabled in the policy.
    pub async fn detect_captcha(&self) -> Result<bool, FlowError> {
        Ok(captcha_present(&*self.page).await?)
    }

    /// Cooperative: an in-flight item finishes before the pause lands.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Execute a plan. Rejects with [`FlowError::Busy`] while a run is in
    /// flight; nothing is queued.
    #[instrument(skip_all, fields(items = plan.len()))]
    pub async fn start_filling(
        &self,
        plan: Vec<FillPlanItem>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<(), FlowError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("rejected start while a run is in progress");
            return Err(FlowError::Busy);
        }
        self.paused.store(false, Ordering::SeqCst);
        self.captcha_seen.store(false, Ordering::SeqCst);

        let url = match self.page.url().await {
            Ok(url) => url,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        let items = plan.len();
        {
            let mut state = self.state.lock();
            state.tracker.reset_if_navigated(&url);
            if !fields.is_empty() {
                state.fields = fields;
            }
            state.plan = plan;
            state.cursor = 0;
        }
        info!(items, "fill run starting");
        self.bus.emit(FillEvent::FillStarted {
            mode: "plan".into(),
            items,
        });
        self.run_loop().await
    }

    /// Re-enter the loop on the remaining items. Safe to call after the
    /// plan completed; it simply emits `complete` again. Resuming with the
    /// full original plan is equally safe because the tracker skips
    /// everything already applied.
    pub async fn resume(&self) -> Result<(), FlowError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(FlowError::Busy);
        }
        self.paused.store(false, Ordering::SeqCst);
        self.captcha_seen.store(false, Ordering::SeqCst);
        debug!("resuming fill run");
        self.run_loop().await
    }

    async fn run_loop(&self) -> Result<(), FlowError> {
        loop {
            let next = {
                let state = self.state.lock();
                state.plan.get(state.cursor).cloned().map(|item| (item, state.cursor))
            };
            let Some((item, index)) = next else {
                self.bus.emit(FillEvent::Complete);
                self.running.store(false, Ordering::SeqCst);
                info!("fill run complete");
                return Ok(());
            };

            if self.paused.load(Ordering::SeqCst) {
                self.bus.emit(FillEvent::Paused { at: index });
                self.running.store(false, Ordering::SeqCst);
                info!(at = index, "fill run paused");
                return Ok(());
            }

            let captcha = self.captcha_seen.load(Ordering::SeqCst)
                || (self.policy.captcha.enabled && captcha_present(&*self.page).await?);
            if captcha {
                self.paused.store(true, Ordering::SeqCst);
                self.bus.emit(FillEvent::CaptchaDetected);
                self.running.store(false, Ordering::SeqCst);
                warn!(at = index, "fill run suspended on captcha");
                return Ok(());
            }

            let already_done = {
                let state = self.state.lock();
                state
                    .tracker
                    .should_skip(&item.field_id, item.action, &item.value, item.multi)
            };
            if already_done {
                self.bus.emit(FillEvent::Skipped {
                    field: item.field_id.clone(),
                    reason: SkipReason::AlreadyFilled,
                });
                self.state.lock().cursor += 1;
                continue;
            }

            self.bus.emit(FillEvent::Filling {
                field: item.field_id.clone(),
                action: item.action,
            });

            let fields = self.state.lock().fields.clone();
            let step = match run_item(&*self.page, &*self.tempo, &fields, &item).await {
                Ok(step) => step,
                Err(e) => StepDisposition::Failed(e.into()),
            };
            self.settle_item(&item, step);

            self.state.lock().cursor += 1;
            self.tempo.pause(PausePoint::InterItem).await;
        }
    }

    fn settle_item(&self, item: &FillPlanItem, step: StepDisposition) {
        match step {
            StepDisposition::Filled { fallback } => {
                if let Some(fb) = fallback {
                    self.bus.emit(FillEvent::SelectFallback {
                        field: item.field_id.clone(),
                        requested: fb.requested,
                        chosen: fb.chosen,
                    });
                }
                self.record(item, true);
                self.bus.emit(FillEvent::Filled {
                    field: item.field_id.clone(),
                });
            }
            StepDisposition::AlreadyCorrect => {
                self.record(item, true);
                self.bus.emit(FillEvent::Skipped {
                    field: item.field_id.clone(),
                    reason: SkipReason::AlreadyCorrect,
                });
            }
            StepDisposition::UploadNeeded => {
                self.bus.emit(FillEvent::UploadNeeded {
                    field: item.field_id.clone(),
                });
            }
            StepDisposition::SkipRequested => {
                debug!(field = %item.field_id, "item skipped by plan");
            }
            StepDisposition::Failed(error) => {
                self.record(item, false);
                match &error {
                    FlowError::ElementNotFound { field, action } => {
                        self.bus.emit(FillEvent::ElementNotFound {
                            field: field.clone(),
                            action: *action,
                        });
                    }
                    _ => {
                        self.bus.emit(FillEvent::Error {
                            field: item.field_id.clone(),
                            error: error.to_string(),
                        });
                    }
                }
                warn!(field = %item.field_id, %error, "plan item failed");
            }
        }
    }

    fn record(&self, item: &FillPlanItem, success: bool) {
        self.state.lock().tracker.record(
            &item.field_id,
            item.action,
            &item.value,
            success,
            item.multi,
        );
    }

    /// Background CAPTCHA poll. Spawning it is the opt-in; it only sets
    /// shared flags and never touches plan or page state. Abort the handle
    /// to stop it.
    pub fn spawn_captcha_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let interval = engine.policy.captcha_poll_interval();
            loop {
                tokio::time::sleep(interval).await;
                match captcha_present(&*engine.page).await {
                    Ok(true) => {
                        warn!("captcha appeared; pausing");
                        engine.captcha_seen.store(true, Ordering::SeqCst);
                        engine.paused.store(true, Ordering::SeqCst);
                    }
                    Ok(false) => {}
                    Err(e) => debug!(error = %e, "captcha poll failed"),
                }
            }
        })
    }
}
