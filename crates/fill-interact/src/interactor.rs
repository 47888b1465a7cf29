//! One simulator per control family.
//!
//! Every primitive reports success or failure through [`InteractOutcome`]
//! instead of erroring: "no option matched" is an expected condition the
//! flow layer turns into a field-scoped event, not a fault.

use formpilot_core_types::{normalize_ws, FillValue};
use formpilot_fill_verify::{fuzzy_match, pick_best, Candidate, MatchTier};
use formpilot_page_port::{is_visible, DomEvent, NodeId, PageError, PagePort};
use tracing::{debug, trace};

use crate::gestures::real_click;
use crate::tempo::{PausePoint, TempoPort};

const OPTION_SELECTOR: &str =
    "[role=\"option\"], [role=\"menuitem\"], [role=\"menuitemradio\"], li";
const CONTAINER_SELECTOR: &str =
    "fieldset, [class*=\"question\"], [data-testid*=\"question\"], [data-qa*=\"question\"]";
const CHIP_SELECTOR: &str = "[class*=\"chip\"], [class*=\"tag\"], [class*=\"multi-value\"]";
const CHIP_REMOVE_SELECTOR: &str =
    "[class*=\"remove\"], [aria-label*=\"Remove\"], [aria-label*=\"remove\"], button";

/// What an interaction did, for events and logs. `strategy` names which
/// approach landed; `chosen`/`tier` are set for menu picks.
#[derive(Clone, Debug)]
pub struct InteractOutcome {
    pub ok: bool,
    pub strategy: &'static str,
    pub chosen: Option<String>,
    pub tier: Option<MatchTier>,
    pub detail: Option<String>,
}

impl InteractOutcome {
    fn ok(strategy: &'static str) -> Self {
        Self {
            ok: true,
            strategy,
            chosen: None,
            tier: None,
            detail: None,
        }
    }

    fn chose(strategy: &'static str, chosen: String, tier: MatchTier) -> Self {
        Self {
            ok: true,
            strategy,
            chosen: Some(chosen),
            tier: Some(tier),
            detail: None,
        }
    }

    fn failed(strategy: &'static str, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            strategy,
            chosen: None,
            tier: None,
            detail: Some(detail.into()),
        }
    }
}

pub struct Interactor<'a> {
    page: &'a dyn PagePort,
    tempo: &'a dyn TempoPort,
}

impl<'a> Interactor<'a> {
    pub fn new(page: &'a dyn PagePort, tempo: &'a dyn TempoPort) -> Self {
        Self { page, tempo }
    }

    /// Focus, clear, then append the text character by character with an
    /// `input` event per keystroke, the way pages with controlled inputs
    /// expect to observe typing.
    pub async fn type_text(&self, node: NodeId, text: &str) -> Result<InteractOutcome, PageError> {
        self.page.dispatch(node, DomEvent::Focus).await?;
        self.tempo.pause(PausePoint::FocusSettle).await;

        self.page.set_value(node, "").await?;
        self.page.dispatch(node, DomEvent::Input).await?;

        let mut buffer = String::with_capacity(text.len());
        for ch in text.chars() {
            buffer.push(ch);
            self.page.set_value(node, &buffer).await?;
            self.page.dispatch(node, DomEvent::Input).await?;
            self.tempo.pause(PausePoint::Keystroke).await;
        }

        self.page.dispatch(node, DomEvent::Change).await?;
        self.page.dispatch(node, DomEvent::Blur).await?;
        Ok(InteractOutcome::ok("typed"))
    }

    /// Content-editable surfaces take their text in one shot; per-character
    /// value writes do not apply to them.
    pub async fn fill_rich_text(
        &self,
        node: NodeId,
        text: &str,
    ) -> Result<InteractOutcome, PageError> {
        self.page.dispatch(node, DomEvent::Focus).await?;
        self.tempo.pause(PausePoint::FocusSettle).await;
        self.page.set_inner_text(node, "").await?;
        self.page.dispatch(node, DomEvent::Input).await?;
        self.page.set_inner_text(node, text).await?;
        self.page.dispatch(node, DomEvent::Input).await?;
        self.page.dispatch(node, DomEvent::Change).await?;
        self.page.dispatch(node, DomEvent::Blur).await?;
        Ok(InteractOutcome::ok("rich-text"))
    }

    pub async fn select_native(
        &self,
        node: NodeId,
        requested: &str,
    ) -> Result<InteractOutcome, PageError> {
        self.page.dispatch(node, DomEvent::Focus).await?;
        real_click(self.page, node).await?;
        self.tempo.pause(PausePoint::MenuSettle).await;

        let candidates: Vec<Candidate> = self
            .page
            .select_options(node)
            .await?
            .into_iter()
            .map(|o| Candidate::new(o.index, o.value, o.text))
            .collect();
        let Some((index, tier)) = pick_best(requested, &candidates) else {
            real_click(self.page, node).await?;
            self.page.dispatch(node, DomEvent::Blur).await?;
            return Ok(InteractOutcome::failed("native-select", "no option matched"));
        };

        self.page.set_option_selected(node, index, true).await?;
        self.page.dispatch(node, DomEvent::Change).await?;
        self.page.dispatch(node, DomEvent::Input).await?;
        real_click(self.page, node).await?;
        self.page.dispatch(node, DomEvent::Blur).await?;

        let chosen = candidates
            .into_iter()
            .find(|c| c.index == index)
            .map(|c| c.text)
            .unwrap_or_default();
        Ok(InteractOutcome::chose("native-select", chosen, tier))
    }

    pub async fn select_native_multi(
        &self,
        node: NodeId,
        requested: &[String],
    ) -> Result<InteractOutcome, PageError> {
        let candidates: Vec<Candidate> = self
            .page
            .select_options(node)
            .await?
            .into_iter()
            .map(|o| Candidate::new(o.index, o.value, o.text))
            .collect();

        let mut chosen = Vec::new();
        let mut missed = Vec::new();
        for value in requested {
            match pick_best(value, &candidates) {
                Some((index, _tier)) => {
                    self.page.set_option_selected(node, index, true).await?;
                    if let Some(c) = candidates.iter().find(|c| c.index == index) {
                        chosen.push(c.text.clone());
                    }
                }
                None => missed.push(value.clone()),
            }
        }
        self.page.dispatch(node, DomEvent::Change).await?;
        self.page.dispatch(node, DomEvent::Input).await?;

        if missed.is_empty() {
            let mut outcome = InteractOutcome::ok("native-multi");
            outcome.chosen = Some(chosen.join(", "));
            Ok(outcome)
        } else {
            Ok(InteractOutcome::failed(
                "native-multi",
                format!("unmatched values: {}", missed.join(", ")),
            ))
        }
    }

    pub async fn select_custom(
        &self,
        node: NodeId,
        requested: &str,
    ) -> Result<InteractOutcome, PageError> {
        // Strategy 1: some widgets keep their options mounted; pick without
        // opening anything.
        let passive_scope = self.question_container(node).await?;
        if let Some(scope) = passive_scope {
            let options = self.visible_options(Some(scope)).await?;
            if let Some((option_node, text, tier)) = best_of(requested, &options) {
                trace!(%requested, chosen = %text, "passive custom-select hit");
                return self
                    .commit_custom_choice(node, option_node, text, tier, "visible-options")
                    .await;
            }
        }

        // Strategy 2: open the menu, wait for it to render, read it.
        self.page.dispatch(node, DomEvent::Focus).await?;
        self.tempo.pause(PausePoint::FocusSettle).await;
        let snap = self.page.snapshot(node).await?;
        if snap.tag == "input" && !snap.value.is_empty() {
            // Clear any typed filter so the full option list renders.
            self.page.set_value(node, "").await?;
            self.page.dispatch(node, DomEvent::Input).await?;
        }
        real_click(self.page, node).await?;
        self.page.dispatch(node, DomEvent::key_down("ArrowDown")).await?;
        self.tempo.pause(PausePoint::MenuSettle).await;

        let scope = self.option_scope(node).await?;
        let options = self.visible_options(scope).await?;
        let Some((option_node, text, tier)) = best_of(requested, &options) else {
            self.page.dispatch(node, DomEvent::key_down("Escape")).await?;
            self.page.dispatch(node, DomEvent::Blur).await?;
            debug!(%requested, options = options.len(), "custom select found no match");
            return Ok(InteractOutcome::failed("open-menu", "no option matched"));
        };
        self.commit_custom_choice(node, option_node, text, tier, "open-menu")
            .await
    }

    async fn commit_custom_choice(
        &self,
        control: NodeId,
        option: NodeId,
        text: String,
        tier: MatchTier,
        strategy: &'static str,
    ) -> Result<InteractOutcome, PageError> {
        self.page.scroll_into_view(option).await?;
        real_click(self.page, option).await?;

        // Widgets that expose a settable backing input get the value written
        // if their own click handler did not already do it.
        let snap = self.page.snapshot(control).await?;
        if snap.tag == "input" && snap.value.is_empty() {
            self.page.set_value(control, &text).await?;
        }
        self.page.dispatch(control, DomEvent::Input).await?;
        self.page.dispatch(control, DomEvent::Change).await?;
        self.page.dispatch(control, DomEvent::Blur).await?;
        Ok(InteractOutcome::chose(strategy, text, tier))
    }

    /// Multi-select: drop chips that conflict with the requested set, then
    /// run the single-select sequence once per requested value.
    pub async fn select_custom_multi(
        &self,
        node: NodeId,
        requested: &[String],
    ) -> Result<InteractOutcome, PageError> {
        self.remove_conflicting_chips(node, requested).await?;

        let mut chosen = Vec::new();
        for value in requested {
            let outcome = self.select_custom(node, value).await?;
            if !outcome.ok {
                return Ok(InteractOutcome::failed(
                    "custom-multi",
                    format!("no option matched '{value}'"),
                ));
            }
            if let Some(text) = outcome.chosen {
                chosen.push(text);
            }
            // On multi widgets the input is a filter box; a committed pick
            // lives in its chip, not here.
            let snap = self.page.snapshot(node).await?;
            if snap.tag == "input" && !snap.value.is_empty() {
                self.page.set_value(node, "").await?;
                self.page.dispatch(node, DomEvent::Input).await?;
            }
        }
        let mut outcome = InteractOutcome::ok("custom-multi");
        outcome.chosen = Some(chosen.join(", "));
        Ok(outcome)
    }

    async fn remove_conflicting_chips(
        &self,
        node: NodeId,
        requested: &[String],
    ) -> Result<(), PageError> {
        let Some(scope) = self.question_container(node).await? else {
            return Ok(());
        };
        for chip in self.page.query(Some(scope), CHIP_SELECTOR).await? {
            let snap = match self.page.snapshot(chip).await {
                Ok(snap) => snap,
                // A previous removal can detach nested chip markup.
                Err(PageError::UnknownNode(_)) => continue,
                Err(e) => return Err(e),
            };
            if !is_visible(&snap) {
                continue;
            }
            let text = normalize_ws(&snap.text);
            if text.is_empty() {
                continue;
            }
            let keeps = requested.iter().any(|v| fuzzy_match(v, &text).is_some());
            if keeps {
                continue;
            }
            if let Some(remove) = self
                .page
                .query(Some(chip), CHIP_REMOVE_SELECTOR)
                .await?
                .first()
            {
                debug!(chip = %text, "removing conflicting selection");
                real_click(self.page, *remove).await?;
            }
        }
        Ok(())
    }

    /// No-op when the state already matches; a user would not click.
    pub async fn set_checkbox(
        &self,
        node: NodeId,
        want: bool,
    ) -> Result<InteractOutcome, PageError> {
        let snap = self.page.snapshot(node).await?;
        if snap.checked == want {
            return Ok(InteractOutcome::ok("noop"));
        }
        self.page.dispatch(node, DomEvent::Focus).await?;
        self.tempo.pause(PausePoint::FocusSettle).await;
        real_click(self.page, node).await?;
        self.page.dispatch(node, DomEvent::Change).await?;
        self.page.dispatch(node, DomEvent::Blur).await?;
        Ok(InteractOutcome::ok("clicked"))
    }

    /// Radios can only be checked by user-equivalent action, never
    /// unchecked. A string value picks the matching member of the same-name
    /// group.
    pub async fn set_radio(
        &self,
        node: NodeId,
        value: &FillValue,
    ) -> Result<InteractOutcome, PageError> {
        if let FillValue::Flag(want) = value {
            let snap = self.page.snapshot(node).await?;
            if !*want || snap.checked {
                return Ok(InteractOutcome::ok("noop"));
            }
            self.page.dispatch(node, DomEvent::Focus).await?;
            real_click(self.page, node).await?;
            self.page.dispatch(node, DomEvent::Change).await?;
            return Ok(InteractOutcome::ok("clicked"));
        }

        let requested = value.canonical();
        let snap = self.page.snapshot(node).await?;
        let members = match snap.name() {
            Some(name) => {
                self.page
                    .query(None, &format!("input[type=\"radio\"][name=\"{name}\"]"))
                    .await?
            }
            None => vec![node],
        };

        let mut candidates = Vec::new();
        let mut nodes = Vec::new();
        for member in members {
            let member_snap = self.page.snapshot(member).await?;
            let label = match self.page.closest(member, "label").await? {
                Some(label) if label != member => {
                    normalize_ws(&self.page.snapshot(label).await?.text)
                }
                _ => String::new(),
            };
            let value_attr = member_snap.attr("value").unwrap_or("").to_string();
            candidates.push(Candidate::new(nodes.len(), value_attr, label));
            nodes.push(member);
        }

        let Some((index, tier)) = pick_best(&requested, &candidates) else {
            return Ok(InteractOutcome::failed("radio-group", "no option matched"));
        };
        let target = nodes[index];
        let target_snap = self.page.snapshot(target).await?;
        let chosen = if candidates[index].text.is_empty() {
            candidates[index].value.clone()
        } else {
            candidates[index].text.clone()
        };
        if target_snap.checked {
            return Ok(InteractOutcome::chose("noop", chosen, tier));
        }
        self.page.dispatch(target, DomEvent::Focus).await?;
        real_click(self.page, target).await?;
        self.page.dispatch(target, DomEvent::Change).await?;
        Ok(InteractOutcome::chose("radio-group", chosen, tier))
    }

    async fn question_container(&self, node: NodeId) -> Result<Option<NodeId>, PageError> {
        let found = self.page.closest(node, CONTAINER_SELECTOR).await?;
        match found {
            Some(container) => Ok(Some(container)),
            None => self.page.parent(node).await,
        }
    }

    /// Where an opened menu renders: `aria-controls` target, else the first
    /// visible listbox, else the question container, else the document.
    async fn option_scope(&self, node: NodeId) -> Result<Option<NodeId>, PageError> {
        let snap = self.page.snapshot(node).await?;
        if let Some(controls) = snap.attr("aria-controls") {
            if let Some(target) = self
                .page
                .query(None, &format!("[id=\"{controls}\"]"))
                .await?
                .first()
            {
                return Ok(Some(*target));
            }
        }
        for listbox in self.page.query(None, "[role=\"listbox\"]").await? {
            if is_visible(&self.page.snapshot(listbox).await?) {
                return Ok(Some(listbox));
            }
        }
        self.question_container(node).await
    }

    async fn visible_options(
        &self,
        scope: Option<NodeId>,
    ) -> Result<Vec<(NodeId, String)>, PageError> {
        let mut out = Vec::new();
        for option in self.page.query(scope, OPTION_SELECTOR).await? {
            let snap = self.page.snapshot(option).await?;
            if !is_visible(&snap) {
                continue;
            }
            let text = normalize_ws(&snap.text);
            if !text.is_empty() {
                out.push((option, text));
            }
        }
        Ok(out)
    }
}

fn best_of(
    requested: &str,
    options: &[(NodeId, String)],
) -> Option<(NodeId, String, MatchTier)> {
    let candidates: Vec<Candidate> = options
        .iter()
        .enumerate()
        .map(|(i, (_, text))| Candidate::new(i, text.clone(), text.clone()))
        .collect();
    let (index, tier) = pick_best(requested, &candidates)?;
    let (node, text) = options[index].clone();
    Some((node, text, tier))
}
