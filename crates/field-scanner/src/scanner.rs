//! The scan entry point: eligibility filtering, per-control description,
//! radio-group folding.

use std::collections::HashSet;
use std::time::Duration;

use formpilot_core_types::{
    normalize_ws, ControlType, CurrentValue, FieldDescriptor, FieldId, SelectorHints,
};
use formpilot_page_port::{is_visible, ElementSnapshot, PageError, PagePort};
use tracing::{debug, instrument};

use crate::classify::{classify, question_container};
use crate::hints::infer_hint;
use crate::label::{container_heading, resolve_label};
use crate::options::{custom_options, native_options};
use crate::selectors::{build_selectors, group_selector};

const ELIGIBLE: &str =
    "input, select, textarea, [contenteditable], [role=\"textbox\"], [role=\"combobox\"]";

const EXCLUDED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "image", "reset"];

#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Open closed custom menus to read their options. Costs one open/close
    /// interaction per menu that renders nothing passively.
    pub discover_menu_options: bool,
    /// Wait after opening a menu before reading what rendered.
    pub settle: Duration,
    pub max_options: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            discover_menu_options: true,
            settle: Duration::from_millis(180),
            max_options: 50,
        }
    }
}

pub struct Scanner<'a> {
    page: &'a dyn PagePort,
    config: ScanConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(page: &'a dyn PagePort) -> Self {
        Self {
            page,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(page: &'a dyn PagePort, config: ScanConfig) -> Self {
        Self { page, config }
    }

    fn eligible(&self, snap: &ElementSnapshot) -> bool {
        if snap.tag == "input" && EXCLUDED_INPUT_TYPES.contains(&snap.input_type().as_str()) {
            return false;
        }
        if snap.disabled() || snap.readonly() {
            return false;
        }
        let is_form_tag = matches!(snap.tag.as_str(), "input" | "select" | "textarea");
        if !is_form_tag
            && !snap.content_editable()
            && !matches!(snap.role().as_str(), "textbox" | "combobox")
        {
            return false;
        }
        // File inputs hide behind styled upload buttons; keep them anyway.
        if !is_visible(snap) && !(snap.tag == "input" && snap.input_type() == "file") {
            return false;
        }
        true
    }

    #[instrument(skip(self), fields(url))]
    pub async fn scan(&self) -> Result<Vec<FieldDescriptor>, PageError> {
        let url = self.page.url().await?;
        tracing::Span::current().record("url", url.as_str());

        let mut out: Vec<FieldDescriptor> = Vec::new();
        let mut used_ids: HashSet<String> = HashSet::new();
        let mut folded_radio_groups: HashSet<String> = HashSet::new();

        for node in self.page.query(None, ELIGIBLE).await? {
            let snap = self.page.snapshot(node).await?;
            if !self.eligible(&snap) {
                continue;
            }
            let control = classify(self.page, &snap).await?;

            if control == ControlType::Radio {
                if let Some(name) = snap.name() {
                    if !folded_radio_groups.insert(name.to_string()) {
                        continue;
                    }
                    let desc = self.describe_radio_group(&snap, name).await?;
                    out.push(self.with_unique_id(desc, &mut used_ids));
                    continue;
                }
            }

            let desc = self.describe(&snap, control).await?;
            out.push(self.with_unique_id(desc, &mut used_ids));
        }
        debug!(fields = out.len(), "scan complete");
        Ok(out)
    }

    fn with_unique_id(
        &self,
        mut desc: FieldDescriptor,
        used: &mut HashSet<String>,
    ) -> FieldDescriptor {
        while !used.insert(desc.id.0.clone()) {
            desc.id = FieldId::generated(&desc.label);
        }
        desc
    }

    async fn describe(
        &self,
        snap: &ElementSnapshot,
        control: ControlType,
    ) -> Result<FieldDescriptor, PageError> {
        let label = resolve_label(self.page, snap).await?;
        let placeholder = normalize_ws(snap.placeholder());
        let name = snap.name().unwrap_or("").to_string();
        let id = match snap.id() {
            Some(id) => FieldId::new(id),
            None => FieldId::generated(&label),
        };

        let options = match control {
            ControlType::NativeMenu => native_options(self.page, snap.node).await?,
            ControlType::CustomMenu if self.config.discover_menu_options => {
                custom_options(
                    self.page,
                    snap.node,
                    self.config.settle,
                    self.config.max_options,
                )
                .await?
            }
            _ => Vec::new(),
        };

        let current_value = self.current_value(snap, control).await?;
        Ok(FieldDescriptor {
            id,
            hint: infer_hint(&label, &placeholder, &name),
            selectors: build_selectors(self.page, snap).await?,
            label,
            placeholder,
            name,
            control,
            required: snap.required(),
            options,
            current_value,
        })
    }

    /// Radios sharing a `name` are one question; fold them into a single
    /// descriptor whose options are the per-member labels.
    async fn describe_radio_group(
        &self,
        first: &ElementSnapshot,
        name: &str,
    ) -> Result<FieldDescriptor, PageError> {
        let selector = group_selector("radio", name);
        let mut options = Vec::new();
        let mut checked_value: Option<String> = None;
        for member in self.page.query(None, &selector).await? {
            let member_snap = self.page.snapshot(member).await?;
            let text = resolve_label(self.page, &member_snap).await?;
            let value = member_snap
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            if member_snap.checked {
                checked_value = Some(text.clone());
            }
            options.push(formpilot_core_types::FieldOption { value, text });
        }

        let label = {
            let heading = container_heading(self.page, first).await?;
            if heading.is_empty() {
                normalize_ws(name)
            } else {
                heading
            }
        };
        let container = match question_container(self.page, first.node).await? {
            Some(node) => {
                let snap = self.page.snapshot(node).await?;
                build_selectors(self.page, &snap)
                    .await?
                    .control
            }
            None => None,
        };

        Ok(FieldDescriptor {
            id: FieldId::new(name),
            hint: infer_hint(&label, "", name),
            selectors: SelectorHints {
                primary: Some(selector.clone()),
                control: Some(selector),
                container,
                generic: false,
            },
            label,
            placeholder: String::new(),
            name: name.to_string(),
            control: ControlType::Radio,
            required: first.required(),
            options,
            current_value: checked_value.map(CurrentValue::Text),
        })
    }

    async fn current_value(
        &self,
        snap: &ElementSnapshot,
        control: ControlType,
    ) -> Result<Option<CurrentValue>, PageError> {
        Ok(match control {
            ControlType::Checkbox => Some(CurrentValue::Checked(snap.checked)),
            ControlType::RichText => {
                let text = normalize_ws(&snap.text);
                (!text.is_empty()).then_some(CurrentValue::Text(text))
            }
            ControlType::NativeMenu => {
                let selected = self
                    .page
                    .select_options(snap.node)
                    .await?
                    .into_iter()
                    .find(|o| o.selected && !o.text.trim().is_empty());
                selected.map(|o| CurrentValue::Text(normalize_ws(&o.text)))
            }
            ControlType::File => None,
            _ => {
                let value = normalize_ws(&snap.value);
                (!value.is_empty()).then_some(CurrentValue::Text(value))
            }
        })
    }
}
