//! One plan item, start to finish: compatibility gate, resolution,
//! primitive dispatch, verification. The engine loop owns pacing, pause,
//! CAPTCHA and the tracker; this module owns what happens to a single item.

use formpilot_core_types::{
    normalize_text, ControlType, FieldDescriptor, FillAction, FillPlanItem, FillValue,
};
use formpilot_field_locator::{resolve, Resolution};
use formpilot_fill_interact::{Interactor, TempoPort};
use formpilot_fill_verify::{
    fuzzy_match, verify_multi_selection, verify_selection, verify_text, verify_toggle,
};
use formpilot_page_port::{NodeId, PageError, PagePort};
use tracing::{debug, warn};

use crate::errors::FlowError;

/// How an item pick that landed on a non-exact tier is reported.
#[derive(Clone, Debug)]
pub struct Fallback {
    pub requested: String,
    pub chosen: String,
}

/// Terminal state of one plan item.
#[derive(Debug)]
pub enum StepDisposition {
    Filled { fallback: Option<Fallback> },
    /// The control already showed the intended value; nothing was touched.
    AlreadyCorrect,
    UploadNeeded,
    SkipRequested,
    Failed(FlowError),
}

fn find_descriptor<'a>(
    fields: &'a [FieldDescriptor],
    item: &FillPlanItem,
) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|f| f.id == item.field_id)
}

/// Effective control family: the scanned classification when we have it,
/// otherwise inferred from the resolved element.
async fn effective_control(
    page: &dyn PagePort,
    node: NodeId,
    descriptor: Option<&FieldDescriptor>,
) -> Result<ControlType, PageError> {
    if let Some(desc) = descriptor {
        return Ok(desc.control);
    }
    let snap = page.snapshot(node).await?;
    Ok(match snap.tag.as_str() {
        "select" => ControlType::NativeMenu,
        "textarea" => ControlType::TextArea,
        "input" => match snap.input_type().as_str() {
            "checkbox" => ControlType::Checkbox,
            "radio" => ControlType::Radio,
            "file" => ControlType::File,
            _ => ControlType::Text,
        },
        _ if snap.content_editable() => ControlType::RichText,
        _ => ControlType::CustomMenu,
    })
}

async fn is_native_select(page: &dyn PagePort, node: NodeId) -> Result<bool, PageError> {
    Ok(page.snapshot(node).await?.tag == "select")
}

/// Radios verify through the group: some member must be checked and its
/// label or value must match what was asked for.
async fn verify_radio(
    page: &dyn PagePort,
    node: NodeId,
    value: &FillValue,
) -> Result<bool, PageError> {
    if let FillValue::Flag(want) = value {
        return verify_toggle(page, node, *want).await;
    }
    let requested = value.canonical();
    let snap = page.snapshot(node).await?;
    let members = match snap.name() {
        Some(name) => {
            page.query(None, &format!("input[type=\"radio\"][name=\"{name}\"]"))
                .await?
        }
        None => vec![node],
    };
    for member in members {
        let member_snap = page.snapshot(member).await?;
        if !member_snap.checked {
            continue;
        }
        let value_attr = member_snap.attr("value").unwrap_or("");
        if fuzzy_match(&requested, value_attr).is_some() {
            return Ok(true);
        }
        if let Some(label) = page.closest(member, "label").await? {
            if label != member {
                let text = page.snapshot(label).await?.text;
                if fuzzy_match(&requested, &text).is_some() {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

pub async fn run_item(
    page: &dyn PagePort,
    tempo: &dyn TempoPort,
    fields: &[FieldDescriptor],
    item: &FillPlanItem,
) -> Result<StepDisposition, PageError> {
    if item.action == FillAction::Skip {
        debug!(field = %item.field_id, "plan requests skip");
        return Ok(StepDisposition::SkipRequested);
    }

    let descriptor = find_descriptor(fields, item);
    if let Some(desc) = descriptor {
        if !item.action.compatible_with(desc.control) {
            warn!(
                field = %item.field_id,
                action = item.action.label(),
                control = ?desc.control,
                "action is incompatible with the scanned control type"
            );
            return Ok(StepDisposition::Failed(FlowError::UnsupportedAction {
                field: item.field_id.clone(),
                action: item.action,
            }));
        }
    }

    // Uploads are delegated to the external collaborator; the engine only
    // announces them and must not attempt a text or menu interaction.
    if item.action == FillAction::Upload {
        return Ok(StepDisposition::UploadNeeded);
    }

    let Some(Resolution { node, .. }) =
        resolve(page, &item.field_id, item.action, descriptor).await?
    else {
        return Ok(StepDisposition::Failed(FlowError::ElementNotFound {
            field: item.field_id.clone(),
            action: item.action,
        }));
    };

    page.scroll_into_view(node).await?;
    let interactor = Interactor::new(page, tempo);
    let requested = item.value.canonical();

    match item.action {
        FillAction::Type => {
            let control = effective_control(page, node, descriptor).await?;
            let live = page.snapshot(node).await?;
            let current = if control == ControlType::RichText {
                live.text.clone()
            } else {
                live.value.clone()
            };
            if !requested.is_empty() && normalize_text(&current) == normalize_text(&requested) {
                return Ok(StepDisposition::AlreadyCorrect);
            }

            let outcome = if control == ControlType::RichText {
                interactor.fill_rich_text(node, &requested).await?
            } else {
                interactor.type_text(node, &requested).await?
            };
            if !outcome.ok {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            if !verify_text(page, node, &requested).await? {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            Ok(StepDisposition::Filled { fallback: None })
        }

        FillAction::Select => {
            let outcome = if is_native_select(page, node).await? {
                interactor.select_native(node, &requested).await?
            } else {
                interactor.select_custom(node, &requested).await?
            };
            if !outcome.ok {
                return Ok(StepDisposition::Failed(FlowError::OptionNotMatched {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            if !verify_selection(page, node, &[requested.clone()]).await? {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            let fallback = match (outcome.tier, outcome.chosen) {
                (Some(tier), Some(chosen)) if !tier.is_exact() => Some(Fallback {
                    requested,
                    chosen,
                }),
                _ => None,
            };
            Ok(StepDisposition::Filled { fallback })
        }

        FillAction::MultiSelect => {
            let values = item.value.values();
            let outcome = if is_native_select(page, node).await? {
                interactor.select_native_multi(node, &values).await?
            } else {
                interactor.select_custom_multi(node, &values).await?
            };
            if !outcome.ok {
                return Ok(StepDisposition::Failed(FlowError::OptionNotMatched {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            if !verify_multi_selection(page, node, &values).await? {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            Ok(StepDisposition::Filled { fallback: None })
        }

        FillAction::Check => {
            let want = item.value.as_flag();
            let outcome = interactor.set_checkbox(node, want).await?;
            if !outcome.ok || !verify_toggle(page, node, want).await? {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            Ok(StepDisposition::Filled { fallback: None })
        }

        FillAction::Radio => {
            let outcome = interactor.set_radio(node, &item.value).await?;
            if !outcome.ok {
                return Ok(StepDisposition::Failed(FlowError::OptionNotMatched {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            if !verify_radio(page, node, &item.value).await? {
                return Ok(StepDisposition::Failed(FlowError::VerificationFailed {
                    field: item.field_id.clone(),
                    requested,
                }));
            }
            let fallback = match (outcome.tier, outcome.chosen) {
                (Some(tier), Some(chosen)) if !tier.is_exact() => Some(Fallback {
                    requested,
                    chosen,
                }),
                _ => None,
            };
            Ok(StepDisposition::Filled { fallback })
        }

        FillAction::Upload | FillAction::Skip => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_core_types::{FieldId, SelectorHints, SemanticHint};
    use formpilot_fill_interact::ZeroTempo;
    use formpilot_page_port::{MemoryPage, NodeSpec};

    fn text_field(id: &str, selector: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: FieldId::new(id),
            label: id.to_string(),
            placeholder: String::new(),
            name: String::new(),
            control: ControlType::Text,
            required: false,
            options: vec![],
            selectors: SelectorHints {
                primary: Some(selector.into()),
                control: Some(selector.into()),
                ..Default::default()
            },
            hint: SemanticHint::GeneralText,
            current_value: None,
        }
    }

    #[tokio::test]
    async fn incompatible_action_is_unsupported() {
        let page = MemoryPage::new("x");
        page.append(None, NodeSpec::new("input").attr("id", "email"));
        let fields = vec![text_field("email", "#email")];
        let item = FillPlanItem::new("email", FillAction::Select, FillValue::Text("x".into()));
        let step = run_item(&page, &ZeroTempo, &fields, &item).await.unwrap();
        assert!(matches!(
            step,
            StepDisposition::Failed(FlowError::UnsupportedAction { .. })
        ));
    }

    #[tokio::test]
    async fn type_on_already_correct_value_touches_nothing() {
        let page = MemoryPage::new("x");
        let input = page.append(
            None,
            NodeSpec::new("input").attr("id", "name").value("Jane Doe"),
        );
        let fields = vec![text_field("name", "#name")];
        let item = FillPlanItem::new("name", FillAction::Type, FillValue::Text("Jane Doe".into()));
        let step = run_item(&page, &ZeroTempo, &fields, &item).await.unwrap();
        assert!(matches!(step, StepDisposition::AlreadyCorrect));
        assert!(page.events_for(input).is_empty());
    }

    #[tokio::test]
    async fn upload_is_announced_not_executed() {
        let page = MemoryPage::new("x");
        let input = page.append(
            None,
            NodeSpec::new("input").attr("id", "resume").attr("type", "file").hidden(),
        );
        let item = FillPlanItem::new(
            "resume",
            FillAction::Upload,
            FillValue::Text("resume.pdf".into()),
        );
        let step = run_item(&page, &ZeroTempo, &[], &item).await.unwrap();
        assert!(matches!(step, StepDisposition::UploadNeeded));
        assert!(page.events_for(input).is_empty());
    }

    #[tokio::test]
    async fn missing_element_is_field_scoped_failure() {
        let page = MemoryPage::new("x");
        let item = FillPlanItem::new("ghost", FillAction::Type, FillValue::Text("x".into()));
        let step = run_item(&page, &ZeroTempo, &[], &item).await.unwrap();
        assert!(matches!(
            step,
            StepDisposition::Failed(FlowError::ElementNotFound { .. })
        ));
    }
}
