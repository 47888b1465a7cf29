//! Scenario coverage: one test per control family quirk, run through the
//! whole engine (scan, resolve, interact, verify, track).

use std::sync::Arc;

use formpilot::flow::{FillEngine, FillEvent, FlowPolicy, SkipReason};
use formpilot::page::{DomEvent, MemoryPage, NodeSpec, PagePort};
use formpilot::{
    ControlType, FieldDescriptor, FieldId, FillAction, FillPlanItem, FillValue, SelectorHints,
    SemanticHint, ZeroTempo,
};

fn engine_for(page: Arc<MemoryPage>) -> Arc<FillEngine> {
    let mut policy = FlowPolicy::default();
    policy.scan.settle_ms = 0;
    Arc::new(FillEngine::new(page, Arc::new(ZeroTempo), policy))
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<FillEvent>) -> Vec<FillEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn native_select_sets_value_and_fires_change() {
    let page = Arc::new(MemoryPage::new("https://jobs.example.com/apply"));
    let q = page.append(None, NodeSpec::new("div").attr("class", "question"));
    page.append(
        Some(q),
        NodeSpec::new("label").attr("for", "country").text("Country"),
    );
    let select = page.append(Some(q), NodeSpec::new("select").attr("id", "country"));
    page.append(
        Some(select),
        NodeSpec::new("option").attr("value", "US").text("United States"),
    );
    page.append(
        Some(select),
        NodeSpec::new("option").attr("value", "CA").text("Canada"),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "country",
        FillAction::Select,
        FillValue::Text("United States".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    // Exact tier, so no fallback is announced.
    assert!(!events
        .iter()
        .any(|e| matches!(e, FillEvent::SelectFallback { .. })));
    assert_eq!(page.snapshot(select).await.unwrap().value, "US");
    assert!(page.events_for(select).contains(&DomEvent::Change));
}

#[tokio::test]
async fn alias_tier_reaches_the_paraphrased_option_and_reports_fallback() {
    let page = Arc::new(MemoryPage::new("https://jobs.example.com/apply"));
    let q = page.append(None, NodeSpec::new("div").attr("class", "question"));
    page.append(Some(q), NodeSpec::new("h3").text("How did you hear about us?"));
    let input = page.append(
        Some(q),
        NodeSpec::new("input")
            .attr("id", "source")
            .attr("role", "combobox")
            .attr("aria-controls", "source-menu"),
    );
    let menu = page.append(
        Some(q),
        NodeSpec::new("ul").attr("id", "source-menu").attr("role", "listbox").hidden(),
    );
    page.append(Some(menu), NodeSpec::new("li").attr("role", "option").text("Job board"));
    page.append(
        Some(menu),
        NodeSpec::new("li").attr("role", "option").text("Online professional network"),
    );
    page.bind_menu(input, menu, Some(input));

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "source",
        FillAction::Select,
        FillValue::Text("LinkedIn".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        FillEvent::SelectFallback { requested, chosen, .. }
            if requested == "LinkedIn" && chosen == "Online professional network"
    )));
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert_eq!(
        page.snapshot(input).await.unwrap().value,
        "Online professional network"
    );
}

#[tokio::test]
async fn multi_select_fills_every_value_and_verifies_through_chips() {
    let page = Arc::new(MemoryPage::new("https://jobs.example.com/apply"));
    let q = page.append(None, NodeSpec::new("div").attr("class", "question"));
    page.append(Some(q), NodeSpec::new("h3").text("Which languages do you know?"));
    let shell = page.append(Some(q), NodeSpec::new("div").attr("class", "select__control"));
    let input = page.append(
        Some(shell),
        NodeSpec::new("input")
            .attr("id", "skills")
            .attr("role", "combobox")
            .attr("aria-controls", "skills-menu"),
    );
    let menu = page.append(
        Some(q),
        NodeSpec::new("ul").attr("id", "skills-menu").attr("role", "listbox").hidden(),
    );
    page.append(Some(menu), NodeSpec::new("li").attr("role", "option").text("Rust"));
    page.append(Some(menu), NodeSpec::new("li").attr("role", "option").text("Go"));
    page.append(Some(menu), NodeSpec::new("li").attr("role", "option").text("Python"));
    page.bind_multi_menu(input, menu, Some(input));

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "skills",
        FillAction::MultiSelect,
        FillValue::Many(vec!["Rust".into(), "Go".into()]),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert!(!events.iter().any(|e| matches!(e, FillEvent::Error { .. })));

    // Both picks stand as chips and the filter input ends up empty.
    let mut chips = Vec::new();
    for chip in page
        .query(Some(shell), "div[class*=\"multi-value\"]")
        .await
        .unwrap()
    {
        chips.push(page.snapshot(chip).await.unwrap().text.trim().to_string());
    }
    assert_eq!(chips, vec!["Rust".to_string(), "Go".to_string()]);
    assert_eq!(page.snapshot(input).await.unwrap().value, "");
}

#[tokio::test]
async fn usa_reaches_united_states() {
    let page = Arc::new(MemoryPage::new("x"));
    let select = page.append(None, NodeSpec::new("select").attr("id", "country"));
    page.append(
        Some(select),
        NodeSpec::new("option").attr("value", "US").text("United States"),
    );
    page.append(
        Some(select),
        NodeSpec::new("option").attr("value", "CA").text("Canada"),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "country",
        FillAction::Select,
        FillValue::Text("usa".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert_eq!(page.snapshot(select).await.unwrap().value, "US");
}

#[tokio::test]
async fn prefer_not_to_say_selects_the_decline_option() {
    let page = Arc::new(MemoryPage::new("x"));
    let select = page.append(None, NodeSpec::new("select").attr("id", "gender"));
    page.append(Some(select), NodeSpec::new("option").attr("value", "m").text("Male"));
    page.append(Some(select), NodeSpec::new("option").attr("value", "f").text("Female"));
    page.append(
        Some(select),
        NodeSpec::new("option").attr("value", "d").text("Decline to answer"),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "gender",
        FillAction::Select,
        FillValue::Text("Prefer not to say".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert_eq!(page.snapshot(select).await.unwrap().value, "d");
}

#[tokio::test]
async fn checked_checkbox_gets_no_click_but_still_verifies() {
    let page = Arc::new(MemoryPage::new("x"));
    page.append(
        None,
        NodeSpec::new("label").attr("for", "terms").text("I agree"),
    );
    let cb = page.append(
        None,
        NodeSpec::new("input").attr("id", "terms").attr("type", "checkbox").checked(true),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "terms",
        FillAction::Check,
        FillValue::Flag(true),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert!(page.events_for(cb).is_empty());
    assert!(page.snapshot(cb).await.unwrap().checked);
}

#[tokio::test]
async fn strict_select_on_a_generic_selector_misses_instead_of_guessing() {
    let page = Arc::new(MemoryPage::new("x"));
    let stray = page.append(None, NodeSpec::new("input"));

    let descriptor = FieldDescriptor {
        id: FieldId::new("field_unknown_1a2b3c4d"),
        label: "Unknown field".into(),
        placeholder: String::new(),
        name: String::new(),
        control: ControlType::CustomMenu,
        required: false,
        options: vec![],
        selectors: SelectorHints {
            primary: Some("input".into()),
            control: Some("input".into()),
            container: None,
            generic: true,
        },
        hint: SemanticHint::GeneralText,
        current_value: None,
    };

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let plan = vec![FillPlanItem::new(
        "field_unknown_1a2b3c4d",
        FillAction::Select,
        FillValue::Text("Canada".into()),
    )];
    engine.start_filling(plan, vec![descriptor]).await.unwrap();

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, FillEvent::ElementNotFound { .. })));
    assert!(!events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    // The stray input was never touched.
    assert!(page.events_for(stray).is_empty());
    assert_eq!(page.snapshot(stray).await.unwrap().value, "");
}

#[tokio::test]
async fn radio_group_answers_by_member_label() {
    let page = Arc::new(MemoryPage::new("x"));
    let q = page.append(None, NodeSpec::new("fieldset"));
    page.append(Some(q), NodeSpec::new("legend").text("Authorized to work?"));
    let l1 = page.append(Some(q), NodeSpec::new("label"));
    let yes = page.append(
        Some(l1),
        NodeSpec::new("input").attr("type", "radio").attr("name", "authorized").attr("value", "yes"),
    );
    page.append(Some(l1), NodeSpec::new("span").text("Yes"));
    let l2 = page.append(Some(q), NodeSpec::new("label"));
    let no = page.append(
        Some(l2),
        NodeSpec::new("input").attr("type", "radio").attr("name", "authorized").attr("value", "no"),
    );
    page.append(Some(l2), NodeSpec::new("span").text("No"));

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    assert_eq!(fields.len(), 1);
    let plan = vec![FillPlanItem::new(
        "authorized",
        FillAction::Radio,
        FillValue::Text("Yes".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert!(page.snapshot(yes).await.unwrap().checked);
    assert!(!page.snapshot(no).await.unwrap().checked);
}

#[tokio::test]
async fn upload_emits_the_delegation_event_and_touches_nothing() {
    let page = Arc::new(MemoryPage::new("x"));
    page.append(
        None,
        NodeSpec::new("label").attr("for", "resume").text("Resume"),
    );
    let file = page.append(
        None,
        NodeSpec::new("input").attr("id", "resume").attr("type", "file").hidden(),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "resume",
        FillAction::Upload,
        FillValue::Text("resume.pdf".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, FillEvent::UploadNeeded { .. })));
    assert!(!events.iter().any(|e| matches!(e, FillEvent::Filled { .. })));
    assert!(page.events_for(file).is_empty());
}

#[tokio::test]
async fn prefilled_text_field_is_skipped_as_already_correct() {
    let page = Arc::new(MemoryPage::new("x"));
    page.append(
        None,
        NodeSpec::new("label").attr("for", "email").text("Email"),
    );
    let input = page.append(
        None,
        NodeSpec::new("input").attr("id", "email").value("jane@example.com"),
    );

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![FillPlanItem::new(
        "email",
        FillAction::Type,
        FillValue::Text("jane@example.com".into()),
    )];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        FillEvent::Skipped {
            reason: SkipReason::AlreadyCorrect,
            ..
        }
    )));
    assert!(page.events_for(input).is_empty());
}

#[tokio::test]
async fn wrong_action_for_the_control_surfaces_as_error_and_run_continues() {
    let page = Arc::new(MemoryPage::new("x"));
    page.append(
        None,
        NodeSpec::new("label").attr("for", "email").text("Email"),
    );
    page.append(None, NodeSpec::new("input").attr("id", "email"));
    page.append(
        None,
        NodeSpec::new("label").attr("for", "city").text("City"),
    );
    let city = page.append(None, NodeSpec::new("input").attr("id", "city"));

    let engine = engine_for(Arc::clone(&page));
    let mut rx = engine.subscribe();
    let fields = engine.scan_page().await.unwrap();
    let plan = vec![
        FillPlanItem::new("email", FillAction::Select, FillValue::Text("x".into())),
        FillPlanItem::new("city", FillAction::Type, FillValue::Text("Lisbon".into())),
    ];
    engine.start_filling(plan, fields).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, FillEvent::Error { .. })));
    // The bad item never aborts the run; the next one still lands.
    assert_eq!(page.snapshot(city).await.unwrap().value, "Lisbon");
    assert!(events.iter().any(|e| matches!(e, FillEvent::Complete)));
}
