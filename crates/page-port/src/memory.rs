//! In-memory page implementation.
//!
//! Suitable for unit tests and the CLI fixture runner: it keeps a node tree
//! with attributes, values and styles, answers the selector subset, and
//! mirrors the browser default actions the interaction primitives rely on
//! (checkbox toggling, radio-group exclusivity, registered menu behaviors).
//! Every dispatched event is recorded so tests can assert gesture sequences.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::PageError;
use crate::model::{DomEvent, ElementSnapshot, NodeId, OptionSnapshot, Rect, StyleSnapshot};
use crate::ports::PagePort;
use crate::selector::{CompoundSelector, MatchTarget, SelectorList};

#[derive(Clone, Debug)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tag: String,
    attrs: HashMap<String, String>,
    own_text: String,
    value: String,
    checked: bool,
    selected: bool,
    style: StyleSnapshot,
    rect: Rect,
    detached: bool,
}

#[derive(Clone, Debug)]
struct MenuBinding {
    trigger: NodeId,
    menu: NodeId,
    control: Option<NodeId>,
    multi: bool,
}

#[derive(Default)]
struct Inner {
    url: String,
    nodes: Vec<NodeData>,
    roots: Vec<NodeId>,
    log: Vec<(NodeId, DomEvent)>,
    menus: Vec<MenuBinding>,
    chip_removes: HashMap<NodeId, NodeId>,
}

/// Builder for one element of the in-memory tree.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    hidden: bool,
    rect: Rect,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attrs: HashMap::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            hidden: false,
            rect: Rect::new(120.0, 24.0),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn rect(mut self, width: f32, height: f32) -> Self {
        self.rect = Rect::new(width, height);
        self
    }
}

pub struct MemoryPage {
    inner: Mutex<Inner>,
}

impl MemoryPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                url: url.into(),
                ..Default::default()
            }),
        }
    }

    pub fn append(&self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let mut inner = self.inner.lock();
        let id = NodeId(inner.nodes.len() as u64);
        let style = if spec.hidden {
            StyleSnapshot {
                display: "none".into(),
                ..Default::default()
            }
        } else {
            StyleSnapshot::default()
        };
        inner.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            tag: spec.tag,
            attrs: spec.attrs,
            own_text: spec.text,
            value: spec.value,
            checked: spec.checked,
            selected: false,
            style,
            rect: spec.rect,
            detached: false,
        });
        match parent {
            Some(p) => inner.nodes[p.0 as usize].children.push(id),
            None => inner.roots.push(id),
        }
        id
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.inner.lock().url = url.into();
    }

    pub fn set_hidden(&self, node: NodeId, hidden: bool) {
        let mut inner = self.inner.lock();
        if let Some(data) = inner.nodes.get_mut(node.0 as usize) {
            data.style.display = if hidden { "none" } else { "block" }.into();
        }
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        let mut inner = self.inner.lock();
        if let Some(data) = inner.nodes.get_mut(node.0 as usize) {
            data.attrs.insert(name.to_lowercase(), value.to_string());
        }
    }

    /// Register a custom menu: clicking the trigger (or bound control)
    /// reveals the menu subtree, Escape hides it, and clicking an option
    /// inside copies its text into the bound control and closes the menu.
    pub fn bind_menu(&self, trigger: NodeId, menu: NodeId, control: Option<NodeId>) {
        self.inner.lock().menus.push(MenuBinding {
            trigger,
            menu,
            control,
            multi: false,
        });
    }

    /// Like [`bind_menu`](Self::bind_menu), but for multi-value widgets:
    /// clicking an option renders a removable chip next to the control and
    /// leaves the control's own value untouched (it is a filter box).
    pub fn bind_multi_menu(&self, trigger: NodeId, menu: NodeId, control: Option<NodeId>) {
        self.inner.lock().menus.push(MenuBinding {
            trigger,
            menu,
            control,
            multi: true,
        });
    }

    /// Register a chip remove control: clicking it detaches the chip node.
    pub fn bind_chip_remove(&self, remove_control: NodeId, chip: NodeId) {
        self.inner.lock().chip_removes.insert(remove_control, chip);
    }

    pub fn dispatched(&self) -> Vec<(NodeId, DomEvent)> {
        self.inner.lock().log.clone()
    }

    pub fn events_for(&self, node: NodeId) -> Vec<DomEvent> {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn clear_log(&self) {
        self.inner.lock().log.clear();
    }
}

impl Inner {
    fn get(&self, node: NodeId) -> Result<&NodeData, PageError> {
        self.nodes
            .get(node.0 as usize)
            .filter(|n| !n.detached)
            .ok_or(PageError::UnknownNode(node.0))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeData, PageError> {
        self.nodes
            .get_mut(node.0 as usize)
            .filter(|n| !n.detached)
            .ok_or(PageError::UnknownNode(node.0))
    }

    /// Document-order walk of the subtree under `scope` (scope excluded),
    /// or of the whole document.
    fn walk(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match scope {
            Some(root) => match self.get(root) {
                Ok(data) => data.children.iter().rev().copied().collect(),
                Err(_) => return out,
            },
            None => self.roots.iter().rev().copied().collect(),
        };
        while let Some(id) = stack.pop() {
            let Ok(data) = self.get(id) else { continue };
            out.push(id);
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, sel: &CompoundSelector) -> bool {
        let Ok(data) = self.get(node) else {
            return false;
        };
        let attrs = data.attrs.clone();
        let lookup = move |name: &str| attrs.get(name).cloned();
        sel.matches(&MatchTarget {
            tag: &data.tag,
            attr: &lookup,
        })
    }

    fn query_list(&self, scope: Option<NodeId>, list: &SelectorList) -> Vec<NodeId> {
        let order = self.walk(scope);
        let mut out: Vec<NodeId> = Vec::new();
        for sel in &list.0 {
            let hits: Vec<NodeId> = order
                .iter()
                .copied()
                .filter(|n| self.matches(*n, sel))
                .collect();
            let picked: Vec<NodeId> = match sel.nth_of_type {
                Some(n) => hits.into_iter().skip(n - 1).take(1).collect(),
                None => hits,
            };
            for hit in picked {
                if !out.contains(&hit) {
                    out.push(hit);
                }
            }
        }
        // Keep document order stable across comma alternatives.
        let index: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        out.sort_by_key(|n| index.get(n).copied().unwrap_or(usize::MAX));
        out
    }

    fn effective_display_none(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Ok(data) = self.get(id) else { return true };
            if data.style.display == "none" {
                return true;
            }
            cursor = data.parent;
        }
        false
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        let Ok(data) = self.get(node) else {
            return String::new();
        };
        if !data.own_text.is_empty() {
            parts.push(data.own_text.clone());
        }
        for child in self.walk(Some(node)) {
            if let Ok(c) = self.get(child) {
                if !c.own_text.is_empty() {
                    parts.push(c.own_text.clone());
                }
            }
        }
        parts.join(" ")
    }

    fn snapshot(&self, node: NodeId) -> Result<ElementSnapshot, PageError> {
        let data = self.get(node)?;
        let mut style = data.style.clone();
        if self.effective_display_none(node) {
            style.display = "none".into();
        }
        Ok(ElementSnapshot {
            node,
            tag: data.tag.clone(),
            attrs: data.attrs.clone(),
            text: self.text_content(node),
            value: data.value.clone(),
            checked: data.checked,
            style,
            rect: data.rect,
        })
    }

    fn is_in_subtree(&self, node: NodeId, root: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == root {
                return true;
            }
            cursor = self.get(id).ok().and_then(|d| d.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(node.0 as usize).and_then(|n| n.parent) {
            self.nodes[parent.0 as usize]
                .children
                .retain(|c| *c != node);
        }
        self.roots.retain(|r| *r != node);
        for id in self.walk(Some(node)) {
            self.nodes[id.0 as usize].detached = true;
        }
        if let Some(data) = self.nodes.get_mut(node.0 as usize) {
            data.detached = true;
        }
    }

    fn apply_click_defaults(&mut self, node: NodeId) -> Result<(), PageError> {
        let (tag, input_type, name) = {
            let data = self.get(node)?;
            (
                data.tag.clone(),
                data.attrs.get("type").cloned().unwrap_or_default(),
                data.attrs.get("name").cloned(),
            )
        };

        if tag == "input" && input_type == "checkbox" {
            let data = self.get_mut(node)?;
            data.checked = !data.checked;
        } else if tag == "input" && input_type == "radio" {
            // Radio groups are exclusive by name, like the browser.
            if let Some(group) = name {
                let peers: Vec<NodeId> = self
                    .walk(None)
                    .into_iter()
                    .filter(|id| {
                        self.get(*id)
                            .map(|d| {
                                d.tag == "input"
                                    && d.attrs.get("type").map(|t| t == "radio").unwrap_or(false)
                                    && d.attrs.get("name") == Some(&group)
                            })
                            .unwrap_or(false)
                    })
                    .collect();
                for peer in peers {
                    self.nodes[peer.0 as usize].checked = peer == node;
                }
            } else {
                self.get_mut(node)?.checked = true;
            }
        }

        // Registered menu behaviors.
        let menus = self.menus.clone();
        for binding in &menus {
            let is_trigger = node == binding.trigger || Some(node) == binding.control;
            if is_trigger {
                self.nodes[binding.menu.0 as usize].style.display = "block".into();
                continue;
            }
            if self.is_in_subtree(node, binding.menu) {
                let role = self
                    .get(node)?
                    .attrs
                    .get("role")
                    .cloned()
                    .unwrap_or_default();
                let tag = self.get(node)?.tag.clone();
                let option_like = matches!(role.as_str(), "option" | "menuitem" | "menuitemradio")
                    || tag == "li";
                if option_like {
                    let text = self.text_content(node).trim().to_string();
                    if binding.multi {
                        let shell = binding
                            .control
                            .and_then(|c| self.nodes[c.0 as usize].parent)
                            .or(self.nodes[binding.trigger.0 as usize].parent);
                        let chip = self.insert_node(shell, "div", "multi-value", &text);
                        let remove =
                            self.insert_node(Some(chip), "button", "multi-value-remove", "");
                        self.chip_removes.insert(remove, chip);
                    } else if let Some(control) = binding.control {
                        self.nodes[control.0 as usize].value = text;
                    }
                    self.nodes[binding.menu.0 as usize].style.display = "none".into();
                }
            }
        }

        if let Some(chip) = self.chip_removes.get(&node).copied() {
            self.detach(chip);
        }
        Ok(())
    }

    /// Script-created element, as a widget's own click handler would add it.
    fn insert_node(&mut self, parent: Option<NodeId>, tag: &str, class: &str, text: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        let mut attrs = HashMap::new();
        if !class.is_empty() {
            attrs.insert("class".into(), class.to_string());
        }
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            tag: tag.to_string(),
            attrs,
            own_text: text.to_string(),
            value: String::new(),
            checked: false,
            selected: false,
            style: StyleSnapshot::default(),
            rect: Rect::new(60.0, 20.0),
            detached: false,
        });
        match parent {
            Some(p) => self.nodes[p.0 as usize].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    fn apply_keydown_defaults(&mut self, node: NodeId, key: &str) {
        if key != "Escape" {
            return;
        }
        let menus = self.menus.clone();
        for binding in &menus {
            if node == binding.trigger || Some(node) == binding.control {
                self.nodes[binding.menu.0 as usize].style.display = "none".into();
            }
        }
    }
}

#[async_trait]
impl PagePort for MemoryPage {
    async fn query(
        &self,
        scope: Option<NodeId>,
        selector: &str,
    ) -> Result<Vec<NodeId>, PageError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.inner.lock().query_list(scope, &list))
    }

    async fn snapshot(&self, node: NodeId) -> Result<ElementSnapshot, PageError> {
        self.inner.lock().snapshot(node)
    }

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, PageError> {
        Ok(self.inner.lock().get(node)?.parent)
    }

    async fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, PageError> {
        let list = SelectorList::parse(selector)?;
        let inner = self.inner.lock();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if list.0.iter().any(|sel| inner.matches(id, sel)) {
                return Ok(Some(id));
            }
            cursor = inner.get(id)?.parent;
        }
        Ok(None)
    }

    async fn preceding_siblings(&self, node: NodeId) -> Result<Vec<NodeId>, PageError> {
        let inner = self.inner.lock();
        let Some(parent) = inner.get(node)?.parent else {
            return Ok(Vec::new());
        };
        let siblings = &inner.get(parent)?.children;
        let mut out: Vec<NodeId> = siblings
            .iter()
            .take_while(|s| **s != node)
            .copied()
            .collect();
        out.reverse();
        Ok(out)
    }

    async fn select_options(&self, node: NodeId) -> Result<Vec<OptionSnapshot>, PageError> {
        let inner = self.inner.lock();
        let data = inner.get(node)?;
        if data.tag != "select" {
            return Err(PageError::NotASelect);
        }
        let mut out = Vec::new();
        for (index, child) in data.children.iter().enumerate() {
            let c = inner.get(*child)?;
            if c.tag != "option" {
                continue;
            }
            out.push(OptionSnapshot {
                index,
                value: c
                    .attrs
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| c.own_text.clone()),
                text: c.own_text.clone(),
                selected: c.selected,
            });
        }
        Ok(out)
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), PageError> {
        let mut inner = self.inner.lock();
        let (tag, children) = {
            let data = inner.get(node)?;
            (data.tag.clone(), data.children.clone())
        };
        if tag == "select" {
            for child in &children {
                let opt_value = {
                    let c = inner.get(*child)?;
                    c.attrs
                        .get("value")
                        .cloned()
                        .unwrap_or_else(|| c.own_text.clone())
                };
                inner.get_mut(*child)?.selected = opt_value == value;
            }
        }
        inner.get_mut(node)?.value = value.to_string();
        Ok(())
    }

    async fn set_inner_text(&self, node: NodeId, text: &str) -> Result<(), PageError> {
        self.inner.lock().get_mut(node)?.own_text = text.to_string();
        Ok(())
    }

    async fn set_option_selected(
        &self,
        node: NodeId,
        index: usize,
        selected: bool,
    ) -> Result<(), PageError> {
        let mut inner = self.inner.lock();
        let (multiple, children) = {
            let data = inner.get(node)?;
            if data.tag != "select" {
                return Err(PageError::NotASelect);
            }
            (data.attrs.contains_key("multiple"), data.children.clone())
        };
        let target = *children.get(index).ok_or(PageError::OptionOutOfRange(index))?;
        if selected && !multiple {
            for child in &children {
                inner.get_mut(*child)?.selected = false;
            }
        }
        inner.get_mut(target)?.selected = selected;
        if selected {
            let value = {
                let c = inner.get(target)?;
                c.attrs
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| c.own_text.clone())
            };
            inner.get_mut(node)?.value = value;
        }
        Ok(())
    }

    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), PageError> {
        let mut inner = self.inner.lock();
        inner.get(node)?;
        inner.log.push((node, event.clone()));
        match &event {
            DomEvent::Click => inner.apply_click_defaults(node)?,
            DomEvent::KeyDown { key } => inner.apply_keydown_defaults(node, key),
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&self, node: NodeId) -> Result<(), PageError> {
        self.inner.lock().get(node).map(|_| ())
    }

    async fn url(&self) -> Result<String, PageError> {
        Ok(self.inner.lock().url.clone())
    }
}

/// Serializable page description so the CLI can run the engine against a
/// captured form without a browser.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageFixture {
    pub url: String,
    pub nodes: Vec<FixtureNode>,
    #[serde(default)]
    pub menus: Vec<FixtureMenu>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

/// Menu binding referencing element ids from the node tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureMenu {
    pub trigger: String,
    pub menu: String,
    #[serde(default)]
    pub control: Option<String>,
    #[serde(default)]
    pub multi: bool,
}

impl MemoryPage {
    pub fn from_fixture(fixture: &PageFixture) -> Result<Self, PageError> {
        let page = MemoryPage::new(&fixture.url);
        let mut by_id: HashMap<String, NodeId> = HashMap::new();
        for node in &fixture.nodes {
            build_fixture_node(&page, None, node, &mut by_id);
        }
        for menu in &fixture.menus {
            let trigger = *by_id
                .get(&menu.trigger)
                .ok_or_else(|| PageError::Backend(format!("unknown menu trigger id {}", menu.trigger)))?;
            let menu_node = *by_id
                .get(&menu.menu)
                .ok_or_else(|| PageError::Backend(format!("unknown menu id {}", menu.menu)))?;
            let control = match &menu.control {
                Some(id) => Some(*by_id.get(id).ok_or_else(|| {
                    PageError::Backend(format!("unknown menu control id {id}"))
                })?),
                None => None,
            };
            if menu.multi {
                page.bind_multi_menu(trigger, menu_node, control);
            } else {
                page.bind_menu(trigger, menu_node, control);
            }
        }
        Ok(page)
    }
}

fn build_fixture_node(
    page: &MemoryPage,
    parent: Option<NodeId>,
    node: &FixtureNode,
    by_id: &mut HashMap<String, NodeId>,
) {
    let mut spec = NodeSpec::new(&node.tag)
        .text(&node.text)
        .value(&node.value)
        .checked(node.checked);
    for (k, v) in &node.attrs {
        spec = spec.attr(k, v);
    }
    if node.hidden {
        spec = spec.hidden();
    }
    let id = page.append(parent, spec);
    if let Some(dom_id) = node.attrs.get("id") {
        by_id.insert(dom_id.clone(), id);
    }
    for child in &node.children {
        build_fixture_node(page, Some(id), child, by_id);
    }
}
