// Shared test support: tracing init and an in-memory fake driver.
//
// FakePage is a tiny mutable DOM behind the `Driver` trait. Tests mutate it
// (also from spawned tasks, to exercise the retry loops) and the handles
// under test observe the changes through normal resolution.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use bide::{Driver, DriverError, DriverResult, ElementRef, Selector};

pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone)]
struct Node {
    id: u64,
    tag: String,
    attrs: HashMap<String, String>,
    css: HashMap<String, String>,
    text: String,
    displayed: bool,
    enabled: bool,
    parent: Option<u64>,
    removed: bool,
}

#[derive(Default)]
struct Dom {
    nodes: Vec<Node>,
    next_id: u64,
    closed: bool,
    query_calls: usize,
}

/// In-memory page implementing [`Driver`]. Cloning shares the same DOM.
#[derive(Clone, Default)]
pub struct FakePage {
    dom: Arc<Mutex<Dom>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.clone())
    }

    /// Adds a root-level node; returns its id for later mutation.
    pub fn add(&self, tag: &str, attrs: &[(&str, &str)], text: &str) -> u64 {
        self.add_child_of(None, tag, attrs, text)
    }

    /// Adds a node under `parent`.
    pub fn add_child(&self, parent: u64, tag: &str, attrs: &[(&str, &str)], text: &str) -> u64 {
        self.add_child_of(Some(parent), tag, attrs, text)
    }

    fn add_child_of(
        &self,
        parent: Option<u64>,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> u64 {
        let mut dom = self.dom.lock();
        dom.next_id += 1;
        let id = dom.next_id;
        dom.nodes.push(Node {
            id,
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            css: HashMap::new(),
            text: text.to_string(),
            displayed: true,
            enabled: true,
            parent,
            removed: false,
        });
        id
    }

    pub fn set_text(&self, id: u64, text: &str) {
        self.with_node(id, |node| node.text = text.to_string());
    }

    pub fn set_attr(&self, id: u64, name: &str, value: &str) {
        self.with_node(id, |node| {
            node.attrs.insert(name.to_string(), value.to_string());
        });
    }

    pub fn set_css(&self, id: u64, name: &str, value: &str) {
        self.with_node(id, |node| {
            node.css.insert(name.to_string(), value.to_string());
        });
    }

    pub fn show(&self, id: u64) {
        self.with_node(id, |node| node.displayed = true);
    }

    pub fn hide(&self, id: u64) {
        self.with_node(id, |node| node.displayed = false);
    }

    pub fn set_enabled(&self, id: u64, enabled: bool) {
        self.with_node(id, |node| node.enabled = enabled);
    }

    /// Detaches the node and all its descendants.
    pub fn remove(&self, id: u64) {
        let mut dom = self.dom.lock();
        let mut doomed = vec![id];
        loop {
            let more: Vec<u64> = dom
                .nodes
                .iter()
                .filter(|n| {
                    !n.removed
                        && !doomed.contains(&n.id)
                        && n.parent.is_some_and(|p| doomed.contains(&p))
                })
                .map(|n| n.id)
                .collect();
            if more.is_empty() {
                break;
            }
            doomed.extend(more);
        }
        for node in dom.nodes.iter_mut() {
            if doomed.contains(&node.id) {
                node.removed = true;
            }
        }
    }

    /// Simulates the browser/session dying: everything fails fatally.
    pub fn close(&self) {
        self.dom.lock().closed = true;
    }

    pub fn query_calls(&self) -> usize {
        self.dom.lock().query_calls
    }

    /// Assertion helper: reads an attribute straight from the DOM.
    pub fn attr(&self, id: u64, name: &str) -> Option<String> {
        self.dom
            .lock()
            .nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    fn with_node(&self, id: u64, mutate: impl FnOnce(&mut Node)) {
        let mut dom = self.dom.lock();
        if let Some(node) = dom.nodes.iter_mut().find(|n| n.id == id) {
            mutate(node);
        }
    }

    fn live_node(&self, element: &ElementRef) -> DriverResult<Node> {
        let dom = self.dom.lock();
        if dom.closed {
            return Err(DriverError::SessionClosed("browser is gone".to_string()));
        }
        let id = element
            .id()
            .parse::<u64>()
            .map_err(|_| DriverError::Other(format!("malformed reference '{element}'")))?;
        match dom.nodes.iter().find(|n| n.id == id) {
            Some(node) if !node.removed => Ok(node.clone()),
            _ => Err(DriverError::Stale(format!("element {id} is detached"))),
        }
    }
}

fn matches_css(node: &Node, css: &str) -> bool {
    // Supports tag, #id, .class and tag#id / tag.class combinations;
    // enough for these tests.
    let css = css.trim();
    let mut tag = css;
    let mut id = None;
    let mut class = None;
    if let Some(pos) = css.find(['#', '.']) {
        tag = &css[..pos];
        let rest = &css[pos..];
        if let Some(stripped) = rest.strip_prefix('#') {
            if let Some(dot) = stripped.find('.') {
                id = Some(&stripped[..dot]);
                class = Some(&stripped[dot + 1..]);
            } else {
                id = Some(stripped);
            }
        } else if let Some(stripped) = rest.strip_prefix('.') {
            class = Some(stripped);
        }
    }
    if !tag.is_empty() && node.tag != tag {
        return false;
    }
    if let Some(id) = id {
        if node.attrs.get("id").map(String::as_str) != Some(id) {
            return false;
        }
    }
    if let Some(class) = class {
        let has = node
            .attrs
            .get("class")
            .is_some_and(|all| all.split_whitespace().any(|c| c == class));
        if !has {
            return false;
        }
    }
    true
}

fn is_descendant(nodes: &[Node], node: &Node, ancestor: u64) -> bool {
    let mut current = node.parent;
    while let Some(parent_id) = current {
        if parent_id == ancestor {
            return true;
        }
        current = nodes
            .iter()
            .find(|n| n.id == parent_id)
            .and_then(|n| n.parent);
    }
    false
}

#[async_trait]
impl Driver for FakePage {
    async fn query(
        &self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementRef>> {
        let mut dom = self.dom.lock();
        if dom.closed {
            return Err(DriverError::SessionClosed("browser is gone".to_string()));
        }
        dom.query_calls += 1;

        let scope_id = match scope {
            Some(reference) => {
                let id = reference
                    .id()
                    .parse::<u64>()
                    .map_err(|_| DriverError::Other(format!("malformed reference '{reference}'")))?;
                match dom.nodes.iter().find(|n| n.id == id) {
                    Some(node) if !node.removed => Some(id),
                    _ => return Err(DriverError::Stale(format!("scope {id} is detached"))),
                }
            }
            None => None,
        };

        let Selector::Css(css) = selector else {
            return Err(DriverError::Other("xpath not supported by FakePage".to_string()));
        };

        let nodes = &dom.nodes;
        Ok(nodes
            .iter()
            .filter(|n| !n.removed)
            .filter(|n| matches_css(n, css))
            .filter(|n| scope_id.is_none_or(|scope| is_descendant(nodes, n, scope)))
            .map(|n| ElementRef::new(n.id.to_string()))
            .collect())
    }

    async fn text(&self, element: &ElementRef) -> DriverResult<String> {
        Ok(self.live_node(element)?.text)
    }

    async fn tag_name(&self, element: &ElementRef) -> DriverResult<String> {
        Ok(self.live_node(element)?.tag)
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        Ok(self.live_node(element)?.attrs.get(name).cloned())
    }

    async fn css_value(&self, element: &ElementRef, name: &str) -> DriverResult<String> {
        Ok(self
            .live_node(element)?
            .css
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool> {
        Ok(self.live_node(element)?.displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool> {
        Ok(self.live_node(element)?.enabled)
    }

    async fn is_stale(&self, element: &ElementRef) -> DriverResult<bool> {
        let dom = self.dom.lock();
        if dom.closed {
            return Err(DriverError::SessionClosed("browser is gone".to_string()));
        }
        let Ok(id) = element.id().parse::<u64>() else {
            return Ok(true);
        };
        Ok(!dom.nodes.iter().any(|n| n.id == id && !n.removed))
    }

    async fn click(&self, element: &ElementRef) -> DriverResult<()> {
        let node = self.live_node(element)?;
        if !node.displayed || !node.enabled {
            return Err(DriverError::NotInteractable(format!(
                "element {} ignores clicks",
                node.id
            )));
        }
        self.with_node(node.id, |n| {
            n.attrs
                .insert("data-clicked".to_string(), "true".to_string());
        });
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, keys: &str) -> DriverResult<()> {
        let node = self.live_node(element)?;
        if !node.displayed {
            return Err(DriverError::NotInteractable(format!(
                "element {} ignores keys",
                node.id
            )));
        }
        self.with_node(node.id, |n| {
            let value = n.attrs.entry("value".to_string()).or_default();
            value.push_str(keys);
        });
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> DriverResult<()> {
        let node = self.live_node(element)?;
        self.with_node(node.id, |n| {
            n.attrs.insert("value".to_string(), String::new());
        });
        Ok(())
    }
}
