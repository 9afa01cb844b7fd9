//! In-memory element host for unit tests.

use crate::element::ElementHost;
use kurbo::{Rect, Size, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;

/// Route `log` output to the test harness. Set `RUST_LOG` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handle to a node of the fake tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeElement(pub usize);

#[derive(Debug, Clone, Default)]
struct Node {
    selector: Option<String>,
    rect: Rect,
    styles: HashMap<String, String>,
    classes: Vec<String>,
    children: Vec<usize>,
    parent: Option<usize>,
    scroll: Vec2,
    extent: Size,
    client: Size,
}

/// RefCell-backed element tree. Node 0 is the document root, node 1 the body.
#[derive(Debug)]
pub struct FakeHost {
    nodes: RefCell<Vec<Node>>,
}

pub const ROOT: FakeElement = FakeElement(0);
pub const BODY: FakeElement = FakeElement(1);

impl FakeHost {
    pub fn new() -> Self {
        let root = Node {
            rect: Rect::new(0.0, 0.0, 1024.0, 768.0),
            client: Size::new(1024.0, 768.0),
            extent: Size::new(1024.0, 768.0),
            children: vec![1],
            ..Node::default()
        };
        let body = Node {
            rect: Rect::new(0.0, 0.0, 1024.0, 768.0),
            parent: Some(0),
            ..Node::default()
        };
        Self {
            nodes: RefCell::new(vec![root, body]),
        }
    }

    /// Add an element under the body.
    pub fn add_element(&self, rect: Rect) -> FakeElement {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(Node {
            rect,
            client: rect.size(),
            extent: rect.size(),
            parent: Some(BODY.0),
            ..Node::default()
        });
        nodes[BODY.0].children.push(id);
        FakeElement(id)
    }

    /// Add an element that `resolve` finds under the given selector.
    pub fn add_selectable(&self, selector: &str, rect: Rect) -> FakeElement {
        let el = self.add_element(rect);
        self.nodes.borrow_mut()[el.0].selector = Some(selector.to_string());
        el
    }

    pub fn set_rect(&self, el: &FakeElement, rect: Rect) {
        self.nodes.borrow_mut()[el.0].rect = rect;
    }

    /// Set the scrollable content size of an element.
    pub fn set_extent(&self, el: &FakeElement, extent: Size) {
        self.nodes.borrow_mut()[el.0].extent = extent;
    }

    pub fn classes(&self, el: &FakeElement) -> Vec<String> {
        self.nodes.borrow()[el.0].classes.clone()
    }

    pub fn has_class(&self, el: &FakeElement, class: &str) -> bool {
        self.nodes.borrow()[el.0].classes.iter().any(|c| c == class)
    }

    pub fn children(&self, el: &FakeElement) -> Vec<FakeElement> {
        self.nodes.borrow()[el.0]
            .children
            .iter()
            .map(|&id| FakeElement(id))
            .collect()
    }

    pub fn parent(&self, el: &FakeElement) -> Option<FakeElement> {
        self.nodes.borrow()[el.0].parent.map(FakeElement)
    }

    fn clone_node(nodes: &mut Vec<Node>, id: usize) -> usize {
        let mut node = nodes[id].clone();
        node.parent = None;
        node.selector = None;
        let children = std::mem::take(&mut node.children);
        let new_id = nodes.len();
        nodes.push(node);
        for child in children {
            let cloned = Self::clone_node(nodes, child);
            nodes[cloned].parent = Some(new_id);
            nodes[new_id].children.push(cloned);
        }
        new_id
    }
}

impl ElementHost for FakeHost {
    type Element = FakeElement;

    fn resolve(&self, selector: &str) -> Option<FakeElement> {
        self.nodes
            .borrow()
            .iter()
            .position(|n| n.selector.as_deref() == Some(selector))
            .map(FakeElement)
    }

    fn document_root(&self) -> FakeElement {
        ROOT
    }

    fn ghost_layer(&self) -> FakeElement {
        BODY
    }

    fn bounding_rect(&self, el: &FakeElement) -> Rect {
        self.nodes.borrow()[el.0].rect
    }

    fn clone_element(&self, el: &FakeElement) -> Option<FakeElement> {
        let mut nodes = self.nodes.borrow_mut();
        Some(FakeElement(Self::clone_node(&mut nodes, el.0)))
    }

    fn create_element(&self) -> Option<FakeElement> {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node::default());
        Some(FakeElement(nodes.len() - 1))
    }

    fn set_style(&self, el: &FakeElement, property: &str, value: &str) {
        self.nodes.borrow_mut()[el.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn style(&self, el: &FakeElement, property: &str) -> Option<String> {
        self.nodes.borrow()[el.0].styles.get(property).cloned()
    }

    fn append_child(&self, parent: &FakeElement, child: &FakeElement) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[parent.0].children.push(child.0);
        nodes[child.0].parent = Some(parent.0);
    }

    fn remove_child(&self, parent: &FakeElement, child: &FakeElement) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[parent.0].children.retain(|&c| c != child.0);
        if nodes[child.0].parent == Some(parent.0) {
            nodes[child.0].parent = None;
        }
    }

    fn add_class(&self, el: &FakeElement, class: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[el.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, el: &FakeElement, class: &str) {
        self.nodes.borrow_mut()[el.0].classes.retain(|c| c != class);
    }

    fn scroll_offset(&self, el: &FakeElement) -> Vec2 {
        self.nodes.borrow()[el.0].scroll
    }

    fn set_scroll_offset(&self, el: &FakeElement, offset: Vec2) {
        self.nodes.borrow_mut()[el.0].scroll = offset;
    }

    fn scroll_extent(&self, el: &FakeElement) -> Size {
        self.nodes.borrow()[el.0].extent
    }

    fn client_size(&self, el: &FakeElement) -> Size {
        self.nodes.borrow()[el.0].client
    }
}
