//! [`ElementHost`] over the browser DOM.

use ghostdrag_core::{DragError, DragResult, ElementHost};
use kurbo::{Rect, Size, Vec2};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

/// DOM element host for the current page.
#[derive(Debug, Clone)]
pub struct WebHost {
    document: Document,
    root: HtmlElement,
    body: HtmlElement,
}

impl WebHost {
    /// Bind to the page's document.
    pub fn new() -> DragResult<Self> {
        let window = web_sys::window().ok_or(DragError::NoWindow)?;
        let document = window.document().ok_or(DragError::NoDocument)?;
        let root = document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| DragError::Dom("document has no root element".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| DragError::Dom("document has no body".to_string()))?;
        Ok(Self { document, root, body })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl ElementHost for WebHost {
    type Element = HtmlElement;

    fn resolve(&self, selector: &str) -> Option<HtmlElement> {
        match self.document.query_selector(selector) {
            Ok(found) => found.and_then(|el| el.dyn_into::<HtmlElement>().ok()),
            Err(err) => {
                log::warn!("Invalid selector {selector:?}: {err:?}");
                None
            }
        }
    }

    fn document_root(&self) -> HtmlElement {
        self.root.clone()
    }

    fn ghost_layer(&self) -> HtmlElement {
        self.body.clone()
    }

    fn bounding_rect(&self, element: &HtmlElement) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom())
    }

    fn clone_element(&self, element: &HtmlElement) -> Option<HtmlElement> {
        element
            .clone_node_with_deep(true)
            .ok()
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
    }

    fn create_element(&self) -> Option<HtmlElement> {
        self.document
            .create_element("div")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn set_style(&self, element: &HtmlElement, property: &str, value: &str) {
        if let Err(err) = element.style().set_property(property, value) {
            log::debug!("Failed to set {property}: {err:?}");
        }
    }

    fn style(&self, element: &HtmlElement, property: &str) -> Option<String> {
        element
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn append_child(&self, parent: &HtmlElement, child: &HtmlElement) {
        if let Err(err) = parent.append_child(child) {
            log::warn!("Failed to append element: {err:?}");
        }
    }

    fn remove_child(&self, parent: &HtmlElement, child: &HtmlElement) {
        // Already detached elements are fine.
        let _ = parent.remove_child(child);
    }

    fn add_class(&self, element: &HtmlElement, class: &str) {
        let _ = element.class_list().add_1(class);
    }

    fn remove_class(&self, element: &HtmlElement, class: &str) {
        let _ = element.class_list().remove_1(class);
    }

    fn scroll_offset(&self, element: &HtmlElement) -> Vec2 {
        Vec2::new(f64::from(element.scroll_left()), f64::from(element.scroll_top()))
    }

    fn set_scroll_offset(&self, element: &HtmlElement, offset: Vec2) {
        element.set_scroll_left(offset.x.round() as i32);
        element.set_scroll_top(offset.y.round() as i32);
    }

    fn scroll_extent(&self, element: &HtmlElement) -> Size {
        Size::new(
            f64::from(element.scroll_width()),
            f64::from(element.scroll_height()),
        )
    }

    fn client_size(&self, element: &HtmlElement) -> Size {
        Size::new(
            f64::from(element.client_width()),
            f64::from(element.client_height()),
        )
    }
}
