//! Visual element host abstraction.
//!
//! The engine never touches a rendering technology directly. A platform
//! binding implements [`ElementHost`] over its own element handles (DOM nodes
//! in the browser), and the engine drives clone/style/append/remove through it.

use kurbo::{Rect, Size, Vec2};
use std::fmt::Debug;

/// Operations the engine needs from the platform's element tree.
///
/// All methods take `&self`: element handles are shared with drop targets and
/// platform handles are expected to be interior-mutable.
pub trait ElementHost {
    /// Opaque handle to one visual element.
    type Element: Clone + Debug;

    /// Resolve a selector to an element.
    fn resolve(&self, selector: &str) -> Option<Self::Element>;

    /// The document root, used when a viewport selector does not resolve.
    fn document_root(&self) -> Self::Element;

    /// Container ghost elements are attached to.
    fn ghost_layer(&self) -> Self::Element;

    /// Bounding rectangle in client coordinates.
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Structural deep clone, detached from the tree.
    fn clone_element(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Create an empty detached block element.
    fn create_element(&self) -> Option<Self::Element>;

    fn set_style(&self, element: &Self::Element, property: &str, value: &str);

    fn style(&self, element: &Self::Element, property: &str) -> Option<String>;

    fn append_child(&self, parent: &Self::Element, child: &Self::Element);

    fn remove_child(&self, parent: &Self::Element, child: &Self::Element);

    fn add_class(&self, element: &Self::Element, class: &str);

    fn remove_class(&self, element: &Self::Element, class: &str);

    /// Current scroll offset of a scrollable element.
    fn scroll_offset(&self, element: &Self::Element) -> Vec2;

    fn set_scroll_offset(&self, element: &Self::Element, offset: Vec2);

    /// Total size of the scrollable content.
    fn scroll_extent(&self, element: &Self::Element) -> Size;

    /// Visible size of the element's content box.
    fn client_size(&self, element: &Self::Element) -> Size;
}
