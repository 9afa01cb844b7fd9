//! Class-name helpers.
//!
//! Every class mutation made by the engine and the drop targets goes through
//! these two functions.

use crate::element::ElementHost;

/// Add each class of a space-separated list to an element.
///
/// No-op when the element or the class list is absent.
pub fn add_classes<H: ElementHost + ?Sized>(
    host: &H,
    element: Option<&H::Element>,
    classes: Option<&str>,
) {
    let (Some(element), Some(classes)) = (element, classes) else {
        return;
    };
    for class in classes.split_whitespace() {
        host.add_class(element, class);
    }
}

/// Remove each class of a space-separated list from an element.
///
/// No-op when the element or the class list is absent.
pub fn remove_classes<H: ElementHost + ?Sized>(
    host: &H,
    element: Option<&H::Element>,
    classes: Option<&str>,
) {
    let (Some(element), Some(classes)) = (element, classes) else {
        return;
    };
    for class in classes.split_whitespace() {
        host.remove_class(element, class);
    }
}
