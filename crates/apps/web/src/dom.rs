use bridge::{AttributeHost, ElementTree};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement};

/// The live page, seen through [`ElementTree`].
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl ElementTree for WebDom {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name()
    }

    fn is_document_root(&self, node: &Element) -> bool {
        matches!(node.tag_name().to_ascii_uppercase().as_str(), "BODY" | "HTML")
    }

    fn set_hidden(&mut self, node: &Element, hidden: bool) {
        let Some(el) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = el.style();
        let result = if hidden {
            style.set_property("visibility", "hidden")
        } else {
            style.remove_property("visibility").map(|_| ())
        };
        if let Err(err) = result {
            tracing::debug!(?err, "visibility style not applied");
        }
    }
}

/// An element carrying the attribute relay.
#[derive(Clone)]
pub struct ElementHost {
    element: Element,
}

impl ElementHost {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl AttributeHost for ElementHost {
    fn read_attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        if let Err(err) = self.element.set_attribute(name, value) {
            tracing::warn!(?err, name, "attribute not written");
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        let _ = self.element.remove_attribute(name);
    }

    fn dispatch_event(&mut self, event: &str) {
        match Event::new(event) {
            Ok(ev) => {
                let _ = self.element.dispatch_event(&ev);
            }
            Err(err) => tracing::warn!(?err, event, "event not dispatched"),
        }
    }
}
