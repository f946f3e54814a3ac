//! Section navigation for the page chrome.
//!
//! A `button.departure` shows the `div.section` sharing its id and hides the
//! rest; a `button.return` hides its own section again.

use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, NodeList};

const ACTIVE: &str = "active";

fn elements(list: &NodeList) -> impl Iterator<Item = Element> + '_ {
    (0..list.length()).filter_map(|i| list.get(i).and_then(|node| node.dyn_into().ok()))
}

fn on_click(button: &Element, handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

pub fn wire_sections_in(document: &Document) -> Result<(), JsValue> {
    let sections = document.query_selector_all("div.section")?;

    for button in elements(&document.query_selector_all("button.departure")?) {
        let id = button.id();
        let sections = sections.clone();
        on_click(&button, move || {
            for section in elements(&sections) {
                let show = section.id() == id;
                if let Err(e) = section.class_list().toggle_with_force(ACTIVE, show) {
                    warn!("Could not toggle section {}: {e:?}", section.id());
                }
            }
        })?;
    }

    for button in elements(&document.query_selector_all("button.return")?) {
        let id = button.id();
        let document = document.clone();
        on_click(&button, move || {
            if let Ok(Some(section)) = document.query_selector(&format!("div.section#{id}")) {
                if let Err(e) = section.class_list().remove_1(ACTIVE) {
                    warn!("Could not hide section {id}: {e:?}");
                }
            }
        })?;
    }
    Ok(())
}

#[wasm_bindgen]
pub fn wire_sections() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("Failed to get document")?;
    wire_sections_in(&document)
}
