//! Browser entry points.
//!
//! The page's own controls call the exported functions below. They only post
//! [`UiEvent`]s to the running event loop; all state changes happen on the
//! loop like any other input.

use std::cell::RefCell;

use wasm_bindgen::{JsCast, prelude::*};
use winit::event_loop::EventLoopProxy;

use crate::{
    config::Config,
    configurator::SavedDesign,
    data_structures::color::Color,
    flow::{FlowEvent, UiEvent},
    upload::Upload,
};

thread_local! {
    static PROXY: RefCell<Option<EventLoopProxy<FlowEvent>>> = const { RefCell::new(None) };
}

pub(crate) fn register_proxy(proxy: EventLoopProxy<FlowEvent>) {
    PROXY.with(|slot| *slot.borrow_mut() = Some(proxy));
}

fn post(event: UiEvent) -> Result<(), JsValue> {
    PROXY.with(|slot| match slot.borrow().as_ref() {
        Some(proxy) => proxy
            .send_event(FlowEvent::Ui(event))
            .map_err(|_| JsValue::from_str("The configurator has shut down")),
        None => Err(JsValue::from_str("The configurator is not running yet")),
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    crate::flow::run(Config::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

/// Paint the model in a `#rrggbb` colour.
#[wasm_bindgen]
pub fn pick_color(hex: &str) -> Result<(), JsValue> {
    let color = Color::from_hex(hex).map_err(|e| JsValue::from_str(&e.to_string()))?;
    post(UiEvent::ColorPicked(color))
}

/// Map an uploaded file onto the model. Only JPEG files are accepted.
#[wasm_bindgen]
pub fn upload_image(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
    post(UiEvent::ImageUploaded(Upload::new(file_name, mime_type, bytes)))
}

/// Export the current model and download it.
#[wasm_bindgen]
pub fn save_design() -> Result<(), JsValue> {
    post(UiEvent::SaveRequested)
}

pub(crate) fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if window.alert_with_message(message).is_err() {
            log::warn!("Could not show alert: {}", message);
        }
    }
}

/// Offer `design` as a file download through a temporary object URL.
pub(crate) fn download(design: &SavedDesign) -> anyhow::Result<()> {
    let js_err = |e: JsValue| anyhow::anyhow!("{:?}", e);

    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No browser window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("No document"))?;

    let uint8_array = js_sys::Uint8Array::new_with_length(design.bytes.len() as u32);
    uint8_array.copy_from(&design.bytes);
    let array = js_sys::Array::new();
    array.push(&uint8_array.buffer());
    let blob = web_sys::Blob::new_with_u8_array_sequence(&array).map_err(js_err)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_err)?;

    let anchor = document
        .create_element("a")
        .map_err(js_err)?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| anyhow::anyhow!("Could not create a download link"))?;
    anchor.set_href(&url);
    anchor.set_download(&design.file_name);
    anchor.click();
    web_sys::Url::revoke_object_url(&url).map_err(js_err)?;
    log::info!("Downloaded {}", design.file_name);
    Ok(())
}
