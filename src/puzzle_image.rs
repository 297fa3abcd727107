use std::rc::Rc;

use gloo::events::EventListener;
use wasm_bindgen::JsValue;
use web_sys::{File, HtmlImageElement, Url};

use hamekomi_core::catalog::puzzle_by_slug;

pub(crate) fn resolve_catalog_src(slug: &str) -> Option<String> {
    puzzle_by_slug(slug).map(|entry| entry.src.to_string())
}

pub(crate) fn create_object_url(file: &File) -> Result<String, JsValue> {
    Url::create_object_url_with_blob(file)
}

pub(crate) fn revoke_object_url(url: &str) {
    let _ = Url::revoke_object_url(url);
}

// Starts a decode and hands the element back once its natural size is known.
// The forgotten listeners keep the element alive until the browser fires one
// of the two events; a failed load only logs.
pub(crate) fn load_image(src: &str, on_ready: Rc<dyn Fn(HtmlImageElement)>) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;
    let loaded = image.clone();
    EventListener::once(&image, "load", move |_| {
        on_ready(loaded.clone());
    })
    .forget();
    let failed_src = src.to_string();
    EventListener::once(&image, "error", move |_| {
        gloo::console::warn!("image failed to load:", failed_src.clone());
    })
    .forget();
    image.set_src(src);
    Ok(())
}
