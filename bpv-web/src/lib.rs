/// Blueprint viewer for the browser
///
/// Mounts a `<canvas>` into a host element, drives frames with `requestAnimationFrame` and loads
/// blueprint metadata with `fetch`.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bpv_core::{BlueprintMetadata, Credential, FetchError, FetchOutcome, FetchRequest, Viewer, ViewerConfig};
use wasm_bindgen::prelude::*;

pub mod canvas;
pub mod scheduler;

pub use canvas::{CanvasSurface, DocumentFonts, DomMount};
pub use scheduler::{BrowserViewer, RafScheduler};

/// Font family used for the dimensions label
const LABEL_FAMILY: &str = "sans-serif";

pub(crate) fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

pub(crate) fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// One viewer bound to a page element
#[wasm_bindgen]
pub struct BlueprintViewer {
    viewer: Rc<RefCell<BrowserViewer>>,
    http: reqwest::Client,
}

#[wasm_bindgen]
impl BlueprintViewer {
    /// `config` is an optional JSON viewer configuration; `token` a bearer token for the API
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>, token: Option<String>) -> Result<BlueprintViewer, JsValue> {
        let config = match config {
            Some(json) => ViewerConfig::from_json_str(&json).map_err(js_error)?,
            None => ViewerConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let document = window.document().ok_or_else(|| js_error("no document"))?;

        let fonts = DocumentFonts::new(document, LABEL_FAMILY, config.label_size.ceil() as u32);
        let viewer = Rc::new_cyclic(|weak: &Weak<RefCell<BrowserViewer>>| {
            let scheduler = RafScheduler::new(window, weak.clone());
            RefCell::new(Viewer::new(&config, scheduler, fonts))
        });
        if let Some(token) = token {
            viewer.borrow_mut().set_credential(Some(Credential::bearer(token)));
        }

        Ok(Self {
            viewer,
            http: reqwest::Client::new(),
        })
    }

    /// Attach to the element with id `host_id` and start rendering
    pub fn mount(&mut self, host_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| js_error("no document"))?;
        let host = document
            .get_element_by_id(host_id)
            .ok_or_else(|| js_error(format!("no element with id {host_id}")))?;

        self.viewer
            .borrow_mut()
            .mount(DomMount::new(document, host))
            .map_err(js_error)?;
        if !self.viewer.borrow().is_loop_running() {
            console_error("render loop did not start: requestAnimationFrame refused");
        }
        self.dispatch_fetch();
        Ok(())
    }

    pub fn unmount(&mut self) {
        self.viewer.borrow_mut().unmount();
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.viewer.borrow().is_mounted()
    }

    #[wasm_bindgen(js_name = setBlueprint)]
    pub fn set_blueprint(&mut self, id: &str) {
        self.viewer.borrow_mut().set_blueprint(id);
        self.dispatch_fetch();
    }

    /// One of `top`, `front`, `right`, `left`
    #[wasm_bindgen(js_name = setView)]
    pub fn set_view(&mut self, view: &str) -> Result<(), JsValue> {
        self.viewer.borrow_mut().select_view(view).map_err(js_error)
    }

    /// Hex color such as `#ff8800`, or `none` for the default
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, color: &str) {
        self.viewer.borrow_mut().set_color(color);
    }

    #[wasm_bindgen(js_name = setAutoRotate)]
    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.viewer.borrow_mut().set_auto_rotate(enabled);
    }

    /// Nudge the camera by `azimuth` / `polar` radians
    pub fn orbit(&mut self, azimuth: f32, polar: f32) {
        self.viewer.borrow_mut().orbit(azimuth, polar);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewer
            .borrow_mut()
            .resize(bpv_core::SurfaceSize { width, height });
    }

    /// Run the viewer's pending fetch on the browser's event loop
    fn dispatch_fetch(&self) {
        let Some(request) = self.viewer.borrow_mut().take_fetch_request() else {
            return;
        };
        let viewer = Rc::downgrade(&self.viewer);
        let http = self.http.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_metadata(&http, &request).await;
            if let Err(err) = &result {
                console_warn(&format!("failed to load blueprint {}: {err}", request.ticket.id));
            }
            let outcome = FetchOutcome {
                ticket: request.ticket,
                result,
            };
            // The viewer may have been dropped while the request was in flight
            if let Some(viewer) = viewer.upgrade() {
                viewer.borrow_mut().complete_fetch(outcome);
            }
        });
    }
}

async fn fetch_metadata(
    http: &reqwest::Client,
    request: &FetchRequest,
) -> Result<BlueprintMetadata, FetchError> {
    let mut builder = http.get(&request.url);
    if let Some(credential) = &request.credential {
        builder = builder.header("Authorization", credential.authorization());
    }

    let response = builder
        .send()
        .await
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    BlueprintMetadata::from_json(&body)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
