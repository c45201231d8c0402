/// `requestAnimationFrame` as the viewer's frame scheduler
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bpv_core::{FrameHandle, FrameScheduler, SchedulerError, Viewer};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

use crate::canvas::DomMount;
use crate::{console_error, console_warn};

pub type BrowserViewer = Viewer<DomMount, RafScheduler>;

/// Schedules frames on the window and routes each callback back into the viewer
pub struct RafScheduler {
    window: Window,
    viewer: Weak<RefCell<BrowserViewer>>,
}

impl RafScheduler {
    pub fn new(window: Window, viewer: Weak<RefCell<BrowserViewer>>) -> Self {
        Self { window, viewer }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, SchedulerError> {
        let viewer = self.viewer.clone();
        let fired: Rc<Cell<Option<FrameHandle>>> = Rc::new(Cell::new(None));
        let handle_slot = Rc::clone(&fired);

        // Freed by wasm-bindgen after its single call
        let callback = Closure::once_into_js(move |_timestamp: JsValue| {
            let (Some(viewer), Some(handle)) = (viewer.upgrade(), handle_slot.get()) else {
                return;
            };
            if let Ok(mut viewer) = viewer.try_borrow_mut() {
                if viewer.frame(handle) && !viewer.is_loop_running() {
                    console_error("render loop stopped: the next frame could not be scheduled");
                }
            };
        });

        let id = self
            .window
            .request_animation_frame(callback.unchecked_ref())
            .map_err(|err| SchedulerError::Refused(format!("requestAnimationFrame: {err:?}")))?;
        let handle = FrameHandle(id as u64);
        fired.set(Some(handle));
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0 as i32) {
            console_warn(&format!("cancelAnimationFrame failed: {err:?}"));
        }
    }
}
