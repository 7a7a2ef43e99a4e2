use crate::config::Runner_Config;
use crate::host::{Host, Step_Result};
use crate::module::Module_Handle;
use crate::platform::web::Canvas_Platform;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "lively-canvas";

type Web_Host = Host<Canvas_Platform>;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    lively_diagnostics::add_default_logger();
    linfo!("Starting Lively ({})", crate::variant::Build_Variant::current());

    let config = Runner_Config::default();
    let platform = Canvas_Platform::new(CANVAS_ID, config.window_size)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let module = Module_Handle::new_static(lively_game::game_api());
    let host = Host::new(platform, module, (), &config)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;

    request_animation_frame(Rc::new(RefCell::new(Some(host))));
    Ok(())
}

fn request_animation_frame(host: Rc<RefCell<Option<Web_Host>>>) {
    let window = match web_sys::window() {
        Some(w) => w,
        None => fatal!("No window to animate!"),
    };
    let closure = Closure::once(move |timestamp_ms: f64| {
        host_frame(host, timestamp_ms);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn host_frame(host: Rc<RefCell<Option<Web_Host>>>, timestamp_ms: f64) {
    let now = Duration::from_secs_f64(timestamp_ms.max(0.) / 1000.);
    let quit = match host.borrow_mut().as_mut() {
        Some(h) => h.step(now) == Step_Result::Quit,
        None => return,
    };

    if quit {
        if let Some(h) = host.borrow_mut().take() {
            h.shutdown();
        }
    } else {
        request_animation_frame(host);
    }
}
