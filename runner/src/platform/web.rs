use super::Platform;
use crate::error::Runner_Error;
use crate::notice::Notice;
use lively_api::{Draw_Command, Draw_Kind, Frame_Input, Key};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent};

const NOTICE_FRAMES: u32 = 180;

type Key_Queue = Rc<RefCell<Vec<(Key, bool)>>>;

pub struct Canvas_Platform {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    key_events: Key_Queue,
    notice: Option<(String, u32)>,
}

fn map_key(key: &str) -> Option<Key> {
    match key {
        "ArrowLeft" | "a" => Some(Key::Left),
        "ArrowRight" | "d" => Some(Key::Right),
        "ArrowUp" | "w" => Some(Key::Up),
        "ArrowDown" | "s" => Some(Key::Down),
        " " => Some(Key::Space),
        "Escape" => Some(Key::Escape),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        _ => None,
    }
}

fn context_failure(what: &str) -> Runner_Error {
    Runner_Error::Platform_Context_Failure(String::from(what))
}

impl Canvas_Platform {
    /// Binds to the canvas with id `canvas_id`, creating one if it doesn't exist.
    pub fn new(canvas_id: &str, size: (u32, u32)) -> Result<Self, Runner_Error> {
        let window = web_sys::window().ok_or_else(|| context_failure("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| context_failure("no document"))?;

        let canvas = match document.get_element_by_id(canvas_id) {
            Some(elem) => elem
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| context_failure("element is not a canvas"))?,
            None => {
                let canvas = document
                    .create_element("canvas")
                    .and_then(|e| e.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
                    .map_err(|_| context_failure("failed to create canvas"))?;
                canvas.set_id(canvas_id);
                canvas.set_width(size.0);
                canvas.set_height(size.1);
                document
                    .body()
                    .ok_or_else(|| context_failure("no body"))?
                    .append_child(&canvas)
                    .map_err(|_| context_failure("failed to attach canvas"))?;
                canvas
            }
        };

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| context_failure("no 2d context"))?;

        let key_events: Key_Queue = Rc::new(RefCell::new(Vec::new()));
        for (event_name, down) in &[("keydown", true), ("keyup", false)] {
            let queue = key_events.clone();
            let down = *down;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = map_key(&event.key()) {
                    event.prevent_default();
                    queue.borrow_mut().push((key, down));
                }
            });
            window
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())
                .map_err(|_| context_failure("failed to add key listener"))?;
            closure.forget();
        }

        Ok(Canvas_Platform {
            canvas,
            ctx,
            key_events,
            notice: None,
        })
    }
}

fn css_color([r, g, b, a]: [u8; 4]) -> JsValue {
    JsValue::from_str(&format!(
        "rgba({}, {}, {}, {})",
        r,
        g,
        b,
        f32::from(a) / 255.
    ))
}

impl Platform for Canvas_Platform {
    fn poll_events(&mut self, input: &mut Frame_Input) {
        for (key, down) in self.key_events.borrow_mut().drain(..) {
            input.set_key(key, down);
        }
        input.window_size = [self.canvas.width(), self.canvas.height()];
    }

    fn present(&mut self, commands: &[Draw_Command]) {
        let (w, h) = (
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
        for cmd in commands {
            self.ctx.set_fill_style(&css_color(cmd.color));
            match cmd.kind {
                Draw_Kind::Clear => self.ctx.fill_rect(0., 0., w, h),
                Draw_Kind::Rect => {
                    let [x, y, rw, rh] = cmd.rect;
                    self.ctx
                        .fill_rect(f64::from(x), f64::from(y), f64::from(rw), f64::from(rh));
                }
            }
        }

        if let Some((text, frames_left)) = &mut self.notice {
            self.ctx.set_fill_style(&JsValue::from_str("white"));
            let _ = self.ctx.fill_text(text, 8., h - 12.);
            *frames_left -= 1;
            if *frames_left == 0 {
                self.notice = None;
            }
        }
    }

    fn should_close(&self) -> bool {
        false
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.notice = Some((notice.to_string(), NOTICE_FRAMES));
    }
}
