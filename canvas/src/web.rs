//! Browser host: binds the engine to a WebSocket, the document and a canvas.
//!
//! Everything runs on the page's single thread. Each DOM callback borrows the
//! shared [`EngineCore`] for the duration of one event and never yields while
//! holding it, so the message handler always replaces the snapshot in full
//! before the next animation frame reads it.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    BinaryType, CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MessageEvent, MouseEvent, WebSocket,
};

use crate::engine::{EngineCore, Frame};
use crate::render::{CanvasSurface, RenderConfig};

type Shared = Rc<RefCell<EngineCore>>;

/// A running game client attached to one canvas element.
#[wasm_bindgen]
pub struct Client {
    engine: Shared,
    socket: WebSocket,
}

#[wasm_bindgen]
impl Client {
    /// Size the canvas, open the connection and start the render loop.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context, the URL is rejected by
    /// the `WebSocket` constructor, or the window is unavailable.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, url: &str, factor: f64) -> Result<Client, JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("console logger already installed");
        }

        let config = RenderConfig::new(factor);
        let size = config.surface_size();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size_px = size.round() as u32;
        canvas.set_width(size_px);
        canvas.set_height(size_px);

        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let socket = WebSocket::new(url)?;
        socket.set_binary_type(BinaryType::Arraybuffer);

        let engine: Shared = Rc::new(RefCell::new(EngineCore::new(config)));

        bind_socket(&socket, &engine);
        bind_keys(&socket, &engine)?;
        bind_click(&canvas, &socket, &engine)?;
        start_render_loop(CanvasSurface::new(ctx, size, size), Rc::clone(&engine))?;

        log::info!("connecting to {url}");
        Ok(Self { engine, socket })
    }

    /// Close the connection. The last snapshot keeps rendering.
    ///
    /// # Errors
    ///
    /// Propagates the `WebSocket.close()` exception, if any.
    pub fn close(&self) -> Result<(), JsValue> {
        self.socket.close()
    }

    /// Entity id the server assigned to this client, once known.
    #[wasm_bindgen(getter, js_name = localEntityId)]
    pub fn local_entity_id(&self) -> Option<u8> {
        self.engine.borrow().local_entity_id()
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.engine.borrow().is_open()
    }
}

fn bind_socket(socket: &WebSocket, engine: &Shared) {
    let on_open = {
        let engine = Rc::clone(engine);
        Closure::<dyn FnMut()>::new(move || {
            log::info!("connected");
            engine.borrow_mut().on_open();
        })
    };
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
    on_open.forget();

    let on_close = {
        let engine = Rc::clone(engine);
        Closure::<dyn FnMut()>::new(move || {
            log::info!("connection closed");
            engine.borrow_mut().on_close();
        })
    };
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
    on_close.forget();

    let on_message = {
        let engine = Rc::clone(engine);
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Ok(buffer) = event.data().dyn_into::<js_sys::ArrayBuffer>() else {
                log::warn!("ignoring non-binary message");
                return;
            };
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            if let Err(err) = engine.borrow_mut().on_message(&bytes) {
                log::warn!("rejected snapshot ({} bytes): {err}", bytes.len());
            }
        })
    };
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();
}

fn bind_keys(socket: &WebSocket, engine: &Shared) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;

    let on_key_down = {
        let engine = Rc::clone(engine);
        let socket = socket.clone();
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            send(&socket, engine.borrow().on_key_down(&event.key(), event.repeat()));
        })
    };
    document.add_event_listener_with_callback("keydown", on_key_down.as_ref().unchecked_ref())?;
    on_key_down.forget();

    let on_key_up = {
        let engine = Rc::clone(engine);
        let socket = socket.clone();
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            send(&socket, engine.borrow().on_key_up(&event.key()));
        })
    };
    document.add_event_listener_with_callback("keyup", on_key_up.as_ref().unchecked_ref())?;
    on_key_up.forget();

    Ok(())
}

fn bind_click(canvas: &HtmlCanvasElement, socket: &WebSocket, engine: &Shared) -> Result<(), JsValue> {
    let on_click = {
        let engine = Rc::clone(engine);
        let socket = socket.clone();
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let outbound = engine
                .borrow()
                .on_click(f64::from(event.offset_x()), f64::from(event.offset_y()));
            send(&socket, outbound);
        })
    };
    canvas.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn send(socket: &WebSocket, outbound: Option<Vec<u8>>) {
    let Some(bytes) = outbound else {
        return;
    };
    if let Err(err) = socket.send_with_u8_array(&bytes) {
        log::warn!("send failed: {err:?}");
    }
}

fn start_render_loop(mut surface: CanvasSurface, engine: Shared) -> Result<(), JsValue> {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&tick);

    *tick.borrow_mut() = Some(Closure::new(move || {
        if let Frame::Failed { error, repeated: false } = engine.borrow_mut().render(&mut surface) {
            log::warn!("snapshot not drawn: {error}");
        }
        if let Some(callback) = next.borrow().as_ref() {
            if let Err(err) = request_animation_frame(callback) {
                log::error!("render loop stopped: {err:?}");
            }
        }
    }));

    let first = tick.borrow();
    match first.as_ref() {
        Some(callback) => request_animation_frame(callback),
        None => Ok(()),
    }
}

fn request_animation_frame(callback: &Closure<dyn FnMut()>) -> Result<(), JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("window unavailable"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map(|_handle| ())
}
