//! Browser build of the bridge: Leaflet engine, real DOM, JS exports.
//!
//! One [`CommandChannel`] lives in thread-local state. Events are delivered
//! after that state is released, so a host listener may call straight back
//! into any export.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use bridge::{AttributeRelay, BridgeConfig, CommandChannel, MapSurface, Pointer, Transport};
use foundation::bounds::LatLng;
use foundation::time::Time;
use protocol::{BridgeEvent, Command, Payload, SyncRequest, encode_event};
use runtime::Clock;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

mod dom;
mod leaflet;
mod logging;

pub use dom::{ElementHost, WebDom};
pub use leaflet::{LeafletEngine, glyph_html};

type Channel = CommandChannel<LeafletEngine, WebDom>;

/// Wall clock backed by `Date.now()`.
struct DateClock;

impl Clock for DateClock {
    fn now(&self) -> Time {
        Time(js_sys::Date::now())
    }
}

struct WebBridge {
    channel: Channel,
    listener: Option<js_sys::Function>,
    relay_element: Option<web_sys::Element>,
    /// Deadline the pending `setTimeout` was armed for.
    armed_for: Option<Time>,
}

thread_local! {
    static BRIDGE: RefCell<Option<WebBridge>> = const { RefCell::new(None) };
    static OUTBOX: RefCell<VecDeque<BridgeEvent>> = const { RefCell::new(VecDeque::new()) };
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

fn with_bridge<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut WebBridge) -> R,
{
    BRIDGE
        .try_with(|b| b.try_borrow_mut().ok()?.as_mut().map(f))
        .ok()
        .flatten()
}

/// Sends events to whoever is listening: the registered callback and the
/// relay element, if attached.
struct Outlet {
    listener: Option<js_sys::Function>,
    relay: Option<AttributeRelay<ElementHost>>,
}

impl Transport for Outlet {
    fn send(&mut self, event: &BridgeEvent) {
        if let Some(listener) = &self.listener {
            let value = js_sys::JSON::parse(&encode_event(event)).unwrap_or(JsValue::NULL);
            if let Err(err) = listener.call1(&JsValue::NULL, &value) {
                tracing::warn!(?err, "event listener threw");
            }
        }
        if let Some(relay) = &mut self.relay {
            relay.send(event);
        }
    }
}

/// Runs `f` against the channel, then hands any events it produced to the
/// host and re-arms the timer for deferred work.
fn run<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Channel) -> R,
{
    let result = with_bridge(|b| {
        let out = f(&mut b.channel);
        let events = b.channel.surface_mut().drain_events();
        OUTBOX.with(|o| o.borrow_mut().extend(events));
        out
    });
    if result.is_none() {
        tracing::debug!("bridge not started or busy; call dropped");
    }
    arm_timer();
    deliver();
    result
}

fn deliver() {
    if DELIVERING.with(|d| d.replace(true)) {
        return;
    }
    loop {
        let Some(event) = OUTBOX.with(|o| o.borrow_mut().pop_front()) else {
            break;
        };
        let outlet = with_bridge(|b| Outlet {
            listener: b.listener.clone(),
            relay: b
                .relay_element
                .clone()
                .map(|el| AttributeRelay::new(ElementHost::new(el))),
        });
        if let Some(mut outlet) = outlet {
            outlet.send(&event);
        }
    }
    DELIVERING.with(|d| d.set(false));
}

fn arm_timer() {
    let due = with_bridge(|b| {
        let next = b.channel.surface().next_deadline()?;
        if b.armed_for.is_some_and(|armed| armed.0 <= next.0) {
            return None;
        }
        b.armed_for = Some(next);
        Some(next)
    })
    .flatten();
    let Some(due) = due else {
        return;
    };
    let Some(window) = web_sys::window() else {
        return;
    };
    let delay = (due.0 - js_sys::Date::now()).ceil().max(0.0) as i32;
    let callback = Closure::once_into_js(move || {
        with_bridge(|b| b.armed_for = None);
        run(|channel| channel.tick());
    });
    if let Err(err) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
    {
        tracing::warn!(?err, "setTimeout failed");
        with_bridge(|b| b.armed_for = None);
    }
}

fn on_pointer(event: JsValue) {
    let field = |name: &str| js_sys::Reflect::get(&event, &JsValue::from_str(name)).ok();
    let number = |name: &str| field(name).and_then(|v| v.as_f64());
    let (Some(lat), Some(lng)) = (number("lat"), number("lng")) else {
        return;
    };
    let at = LatLng::new(lat, lng);
    let kind = field("kind").and_then(|v| v.as_string()).unwrap_or_default();
    run(|channel| {
        let pointer = match kind.as_str() {
            "glyph" => {
                let tag = number("tag")? as u32;
                let key = channel.surface().engine().glyph_key(tag)?;
                Pointer::Glyph { key, at }
            }
            _ => Pointer::Map { at },
        };
        channel.surface_mut().handle_pointer(pointer);
        Some(())
    });
}

/// Starts the bridge. `config_json` may be empty for defaults.
#[wasm_bindgen]
pub fn start_bridge(config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::DEBUG);

    let config = if config_json.trim().is_empty() {
        BridgeConfig::default()
    } else {
        BridgeConfig::from_json_str(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let sink = Closure::<dyn FnMut(JsValue)>::new(on_pointer);
    leaflet::set_pointer_sink(sink.as_ref().unchecked_ref());
    sink.forget();

    let surface = MapSurface::new(
        LeafletEngine::new(),
        WebDom::new(document),
        Box::new(DateClock),
        config,
    );
    BRIDGE.with(|b| {
        *b.borrow_mut() = Some(WebBridge {
            channel: CommandChannel::new(surface),
            listener: None,
            relay_element: None,
            armed_for: None,
        });
    });
    tracing::info!("bridge started");
    Ok(())
}

/// Registers `f` to receive every outbound event as a plain object.
#[wasm_bindgen]
pub fn set_event_listener(f: js_sys::Function) {
    with_bridge(|b| b.listener = Some(f));
}

/// Serves the attribute relay on the element `element_id`.
#[wasm_bindgen]
pub fn attach_relay(element_id: &str) -> Result<(), JsValue> {
    let element = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(element_id))
        .ok_or_else(|| JsValue::from_str("relay element not found"))?;

    let on_command = Closure::<dyn FnMut()>::new(on_relay_command);
    element.add_event_listener_with_callback(
        AttributeRelay::<ElementHost>::COMMAND_EVENT,
        on_command.as_ref().unchecked_ref(),
    )?;
    on_command.forget();

    with_bridge(|b| b.relay_element = Some(element));
    // Frames written before the listener existed.
    on_relay_command();
    Ok(())
}

fn on_relay_command() {
    let Some(element) = with_bridge(|b| b.relay_element.clone()).flatten() else {
        return;
    };
    let mut relay = AttributeRelay::new(ElementHost::new(element));
    run(|channel| {
        while let Some(frame) = relay.receive() {
            channel.dispatch_frame(&frame);
        }
    });
}

/// Dispatches one JSON command frame. `false` if it was not a command.
#[wasm_bindgen]
pub fn dispatch(frame: &str) -> bool {
    run(|channel| channel.dispatch_frame(frame)).unwrap_or(false)
}

#[wasm_bindgen(js_name = initMap)]
pub fn init_map(mount_id: String, lat: f64, lng: f64, zoom: f64) {
    run(|c| {
        c.dispatch(Command::InitMap {
            mount_id,
            lat,
            lng,
            zoom,
        })
    });
}

#[wasm_bindgen(js_name = updateMarkers)]
pub fn update_markers(payload: &str) {
    run(|c| {
        c.dispatch(Command::UpdateMarkers {
            payload: payload.into(),
        })
    });
}

#[wasm_bindgen(js_name = updateRoute)]
pub fn update_route(payload: &str) {
    run(|c| {
        c.dispatch(Command::UpdateRoute {
            payload: payload.into(),
        })
    });
}

#[wasm_bindgen(js_name = fitBounds)]
pub fn fit_bounds(payload: &str) {
    run(|c| {
        c.dispatch(Command::FitBounds {
            payload: payload.into(),
        })
    });
}

#[wasm_bindgen(js_name = panTo)]
pub fn pan_to(lat: f64, lng: f64) {
    run(|c| c.dispatch(Command::PanTo { lat, lng }));
}

#[wasm_bindgen(js_name = setView)]
pub fn set_view(lat: f64, lng: f64, zoom: f64) {
    run(|c| c.dispatch(Command::SetView { lat, lng, zoom }));
}

#[wasm_bindgen(js_name = toggleOverlay)]
pub fn toggle_overlay(enabled: bool) {
    run(|c| c.dispatch(Command::ToggleOverlay { enabled }));
}

#[wasm_bindgen(js_name = isOverlayEnabled)]
pub fn is_overlay_enabled() -> bool {
    with_bridge(|b| b.channel.surface().is_overlay_enabled()).unwrap_or(false)
}

#[wasm_bindgen(js_name = setHidden)]
pub fn set_hidden(hidden: bool) {
    run(|c| c.dispatch(Command::SetHidden { hidden }));
}

#[wasm_bindgen(js_name = invalidateSize)]
pub fn invalidate_size() {
    run(|c| c.dispatch(Command::InvalidateSize));
}

#[wasm_bindgen]
pub fn dispose() {
    run(|c| c.dispatch(Command::Dispose));
}

/// Composite update. `undefined`, `null` or blank fields are skipped.
#[wasm_bindgen]
pub fn sync(markers: Option<String>, route: Option<String>, bounds: Option<String>) {
    let request = SyncRequest {
        markers: markers.map(Payload::new),
        route: route.map(Payload::new),
        bounds: bounds.map(Payload::new),
    };
    run(|c| c.dispatch(Command::Sync(request)));
}

/// Diagnostic counters as `{ counters: [[name, n]...], gauges: [...] }`.
#[wasm_bindgen]
pub fn metrics() -> JsValue {
    with_bridge(|b| {
        let snapshot = b.channel.surface().metrics();
        let json = serde_json::json!({
            "counters": snapshot.counters,
            "gauges": snapshot.gauges,
        });
        js_sys::JSON::parse(&json.to_string()).unwrap_or(JsValue::NULL)
    })
    .unwrap_or(JsValue::NULL)
}
