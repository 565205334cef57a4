//! Scripted replay of host traffic against the headless engine.
//!
//! A script is JSON lines. Each line is one of:
//! - a command frame, e.g. `{"op":"updateRoute","payload":"[[1,2],[3,4]]"}`
//! - a simulated click: `{"tap":{"lat":1,"lng":2}}` or `{"tap":{"marker":"w1"}}`
//! - a pause that lets deferred work run: `{"wait_ms":250}`
//!
//! Blank lines and lines starting with `#` are skipped.

use bridge::headless::{HeadlessDom, HeadlessSurface, SceneSummary, surface_with_config};
use bridge::{BridgeConfig, CommandChannel, Pointer};
use foundation::bounds::LatLng;
use protocol::BridgeEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Step {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Step {
    Wait { wait_ms: u32 },
    Tap { tap: TapTarget },
    Frame(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum TapTarget {
    Marker { marker: String },
    Map { lat: f64, lng: f64 },
}

/// What a replay produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub events: Vec<BridgeEvent>,
    /// Final state of the map, if one is mounted at the end.
    pub summary: Option<SceneSummary>,
    pub hidden_elements: usize,
    pub counters: Vec<(&'static str, u64)>,
}

/// Runs `script` against a fresh headless page whose only element is
/// `<div id=config.visibility.mount_id>`.
pub fn replay(script: &str, config: BridgeConfig) -> Result<ReplayReport, ReplayError> {
    let mut dom = HeadlessDom::new();
    let mount = config.visibility.mount_id.clone();
    dom.append(dom.body(), "div", Some(mount.as_str()));
    let (surface, clock) = surface_with_config(dom, config);
    let mut channel = CommandChannel::new(surface);
    let mut events = Vec::new();

    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let step: Step =
            serde_json::from_str(text).map_err(|source| ReplayError::Step { line, source })?;
        match step {
            Step::Wait { wait_ms } => {
                clock.advance_ms(wait_ms);
                let ran = channel.tick();
                debug!(line, wait_ms, ran, "waited");
            }
            Step::Tap { tap } => {
                if let Some(pointer) = pointer_for(channel.surface(), &tap) {
                    channel.surface_mut().handle_pointer(pointer);
                } else {
                    warn!(line, ?tap, "tap has no target");
                }
            }
            Step::Frame(frame) => {
                channel.dispatch_frame(&frame.to_string());
            }
        }
        events.extend(channel.surface_mut().drain_events());
    }

    let surface = channel.surface();
    Ok(ReplayReport {
        events,
        summary: surface.engine().live_map().map(|m| m.summary()),
        hidden_elements: surface.dom().hidden().len(),
        counters: surface.metrics().counters,
    })
}

fn pointer_for(surface: &HeadlessSurface, tap: &TapTarget) -> Option<Pointer> {
    match tap {
        TapTarget::Map { lat, lng } => Some(Pointer::Map {
            at: LatLng::new(*lat, *lng),
        }),
        TapTarget::Marker { marker } => {
            let map = surface.engine().live_map()?;
            let key = map.glyph_key_for(marker)?;
            let at = map
                .glyphs()
                .into_iter()
                .find(|(k, _)| *k == key)
                .map(|(_, g)| g.position)?;
            Some(Pointer::Glyph { key, at })
        }
    }
}
