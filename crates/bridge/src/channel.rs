use protocol::{BridgeEvent, Command, Payload, SyncRequest, decode_command};
use tracing::{debug, trace, warn};

use crate::dom::ElementTree;
use crate::engine::{MapEngine, Pointer};
use crate::surface::MapSurface;
use crate::transport::Transport;

/// Routes host commands to a [`MapSurface`] and surface events back out.
///
/// The channel owns no transport. Hosts that call in directly use
/// [`CommandChannel::dispatch`]; relays are drained with
/// [`CommandChannel::pump`].
pub struct CommandChannel<E: MapEngine, D: ElementTree> {
    surface: MapSurface<E, D>,
}

impl<E: MapEngine, D: ElementTree> CommandChannel<E, D> {
    pub fn new(surface: MapSurface<E, D>) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &MapSurface<E, D> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MapSurface<E, D> {
        &mut self.surface
    }

    pub fn into_surface(self) -> MapSurface<E, D> {
        self.surface
    }

    pub fn dispatch(&mut self, command: Command) {
        trace!(op = command.name(), "dispatch");
        self.surface.metrics.inc("commands");
        let surface = &mut self.surface;
        match command {
            Command::InitMap {
                mount_id,
                lat,
                lng,
                zoom,
            } => {
                surface.init_map(&mount_id, lat, lng, zoom);
            }
            Command::UpdateMarkers { payload } => surface.update_markers(payload.as_str()),
            Command::UpdateRoute { payload } => surface.update_route(payload.as_str()),
            Command::FitBounds { payload } => surface.fit_bounds(payload.as_str()),
            Command::PanTo { lat, lng } => surface.pan_to(lat, lng),
            Command::SetView { lat, lng, zoom } => surface.set_view(lat, lng, zoom),
            Command::ToggleOverlay { enabled } => surface.toggle_overlay(enabled),
            Command::QueryOverlay => {
                let enabled = surface.is_overlay_enabled();
                surface.emit(BridgeEvent::OverlayStatus { enabled });
            }
            Command::SetHidden { hidden } => surface.set_hidden(hidden),
            Command::InvalidateSize => surface.invalidate_size(),
            Command::Dispose => surface.dispose(),
            Command::Sync(request) => sync(surface, request),
        }
    }

    /// Decodes and dispatches one frame. Returns `false` for a frame that
    /// is not a command; it is logged and dropped.
    pub fn dispatch_frame(&mut self, frame: &str) -> bool {
        match decode_command(frame) {
            Ok(command) => {
                self.dispatch(command);
                true
            }
            Err(err) => {
                self.surface.metrics.inc("frames.rejected");
                warn!(%err, "command frame ignored");
                false
            }
        }
    }

    /// Handles every frame waiting on `transport`, then flushes events to it.
    /// Returns how many frames were read.
    pub fn pump(&mut self, transport: &mut impl Transport) -> usize {
        let mut read = 0;
        while let Some(frame) = transport.receive() {
            self.dispatch_frame(&frame);
            read += 1;
        }
        self.flush(transport);
        read
    }

    /// Sends pending events to `transport`.
    pub fn flush(&mut self, transport: &mut impl Transport) {
        let events = self.surface.drain_events();
        if !events.is_empty() {
            debug!(count = events.len(), "flushing events");
        }
        for event in &events {
            transport.send(event);
        }
    }

    /// Feeds an engine click in and flushes whatever it produced.
    pub fn pointer(&mut self, pointer: Pointer, transport: &mut impl Transport) {
        self.surface.handle_pointer(pointer);
        self.flush(transport);
    }

    /// Runs due deferred work. Returns how many tasks acted.
    pub fn tick(&mut self) -> usize {
        self.surface.run_due()
    }
}

/// Applies each present field on its own, markers first, then route, then
/// bounds. A bad field does not stop the others.
fn sync<E: MapEngine, D: ElementTree>(surface: &mut MapSurface<E, D>, request: SyncRequest) {
    let SyncRequest {
        markers,
        route,
        bounds,
    } = request;
    if let Some(p) = present(markers) {
        surface.update_markers(p.as_str());
    }
    if let Some(p) = present(route) {
        surface.update_route(p.as_str());
    }
    if let Some(p) = present(bounds) {
        surface.fit_bounds(p.as_str());
    }
}

fn present(field: Option<Payload>) -> Option<Payload> {
    field.filter(|p| !p.is_blank())
}
