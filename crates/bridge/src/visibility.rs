//! Hiding the map without tearing it down.
//!
//! Host UI toolkits often stack the map under opaque platform-view wrappers.
//! Hiding only the mount element leaves its ancestors painting over the host
//! UI, so the whole chain up to the wrapper is toggled.

use tracing::debug;

use crate::dom::ElementTree;
use crate::engine::MapEngine;
use crate::surface::{Deferred, MapSurface};

/// Toggles `start` and each ancestor up to, but excluding, the first
/// document root or element whose tag starts with `boundary_prefix`.
/// Returns how many elements were touched.
pub fn set_chain_hidden<D: ElementTree>(
    dom: &mut D,
    start: D::Node,
    boundary_prefix: &str,
    hidden: bool,
) -> usize {
    let mut node = start;
    let mut touched = 0;
    loop {
        dom.set_hidden(&node, hidden);
        touched += 1;
        let Some(parent) = dom.parent(&node) else {
            break;
        };
        if dom.is_document_root(&parent) || has_prefix(&dom.tag_name(&parent), boundary_prefix) {
            break;
        }
        node = parent;
    }
    touched
}

fn has_prefix(tag: &str, prefix: &str) -> bool {
    tag.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

impl<E: MapEngine, D: ElementTree> MapSurface<E, D> {
    /// Hides or shows the map's element chain. Showing a live map schedules
    /// a size recalculation once layout has settled.
    pub fn set_hidden(&mut self, hidden: bool) {
        let mount_id = self
            .last_mount
            .clone()
            .unwrap_or_else(|| self.config.visibility.mount_id.clone());
        let Some(mount) = self.dom.element_by_id(&mount_id) else {
            debug!(mount_id, hidden, "set_hidden ignored: mount element not found");
            return;
        };
        let touched = set_chain_hidden(
            &mut self.dom,
            mount,
            &self.config.visibility.boundary_tag_prefix,
            hidden,
        );
        debug!(mount_id, hidden, touched, "visibility changed");

        if !hidden {
            let delay = self.config.timing.restore_invalidate_delay_ms;
            self.schedule(delay, Deferred::InvalidateSize);
        }
    }

    /// Asks the engine to re-measure its container on a later turn.
    pub fn invalidate_size(&mut self) {
        if !self.is_mounted() {
            debug!("invalidate_size ignored: no map");
            return;
        }
        let delay = self.config.timing.invalidate_delay_ms;
        self.schedule(delay, Deferred::InvalidateSize);
    }
}

#[cfg(test)]
mod tests {
    use super::has_prefix;
    use crate::headless::{HeadlessDom, headless_surface};

    #[test]
    fn prefix_is_case_insensitive() {
        assert!(has_prefix("flt-platform-view", "FLT"));
        assert!(has_prefix("FLT-GLASS-PANE", "flt"));
        assert!(!has_prefix("fl", "FLT"));
        assert!(!has_prefix("div", "FLT"));
    }

    #[test]
    fn walk_stops_below_platform_view() {
        let (mut surface, _clock) = headless_surface("map");
        let dom = surface.dom_mut();
        let view = dom.append(dom.body(), "flt-platform-view", None);
        let slot = dom.append(view, "div", None);
        let mount = dom.append(slot, "div", Some("inner"));

        surface.init_map("inner", 0.0, 0.0, 3.0).unwrap();
        surface.set_hidden(true);

        let dom = surface.dom();
        assert!(dom.is_hidden(mount));
        assert!(dom.is_hidden(slot));
        assert!(!dom.is_hidden(view));
        assert!(!dom.is_hidden(dom.body()));
    }

    #[test]
    fn walk_stops_at_body() {
        let (mut surface, _clock) = headless_surface("map");
        surface.set_hidden(true);

        let dom = surface.dom();
        let mount = dom.find("map").unwrap();
        assert!(dom.is_hidden(mount));
        assert!(!dom.is_hidden(dom.body()));

        surface.set_hidden(false);
        assert!(!surface.dom().is_hidden(mount));
    }

    #[test]
    fn missing_mount_is_noop() {
        let mut dom = HeadlessDom::new();
        let lone = dom.append(dom.body(), "div", Some("other"));
        let (mut surface, _clock) = crate::headless::surface_with_dom(dom);
        surface.set_hidden(true);
        assert!(!surface.dom().is_hidden(lone));
    }

    #[test]
    fn showing_live_map_recalculates_after_delay() {
        let (mut surface, clock) = headless_surface("map");
        surface.init_map("map", 0.0, 0.0, 3.0).unwrap();
        surface.set_hidden(true);
        assert_eq!(surface.next_deadline(), None);

        surface.set_hidden(false);
        clock.advance_ms(199);
        assert_eq!(surface.run_due(), 0);
        clock.advance_ms(1);
        assert_eq!(surface.run_due(), 1);
        assert_eq!(surface.engine().live_map().unwrap().invalidations, 1);
    }

    #[test]
    fn showing_without_map_schedules_nothing() {
        let (mut surface, _clock) = headless_surface("map");
        surface.set_hidden(false);
        assert_eq!(surface.next_deadline(), None);
    }

    #[test]
    fn invalidate_size_waits_its_delay() {
        let (mut surface, clock) = headless_surface("map");
        surface.invalidate_size();
        assert_eq!(surface.next_deadline(), None);

        surface.init_map("map", 0.0, 0.0, 3.0).unwrap();
        surface.invalidate_size();
        clock.advance_ms(100);
        assert_eq!(surface.run_due(), 1);
    }

    #[test]
    fn recalculation_never_reaches_a_later_map() {
        let (mut surface, clock) = headless_surface("map");
        surface.init_map("map", 0.0, 0.0, 3.0).unwrap();
        surface.set_hidden(false);
        surface.dispose();
        surface.init_map("map", 0.0, 0.0, 3.0).unwrap();

        clock.advance_ms(500);
        assert_eq!(surface.run_due(), 0);
        assert_eq!(surface.engine().live_map().unwrap().invalidations, 0);
        assert_eq!(surface.metrics().counters, vec![("maps.created", 2)]);
    }
}
