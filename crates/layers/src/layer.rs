/// Which surface-owned layer a slot holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerRole {
    BaseTiles,
    Markers,
    Route,
    Overlay,
}

impl LayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerRole::BaseTiles => "base-tiles",
            LayerRole::Markers => "markers",
            LayerRole::Route => "route",
            LayerRole::Overlay => "overlay",
        }
    }
}

/// Holds at most one engine layer handle for a role.
///
/// `take` empties the slot before the caller removes the layer from the
/// engine, so a slot never points at a layer that is already gone.
#[derive(Debug)]
pub struct LayerSlot<H> {
    role: LayerRole,
    handle: Option<H>,
}

impl<H> LayerSlot<H> {
    pub fn new(role: LayerRole) -> Self {
        Self { role, handle: None }
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn is_occupied(&self) -> bool {
        self.handle.is_some()
    }

    pub fn get(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn take(&mut self) -> Option<H> {
        self.handle.take()
    }

    /// Stores `handle`, returning the previous occupant (which the caller
    /// still has to remove from the engine).
    pub fn put(&mut self, handle: H) -> Option<H> {
        self.handle.replace(handle)
    }
}
