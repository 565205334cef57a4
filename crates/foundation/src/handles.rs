use crate::ids::InstanceId;

/// Key stamped on every rendered glyph: `(instance, generation, index)`.
///
/// The generation increments on every marker rebuild, so a tap reported for a
/// glyph from an earlier snapshot (or an earlier map instance) no longer
/// resolves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub instance: InstanceId,
    pub generation: u32,
    pub index: u32,
}

impl GlyphKey {
    pub fn new(instance: InstanceId, generation: u32, index: u32) -> Self {
        GlyphKey {
            instance,
            generation,
            index,
        }
    }
}
