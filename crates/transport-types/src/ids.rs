use serde::{Deserialize, Serialize};

/// Identifier of a material in the serialized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Identifier of a surface in the serialized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// Identifier of a cell in the serialized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u32);

/// Identifier of a universe in the serialized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniverseId(pub u32);

/// Hands out stable, 1-based identifiers per entity kind.
///
/// One allocator lives for the lifetime of a model so that every entity keeps
/// the id it was created with through export.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_material: u32,
    next_surface: u32,
    next_cell: u32,
    next_universe: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_material: 1,
            next_surface: 1,
            next_cell: 1,
            next_universe: 1,
        }
    }

    pub fn material(&mut self) -> MaterialId {
        let id = MaterialId(self.next_material);
        self.next_material += 1;
        id
    }

    pub fn surface(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        id
    }

    pub fn cell(&mut self) -> CellId {
        let id = CellId(self.next_cell);
        self.next_cell += 1;
        id
    }

    pub fn universe(&mut self) -> UniverseId {
        let id = UniverseId(self.next_universe);
        self.next_universe += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
