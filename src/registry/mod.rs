pub mod material;
pub mod placement;
pub mod solid;
pub mod transfer;
pub mod volume;

pub use material::{MaterialData, MaterialId};
pub use placement::{PhysicalVolume, PlacementId};
pub use solid::{BooleanOp, Shape, SolidData, SolidId};
pub use volume::{AssemblyVolume, LogicalVolume, Volume, VolumeId};

use std::collections::HashMap;

use slotmap::{Key, SlotMap};

use crate::error::{EntityKind, HierarchyError, RegistryError};

/// Anything stored in a [`NameTable`] carries its own unique name.
pub trait Named {
    fn name(&self) -> &str;
}

/// An arena of entities of one kind with a unique-name index.
#[derive(Debug)]
pub struct NameTable<K: Key, V> {
    kind: EntityKind,
    items: SlotMap<K, V>,
    index: HashMap<String, K>,
}

impl<K: Key, V: Named> NameTable<K, V> {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: SlotMap::with_key(),
            index: HashMap::new(),
        }
    }

    /// Inserts an entity under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken; the
    /// existing entry is left untouched.
    pub fn insert(&mut self, value: V) -> Result<K, RegistryError> {
        if self.index.contains_key(value.name()) {
            return Err(RegistryError::DuplicateName {
                kind: self.kind,
                name: value.name().to_owned(),
            });
        }
        let name = value.name().to_owned();
        let id = self.items.insert(value);
        self.index.insert(name, id);
        Ok(id)
    }

    /// Returns the entity for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownReference`] if `id` was not issued by
    /// this table.
    pub fn get(&self, id: K) -> Result<&V, RegistryError> {
        self.items
            .get(id)
            .ok_or(RegistryError::UnknownReference { kind: self.kind })
    }

    fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> V) -> K {
        if let Some(id) = self.id(name) {
            return id;
        }
        let id = self.items.insert(make());
        self.index.insert(name.to_owned(), id);
        id
    }

    fn get_mut(&mut self, id: K) -> Result<&mut V, RegistryError> {
        self.items
            .get_mut(id)
            .ok_or(RegistryError::UnknownReference { kind: self.kind })
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.items.contains_key(id)
    }

    /// Exact-name lookup.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<K> {
        self.index.get(name).copied()
    }

    /// Permissive lookup: an exact match wins; otherwise every stored name
    /// containing `name` is a candidate, and exactly one candidate is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] with no candidates, or
    /// [`RegistryError::AmbiguousName`] listing them when there are several.
    pub fn find(&self, name: &str) -> Result<K, RegistryError> {
        if let Some(id) = self.id(name) {
            return Ok(id);
        }
        let mut candidates: Vec<(&String, K)> = self
            .index
            .iter()
            .filter(|(stored, _)| stored.contains(name))
            .map(|(stored, id)| (stored, *id))
            .collect();
        match candidates.len() {
            0 => Err(RegistryError::NotFound {
                kind: self.kind,
                name: name.to_owned(),
            }),
            1 => Ok(candidates[0].1),
            _ => {
                candidates.sort_by(|a, b| a.0.cmp(b.0));
                Err(RegistryError::AmbiguousName {
                    kind: self.kind,
                    name: name.to_owned(),
                    candidates: candidates.into_iter().map(|(s, _)| s.clone()).collect(),
                })
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Name-keyed store for one geometry build.
///
/// Entities reference each other via typed IDs (generational indices).
/// IDs are only meaningful in the registry that issued them; moving objects
/// between registries goes through the `transfer_*` methods.
#[derive(Debug)]
pub struct Registry {
    solids: NameTable<SolidId, SolidData>,
    materials: NameTable<MaterialId, MaterialData>,
    volumes: NameTable<VolumeId, Volume>,
    placements: NameTable<PlacementId, PhysicalVolume>,
    world: Option<VolumeId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            solids: NameTable::new(EntityKind::Solid),
            materials: NameTable::new(EntityKind::Material),
            volumes: NameTable::new(EntityKind::Volume),
            placements: NameTable::new(EntityKind::Placement),
            world: None,
        }
    }

    // --- Solid operations ---

    /// Inserts a solid. Boolean operands must already be in this registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or an operand is unknown.
    pub fn add_solid(&mut self, data: SolidData) -> Result<SolidId, RegistryError> {
        for operand in data.operands() {
            self.solids.get(operand)?;
        }
        self.solids.insert(data)
    }

    /// Returns the solid data.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not belong to this registry.
    pub fn solid(&self, id: SolidId) -> Result<&SolidData, RegistryError> {
        self.solids.get(id)
    }

    #[must_use]
    pub fn solid_id(&self, name: &str) -> Option<SolidId> {
        self.solids.id(name)
    }

    /// Permissive lookup, see [`NameTable::find`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or ambiguous.
    pub fn find_solid(&self, name: &str) -> Result<SolidId, RegistryError> {
        self.solids.find(name)
    }

    #[must_use]
    pub fn solids(&self) -> &NameTable<SolidId, SolidData> {
        &self.solids
    }

    // --- Material operations ---

    /// Inserts a material.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn add_material(&mut self, data: MaterialData) -> Result<MaterialId, RegistryError> {
        self.materials.insert(data)
    }

    /// Returns the id of a predefined material, registering it on first use.
    pub fn nist_material(&mut self, name: &str) -> MaterialId {
        self.materials
            .get_or_insert_with(name, || MaterialData::new(name))
    }

    /// Returns the material data.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not belong to this registry.
    pub fn material(&self, id: MaterialId) -> Result<&MaterialData, RegistryError> {
        self.materials.get(id)
    }

    #[must_use]
    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.materials.id(name)
    }

    /// Permissive lookup, see [`NameTable::find`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or ambiguous.
    pub fn find_material(&self, name: &str) -> Result<MaterialId, RegistryError> {
        self.materials.find(name)
    }

    #[must_use]
    pub fn materials(&self) -> &NameTable<MaterialId, MaterialData> {
        &self.materials
    }

    // --- Volume operations ---

    /// Inserts a logical or assembly volume. A logical volume's solid and
    /// material must already be in this registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or a reference is unknown.
    pub fn add_volume(&mut self, volume: Volume) -> Result<VolumeId, RegistryError> {
        if let Volume::Logical(lv) = &volume {
            self.solids.get(lv.solid)?;
            self.materials.get(lv.material)?;
        }
        self.volumes.insert(volume)
    }

    /// Returns the volume.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not belong to this registry.
    pub fn volume(&self, id: VolumeId) -> Result<&Volume, RegistryError> {
        self.volumes.get(id)
    }

    #[must_use]
    pub fn volume_id(&self, name: &str) -> Option<VolumeId> {
        self.volumes.id(name)
    }

    /// Permissive lookup, see [`NameTable::find`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or ambiguous.
    pub fn find_volume(&self, name: &str) -> Result<VolumeId, RegistryError> {
        self.volumes.find(name)
    }

    #[must_use]
    pub fn volumes(&self) -> &NameTable<VolumeId, Volume> {
        &self.volumes
    }

    // --- Placement operations ---

    /// Inserts a placement and appends it to the mother's child list.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or either volume is unknown.
    pub fn add_placement(&mut self, placement: PhysicalVolume) -> Result<PlacementId, RegistryError> {
        self.volumes.get(placement.daughter)?;
        self.volumes.get(placement.mother)?;
        let mother = placement.mother;
        let id = self.placements.insert(placement)?;
        self.volumes.get_mut(mother)?.push_child(id);
        Ok(id)
    }

    /// Returns the placement.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not belong to this registry.
    pub fn placement(&self, id: PlacementId) -> Result<&PhysicalVolume, RegistryError> {
        self.placements.get(id)
    }

    #[must_use]
    pub fn placement_id(&self, name: &str) -> Option<PlacementId> {
        self.placements.id(name)
    }

    /// Permissive lookup, see [`NameTable::find`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or ambiguous.
    pub fn find_placement(&self, name: &str) -> Result<PlacementId, RegistryError> {
        self.placements.find(name)
    }

    #[must_use]
    pub fn placements(&self) -> &NameTable<PlacementId, PhysicalVolume> {
        &self.placements
    }

    // --- World ---

    /// Designates a registered logical volume as the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or names an assembly.
    pub fn set_world(&mut self, name: &str) -> crate::Result<()> {
        let id = self.volumes.id(name).ok_or_else(|| RegistryError::NotFound {
            kind: EntityKind::Volume,
            name: name.to_owned(),
        })?;
        self.set_world_id(id)
    }

    /// Designates the volume `id` as the world.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or is an assembly.
    pub fn set_world_id(&mut self, id: VolumeId) -> crate::Result<()> {
        let volume = self.volumes.get(id)?;
        if volume.as_logical().is_none() {
            return Err(HierarchyError::NotLogical(volume.name().to_owned()).into());
        }
        self.world = Some(id);
        Ok(())
    }

    /// Returns the world volume.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoWorld`] if no world was set.
    pub fn world(&self) -> Result<VolumeId, RegistryError> {
        self.world.ok_or(RegistryError::NoWorld)
    }

    /// Returns the world as a logical volume.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoWorld`] if no world was set.
    pub fn world_volume(&self) -> crate::Result<&LogicalVolume> {
        let volume = self.volumes.get(self.world()?)?;
        volume
            .as_logical()
            .ok_or_else(|| HierarchyError::NotLogical(volume.name().to_owned()).into())
    }
}
