use super::material::MaterialId;
use super::placement::PlacementId;
use super::solid::SolidId;
use super::Named;

slotmap::new_key_type! {
    /// Unique identifier for a logical or assembly volume in a registry.
    pub struct VolumeId;
}

/// A solid with a material, and the placements it contains.
///
/// The solid and material never change after creation; only the child
/// list grows.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolume {
    pub name: String,
    pub solid: SolidId,
    pub material: MaterialId,
    pub(crate) children: Vec<PlacementId>,
}

/// A pure grouping node: children but no solid or material.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyVolume {
    pub name: String,
    pub(crate) children: Vec<PlacementId>,
}

/// A node of the volume hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    Logical(LogicalVolume),
    Assembly(AssemblyVolume),
}

impl Volume {
    #[must_use]
    pub fn logical(name: impl Into<String>, solid: SolidId, material: MaterialId) -> Self {
        Self::Logical(LogicalVolume {
            name: name.into(),
            solid,
            material,
            children: Vec::new(),
        })
    }

    #[must_use]
    pub fn assembly(name: impl Into<String>) -> Self {
        Self::Assembly(AssemblyVolume {
            name: name.into(),
            children: Vec::new(),
        })
    }

    /// Placements inside this volume, in insertion order.
    #[must_use]
    pub fn children(&self) -> &[PlacementId] {
        match self {
            Self::Logical(lv) => &lv.children,
            Self::Assembly(av) => &av.children,
        }
    }

    pub(crate) fn push_child(&mut self, placement: PlacementId) {
        match self {
            Self::Logical(lv) => lv.children.push(placement),
            Self::Assembly(av) => av.children.push(placement),
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    #[must_use]
    pub fn as_logical(&self) -> Option<&LogicalVolume> {
        match self {
            Self::Logical(lv) => Some(lv),
            Self::Assembly(_) => None,
        }
    }
}

impl Named for Volume {
    fn name(&self) -> &str {
        match self {
            Self::Logical(lv) => &lv.name,
            Self::Assembly(av) => &av.name,
        }
    }
}
