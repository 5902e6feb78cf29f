use tracing::trace;

use crate::error::{EntityKind, HierarchyError, RegistryError};

use super::{MaterialData, MaterialId, Named, Registry, Shape, SolidData, SolidId, Volume, VolumeId};

impl Registry {
    /// Copies a solid from `source` into this registry under the same name.
    ///
    /// Boolean operands are copied recursively; operands whose names are
    /// already present here are reused rather than copied again.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a solid named like the
    /// top-level solid already exists here, or an error if `id` does not
    /// belong to `source`.
    pub fn transfer_solid(&mut self, source: &Registry, id: SolidId) -> Result<SolidId, RegistryError> {
        let data = source.solid(id)?;
        if self.solid_id(&data.name).is_some() {
            return Err(RegistryError::DuplicateName {
                kind: EntityKind::Solid,
                name: data.name.clone(),
            });
        }
        let shape = match &data.shape {
            Shape::Boolean {
                op,
                first,
                second,
                transform,
            } => Shape::Boolean {
                op: *op,
                first: self.import_solid(source, *first)?,
                second: self.import_solid(source, *second)?,
                transform: *transform,
            },
            primitive => primitive.clone(),
        };
        self.add_solid(SolidData::new(data.name.clone(), shape))
    }

    /// Returns the local solid named like `source`'s `id`, copying it first if
    /// it is not here yet.
    pub(crate) fn import_solid(&mut self, source: &Registry, id: SolidId) -> Result<SolidId, RegistryError> {
        let name = &source.solid(id)?.name;
        if let Some(existing) = self.solid_id(name) {
            trace!(solid = %name, "reusing solid");
            return Ok(existing);
        }
        self.transfer_solid(source, id)
    }

    /// Copies a material from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name already exists here.
    pub fn transfer_material(&mut self, source: &Registry, id: MaterialId) -> Result<MaterialId, RegistryError> {
        let name = source.material(id)?.name.clone();
        self.add_material(MaterialData::new(name))
    }

    pub(crate) fn import_material(&mut self, source: &Registry, id: MaterialId) -> Result<MaterialId, RegistryError> {
        let name = &source.material(id)?.name;
        Ok(match self.material_id(name) {
            Some(existing) => existing,
            None => self.add_material(MaterialData::new(name.clone()))?,
        })
    }

    /// Copies a logical volume from `source` without its children.
    ///
    /// The solid and material are imported, reusing same-named entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the volume name is taken
    /// here, or [`HierarchyError::NotLogical`] if `id` names an assembly.
    pub fn transfer_logical_volume(&mut self, source: &Registry, id: VolumeId) -> crate::Result<VolumeId> {
        let volume = source.volume(id)?;
        let Some(lv) = volume.as_logical() else {
            return Err(HierarchyError::NotLogical(volume.name().to_owned()).into());
        };
        if self.volume_id(&lv.name).is_some() {
            return Err(RegistryError::DuplicateName {
                kind: EntityKind::Volume,
                name: lv.name.clone(),
            }
            .into());
        }
        let solid = self.import_solid(source, lv.solid)?;
        let material = self.import_material(source, lv.material)?;
        Ok(self.add_volume(Volume::logical(lv.name.clone(), solid, material))?)
    }
}
