use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use tracing::{info, instrument, warn};

use crate::error::{Result, WriteError};
use crate::math::Transform;
use crate::operations::query::Validate;
use crate::registry::{BooleanOp, PlacementId, Registry, Shape, SolidId, Volume, VolumeId};

const SCHEMA_LOCATION: &str =
    "http://service-spi.web.cern.ch/service-spi/app/releases/GDML/schema/gdml.xsd";

/// Writes a registry as a GDML document.
///
/// Lengths are written in mm and angles in rad. Boxes and tubes carry full
/// lengths, as GDML expects. Rotations are written in the passive GDML
/// convention (see [`Transform::gdml_angles`]). Materials are referenced by
/// name only; predefined `G4_*` names are resolved by the reader.
pub struct GdmlWriter<'a> {
    registry: &'a Registry,
}

impl<'a> GdmlWriter<'a> {
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Validates the registry and writes the document to `out`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the registry has no world, a dangling
    /// handle or a cycle, and a [`WriteError`] if writing fails.
    #[instrument(skip_all)]
    pub fn write<W: Write>(&self, out: W) -> Result<()> {
        Validate::new().execute(self.registry)?;

        let mut xml = Writer::new_with_indent(out, b' ', 2);
        emit(&mut xml, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(
            &mut xml,
            Event::Start(element(
                "gdml",
                &[
                    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
                    ("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION),
                ],
            )),
        )?;
        emit(&mut xml, Event::Empty(BytesStart::new("define")))?;
        self.write_materials(&mut xml)?;
        self.write_solids(&mut xml)?;
        self.write_structure(&mut xml)?;
        self.write_setup(&mut xml)?;
        emit(&mut xml, Event::End(BytesEnd::new("gdml")))?;

        let mut out = xml.into_inner();
        out.flush().map_err(WriteError::from)?;
        Ok(())
    }

    /// Renders the document into a string.
    ///
    /// # Errors
    ///
    /// See [`GdmlWriter::write`].
    pub fn to_gdml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| WriteError::Xml(e.to_string()).into())
    }

    /// Writes the document to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// See [`GdmlWriter::write`].
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(WriteError::from)?;
        self.write(BufWriter::new(file))?;
        info!(path = %path.display(), "geometry written");
        Ok(())
    }

    fn write_materials<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        for (_, material) in self.registry.materials().iter() {
            if !material.is_predefined() {
                warn!(material = %material.name, "material is not predefined and will be unresolved");
            }
        }
        emit(xml, Event::Empty(BytesStart::new("materials")))
    }

    fn write_solids<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        emit(xml, Event::Start(BytesStart::new("solids")))?;
        let mut written = HashSet::new();
        for (id, _) in self.registry.solids().iter() {
            self.write_solid(xml, id, &mut written)?;
        }
        emit(xml, Event::End(BytesEnd::new("solids")))
    }

    /// Writes operands before the solids that reference them.
    fn write_solid<W: Write>(
        &self,
        xml: &mut Writer<W>,
        id: SolidId,
        written: &mut HashSet<SolidId>,
    ) -> Result<()> {
        if !written.insert(id) {
            return Ok(());
        }
        let solid = self.registry.solid(id)?;
        let name = solid.name.as_str();
        match &solid.shape {
            Shape::Box {
                half_x,
                half_y,
                half_z,
            } => {
                let [x, y, z] = [half_x, half_y, half_z].map(|h| number(2.0 * h));
                emit(
                    xml,
                    Event::Empty(element(
                        "box",
                        &[("name", name), ("x", x.as_str()), ("y", y.as_str()), ("z", z.as_str()), ("lunit", "mm")],
                    )),
                )
            }
            Shape::Tube {
                r_min,
                r_max,
                half_z,
                start_phi,
                delta_phi,
            } => {
                let rmin = number(*r_min);
                let rmax = number(*r_max);
                let z = number(2.0 * half_z);
                let startphi = number(*start_phi);
                let deltaphi = number(*delta_phi);
                emit(
                    xml,
                    Event::Empty(element(
                        "tube",
                        &[
                            ("name", name),
                            ("rmin", rmin.as_str()),
                            ("rmax", rmax.as_str()),
                            ("z", z.as_str()),
                            ("startphi", startphi.as_str()),
                            ("deltaphi", deltaphi.as_str()),
                            ("aunit", "rad"),
                            ("lunit", "mm"),
                        ],
                    )),
                )
            }
            Shape::Boolean {
                op,
                first,
                second,
                transform,
            } => {
                self.write_solid(xml, *first, written)?;
                self.write_solid(xml, *second, written)?;
                let tag = match op {
                    BooleanOp::Union => "union",
                    BooleanOp::Subtraction => "subtraction",
                    BooleanOp::Intersection => "intersection",
                };
                emit(xml, Event::Start(element(tag, &[("name", name)])))?;
                let first = &self.registry.solid(*first)?.name;
                let second = &self.registry.solid(*second)?.name;
                emit(xml, Event::Empty(element("first", &[("ref", first.as_str())])))?;
                emit(xml, Event::Empty(element("second", &[("ref", second.as_str())])))?;
                write_transform(xml, name, transform)?;
                emit(xml, Event::End(BytesEnd::new(tag)))
            }
        }
    }

    fn write_structure<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        emit(xml, Event::Start(BytesStart::new("structure")))?;
        let mut written = HashSet::new();
        self.write_volume(xml, self.registry.world()?, &mut written)?;
        emit(xml, Event::End(BytesEnd::new("structure")))
    }

    /// Post-order: every daughter is defined before its first use.
    fn write_volume<W: Write>(
        &self,
        xml: &mut Writer<W>,
        id: VolumeId,
        written: &mut HashSet<VolumeId>,
    ) -> Result<()> {
        if !written.insert(id) {
            return Ok(());
        }
        let volume = self.registry.volume(id)?;
        for &pid in volume.children() {
            self.write_volume(xml, self.registry.placement(pid)?.daughter, written)?;
        }

        let tag = match volume {
            Volume::Logical(lv) => {
                emit(xml, Event::Start(element("volume", &[("name", lv.name.as_str())])))?;
                let material = &self.registry.material(lv.material)?.name;
                let solid = &self.registry.solid(lv.solid)?.name;
                emit(xml, Event::Empty(element("materialref", &[("ref", material.as_str())])))?;
                emit(xml, Event::Empty(element("solidref", &[("ref", solid.as_str())])))?;
                "volume"
            }
            Volume::Assembly(av) => {
                emit(xml, Event::Start(element("assembly", &[("name", av.name.as_str())])))?;
                "assembly"
            }
        };
        for &pid in volume.children() {
            self.write_physvol(xml, pid)?;
        }
        emit(xml, Event::End(BytesEnd::new(tag)))
    }

    fn write_physvol<W: Write>(&self, xml: &mut Writer<W>, id: PlacementId) -> Result<()> {
        let placement = self.registry.placement(id)?;
        let daughter = self.registry.volume(placement.daughter)?;
        let daughter = match daughter {
            Volume::Logical(lv) => &lv.name,
            Volume::Assembly(av) => &av.name,
        };
        emit(xml, Event::Start(element("physvol", &[("name", placement.name.as_str())])))?;
        emit(xml, Event::Empty(element("volumeref", &[("ref", daughter.as_str())])))?;
        write_transform(xml, &placement.name, &placement.transform)?;
        emit(xml, Event::End(BytesEnd::new("physvol")))
    }

    fn write_setup<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        let world = &self.registry.world_volume()?.name;
        emit(
            xml,
            Event::Start(element("setup", &[("name", "Default"), ("version", "1.0")])),
        )?;
        emit(xml, Event::Empty(element("world", &[("ref", world.as_str())])))?;
        emit(xml, Event::End(BytesEnd::new("setup")))
    }
}

fn write_transform<W: Write>(xml: &mut Writer<W>, owner: &str, transform: &Transform) -> Result<()> {
    let [x, y, z] = transform.position().map(number);
    let position = format!("{owner}_pos");
    emit(
        xml,
        Event::Empty(element(
            "position",
            &[("name", position.as_str()), ("x", x.as_str()), ("y", y.as_str()), ("z", z.as_str()), ("unit", "mm")],
        )),
    )?;
    let [rx, ry, rz] = transform.gdml_angles().map(number);
    let rotation = format!("{owner}_rot");
    emit(
        xml,
        Event::Empty(element(
            "rotation",
            &[("name", rotation.as_str()), ("x", rx.as_str()), ("y", ry.as_str()), ("z", rz.as_str()), ("unit", "rad")],
        )),
    )
}

fn element<'t>(tag: &'t str, attributes: &[(&str, &str)]) -> BytesStart<'t> {
    let mut start = BytesStart::new(tag);
    for &attribute in attributes {
        start.push_attribute(attribute);
    }
    start
}

fn emit<W: Write>(xml: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    xml.write_event(event)
        .map_err(|e| WriteError::Xml(e.to_string()).into())
}

/// Shortest round-trip form, with negative zero folded to `0`.
fn number(value: f64) -> String {
    if value == 0.0 {
        "0".to_owned()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::Subtract;
    use crate::operations::creation::{MakeAssembly, MakeBox, MakeLogicalVolume, MakeTube, PlaceVolume};

    fn sample() -> Registry {
        let mut reg = Registry::new();
        let ws = MakeBox::new("ws", 500.0, 500.0, 500.0).execute(&mut reg).unwrap();
        let m = MakeBox::new("M", 10.0, 10.0, 10.0).execute(&mut reg).unwrap();
        let hole = MakeTube::new("hole", 0.0, 1.0, 12.0).execute(&mut reg).unwrap();
        let drilled = Subtract::new("drilled", m, hole, Transform::from_translation(0.0, 3.0, 0.0))
            .execute(&mut reg)
            .unwrap();
        let vacuum = reg.nist_material("G4_Galactic");
        let copper = reg.nist_material("G4_Cu");
        let wl = MakeLogicalVolume::new("world_LV", ws, vacuum).execute(&mut reg).unwrap();
        let ml = MakeLogicalVolume::new("M_LV", drilled, copper).execute(&mut reg).unwrap();
        let grp = MakeAssembly::new("grp").execute(&mut reg).unwrap();
        PlaceVolume::new("M_PV", ml, grp, Transform::from_translation(0.0, 0.0, 5.0))
            .execute(&mut reg)
            .unwrap();
        PlaceVolume::new("grp_PV", grp, wl, Transform::identity())
            .execute(&mut reg)
            .unwrap();
        reg.set_world_id(wl).unwrap();
        reg
    }

    fn position_of(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` missing from output"))
    }

    #[test]
    fn primitives_use_full_lengths() {
        let gdml = GdmlWriter::new(&sample()).to_gdml_string().unwrap();
        assert!(gdml.contains(r#"<box name="M" x="20" y="20" z="20" lunit="mm"/>"#));
        assert!(gdml.contains(r#"rmax="1" z="24""#));
    }

    #[test]
    fn solids_and_volumes_are_ordered_by_dependency() {
        let gdml = GdmlWriter::new(&sample()).to_gdml_string().unwrap();
        assert!(position_of(&gdml, r#"<tube name="hole""#) < position_of(&gdml, r#"<subtraction name="drilled""#));
        assert!(position_of(&gdml, r#"<volume name="M_LV""#) < position_of(&gdml, r#"<assembly name="grp""#));
        assert!(position_of(&gdml, r#"<assembly name="grp""#) < position_of(&gdml, r#"<volume name="world_LV""#));
        assert!(gdml.contains(r#"<world ref="world_LV"/>"#));
        assert!(gdml.contains(r#"<materialref ref="G4_Cu"/>"#));
    }

    #[test]
    fn placements_carry_position_and_rotation() {
        let gdml = GdmlWriter::new(&sample()).to_gdml_string().unwrap();
        assert!(gdml.contains(r#"<volumeref ref="M_LV"/>"#));
        assert!(gdml.contains(r#"<position name="M_PV_pos" x="0" y="0" z="5" unit="mm"/>"#));
        assert!(gdml.contains(r#"<rotation name="M_PV_rot" x="0" y="0" z="0" unit="rad"/>"#));
        assert!(gdml.contains(r#"<position name="drilled_pos" x="0" y="3" z="0" unit="mm"/>"#));
    }

    #[test]
    fn unvalidated_registry_is_rejected() {
        let mut reg = Registry::new();
        MakeBox::new("lonely", 1.0, 1.0, 1.0).execute(&mut reg).unwrap();
        assert!(GdmlWriter::new(&reg).to_gdml_string().is_err());
    }

    #[test]
    fn writes_file() {
        let path = std::env::temp_dir().join(format!("trexdm-writer-{}.gdml", std::process::id()));
        GdmlWriter::new(&sample()).write_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(contents.starts_with("<?xml"));
    }
}
