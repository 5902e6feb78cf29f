//! Serialization to GDML, the interchange format read by Geant4.

mod writer;

pub use writer::GdmlWriter;
