mod validate;

pub use validate::{Validate, ValidationSummary};
