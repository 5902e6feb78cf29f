pub mod boolean;
pub mod creation;
pub mod flatten;
pub mod query;
