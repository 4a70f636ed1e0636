pub mod index;
pub mod invariants;
pub mod merge;
pub mod project;
pub mod schema;
