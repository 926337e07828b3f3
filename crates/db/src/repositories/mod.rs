//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod regulation_component_repo;
pub mod regulation_repo;

pub use regulation_component_repo::RegulationComponentRepo;
pub use regulation_repo::RegulationRepo;
