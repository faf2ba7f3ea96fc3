//! Metadata extraction and the entity registry

pub mod extractor;
pub mod registry;

pub use extractor::{extract, Catalog};
pub use registry::{EntityModel, Registry, RegistryBuilder};
