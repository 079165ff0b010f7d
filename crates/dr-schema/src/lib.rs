//! dr-schema - the Schema Inference Engine: derives a stable relational
//! schema of virtual tables from sampled documents (§2 component 2).

pub mod error;
pub mod infer;
pub mod lattice;
pub mod model;
pub mod store;

pub use error::{SchemaError, SchemaResult};
pub use infer::SchemaInference;
pub use model::{Column, Schema, SchemaTable, TableKind};
pub use store::{InMemorySchemaStore, JsonFileSchemaStore, SchemaDiff, SchemaStore, VersionSelector};
