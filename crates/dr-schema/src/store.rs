//! SchemaStore: an append-only, versioned `(schema_name, version) ->
//! Schema` map. The core only ever reads/writes through this trait —
//! persistence itself is an external collaborator. One trait, one
//! in-memory/JSON-file implementation good enough for tests and the CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{SchemaError, SchemaResult};
use crate::model::Schema;

/// A version selector for `SchemaStore::read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Exact(u64),
}

#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Read a schema. Writers never mutate an existing version (§5); a
    /// `Latest` read is always safe to run concurrently with a write.
    async fn read(&self, schema_name: &str, version: VersionSelector) -> SchemaResult<Option<Schema>>;

    /// Append a new version for `schema.schema_name`, returning the
    /// version number assigned. The caller's `schema.version` is
    /// ignored; the store assigns the next one.
    async fn write(&self, schema: Schema) -> SchemaResult<u64>;

    /// Convenience over `read` + diffing two versions' table sets, named
    /// in SPEC_FULL.md as an ergonomic addition the CLI's `show-schema
    /// --diff` flag uses; not part of §6.2's core API.
    async fn diff(
        &self,
        schema_name: &str,
        from: u64,
        to: u64,
    ) -> SchemaResult<SchemaDiff> {
        let older = self
            .read(schema_name, VersionSelector::Exact(from))
            .await?
            .ok_or_else(|| SchemaError::SchemaMissing {
                schema_name: schema_name.to_string(),
                version: from,
            })?;
        let newer = self
            .read(schema_name, VersionSelector::Exact(to))
            .await?
            .ok_or_else(|| SchemaError::SchemaMissing {
                schema_name: schema_name.to_string(),
                version: to,
            })?;

        let added_tables = newer
            .tables
            .keys()
            .filter(|id| !older.tables.contains_key(id))
            .copied()
            .collect();
        let removed_tables = older
            .tables
            .keys()
            .filter(|id| !newer.tables.contains_key(id))
            .copied()
            .collect();

        Ok(SchemaDiff {
            added_tables,
            removed_tables,
        })
    }
}

/// The set of tables added/removed between two schema versions.
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub added_tables: Vec<dr_core::TableId>,
    pub removed_tables: Vec<dr_core::TableId>,
}

/// An in-memory `SchemaStore`, used by tests and by the CLI when no
/// `--schema-file` is given.
#[derive(Default)]
pub struct InMemorySchemaStore {
    versions: RwLock<BTreeMap<String, Vec<Schema>>>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaStore for InMemorySchemaStore {
    async fn read(&self, schema_name: &str, version: VersionSelector) -> SchemaResult<Option<Schema>> {
        let versions = self.versions.read().unwrap();
        let Some(history) = versions.get(schema_name) else {
            return Ok(None);
        };
        Ok(match version {
            VersionSelector::Latest => history.last().cloned(),
            VersionSelector::Exact(v) => history.iter().find(|s| s.version == v).cloned(),
        })
    }

    async fn write(&self, mut schema: Schema) -> SchemaResult<u64> {
        let mut versions = self.versions.write().unwrap();
        let history = versions.entry(schema.schema_name.clone()).or_default();
        let next_version = history.last().map(|s| s.version + 1).unwrap_or(1);
        schema.version = next_version;
        history.push(schema);
        Ok(next_version)
    }
}

/// A `SchemaStore` backed by one JSON file per `(schema_name, version)`,
/// named `{schema_name}.v{version}.json`, under `base_dir`. Append-only:
/// `write` never overwrites an existing file.
pub struct JsonFileSchemaStore {
    base_dir: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileSchemaStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        JsonFileSchemaStore {
            base_dir: base_dir.into(),
            lock: RwLock::new(()),
        }
    }

    fn path_for(&self, schema_name: &str, version: u64) -> PathBuf {
        self.base_dir.join(format!("{schema_name}.v{version}.json"))
    }

    fn latest_version_on_disk(&self, schema_name: &str) -> SchemaResult<Option<u64>> {
        let mut latest = None;
        if !self.base_dir.exists() {
            return Ok(None);
        }
        let prefix = format!("{schema_name}.v");
        for entry in std::fs::read_dir(&self.base_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(&prefix) {
                if let Some(v) = rest.strip_suffix(".json").and_then(|s| s.parse::<u64>().ok()) {
                    latest = Some(latest.map_or(v, |l: u64| l.max(v)));
                }
            }
        }
        Ok(latest)
    }
}

fn io_err(e: std::io::Error) -> SchemaError {
    SchemaError::Core(dr_core::CoreError::InvalidOption {
        name: "schemaStore".to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl SchemaStore for JsonFileSchemaStore {
    async fn read(&self, schema_name: &str, version: VersionSelector) -> SchemaResult<Option<Schema>> {
        let _guard = self.lock.read().unwrap();
        let version = match version {
            VersionSelector::Exact(v) => v,
            VersionSelector::Latest => match self.latest_version_on_disk(schema_name)? {
                Some(v) => v,
                None => return Ok(None),
            },
        };
        let path = self.path_for(schema_name, version);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(io_err)?;
        let schema: Schema = serde_json::from_slice(&bytes).map_err(dr_core::CoreError::from)?;
        Ok(Some(schema))
    }

    async fn write(&self, mut schema: Schema) -> SchemaResult<u64> {
        let _guard = self.lock.write().unwrap();
        std::fs::create_dir_all(&self.base_dir).map_err(io_err)?;
        let next_version = self.latest_version_on_disk(&schema.schema_name)?.unwrap_or(0) + 1;
        schema.version = next_version;
        let path = self.path_for(&schema.schema_name, next_version);
        let bytes = serde_json::to_vec_pretty(&schema).map_err(dr_core::CoreError::from)?;
        std::fs::write(&path, bytes).map_err(io_err)?;
        Ok(next_version)
    }
}

/// Helper kept alongside the store implementations: resolves a path
/// relative to the store's base directory, used by the CLI when printing
/// where a schema version lives.
pub fn schema_file_path(base_dir: &Path, schema_name: &str, version: u64) -> PathBuf {
    base_dir.join(format!("{schema_name}.v{version}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;

    fn rt() -> Runtime {
        Runtime::new().unwrap()
    }

    #[test]
    fn in_memory_store_appends_versions() {
        let store = InMemorySchemaStore::new();
        rt().block_on(async {
            let v1 = store.write(Schema::new("_default", 0)).await.unwrap();
            let v2 = store.write(Schema::new("_default", 0)).await.unwrap();
            assert_eq!(v1, 1);
            assert_eq!(v2, 2);

            let latest = store.read("_default", VersionSelector::Latest).await.unwrap().unwrap();
            assert_eq!(latest.version, 2);

            let exact = store
                .read("_default", VersionSelector::Exact(1))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(exact.version, 1);
        });
    }

    #[test]
    fn missing_schema_name_reads_as_none() {
        let store = InMemorySchemaStore::new();
        rt().block_on(async {
            let result = store.read("nope", VersionSelector::Latest).await.unwrap();
            assert!(result.is_none());
        });
    }

    #[test]
    fn json_file_store_round_trips_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSchemaStore::new(dir.path());
        rt().block_on(async {
            let v1 = store.write(Schema::new("_default", 0)).await.unwrap();
            assert_eq!(v1, 1);
            let v2 = store.write(Schema::new("_default", 0)).await.unwrap();
            assert_eq!(v2, 2);

            let latest = store.read("_default", VersionSelector::Latest).await.unwrap().unwrap();
            assert_eq!(latest.version, 2);
            let first = store
                .read("_default", VersionSelector::Exact(1))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(first.version, 1);
        });
    }
}
