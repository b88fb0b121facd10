//! Layered settings: built-in defaults, then an optional `phonebook.toml`
//! (or any other file given on the command line), then `PHONEBOOK_*`
//! environment variables, then explicit overrides.

use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::persist::Persistor;
use crate::store::{EntryStore, MemoryStore};
use crate::validation::ValidationMode;

pub const DEFAULT_CONFIG_FILE: &str = "phonebook";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Entries live in process memory and are lost on exit.
    Memory,
    /// Entries are kept in a SQLite database file.
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub storage: StorageKind,
    pub database: String,
    pub validation: ValidationMode,
    /// Preload the sample persons (memory storage only).
    pub seed: bool,
}

/// Values given explicitly, e.g. as command line flags. They win over
/// every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub storage: Option<String>,
    pub database: Option<String>,
    pub validation: Option<String>,
    pub seed: Option<bool>,
}

impl Settings {
    pub fn load(file: Option<&str>, overrides: Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("port", 3001_i64)?
            .set_default("storage", "memory")?
            .set_default("database", "phonebook.db")?
            .set_default("validation", "validated")?
            .set_default("seed", false)?;
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix("PHONEBOOK"))
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("storage", overrides.storage)?
            .set_override_option("database", overrides.database)?
            .set_override_option("validation", overrides.validation)?
            .set_override_option("seed", overrides.seed)?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Creates the entry store these settings describe. Called once at
    /// startup; the store lives as long as the process.
    pub fn open_store(&self) -> Result<Arc<dyn EntryStore>> {
        info!(storage = ?self.storage, validation = ?self.validation, "opening entry store");
        let store: Arc<dyn EntryStore> = match self.storage {
            StorageKind::Memory if self.seed => Arc::new(MemoryStore::with_sample_persons(self.validation)),
            StorageKind::Memory => Arc::new(MemoryStore::new(self.validation)),
            StorageKind::Sqlite => Arc::new(Persistor::open(&self.database, self.validation)?),
        };
        Ok(store)
    }
}
