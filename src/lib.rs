//! Phonebook – a small CRUD service for names and phone numbers.
//!
//! The service keeps *entries*, each of the form `(id, name, number)`:
//! * An [`identity::EntryId`] is handed out by the store when an entry is
//!   created and never changes afterwards.
//! * A [`validation::Candidate`] carries the `name` and `number` a caller
//!   wants to write.
//! * A [`validation::ValidationMode`] decides which candidates are admitted.
//!
//! ## Modules
//! * [`store`] – The [`store::EntryStore`] trait and the in-memory [`store::MemoryStore`].
//! * [`persist`] – SQLite backed [`persist::Persistor`], handing out object ids.
//! * [`validation`] – Presence, length and uniqueness checks.
//! * [`identity`] – Random integer ids and object ids.
//! * [`server`] – The HTTP routes (axum) on top of a shared store.
//! * [`settings`] – Layered configuration and store construction.
//!
//! ## Validation
//! In validated mode a name needs at least 3 characters and a number at least
//! 8, and neither may already be held by another entry. In unvalidated mode
//! only a name is required.
//!
//! ## Updates
//! Updating an id that is not kept creates a new entry under a fresh id. The
//! caller is told which of the two happened through [`store::UpdateOutcome`].
//!
//! ## Quick Start
//! ```
//! use phonebook::store::{EntryStore, MemoryStore};
//! use phonebook::validation::{Candidate, ValidationMode};
//! let store = MemoryStore::new(ValidationMode::Validated);
//! let entry = store.insert(Candidate::new("Arto Hellas", "040-123456")).unwrap();
//! assert_eq!(store.get(&entry.id.to_string()).unwrap(), entry);
//! assert_eq!(store.count().unwrap(), 1);
//! ```

pub mod error;
pub mod identity;
pub mod persist;
pub mod server;
pub mod settings;
pub mod store;
pub mod validation;
