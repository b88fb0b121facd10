use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::error::{PhonebookError, Result};
use crate::identity::{generate_number_id, parse_number_id, EntryId};
use crate::validation::{Admitted, Candidate, Field, ValidationMode};

// ------------- Entry -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub number: String,
    pub id: EntryId,
}

/// What an update ended up doing. An update of an id that is not kept falls
/// back to inserting a new entry under a freshly assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Entry),
    Created(Entry),
}

impl UpdateOutcome {
    pub fn entry(&self) -> &Entry {
        match self {
            UpdateOutcome::Updated(e) | UpdateOutcome::Created(e) => e,
        }
    }
    pub fn into_entry(self) -> Entry {
        match self {
            UpdateOutcome::Updated(e) | UpdateOutcome::Created(e) => e,
        }
    }
    pub fn created(&self) -> bool {
        matches!(self, UpdateOutcome::Created(_))
    }
}

/// The authoritative collection of entries. Ids arrive as raw strings and
/// are parsed by the store, since only the store knows its id format.
/// Implementations must run each check-then-mutate sequence under one lock.
pub trait EntryStore: Send + Sync {
    fn list(&self) -> Result<Vec<Entry>>;
    fn get(&self, id: &str) -> Result<Entry>;
    fn insert(&self, candidate: Candidate) -> Result<Entry>;
    fn update(&self, id: &str, candidate: Candidate) -> Result<UpdateOutcome>;
    fn remove(&self, id: &str) -> Result<()>;
    fn count(&self) -> Result<usize>;
}

// ------------- MemoryStore -------------
#[derive(Debug, Clone)]
struct Record {
    id: u64,
    name: String,
    number: String,
}

impl Record {
    fn entry(&self) -> Entry {
        Entry {
            name: self.name.clone(),
            number: self.number.clone(),
            id: EntryId::Number(self.id),
        }
    }
    fn holds(&self, field: Field, value: &str) -> bool {
        match field {
            Field::Name => self.name == value,
            Field::Number => self.number == value,
        }
    }
}

/// Keeps entries in a vector, in insertion order, with random integer ids.
#[derive(Debug)]
pub struct MemoryStore {
    mode: ValidationMode,
    records: Mutex<Vec<Record>>,
}

impl MemoryStore {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            records: Mutex::new(Vec::new()),
        }
    }
    /// A store primed with the four classic sample persons, ids 1 to 4.
    pub fn with_sample_persons(mode: ValidationMode) -> Self {
        let samples = [
            ("Arto Hellas", "040-123456"),
            ("Ada Lovelace", "39-44-5323523"),
            ("Dan Abramov", "12-43-234345"),
            ("Mary Poppendieck", "39-23-6423122"),
        ];
        let records = samples
            .iter()
            .zip(1u64..)
            .map(|((name, number), id)| Record {
                id,
                name: name.to_string(),
                number: number.to_string(),
            })
            .collect();
        Self {
            mode,
            records: Mutex::new(records),
        }
    }
}

fn admit(mode: ValidationMode, records: &[Record], candidate: Candidate, except: Option<u64>) -> Result<Admitted> {
    mode.admit(candidate, |field, value| {
        Ok(records
            .iter()
            .any(|r| Some(r.id) != except && r.holds(field, value)))
    })
}

impl EntryStore for MemoryStore {
    fn list(&self) -> Result<Vec<Entry>> {
        let records = self.records.lock()?;
        Ok(records.iter().map(Record::entry).collect())
    }

    fn get(&self, id: &str) -> Result<Entry> {
        let id = parse_number_id(id)?;
        let records = self.records.lock()?;
        records
            .iter()
            .find(|r| r.id == id)
            .map(Record::entry)
            .ok_or(PhonebookError::NotFound)
    }

    fn insert(&self, candidate: Candidate) -> Result<Entry> {
        let mut records = self.records.lock()?;
        let admitted = admit(self.mode, &records, candidate, None)?;
        let record = Record {
            id: generate_number_id(),
            name: admitted.name,
            number: admitted.number,
        };
        debug!(id = record.id, "inserted entry");
        let entry = record.entry();
        records.push(record);
        Ok(entry)
    }

    fn update(&self, id: &str, candidate: Candidate) -> Result<UpdateOutcome> {
        let requested = parse_number_id(id)?;
        let mut records = self.records.lock()?;
        let position = records.iter().position(|r| r.id == requested);
        let admitted = admit(self.mode, &records, candidate, position.map(|_| requested))?;
        match position {
            Some(i) => {
                let record = &mut records[i];
                record.name = admitted.name;
                record.number = admitted.number;
                Ok(UpdateOutcome::Updated(record.entry()))
            }
            None => {
                // the new id must differ from the one asked for
                let mut fresh = generate_number_id();
                while fresh == requested {
                    fresh = generate_number_id();
                }
                let record = Record {
                    id: fresh,
                    name: admitted.name,
                    number: admitted.number,
                };
                debug!(requested, id = fresh, "update fell back to insert");
                let entry = record.entry();
                records.push(record);
                Ok(UpdateOutcome::Created(entry))
            }
        }
    }

    fn remove(&self, id: &str) -> Result<()> {
        let id = parse_number_id(id)?;
        let mut records = self.records.lock()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(PhonebookError::NotFound);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.lock()?.len())
    }
}
