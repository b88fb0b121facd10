// used for persistence
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PhonebookError, Result};
use crate::identity::{EntryId, ObjectId, ObjectIdGenerator};
use crate::store::{Entry, EntryStore, UpdateOutcome};
use crate::validation::{Admitted, Candidate, Field, ValidationMode};

// ------------- Persistence -------------
struct Backing {
    connection: Connection,
    // the storage layer hands out the identities
    generator: ObjectIdGenerator,
}

/// SQLite backed entry store. The connection is opened once and held for the
/// lifetime of the persistor; all access goes through a single mutex.
pub struct Persistor {
    mode: ValidationMode,
    backing: Mutex<Backing>,
}

impl Persistor {
    /// Opens (or creates) a database file. The path `:memory:` gives a
    /// private in-memory database.
    pub fn open(path: impl AsRef<Path>, mode: ValidationMode) -> Result<Self> {
        let connection = Connection::open(path.as_ref())?;
        let persistor = Self::with_connection(connection, mode)?;
        let entries = persistor.count()?;
        info!(path = %path.as_ref().display(), entries, "opened phonebook database");
        Ok(persistor)
    }

    pub fn in_memory(mode: ValidationMode) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, mode)
    }

    fn with_connection(connection: Connection, mode: ValidationMode) -> Result<Self> {
        // no unique constraints on Name or Number, since unvalidated mode allows duplicates
        connection.execute_batch(
            "
            create table if not exists Person (
                Person_Identity text not null,
                Name text not null,
                Number text not null,
                constraint referenceable_Person_Identity primary key (
                    Person_Identity
                )
            );
            ",
        )?;
        Ok(Self {
            mode,
            backing: Mutex::new(Backing {
                connection,
                generator: ObjectIdGenerator::new(),
            }),
        })
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Name => "Name",
        Field::Number => "Number",
    }
}

fn taken(connection: &Connection, field: Field, value: &str, except: Option<&str>) -> Result<bool> {
    let sql = format!(
        "
        select exists (
            select 1
              from Person
             where {} = ?1
               and Person_Identity is not ?2
        )
        ",
        column(field)
    );
    let found: bool = connection
        .prepare_cached(&sql)?
        .query_row(params![value, except], |row| row.get(0))?;
    Ok(found)
}

fn admit(mode: ValidationMode, connection: &Connection, candidate: Candidate, except: Option<&str>) -> Result<Admitted> {
    mode.admit(candidate, |field, value| taken(connection, field, value, except))
}

fn to_entry((id, name, number): (String, String, String)) -> Result<Entry> {
    let id: ObjectId = id.parse().map_err(|_| PhonebookError::Persistence(format!("corrupt identity in Person: {id}")))?;
    Ok(Entry {
        name,
        number,
        id: EntryId::Object(id),
    })
}

fn exists(connection: &Connection, id: &ObjectId) -> Result<bool> {
    let found: Option<String> = connection
        .prepare_cached("select Person_Identity from Person where Person_Identity = ?")?
        .query_row([id.to_string()], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

impl EntryStore for Persistor {
    fn list(&self) -> Result<Vec<Entry>> {
        let backing = self.backing.lock()?;
        let mut statement = backing.connection.prepare_cached(
            "
            select Person_Identity, Name, Number
              from Person
             order by rowid
            ",
        )?;
        let rows = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<(String, String, String)>>>()?;
        rows.into_iter().map(to_entry).collect()
    }

    fn get(&self, id: &str) -> Result<Entry> {
        let id: ObjectId = id.parse()?;
        let backing = self.backing.lock()?;
        let row: Option<(String, String, String)> = backing
            .connection
            .prepare_cached(
                "
                select Person_Identity, Name, Number
                  from Person
                 where Person_Identity = ?
                ",
            )?
            .query_row([id.to_string()], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;
        match row {
            Some(row) => to_entry(row),
            None => Err(PhonebookError::NotFound),
        }
    }

    fn insert(&self, candidate: Candidate) -> Result<Entry> {
        let mut backing = self.backing.lock()?;
        let admitted = admit(self.mode, &backing.connection, candidate, None)?;
        let id = backing.generator.generate();
        backing
            .connection
            .prepare_cached("insert into Person (Person_Identity, Name, Number) values (?, ?, ?)")?
            .execute(params![id.to_string(), admitted.name, admitted.number])?;
        debug!(%id, "persisted entry");
        Ok(Entry {
            name: admitted.name,
            number: admitted.number,
            id: EntryId::Object(id),
        })
    }

    fn update(&self, id: &str, candidate: Candidate) -> Result<UpdateOutcome> {
        let requested: ObjectId = id.parse()?;
        let mut backing = self.backing.lock()?;
        let Backing { connection, generator } = &mut *backing;
        let transaction = connection.transaction()?;
        let outcome = if exists(&transaction, &requested)? {
            let key = requested.to_string();
            let admitted = admit(self.mode, &transaction, candidate, Some(key.as_str()))?;
            transaction
                .prepare_cached("update Person set Name = ?, Number = ? where Person_Identity = ?")?
                .execute(params![admitted.name, admitted.number, key])?;
            UpdateOutcome::Updated(Entry {
                name: admitted.name,
                number: admitted.number,
                id: EntryId::Object(requested),
            })
        } else {
            let admitted = admit(self.mode, &transaction, candidate, None)?;
            let fresh = generator.generate();
            transaction
                .prepare_cached("insert into Person (Person_Identity, Name, Number) values (?, ?, ?)")?
                .execute(params![fresh.to_string(), admitted.name, admitted.number])?;
            debug!(%requested, id = %fresh, "update fell back to insert");
            UpdateOutcome::Created(Entry {
                name: admitted.name,
                number: admitted.number,
                id: EntryId::Object(fresh),
            })
        };
        transaction.commit()?;
        Ok(outcome)
    }

    fn remove(&self, id: &str) -> Result<()> {
        let id: ObjectId = id.parse()?;
        let backing = self.backing.lock()?;
        let removed = backing
            .connection
            .prepare_cached("delete from Person where Person_Identity = ?")?
            .execute([id.to_string()])?;
        if removed == 0 {
            return Err(PhonebookError::NotFound);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let backing = self.backing.lock()?;
        let count: i64 = backing
            .connection
            .prepare_cached("select count(*) from Person")?
            .query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}
