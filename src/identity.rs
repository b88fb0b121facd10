//! Entry identities.
//!
//! Two strategies are available, one per storage backend:
//! * The in-memory store draws a random integer in `[1, 99_999_999]`. No check
//!   is made against ids already in use, so two entries may in rare cases be
//!   handed the same id.
//! * The persistor assigns an [`ObjectId`]: 12 bytes made up of a timestamp,
//!   a per-process random part and a counter, rendered as 24 hex digits.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Serialize, Serializer};

use crate::error::{PhonebookError, Result};

pub const MIN_NUMBER_ID: u64 = 1;
pub const MAX_NUMBER_ID: u64 = 99_999_999;

// ------------- EntryId -------------
/// The identity of an entry as seen from the outside. Numeric ids serialize
/// as JSON numbers, object ids as JSON strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(u64),
    Object(ObjectId),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{}", n),
            EntryId::Object(o) => write!(f, "{}", o),
        }
    }
}

impl From<ObjectId> for EntryId {
    fn from(id: ObjectId) -> Self {
        EntryId::Object(id)
    }
}

// ------------- Random numbers -------------
pub fn generate_number_id() -> u64 {
    rand::thread_rng().gen_range(MIN_NUMBER_ID..=MAX_NUMBER_ID)
}

pub fn parse_number_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| PhonebookError::InvalidId(raw.to_string()))
}

// ------------- ObjectId -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Seconds since the epoch at which the id was generated.
    pub fn seconds(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = PhonebookError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PhonebookError::InvalidId(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| PhonebookError::InvalidId(s.to_string()))?;
        }
        Ok(ObjectId(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug)]
pub struct ObjectIdGenerator {
    process: [u8; 5],
    counter: u32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut process = [0u8; 5];
        rng.fill(&mut process);
        Self {
            process,
            counter: rng.gen_range(0..=0x00ff_ffff),
        }
    }
    pub fn generate(&mut self) -> ObjectId {
        let seconds = Utc::now().timestamp() as u32;
        self.counter = (self.counter + 1) & 0x00ff_ffff;
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..12].copy_from_slice(&self.counter.to_be_bytes()[1..]);
        ObjectId(bytes)
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
