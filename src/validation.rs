//! Field constraints applied to a candidate before it reaches a store.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::error::Result;

/// The writable part of an entry, as received from a caller. Anything
/// besides `name` and `number` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: Some(number.into()),
        }
    }
}

/// A candidate that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub name: String,
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Number,
}

impl Field {
    pub fn min_len(&self) -> usize {
        match self {
            Field::Name => 3,
            Field::Number => 8,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Number => write!(f, "number"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} missing")]
    Missing(Field),
    #[error("{field} `{value}` is shorter than the minimum allowed length ({min})")]
    TooShort { field: Field, value: String, min: usize },
    #[error("person with given {0} already exists")]
    Duplicate(Field),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Missing(field) | ValidationError::Duplicate(field) => *field,
            ValidationError::TooShort { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Presence, length and uniqueness are all enforced.
    #[default]
    Validated,
    /// Only a name is required. Numbers may be left out.
    Unvalidated,
}

impl ValidationMode {
    /// Checks a candidate against this mode. `taken` answers whether some
    /// other entry already holds the given value for a field; it is only
    /// consulted in validated mode, after all per-field checks have passed.
    pub fn admit<F>(&self, candidate: Candidate, mut taken: F) -> Result<Admitted>
    where
        F: FnMut(Field, &str) -> Result<bool>,
    {
        match self {
            ValidationMode::Unvalidated => {
                let name = candidate.name.ok_or(ValidationError::Missing(Field::Name))?;
                let number = candidate.number.unwrap_or_default();
                Ok(Admitted { name, number })
            }
            ValidationMode::Validated => {
                let name = present(candidate.name, Field::Name)?;
                let number = present(candidate.number, Field::Number)?;
                long_enough(&name, Field::Name)?;
                long_enough(&number, Field::Number)?;
                if taken(Field::Name, &name)? {
                    return Err(ValidationError::Duplicate(Field::Name).into());
                }
                if taken(Field::Number, &number)? {
                    return Err(ValidationError::Duplicate(Field::Number).into());
                }
                Ok(Admitted { name, number })
            }
        }
    }
}

fn present(value: Option<String>, field: Field) -> std::result::Result<String, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Missing(field)),
    }
}

fn long_enough(value: &str, field: Field) -> std::result::Result<(), ValidationError> {
    let min = field.min_len();
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, value: value.to_string(), min });
    }
    Ok(())
}
