use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DexError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PokemonId(String);

impl PokemonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PokemonId {
    type Err = DexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !is_valid {
            return Err(DexError::InvalidPokemonId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PokemonRecord {
    pub name: String,
    pub weight: u64,
    pub height: u64,
    pub base_experience: u64,
    pub sprite: Option<String>,
}

impl PokemonRecord {
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(PokemonRecord),
    Failure(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn record(&self) -> Option<&PokemonRecord> {
        match self {
            FetchOutcome::Success(record) => Some(record),
            FetchOutcome::Failure(_) => None,
        }
    }
}
