use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DexError {
    #[error("invalid pokemon id: {0}")]
    InvalidPokemonId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("network error: {0}")]
    CatalogueHttp(String),

    #[error("PokeAPI returned status {status}: {message}")]
    CatalogueStatus { status: u16, message: String },

    #[error("malformed PokeAPI response: {0}")]
    CatalogueParse(String),
}
