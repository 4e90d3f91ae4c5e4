use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::{PokemonId, PokemonRecord};
use crate::error::DexError;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/pokemon";

pub trait CatalogueClient: Send + Sync {
    fn fetch_pokemon(&self, id: &PokemonId) -> Result<PokemonRecord, DexError>;
}

#[derive(Clone)]
pub struct PokeApiHttpClient {
    client: Client,
    base_url: String,
}

impl PokeApiHttpClient {
    pub fn new(base_url: &str) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("termdex/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DexError::CatalogueHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| DexError::CatalogueHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn pokemon_url(&self, id: &PokemonId) -> String {
        format!("{}/{}", self.base_url, id.as_str())
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "PokeAPI request failed".to_string());
        Err(DexError::CatalogueStatus { status, message })
    }
}

impl CatalogueClient for PokeApiHttpClient {
    fn fetch_pokemon(&self, id: &PokemonId) -> Result<PokemonRecord, DexError> {
        let url = self.pokemon_url(id);
        tracing::debug!(id = %id, %url, "pokeapi request");
        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| DexError::CatalogueHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let raw: Value = response
            .json()
            .map_err(|err| DexError::CatalogueParse(err.to_string()))?;
        tracing::debug!(id = %id, latency_ms = start.elapsed().as_millis() as u64, "pokeapi response");
        extract_record(&raw)
    }
}

pub fn extract_record(raw: &Value) -> Result<PokemonRecord, DexError> {
    let name = raw
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DexError::CatalogueParse("missing name".to_string()))?
        .to_string();
    let weight = raw
        .get("weight")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DexError::CatalogueParse("missing or non-numeric weight".to_string()))?;
    let height = raw
        .get("height")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DexError::CatalogueParse("missing or non-numeric height".to_string()))?;
    let base_experience = raw
        .get("base_experience")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| {
            DexError::CatalogueParse("missing or non-numeric base_experience".to_string())
        })?;

    let sprites = raw.get("sprites");
    let artwork = sprites
        .and_then(|v| v.get("other"))
        .and_then(|v| v.get("official-artwork"))
        .and_then(|v| v.get("front_default"))
        .and_then(|v| v.as_str());
    let front_default = sprites
        .and_then(|v| v.get("front_default"))
        .and_then(|v| v.as_str());
    let sprite = artwork.or(front_default).map(|v| v.to_string());

    Ok(PokemonRecord {
        name,
        weight,
        height,
        base_experience,
        sprite,
    })
}
