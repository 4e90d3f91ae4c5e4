use std::fs;

use serde_json::Value;

use termdex::pokeapi::extract_record;

#[test]
fn extracts_record_from_pokeapi_payload() {
    let raw = fs::read_to_string("tests/fixtures/pokemon_pikachu.json").unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    let record = extract_record(&value).unwrap();

    assert_eq!(record.name, "pikachu");
    assert_eq!(record.weight, 60);
    assert_eq!(record.height, 4);
    assert_eq!(record.base_experience, 112);
    assert_eq!(
        record.sprite.as_deref(),
        Some("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/25.png")
    );
    assert_eq!(record.display_name(), "Pikachu");
}
