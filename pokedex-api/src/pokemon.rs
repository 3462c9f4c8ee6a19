//! # Pokémon records
//!
//! - [`PokemonRef`] - name and reference url, as listed by the index and type endpoints
//! - [`PokemonDetail`] - the detail record for one Pokémon
//!
//! The reference url is the cache key for both. Its trailing path segment is the
//! numeric id, so `https://pokeapi.co/api/v2/pokemon/25/` has id 25.
//!
//! The `*Response` structs mirror the server's json and are mapped into the public
//! types as soon as a response is received.

use serde::{Deserialize, Serialize};

use crate::{Result, error::PokedexError};

/// Name and reference of a Pokémon, as listed by the index endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PokemonRef {
    pub name: String,
    /// Reference url; the detail endpoint for this Pokémon.
    pub url: String,
}

impl PokemonRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric id parsed from the reference url, if it has one.
    pub fn id(&self) -> Option<u32> {
        id_from_reference(&self.url)
    }

    /// Numeric id, or 0 when the reference has none. Used as a sort key.
    pub fn id_or_zero(&self) -> u32 {
        self.id().unwrap_or_default()
    }
}

/// Returns the trailing non-empty path segment of `reference`, parsed as an id.
pub fn id_from_reference(reference: &str) -> Option<u32> {
    id_segment(reference).and_then(|segment| segment.parse().ok())
}

/// Returns the trailing non-empty path segment of `reference`.
pub(crate) fn id_segment(reference: &str) -> Option<&str> {
    reference.split('/').rfind(|segment| !segment.is_empty())
}

/// Canonical reference for an id: `{base_url}/pokemon/{id}/`, the form the index uses.
pub fn reference_for_id(base_url: &str, id: u32) -> String {
    format!("{}/pokemon/{id}/", base_url.trim_end_matches('/'))
}

/// A base stat, for example `hp: 35`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatEntry {
    pub name: String,
    pub base_stat: u32,
}

impl StatEntry {
    /// Short label used by stat charts: HP, Atk, Def, SpA, SpD, Spe.
    pub fn label(&self) -> &str {
        match self.name.as_str() {
            "hp" => "HP",
            "attack" => "Atk",
            "defense" => "Def",
            "special-attack" => "SpA",
            "special-defense" => "SpD",
            "speed" => "Spe",
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ability {
    pub name: String,
    pub is_hidden: bool,
}

/// Detail record for one Pokémon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    /// Front sprite url. Some forms have none.
    pub sprite: Option<String>,
    /// Type names, in slot order.
    pub types: Vec<String>,
    pub stats: Vec<StatEntry>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    pub abilities: Vec<Ability>,
    pub held_items: Vec<String>,
    pub forms: Vec<String>,
}

impl PokemonDetail {
    /// Sum of all base stats.
    pub fn total_stats(&self) -> u32 {
        self.stats.iter().map(|stat| stat.base_stat).sum()
    }

    /// Height in metres
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    /// Weight in kilograms
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    /// True if any type name contains `query`, ignoring case.
    /// `query` must already be lowercase.
    pub fn has_type_containing(&self, query: &str) -> bool {
        self.types
            .iter()
            .any(|typ| typ.to_lowercase().contains(query))
    }
}

// ============================================================================
// WIRE TYPES (internal)
// ============================================================================

/// `GET /pokemon?limit=N`
#[derive(Debug, Deserialize)]
pub(crate) struct IndexResponse {
    pub results: Vec<PokemonRef>,
}

/// `GET /type/{name}`
#[derive(Debug, Deserialize)]
pub(crate) struct TypeResponse {
    #[serde(default)]
    pub pokemon: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TypeSlot {
    pub pokemon: PokemonRef,
}

impl TypeResponse {
    pub fn into_refs(self) -> Vec<PokemonRef> {
        self.pokemon.into_iter().map(|slot| slot.pokemon).collect()
    }
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeEntry {
    r#type: NamedResource,
}

#[derive(Debug, Deserialize)]
struct StatResponse {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
struct AbilityEntry {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
struct HeldItem {
    item: NamedResource,
}

/// `GET {reference}`
#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: Sprites,
    #[serde(default)]
    types: Vec<TypeEntry>,
    #[serde(default)]
    stats: Vec<StatResponse>,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    weight: u32,
    #[serde(default)]
    abilities: Vec<AbilityEntry>,
    #[serde(default)]
    held_items: Vec<HeldItem>,
    #[serde(default)]
    forms: Vec<NamedResource>,
}

impl From<DetailResponse> for PokemonDetail {
    fn from(resp: DetailResponse) -> Self {
        Self {
            id: resp.id,
            name: resp.name,
            sprite: resp.sprites.front_default,
            types: resp.types.into_iter().map(|entry| entry.r#type.name).collect(),
            stats: resp
                .stats
                .into_iter()
                .map(|stat| StatEntry {
                    name: stat.stat.name,
                    base_stat: stat.base_stat,
                })
                .collect(),
            height: resp.height,
            weight: resp.weight,
            abilities: resp
                .abilities
                .into_iter()
                .map(|entry| Ability {
                    name: entry.ability.name,
                    is_hidden: entry.is_hidden,
                })
                .collect(),
            held_items: resp.held_items.into_iter().map(|held| held.item.name).collect(),
            forms: resp.forms.into_iter().map(|form| form.name).collect(),
        }
    }
}

/// Checks that a detail agrees with the id encoded in the reference it is cached under.
/// References without a numeric trailing segment are not checked.
pub(crate) fn check_consistent(reference: &str, detail: &PokemonDetail) -> Result<()> {
    match id_from_reference(reference) {
        Some(expected) if expected != detail.id => Err(PokedexError::InconsistentDetail {
            reference: reference.to_string(),
            expected,
            actual: detail.id,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn id_from_trailing_segment() {
        let pikachu = PokemonRef::new("pikachu", "https://pokeapi.co/api/v2/pokemon/25/");
        assert_eq!(pikachu.id(), Some(25));
        assert_eq!(id_from_reference("https://pokeapi.co/api/v2/pokemon/150"), Some(150));
        assert_eq!(id_from_reference("https://pokeapi.co/api/v2/pokemon/mew/"), None);
        assert_eq!(id_from_reference(""), None);
        assert_eq!(
            PokemonRef::new("x", "https://example.com/pokemon/abc/").id_or_zero(),
            0
        );
    }

    #[test]
    fn reference_for_id_matches_index_form() {
        assert_eq!(
            reference_for_id("https://pokeapi.co/api/v2/", 25),
            "https://pokeapi.co/api/v2/pokemon/25/"
        );
        assert_eq!(
            id_from_reference(&reference_for_id("http://127.0.0.1:9000", 7)),
            Some(7)
        );
    }

    #[test]
    fn detail_from_wire_shape() {
        let resp: DetailResponse = serde_json::from_value(json!({
            "id": 25,
            "name": "pikachu",
            "sprites": { "front_default": "https://img/25.png", "back_default": null },
            "types": [ { "slot": 1, "type": { "name": "electric", "url": "x" } } ],
            "stats": [
                { "base_stat": 35, "effort": 0, "stat": { "name": "hp" } },
                { "base_stat": 55, "effort": 0, "stat": { "name": "attack" } }
            ],
            "height": 4,
            "weight": 60,
            "abilities": [
                { "ability": { "name": "static" }, "is_hidden": false, "slot": 1 },
                { "ability": { "name": "lightning-rod" }, "is_hidden": true, "slot": 3 }
            ],
            "held_items": [ { "item": { "name": "oran-berry" } } ],
            "forms": [ { "name": "pikachu" } ],
            "base_experience": 112
        }))
        .expect("detail fixture");
        let detail = PokemonDetail::from(resp);

        assert_eq!(detail.id, 25);
        assert_eq!(detail.sprite.as_deref(), Some("https://img/25.png"));
        assert_eq!(detail.types, vec!["electric"]);
        assert_eq!(detail.total_stats(), 90);
        assert_eq!(detail.stats[1].label(), "Atk");
        assert!(detail.abilities[1].is_hidden);
        assert_eq!(detail.held_items, vec!["oran-berry"]);
        assert_eq!(detail.forms, vec!["pikachu"]);
        assert!((detail.height_m() - 0.4).abs() < f64::EPSILON);
        assert!((detail.weight_kg() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detail_tolerates_null_sprite_and_missing_lists() {
        let resp: DetailResponse = serde_json::from_value(json!({
            "id": 10001,
            "name": "deoxys-attack",
            "sprites": { "front_default": null }
        }))
        .expect("sparse fixture");
        let detail = PokemonDetail::from(resp);
        assert_eq!(detail.sprite, None);
        assert!(detail.types.is_empty());
        assert_eq!(detail.total_stats(), 0);
    }

    #[test]
    fn type_response_flattens_slots() {
        let resp: TypeResponse = serde_json::from_value(json!({
            "id": 10,
            "name": "fire",
            "pokemon": [
                { "pokemon": { "name": "charmander", "url": "https://p/pokemon/4/" }, "slot": 1 },
                { "pokemon": { "name": "vulpix", "url": "https://p/pokemon/37/" }, "slot": 1 }
            ]
        }))
        .expect("type fixture");
        let refs = resp.into_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].name, "vulpix");
        assert_eq!(refs[1].id(), Some(37));
    }

    #[test]
    fn consistency_check() {
        let detail = PokemonDetail {
            id: 25,
            name: "pikachu".into(),
            sprite: None,
            types: vec!["electric".into()],
            stats: Vec::new(),
            height: 4,
            weight: 60,
            abilities: Vec::new(),
            held_items: Vec::new(),
            forms: Vec::new(),
        };
        assert!(check_consistent("https://p/pokemon/25/", &detail).is_ok());
        assert!(check_consistent("https://p/pokemon/pikachu/", &detail).is_ok());
        assert!(matches!(
            check_consistent("https://p/pokemon/26/", &detail),
            Err(PokedexError::InconsistentDetail {
                expected: 26,
                actual: 25,
                ..
            })
        ));
    }

    #[test]
    fn type_match_ignores_case() {
        let detail = PokemonDetail {
            id: 6,
            name: "charizard".into(),
            sprite: None,
            types: vec!["Fire".into(), "flying".into()],
            stats: Vec::new(),
            height: 17,
            weight: 905,
            abilities: Vec::new(),
            held_items: Vec::new(),
            forms: Vec::new(),
        };
        assert!(detail.has_type_containing("fir"));
        assert!(detail.has_type_containing("fly"));
        assert!(!detail.has_type_containing("water"));
    }
}
