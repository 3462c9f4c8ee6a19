//! Shared test utilities for pokedex integration tests
//!
//! A `wiremock` server stands in for PokeAPI. Fixtures build responses in the
//! server's json shape, with references pointing back at the mock server, so
//! every request a client makes can be matched and counted.
#![cfg(test)]
#![allow(dead_code)]

use std::time::Duration;

use pokedex::prelude::*;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// A small catalog: (id, name, types, base stats)
pub const CATALOG: [(u32, &str, &[&str], &[u32]); 6] = [
    (1, "bulbasaur", &["grass", "poison"], &[45, 49, 49, 65, 65, 45]),
    (4, "charmander", &["fire"], &[39, 52, 43, 60, 50, 65]),
    (6, "charizard", &["fire", "flying"], &[78, 84, 78, 109, 85, 100]),
    (7, "squirtle", &["water"], &[44, 48, 65, 50, 64, 43]),
    (25, "pikachu", &["electric"], &[35, 55, 40, 50, 50, 90]),
    (37, "vulpix", &["fire"], &[38, 41, 40, 50, 65, 65]),
];

const STAT_NAMES: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

/// Reference url for `id` on the mock server, in the form the index uses.
pub fn reference(server: &MockServer, id: u32) -> String {
    format!("{}/pokemon/{id}/", server.uri())
}

pub fn ref_json(server: &MockServer, id: u32, name: &str) -> Value {
    json!({ "name": name, "url": reference(server, id) })
}

pub fn index_json(server: &MockServer, entries: &[(u32, &str)]) -> Value {
    let results: Vec<Value> = entries
        .iter()
        .map(|(id, name)| ref_json(server, *id, name))
        .collect();
    json!({ "count": results.len(), "next": null, "previous": null, "results": results })
}

pub fn type_json(server: &MockServer, type_name: &str, entries: &[(u32, &str)]) -> Value {
    let pokemon: Vec<Value> = entries
        .iter()
        .map(|(id, name)| json!({ "pokemon": ref_json(server, *id, name), "slot": 1 }))
        .collect();
    json!({ "id": 10, "name": type_name, "pokemon": pokemon })
}

pub fn detail_json(id: u32, name: &str, types: &[&str], stats: &[u32]) -> Value {
    let types: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(slot, typ)| json!({ "slot": slot + 1, "type": { "name": typ, "url": "" } }))
        .collect();
    let stats: Vec<Value> = stats
        .iter()
        .zip(STAT_NAMES)
        .map(|(base_stat, stat)| json!({ "base_stat": base_stat, "effort": 0, "stat": { "name": stat } }))
        .collect();
    json!({
        "id": id,
        "name": name,
        "sprites": { "front_default": format!("https://img.example/{id}.png") },
        "types": types,
        "stats": stats,
        "height": 7,
        "weight": 69,
        "abilities": [ { "ability": { "name": "overgrow" }, "is_hidden": false, "slot": 1 } ],
        "held_items": [],
        "forms": [ { "name": name } ]
    })
}

/// Catalog entries as (id, name) pairs
pub fn catalog_entries() -> Vec<(u32, &'static str)> {
    CATALOG.iter().map(|(id, name, _, _)| (*id, *name)).collect()
}

/// Catalog entries having `type_name`
pub fn catalog_of_type(type_name: &str) -> Vec<(u32, &'static str)> {
    CATALOG
        .iter()
        .filter(|(_, _, types, _)| types.contains(&type_name))
        .map(|(id, name, _, _)| (*id, *name))
        .collect()
}

/// Mounts the index endpoint. `expect` is the exact number of requests allowed.
pub async fn mount_index(server: &MockServer, entries: &[(u32, &str)], expect: u64) {
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .and(query_param("limit", "100000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_json(server, entries)))
        .expect(expect)
        .mount(server)
        .await;
}

pub async fn mount_type(server: &MockServer, type_name: &str, expect: u64) {
    let entries = catalog_of_type(type_name);
    Mock::given(method("GET"))
        .and(path(format!("/type/{type_name}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(type_json(server, type_name, &entries)),
        )
        .expect(expect)
        .mount(server)
        .await;
}

/// Mounts the detail endpoint for a catalog entry, with an optional response delay.
pub async fn mount_detail_delayed(server: &MockServer, id: u32, delay: Option<Duration>) {
    let Some((_, name, types, stats)) = CATALOG.iter().find(|entry| entry.0 == id) else {
        panic!("no catalog entry for id {id}");
    };
    let mut response = ResponseTemplate::new(200).set_body_json(detail_json(id, name, types, stats));
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }
    Mock::given(method("GET"))
        .and(path(format!("/pokemon/{id}/")))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_detail(server: &MockServer, id: u32) {
    mount_detail_delayed(server, id, None).await;
}

/// Mounts a detail endpoint that always fails with a non-retryable server error.
pub async fn mount_failing_detail(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/pokemon/{id}/")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(server)
        .await;
}

pub async fn mount_catalog_details(server: &MockServer) {
    for (id, _, _, _) in CATALOG {
        mount_detail(server, id).await;
    }
}

/// Client pointed at the mock server. Warming is off unless requested.
pub fn client_for(server: &MockServer, warm_on_index: bool) -> PokedexClient {
    let config = ClientConfig::default()
        .base_url(server.uri())
        .warm_on_index(warm_on_index)
        .warm_concurrency(4)
        .request_timeout(Some(Duration::from_secs(10)));
    PokedexClient::with_config(config).expect("client for mock server")
}
