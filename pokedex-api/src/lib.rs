/*
 * Pokedex rust api client
 *
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Pokedex Rust API Client
//!
//! A caching client for the [PokeAPI](https://pokeapi.co) REST service, with the
//! derived list, gallery, and detail views of a catalog browser.
//!
//! ## Features
//!
//! - fetches the full catalog index once, and per-type index lists on demand
//! - lazily fetches and caches per-Pokémon detail records
//! - background cache warming with an aggregate failure report
//! - pure view derivation: filter, sort, and paginate a cache snapshot
//! - lossless mapping between view parameters and a shareable query string
//! - bounds-checked pagination and circular detail navigation
//! - http pipeline with retry logic, rate limit handling, and metrics
//! - companion cli tool (`dex`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pokedex::prelude::*;
//! # async fn example() -> Result<(), PokedexError> {
//!
//! let client = PokedexClient::new()?;
//!
//! // Load the index (once), then derive the first page of the list view
//! client.load_index().await?;
//! let params = ViewParams::from_query("?search=pika&sort=stat&order=desc");
//! let view = derive_view(&client.snapshot(), &params, LIST_PAGE_SIZE);
//! for entry in &view.entries {
//!     println!("#{} {}", entry.id.unwrap_or_default(), entry.reference.name);
//! }
//!
//! // Gallery: details for one page of the fire-type list
//! let mut params = ViewParams::default();
//! params.toggle_type("fire");
//! let gallery = client.gallery_page(&params, GALLERY_PAGE_SIZE).await?;
//! println!("{} of {} fire types", gallery.details.len(), gallery.pager.total);
//!
//! // Detail view, with wrap-around navigation
//! let pikachu = client.load_detail_by_id(25).await?;
//! let nav = client.detail_nav(pikachu.id);
//! println!("{} (next: #{})", pikachu.name, nav.next_id());
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes on API Design
//!
//! - `PokedexClient` is the cache service. Clone it (cheap, `Arc`-backed) and
//!   pass it to every consumer; all clones share one `PokedexCache`.
//! - Fetch operations return `Result<T, PokedexError>`. Background warming never
//!   fails the caller; it reports a [`WarmReport`](warm::WarmReport) instead.
//! - View derivation is synchronous and framework independent: take a
//!   [`CacheSnapshot`](cache::CacheSnapshot), pass it with [`ViewParams`](view::ViewParams)
//!   to [`derive_view`](view::derive_view), render the [`ViewPage`](view::ViewPage).
//!
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::min_ident_chars)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::ref_option)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod cache;
pub mod client;
pub mod error;
mod http_client;
pub mod pager;
pub mod pokemon;
pub mod query;
pub mod view;
pub mod warm;

/// Result type alias using `PokedexError` as the default error.
pub type Result<T, E = crate::error::PokedexError> = std::result::Result<T, E>;

/// Prelude module - import (nearly) all the things with `use pokedex::prelude::*;`
pub mod prelude {
    pub use super::{
        DEFAULT_CATALOG_SIZE, DEFAULT_FETCH_PAGE_SIZE, GALLERY_PAGE_SIZE, GALLERY_TYPES,
        LIST_PAGE_SIZE, POKEAPI_URL, sprite_url,
    };
    // Error types
    pub use crate::error::*;
    pub use crate::{
        // Cache store
        cache::{CacheSnapshot, PokedexCache},
        client::{ClientConfig, GalleryPage, PokedexClient},
        // HTTP metrics
        http_client::HttpMetricsSnapshot,
        // Pagination and detail navigation
        pager::{DetailNav, Pager},
        // Data model
        pokemon::{Ability, PokemonDetail, PokemonRef, StatEntry},
        // View derivation
        view::{
            DetailSource, SearchMode, SortMode, SortOrder, ViewEntry, ViewPage, ViewParams,
            derive_view, filter_refs, paginate, sort_refs,
        },
        // Background warming
        warm::{FailedRef, SettledPage, WarmReport},
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// PokeAPI v2 endpoint
pub const POKEAPI_URL: &str = "https://pokeapi.co/api/v2";

/// Number of entries in the detail route's circular id space.
pub const DEFAULT_CATALOG_SIZE: u32 = 10277;

/// Page size of the list view
pub const LIST_PAGE_SIZE: usize = 48;

/// Page size of the gallery view
pub const GALLERY_PAGE_SIZE: usize = 200;

/// Page size used by `load_page` callers that don't choose one
pub const DEFAULT_FETCH_PAGE_SIZE: usize = 20;

/// Types offered as gallery filters
pub const GALLERY_TYPES: [&str; 18] = [
    "normal", "fire", "water", "grass", "electric", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

const SPRITE_BASE_URL: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Front sprite url for a Pokémon id. Works without a cached detail record.
pub fn sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE_URL}/{id}.png")
}

pub(crate) mod config {
    /// Environment variable for default endpoint URL
    pub const POKEDEX_URL_ENV: &str = "POKEDEX_URL";

    /// Environment variable to override warming concurrency
    pub const WARM_CONCURRENCY_ENV: &str = "POKEDEX_WARM_CONCURRENCY";

    /// Number of detail fetches in flight while warming
    pub const WARM_CONCURRENCY_DEFAULT: usize = 32;

    /// `limit` query value that returns the entire index in one response
    pub const INDEX_LIMIT_DEFAULT: u32 = 100_000;

    /// Warn when the rate-limit wait exceeds this duration (seconds).
    pub const RATE_LIMIT_WAIT_WARN_SECS: u64 = 5;

    /// Fail when the rate-limit wait exceeds this duration (seconds).
    pub const RATE_LIMIT_WAIT_MAX_SECS: u64 = 30;

    /// Environment variable to override rate-limit retry cap (0 disables the cap).
    pub const RATE_LIMIT_MAX_RETRIES_ENV: &str = "POKEDEX_RATE_LIMIT_MAX_RETRIES";

    /// Maximum consecutive 429 retries before failing.
    pub const RATE_LIMIT_MAX_RETRIES_DEFAULT: u32 = 5;

    /// Max retries for HTTP client
    pub const MAX_RETRIES: u32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_url_uses_id() {
        assert_eq!(
            sprite_url(25),
            "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png"
        );
    }

    #[test]
    fn gallery_types_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for typ in GALLERY_TYPES {
            assert_eq!(typ, typ.to_lowercase());
            assert!(seen.insert(typ), "duplicate type {typ}");
        }
    }
}
