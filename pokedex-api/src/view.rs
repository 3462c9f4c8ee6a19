//! # View derivation
//!
//! Pure functions that turn a cache snapshot plus [`ViewParams`] into the page
//! of entries to render. Nothing here performs I/O or holds a lock; callers
//! re-derive from scratch whenever the cache or the parameters change.
//!
//! - [filter_refs] - search by name/id or by type
//! - [sort_refs] - stable sort by id, name, or total base stat
//! - [paginate] - slice one page
//! - [derive_view] - all of the above over a [`CacheSnapshot`]
//!
//! Type search and stat sort read cached details only. A Pokémon whose detail
//! isn't cached yet doesn't match a type search, and sorts as if its stats were 0.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    cache::CacheSnapshot,
    pager::Pager,
    pokemon::{PokemonDetail, PokemonRef},
};

/// How search text is matched
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum SearchMode {
    /// Name contains the text, or id starts with it
    #[default]
    #[serde(rename = "name/id")]
    #[strum(serialize = "name/id")]
    NameOrId,
    /// A type name contains the text
    #[serde(rename = "type")]
    #[strum(serialize = "type")]
    Type,
}

/// Sort key
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortMode {
    #[default]
    Id,
    Name,
    /// Total of base stats
    Stat,
}

/// Sort direction
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Parameters of the list and gallery views.
///
/// The setters mirror the controls of a catalog browser: changing the search,
/// sort, or type filter returns to the first page.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewParams {
    pub search: String,
    pub mode: SearchMode,
    pub sort: SortMode,
    pub order: SortOrder,
    pub selected_type: Option<String>,
    /// 0-based page index
    pub page: usize,
}

impl ViewParams {
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 0;
    }

    pub fn set_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
        self.page = 0;
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        self.page = 0;
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
        self.page = 0;
    }

    /// Selects a type filter, or clears it with None.
    pub fn set_type(&mut self, selected_type: Option<String>) {
        self.selected_type = selected_type.filter(|typ| !typ.trim().is_empty());
        self.page = 0;
    }

    /// Gallery type button: selecting the active type clears the filter.
    pub fn toggle_type(&mut self, type_name: &str) {
        let next = if self.selected_type.as_deref() == Some(type_name) {
            None
        } else {
            Some(type_name.to_string())
        };
        self.set_type(next);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }
}

/// Read access to cached details, by reference.
pub trait DetailSource {
    fn detail(&self, reference: &str) -> Option<&PokemonDetail>;
}

impl DetailSource for CacheSnapshot {
    fn detail(&self, reference: &str) -> Option<&PokemonDetail> {
        self.details.get(reference).map(Arc::as_ref)
    }
}

impl DetailSource for HashMap<String, PokemonDetail> {
    fn detail(&self, reference: &str) -> Option<&PokemonDetail> {
        self.get(reference)
    }
}

impl DetailSource for HashMap<String, Arc<PokemonDetail>> {
    fn detail(&self, reference: &str) -> Option<&PokemonDetail> {
        self.get(reference).map(Arc::as_ref)
    }
}

/// Keeps the entries matching `search` as a literal substring. Blank search
/// keeps everything.
pub fn filter_refs<'a>(
    list: &'a [PokemonRef],
    details: &impl DetailSource,
    search: &str,
    mode: SearchMode,
) -> Vec<&'a PokemonRef> {
    if search.trim().is_empty() {
        return list.iter().collect();
    }
    let query = search.to_lowercase();
    list.iter()
        .filter(|pokemon| match mode {
            SearchMode::NameOrId => {
                pokemon.name.to_lowercase().contains(&query)
                    || pokemon
                        .id()
                        .is_some_and(|id| id.to_string().starts_with(&query))
            }
            SearchMode::Type => details
                .detail(&pokemon.url)
                .is_some_and(|detail| detail.has_type_containing(&query)),
        })
        .collect()
}

/// Locale-style name comparison: case-insensitive first, exact text breaks ties.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

fn total_stats(details: &impl DetailSource, pokemon: &PokemonRef) -> u32 {
    details
        .detail(&pokemon.url)
        .map_or(0, PokemonDetail::total_stats)
}

/// Sorts in place. The sort is stable in both directions: entries with equal
/// keys keep their relative order.
pub fn sort_refs(
    list: &mut [&PokemonRef],
    details: &impl DetailSource,
    sort: SortMode,
    order: SortOrder,
) {
    let direction = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };
    match sort {
        SortMode::Id => {
            list.sort_by(|left, right| direction(left.id_or_zero().cmp(&right.id_or_zero())));
        }
        SortMode::Name => {
            list.sort_by(|left, right| direction(compare_names(&left.name, &right.name)));
        }
        SortMode::Stat => {
            // compute each total once rather than per comparison
            let mut keyed: Vec<(u32, &PokemonRef)> = list
                .iter()
                .map(|pokemon| (total_stats(details, pokemon), *pokemon))
                .collect();
            keyed.sort_by(|left, right| direction(left.0.cmp(&right.0)));
            for (slot, (_, pokemon)) in list.iter_mut().zip(keyed) {
                *slot = pokemon;
            }
        }
    }
}

/// Returns page `page` of `list`: items `[page * page_size, page * page_size + page_size)`,
/// clamped to the list.
pub fn paginate<T>(list: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_mul(page_size).min(list.len());
    let end = start.saturating_add(page_size).min(list.len());
    &list[start..end]
}

/// One row of a derived view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEntry {
    pub reference: PokemonRef,
    pub id: Option<u32>,
    /// Cached detail, if it has been fetched
    pub detail: Option<Arc<PokemonDetail>>,
}

/// A derived page of the list view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewPage {
    pub entries: Vec<ViewEntry>,
    /// Number of entries after filtering, across all pages
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    /// The selected type's list isn't cached yet
    pub pending: bool,
}

impl ViewPage {
    /// Pagination controller positioned at this page.
    pub fn pager(&self, page_size: usize) -> Pager {
        Pager::new(self.page, self.total, page_size)
    }
}

/// Derives one page of the view: working list, filter, sort, then paginate.
pub fn derive_view(snapshot: &CacheSnapshot, params: &ViewParams, page_size: usize) -> ViewPage {
    let Some(list) = snapshot.working_list(params.selected_type.as_deref()) else {
        return ViewPage {
            page: params.page,
            pending: true,
            ..ViewPage::default()
        };
    };

    let mut filtered = filter_refs(list, snapshot, &params.search, params.mode);
    sort_refs(&mut filtered, snapshot, params.sort, params.order);

    let entries = paginate(&filtered, params.page, page_size)
        .iter()
        .map(|pokemon| ViewEntry {
            reference: (*pokemon).clone(),
            id: pokemon.id(),
            detail: snapshot.details.get(&pokemon.url).cloned(),
        })
        .collect();

    ViewPage {
        entries,
        total: filtered.len(),
        page: params.page,
        total_pages: Pager::new(params.page, filtered.len(), page_size).total_pages(),
        pending: false,
    }
}
