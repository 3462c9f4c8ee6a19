//! # Query string sync
//!
//! Maps [`ViewParams`] to and from a shareable query string such as
//! `search=pika&page=2&sort=stat&order=desc`.
//!
//! | key      | values                  | default   |
//! |----------|-------------------------|-----------|
//! | `search` | any text                | empty     |
//! | `type`   | type name               | none      |
//! | `page`   | 0-based page index      | `0`       |
//! | `mode`   | `name/id`, `type`       | `name/id` |
//! | `sort`   | `id`, `name`, `stat`    | `id`      |
//! | `order`  | `asc`, `desc`           | `asc`     |
//!
//! Defaults are left out when writing. When reading, missing or unrecognized
//! values fall back to the default and unknown keys are ignored.

use std::{borrow::Cow, str::FromStr};

use crate::view::ViewParams;

const KEY_SEARCH: &str = "search";
const KEY_TYPE: &str = "type";
const KEY_PAGE: &str = "page";
const KEY_MODE: &str = "mode";
const KEY_SORT: &str = "sort";
const KEY_ORDER: &str = "order";

// form decoding: '+' is a space, then percent escapes
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // invalid utf-8 after decoding; keep the text as received
        Err(_) => spaced,
    }
}

/// Decoded `(key, value)` pairs, in order. A key without `=` has an empty value.
fn parse_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn parse_or_default<T: FromStr + Default>(value: Option<&str>) -> T {
    value
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

impl ViewParams {
    /// Reads view parameters from a query string. A leading `?` is optional.
    ///
    /// ```rust
    /// use pokedex::prelude::*;
    /// let params = ViewParams::from_query("?search=mr+mime&sort=name&page=2");
    /// assert_eq!(params.search, "mr mime");
    /// assert_eq!(params.sort, SortMode::Name);
    /// assert_eq!(params.page, 2);
    /// ```
    pub fn from_query(query: &str) -> Self {
        let pairs = parse_pairs(query);
        // first occurrence wins
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str())
        };

        ViewParams {
            search: get(KEY_SEARCH).unwrap_or_default().to_string(),
            mode: parse_or_default(get(KEY_MODE)),
            sort: parse_or_default(get(KEY_SORT)),
            order: parse_or_default(get(KEY_ORDER)),
            selected_type: get(KEY_TYPE)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string),
            page: parse_or_default(get(KEY_PAGE)),
        }
    }

    /// Writes the non-default parameters as a query string, without a leading `?`.
    /// Default parameters produce an empty string.
    pub fn to_query(&self) -> String {
        let defaults = ViewParams::default();
        let mut pairs: Vec<(&str, Cow<'_, str>)> = Vec::new();

        if !self.search.is_empty() {
            pairs.push((KEY_SEARCH, urlencoding::encode(&self.search)));
        }
        if let Some(selected_type) = self.selected_type.as_deref().filter(|typ| !typ.is_empty()) {
            pairs.push((KEY_TYPE, urlencoding::encode(selected_type)));
        }
        if self.page != defaults.page {
            pairs.push((KEY_PAGE, Cow::Owned(self.page.to_string())));
        }
        if self.mode != defaults.mode {
            pairs.push((KEY_MODE, Cow::Owned(urlencoding::encode(&self.mode.to_string()).into_owned())));
        }
        if self.sort != defaults.sort {
            pairs.push((KEY_SORT, Cow::Owned(self.sort.to_string())));
        }
        if self.order != defaults.order {
            pairs.push((KEY_ORDER, Cow::Owned(self.order.to_string())));
        }

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}
