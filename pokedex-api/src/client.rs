//! Pokedex Rust API Client
//!
//! # Creating new api client
//!
//! - [new](PokedexClient::new) - create new client
//! - [with_config](PokedexClient::with_config) - create client with custom configuration
//! - [with_client](PokedexClient::with_client) - create client with configuration and custom reqwest client
//!
//! # Loading data
//!
//! - [load_index](PokedexClient::load_index) - full index, fetched once
//! - [load_type_list](PokedexClient::load_type_list) - index of one type
//! - [load_detail](PokedexClient::load_detail) - detail record by reference
//! - [load_detail_by_id](PokedexClient::load_detail_by_id) - detail record by numeric id
//! - [load_page](PokedexClient::load_page) - details for one page of a list
//! - [working_list](PokedexClient::working_list) - type list or full index
//! - [gallery_page](PokedexClient::gallery_page) - details and pager for the gallery view
//!
//! # Configuration
//!
//! - [get_config](PokedexClient::get_config) - returns configuration
//! - [http_metrics](PokedexClient::http_metrics) - request counters
//!

use std::{sync::Arc, time::Duration};

use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    DEFAULT_CATALOG_SIZE, POKEAPI_URL, Result,
    cache::{CacheSnapshot, PokedexCache, type_key},
    config::{
        INDEX_LIMIT_DEFAULT, POKEDEX_URL_ENV, RATE_LIMIT_MAX_RETRIES_DEFAULT,
        RATE_LIMIT_MAX_RETRIES_ENV, WARM_CONCURRENCY_DEFAULT, WARM_CONCURRENCY_ENV,
    },
    error::PokedexError,
    http_client::{HttpClient, HttpMetricsSnapshot, HttpRequest},
    pager::{DetailNav, Pager},
    pokemon::{
        DetailResponse, IndexResponse, PokemonDetail, PokemonRef, TypeResponse, check_consistent,
        reference_for_id,
    },
    view::{ViewParams, paginate},
    warm::WarmReport,
};

/// Configuration for the Pokedex client. Defines endpoint url, warming behavior, and other settings.
///
/// ```rust,no_run
/// use pokedex::prelude::*;
/// # fn create_client() -> Result<PokedexClient, PokedexError> {
/// // local mirror, no background warming
/// let config = ClientConfig::default()
///     .base_url("http://127.0.0.1:8000/api/v2")
///     .warm_on_index(false);
/// let client = PokedexClient::with_config(config)?;
/// # Ok(client)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url for all api requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable POKEDEX_URL, if defined, or
    /// * "https://pokeapi.co/api/v2" `pokedex::POKEAPI_URL`
    pub base_url: String,

    /// `limit` sent with the index request. Large enough to return every entry.
    pub index_limit: u32,

    /// Size of the circular id space used by detail navigation.
    pub catalog_size: u32,

    /// Start warming the detail cache in the background when the index is first loaded.
    pub warm_on_index: bool,

    /// Maximum number of detail fetches in flight while warming.
    /// Defaults to 32, or the env override POKEDEX_WARM_CONCURRENCY.
    pub warm_concurrency: usize,

    /// Maximum consecutive 429 retries before failing (0 disables the cap).
    ///
    /// Defaults to RATE_LIMIT_MAX_RETRIES_DEFAULT, or the env override if set:
    /// POKEDEX_RATE_LIMIT_MAX_RETRIES.
    pub rate_limit_max_retries: u32,

    /// Per-request timeout. None waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(POKEDEX_URL_ENV).unwrap_or(POKEAPI_URL.to_string()),
            index_limit: INDEX_LIMIT_DEFAULT,
            catalog_size: DEFAULT_CATALOG_SIZE,
            warm_on_index: true,
            warm_concurrency: std::env::var(WARM_CONCURRENCY_ENV)
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(WARM_CONCURRENCY_DEFAULT),
            rate_limit_max_retries: std::env::var(RATE_LIMIT_MAX_RETRIES_ENV)
                .ok()
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(RATE_LIMIT_MAX_RETRIES_DEFAULT),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Sets the base url.
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..self
        }
    }

    pub fn index_limit(self, index_limit: u32) -> Self {
        ClientConfig {
            index_limit,
            ..self
        }
    }

    pub fn catalog_size(self, catalog_size: u32) -> Self {
        ClientConfig {
            catalog_size,
            ..self
        }
    }

    pub fn warm_on_index(self, warm_on_index: bool) -> Self {
        ClientConfig {
            warm_on_index,
            ..self
        }
    }

    /// Sets warming concurrency. Values below 1 are treated as 1.
    pub fn warm_concurrency(self, warm_concurrency: usize) -> Self {
        ClientConfig {
            warm_concurrency: warm_concurrency.max(1),
            ..self
        }
    }

    pub fn rate_limit_max_retries(self, rate_limit_max_retries: u32) -> Self {
        ClientConfig {
            rate_limit_max_retries,
            ..self
        }
    }

    /// Sets the per-request timeout (None disables it).
    pub fn request_timeout(self, request_timeout: Option<Duration>) -> Self {
        ClientConfig {
            request_timeout,
            ..self
        }
    }
}

/// Details for one page of the gallery view.
#[derive(Debug, Clone)]
pub struct GalleryPage {
    /// Details of the page's entries, in list order
    pub details: Vec<Arc<PokemonDetail>>,
    /// Pagination over the whole working list
    pub pager: Pager,
}

/// Caching PokeAPI client.
///
/// Cloning is cheap, and all clones share one cache.
#[derive(Clone)]
pub struct PokedexClient {
    pub(crate) client: Arc<HttpClient>,
    pub(crate) config: ClientConfig,
    pub(crate) cache: Arc<PokedexCache>,
    pub(crate) warm_task: Arc<Mutex<Option<JoinHandle<WarmReport>>>>,
}

impl std::fmt::Debug for PokedexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PokedexClient")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl PokedexClient {
    /// Creates a new client with default configuration.
    ///
    /// # Example
    /// ```rust,no_run
    /// use pokedex::prelude::*;
    /// # fn create_client() -> Result<PokedexClient, PokedexError> {
    /// let client = PokedexClient::new()?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with the provided configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_client(reqwest::Client::builder(), config)
    }

    /// Creates a client from a `reqwest::ClientBuilder` and configuration.
    /// ClientBuilder can be customized with proxies, dns servers, tls settings, etc.
    ///
    /// # Example
    /// ```rust,no_run
    /// use pokedex::prelude::*;
    /// # fn create_client() -> Result<PokedexClient, PokedexError> {
    /// let builder = reqwest::Client::builder().pool_max_idle_per_host(8);
    /// let client = PokedexClient::with_client(builder, ClientConfig::default())?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn with_client(builder: reqwest::ClientBuilder, config: ClientConfig) -> Result<Self> {
        debug!(url=?config.base_url, "new client");
        let mut builder =
            builder.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = HttpClient::new(
            builder,
            config.base_url.clone(),
            config.rate_limit_max_retries,
        )?;
        Ok(Self {
            client: Arc::new(client),
            config,
            cache: Arc::new(PokedexCache::default()),
            warm_task: Arc::default(),
        })
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a snapshot of current HTTP metrics.
    ///
    /// Cache hits do not send requests, so they don't increment any counter.
    ///
    /// # Example
    /// ```rust,no_run
    /// use pokedex::prelude::*;
    /// # async fn example() -> Result<(), PokedexError> {
    /// let client = PokedexClient::new()?;
    /// client.load_index().await?;
    /// client.load_index().await?;
    /// assert_eq!(client.http_metrics().total_requests, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn http_metrics(&self) -> HttpMetricsSnapshot {
        self.client.metrics_snapshot()
    }

    /// Shared cache store.
    pub fn cache(&self) -> Arc<PokedexCache> {
        self.cache.clone()
    }

    /// Point-in-time copy of the cache, for [derive_view](crate::view::derive_view).
    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    /// Circular navigation from detail `id`, over the configured catalog size.
    pub fn detail_nav(&self, id: u32) -> DetailNav {
        DetailNav::new(id, self.config.catalog_size)
    }
}

impl PokedexClient {
    /// Returns the full index, fetching it on first use.
    ///
    /// A non-empty index is never fetched again. After the first fetch, warming of the
    /// detail cache starts in the background (unless disabled in [`ClientConfig`]);
    /// this call does not wait for it.
    pub async fn load_index(&self) -> Result<Arc<Vec<PokemonRef>>> {
        if self.cache.has_index() {
            return Ok(self.cache.index());
        }
        debug!(limit = self.config.index_limit, "fetching index");
        let response: IndexResponse = self
            .client
            .send(HttpRequest::get("pokemon").query("limit", self.config.index_limit))
            .await?;
        let index = self.cache.set_index(response.results);
        debug!(count = index.len(), "index loaded");
        if self.config.warm_on_index && !index.is_empty() {
            self.spawn_warm(Arc::clone(&index));
        }
        Ok(index)
    }

    /// Returns the index of one type, fetching it on first use.
    /// Type names are trimmed and matched case-insensitively.
    pub async fn load_type_list(&self, type_name: &str) -> Result<Arc<Vec<PokemonRef>>> {
        let key = type_key(type_name);
        if key.is_empty() {
            return Err(PokedexError::InvalidReference {
                reference: type_name.to_string(),
            });
        }
        if let Some(list) = self.cache.type_list(&key) {
            return Ok(list);
        }
        debug!(type_name = key.as_str(), "fetching type list");
        let response: TypeResponse = self
            .client
            .send(HttpRequest::get(format!(
                "type/{}",
                urlencoding::encode(&key)
            )))
            .await?;
        Ok(self.cache.set_type_list(&key, response.into_refs()))
    }

    /// Returns the detail for `reference`, fetching it on a cache miss.
    ///
    /// A fetched record whose id disagrees with the reference is rejected with
    /// [`PokedexError::InconsistentDetail`] and not cached.
    pub async fn load_detail(&self, reference: &str) -> Result<Arc<PokemonDetail>> {
        if reference.trim().is_empty() {
            return Err(PokedexError::InvalidReference {
                reference: reference.to_string(),
            });
        }
        if let Some(detail) = self.cache.detail(reference) {
            return Ok(detail);
        }
        debug!(reference, "fetching detail");
        let response: DetailResponse = self.client.send(HttpRequest::get(reference)).await?;
        let detail = PokemonDetail::from(response);
        check_consistent(reference, &detail)?;
        Ok(self.cache.set_detail(reference, detail))
    }

    /// Returns the detail for a numeric id.
    ///
    /// The id is turned into the same reference form the index uses, so a detail
    /// loaded here is shared with list and gallery views.
    pub async fn load_detail_by_id(&self, id: u32) -> Result<Arc<PokemonDetail>> {
        if id == 0 {
            return Err(PokedexError::InvalidReference {
                reference: id.to_string(),
            });
        }
        let reference = reference_for_id(&self.client.base_url, id);
        self.load_detail(&reference).await
    }

    /// Returns the details for page `page` of `list`, in list order.
    /// Fetches run concurrently. If any fetch fails, the whole page fails;
    /// see [load_page_settled](PokedexClient::load_page_settled) for partial results.
    pub async fn load_page(
        &self,
        list: &[PokemonRef],
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Arc<PokemonDetail>>> {
        let slice = paginate(list, page, page_size);
        try_join_all(slice.iter().map(|pokemon| self.load_detail(&pokemon.url))).await
    }

    /// The list a view works on: the selected type's list, or the full index.
    pub async fn working_list(&self, selected_type: Option<&str>) -> Result<Arc<Vec<PokemonRef>>> {
        match selected_type {
            Some(type_name) => self.load_type_list(type_name).await,
            None => self.load_index().await,
        }
    }

    /// Loads the gallery page selected by `params`: the working list for
    /// `params.selected_type`, then the details of page `params.page`.
    pub async fn gallery_page(&self, params: &ViewParams, page_size: usize) -> Result<GalleryPage> {
        let list = self.working_list(params.selected_type.as_deref()).await?;
        let details = self.load_page(&list, params.page, page_size).await?;
        Ok(GalleryPage {
            details,
            pager: Pager::new(params.page, list.len(), page_size),
        })
    }
}
