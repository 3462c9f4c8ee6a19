//! # Best-effort detail fetching
//!
//! Operations that fetch many details and must not fail as a whole when one
//! fetch fails:
//!
//! - [ensure_details](PokedexClient::ensure_details) - fetch every uncached detail in a list
//! - [wait_for_warm](PokedexClient::wait_for_warm) - await the background warming started by `load_index`
//! - [load_page_settled](PokedexClient::load_page_settled) - one page of details, with per-item failures
//!
//! Warming starts when [load_index](PokedexClient::load_index) stores the index.
//! It runs as a spawned task, so `load_index` returns without waiting for it.
//! Until warming finishes, type search and stat sort see only the details cached
//! so far. Failures are logged and counted in a [`WarmReport`].

use std::sync::Arc;

use futures::{StreamExt, future::join_all, stream};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    client::PokedexClient,
    error::PokedexError,
    pokemon::{PokemonDetail, PokemonRef},
    view::paginate,
};

/// Outcome of a warming pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    /// Details that were not cached when the pass started
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// References whose fetch failed, in completion order
    pub failed_refs: Vec<String>,
}

impl WarmReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for WarmReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted={} succeeded={} failed={}",
            self.attempted, self.succeeded, self.failed
        )
    }
}

/// A reference whose detail could not be fetched.
#[derive(Debug)]
pub struct FailedRef {
    pub reference: PokemonRef,
    pub error: PokedexError,
}

/// One page of details, tolerating per-item failures.
#[derive(Debug, Default)]
pub struct SettledPage {
    /// Details that loaded, in page order
    pub details: Vec<Arc<PokemonDetail>>,
    /// References that failed, in page order
    pub failed: Vec<FailedRef>,
}

impl SettledPage {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PokedexClient {
    /// Fetches the detail of every reference in `list` that isn't cached yet.
    /// Individual failures are logged and counted; they don't stop the others.
    /// At most `warm_concurrency` fetches are in flight at once.
    pub async fn ensure_details(&self, list: &[PokemonRef]) -> WarmReport {
        let missing: Vec<PokemonRef> = self
            .cache
            .missing_details(list)
            .into_iter()
            .cloned()
            .collect();
        let mut report = WarmReport {
            attempted: missing.len(),
            ..WarmReport::default()
        };
        if missing.is_empty() {
            return report;
        }
        debug!(count = missing.len(), "fetching uncached details");

        let client = self;
        let mut results = stream::iter(missing)
            .map(|pokemon| async move {
                let result = client.load_detail(&pokemon.url).await;
                (pokemon, result)
            })
            .buffer_unordered(self.config.warm_concurrency.max(1));

        while let Some((pokemon, result)) = results.next().await {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!(reference = pokemon.url.as_str(), error = %e, "detail fetch failed");
                    report.failed += 1;
                    report.failed_refs.push(pokemon.url);
                }
            }
        }
        report
    }

    /// Starts warming the detail cache for `index` in the background.
    /// The report is stored in the cache when the task finishes.
    pub(crate) fn spawn_warm(&self, index: Arc<Vec<PokemonRef>>) {
        let client = self.clone();
        let handle = tokio::spawn(async move {
            let report = client.ensure_details(&index).await;
            if report.is_complete() {
                info!(%report, "detail cache warmed");
            } else {
                warn!(%report, "detail cache warmed with failures");
            }
            client.cache.set_warm_report(report.clone());
            report
        });
        if let Some(previous) = self.warm_task.lock().replace(handle) {
            // an earlier pass is still running; let it finish on its own
            debug!(finished = previous.is_finished(), "replaced warm task");
        }
    }

    /// Waits for the current background warming pass, if any, and returns its report.
    /// Returns the last stored report when no pass is running, or None if warming
    /// never ran.
    pub async fn wait_for_warm(&self) -> Option<WarmReport> {
        let handle = self.warm_task.lock().take();
        match handle {
            Some(handle) => match handle.await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "warm task did not complete");
                    self.cache.last_warm_report()
                }
            },
            None => self.cache.last_warm_report(),
        }
    }

    /// Like [load_page](PokedexClient::load_page), but a failed detail does not fail
    /// the page: successful details and failed references are both returned, in page order.
    pub async fn load_page_settled(
        &self,
        list: &[PokemonRef],
        page: usize,
        page_size: usize,
    ) -> SettledPage {
        let slice = paginate(list, page, page_size);
        let results = join_all(slice.iter().map(|pokemon| self.load_detail(&pokemon.url))).await;

        let mut settled = SettledPage::default();
        for (pokemon, result) in slice.iter().zip(results) {
            match result {
                Ok(detail) => settled.details.push(detail),
                Err(error) => settled.failed.push(FailedRef {
                    reference: pokemon.clone(),
                    error,
                }),
            }
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::WarmReport;

    #[test]
    fn report_display_and_completion() {
        let report = WarmReport {
            attempted: 3,
            succeeded: 2,
            failed: 1,
            failed_refs: vec!["https://pokeapi.co/api/v2/pokemon/3/".into()],
        };
        assert!(!report.is_complete());
        assert_eq!(report.to_string(), "attempted=3 succeeded=2 failed=1");
        assert!(WarmReport::default().is_complete());
    }
}
