use anyhow::Result;
use pokedex::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    cli::{AppContext, ListArgs, params_from},
    output::PageFooter,
};

#[derive(Serialize)]
struct ListOutput<'a> {
    /// Shareable query string for this view
    query: &'a str,
    /// 1-based
    page: usize,
    total_pages: usize,
    total: usize,
    entries: &'a [ViewEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    warm: Option<WarmReport>,
}

pub async fn handle(ctx: &AppContext, args: ListArgs) -> Result<()> {
    let mut params = params_from(args.query.as_deref());
    if let Some(search) = args.search {
        params.set_search(search);
    }
    if let Some(mode) = args.mode {
        params.set_mode(mode.to_mode());
    }
    if let Some(sort) = args.sort {
        params.set_sort(sort.to_sort());
    }
    if let Some(order) = args.order {
        params.set_order(order.to_order());
    }

    ctx.client.load_index().await?;
    if let Some(type_name) = params.selected_type.as_deref() {
        ctx.client.load_type_list(type_name).await?;
    }
    let warm = if args.warm {
        ctx.client.wait_for_warm().await
    } else {
        None
    };
    if let Some(report) = &warm {
        info!(%report, "warmed");
    } else if params.mode == SearchMode::Type || params.sort == SortMode::Stat {
        warn!("type search and stat sort only see cached details; use --warm to fetch all");
    }

    let mut view = derive_view(&ctx.client.snapshot(), &params, LIST_PAGE_SIZE);
    if let Some(page) = args.page.as_deref() {
        let mut pager = view.pager(LIST_PAGE_SIZE);
        pager.go_to_input(page)?;
        params.set_page(pager.page);
        view = derive_view(&ctx.client.snapshot(), &params, LIST_PAGE_SIZE);
    }

    let query = params.to_query();
    let footer = PageFooter {
        page: view.page,
        total_pages: view.total_pages,
        total: view.total,
        query: &query,
    };
    ctx.output.emit_page(
        &view.entries,
        &footer,
        &ListOutput {
            query: &query,
            page: view.page.saturating_add(1),
            total_pages: view.total_pages,
            total: view.total,
            entries: &view.entries,
            warm,
        },
    )
}
