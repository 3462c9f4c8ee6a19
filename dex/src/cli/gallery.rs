use std::sync::Arc;

use anyhow::Result;
use pokedex::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::{
    cli::{AppContext, GalleryArgs, params_from},
    output::PageFooter,
};

#[derive(Serialize)]
struct GalleryOutput<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    selected_type: Option<&'a str>,
    /// 1-based
    page: usize,
    total_pages: usize,
    total: usize,
    details: &'a [Arc<PokemonDetail>],
}

pub async fn handle(ctx: &AppContext, args: GalleryArgs) -> Result<()> {
    let mut params = params_from(args.query.as_deref());
    if let Some(type_name) = args.type_name {
        if !GALLERY_TYPES.contains(&type_name.trim().to_lowercase().as_str()) {
            warn!(type_name = type_name.as_str(), "not one of the gallery types");
        }
        params.set_type(Some(type_name));
    }

    if let Some(page) = args.page.as_deref() {
        let list = ctx
            .client
            .working_list(params.selected_type.as_deref())
            .await?;
        let mut pager = Pager::new(params.page, list.len(), GALLERY_PAGE_SIZE);
        pager.go_to_input(page)?;
        params.set_page(pager.page);
    }

    let gallery = ctx.client.gallery_page(&params, GALLERY_PAGE_SIZE).await?;

    let query = params.to_query();
    let footer = PageFooter {
        page: gallery.pager.page,
        total_pages: gallery.pager.total_pages(),
        total: gallery.pager.total,
        query: &query,
    };
    ctx.output.emit_page(
        &gallery.details,
        &footer,
        &GalleryOutput {
            query: &query,
            selected_type: params.selected_type.as_deref(),
            page: gallery.pager.display_page(),
            total_pages: gallery.pager.total_pages(),
            total: gallery.pager.total,
            details: &gallery.details,
        },
    )
}
