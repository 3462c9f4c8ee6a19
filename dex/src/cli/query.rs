use anyhow::Result;
use pokedex::prelude::*;
use serde::Serialize;

use crate::{cli::AppContext, output::OutputFormat};

#[derive(Serialize)]
struct QueryOutput {
    /// Normalized query string
    query: String,
    params: ViewParams,
}

pub fn handle(ctx: &AppContext, query: &str) -> Result<()> {
    let params = ViewParams::from_query(query);
    let normalized = params.to_query();
    if ctx.output.format() == OutputFormat::Table {
        return ctx.output.emit_text(&normalized);
    }
    ctx.output.emit_json(&QueryOutput {
        query: normalized,
        params,
    })
}
