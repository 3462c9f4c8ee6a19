use anyhow::Result;
use pokedex::prelude::*;
use serde::Serialize;

use crate::{cli::AppContext, output::TableRow};

#[derive(Serialize)]
pub struct TypeRow {
    pub name: &'static str,
    /// Query string that selects this type in the gallery
    pub query: String,
}

impl TableRow for TypeRow {
    fn headers() -> &'static [&'static str] {
        &["type", "query"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.to_string(), self.query.clone()]
    }
}

pub fn handle(ctx: &AppContext) -> Result<()> {
    let rows: Vec<TypeRow> = GALLERY_TYPES
        .iter()
        .map(|&name| {
            let mut params = ViewParams::default();
            params.toggle_type(name);
            TypeRow {
                name,
                query: params.to_query(),
            }
        })
        .collect();
    ctx.output.emit_table(&rows)
}
