// Prints the first page of the list view, sorted by total base stats.
// Fetches every detail first, so the stat sort sees the whole catalog.
//

use pokedex::prelude::*;

#[tokio::main]
async fn main() -> Result<(), PokedexError> {
    let client = PokedexClient::new()?;
    client.load_index().await?;
    if let Some(report) = client.wait_for_warm().await {
        eprintln!("warmed: {report}");
    }

    let params = ViewParams::from_query("sort=stat&order=desc");
    let view = derive_view(&client.snapshot(), &params, LIST_PAGE_SIZE);
    for entry in &view.entries {
        let total = entry.detail.as_ref().map_or(0, |detail| detail.total_stats());
        println!("#{:<5} {:<24} {total}", entry.id.unwrap_or_default(), entry.reference.name);
    }
    println!("page 1 of {} ({} total) ?{}", view.total_pages, view.total, params.to_query());

    Ok(())
}
