// Shows one gallery page per type, using the per-type index lists.
//

use pokedex::prelude::*;

#[tokio::main]
async fn main() -> Result<(), PokedexError> {
    let client = PokedexClient::with_config(ClientConfig::default().warm_on_index(false))?;

    for type_name in ["fire", "water", "grass"] {
        let mut params = ViewParams::default();
        params.toggle_type(type_name);
        let page = client.gallery_page(&params, DEFAULT_FETCH_PAGE_SIZE).await?;
        println!("{type_name}: {} total", page.pager.total);
        for detail in &page.details {
            let sprite = detail.sprite.clone().unwrap_or_else(|| sprite_url(detail.id));
            println!("  #{} {} {sprite}", detail.id, detail.name);
        }
    }
    println!("{}", client.http_metrics());

    Ok(())
}
