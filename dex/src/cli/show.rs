use anyhow::Result;
use pokedex::prelude::*;
use serde::Serialize;

use crate::{
    cli::{AppContext, ShowArgs},
    output::{OutputFormat, render_table},
};

#[derive(Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    detail: &'a PokemonDetail,
    total_stats: u32,
    /// Sprite to use when the record has none
    fallback_sprite: String,
    previous_id: u32,
    next_id: u32,
}

pub async fn handle(ctx: &AppContext, args: ShowArgs) -> Result<()> {
    let nav = ctx.client.detail_nav(args.id);
    let id = if args.next {
        nav.next_id()
    } else if args.prev {
        nav.previous_id()
    } else {
        args.id
    };

    let detail = ctx.client.load_detail_by_id(id).await?;
    let nav = ctx.client.detail_nav(detail.id);

    if ctx.output.format() == OutputFormat::Table {
        return ctx.output.emit_text(&describe(&detail, &nav));
    }

    ctx.output.emit_json(&ShowOutput {
        detail: &detail,
        total_stats: detail.total_stats(),
        fallback_sprite: sprite_url(detail.id),
        previous_id: nav.previous_id(),
        next_id: nav.next_id(),
    })
}

fn describe(detail: &PokemonDetail, nav: &DetailNav) -> String {
    let abilities: Vec<String> = detail
        .abilities
        .iter()
        .map(|ability| {
            if ability.is_hidden {
                format!("{} (hidden)", ability.name)
            } else {
                ability.name.clone()
            }
        })
        .collect();
    let mut lines = vec![
        format!("#{} {}", detail.id, detail.name),
        format!("types:     {}", detail.types.join(", ")),
        format!("height:    {:.1} m", detail.height_m()),
        format!("weight:    {:.1} kg", detail.weight_kg()),
        format!("abilities: {}", abilities.join(", ")),
    ];
    if !detail.held_items.is_empty() {
        lines.push(format!("items:     {}", detail.held_items.join(", ")));
    }
    if !detail.forms.is_empty() {
        lines.push(format!("forms:     {}", detail.forms.join(", ")));
    }
    lines.push(String::new());
    lines.push(render_table(&detail.stats));
    lines.push(format!("total: {}", detail.total_stats()));
    lines.push(String::new());
    lines.push(format!("prev: #{}  next: #{}", nav.previous_id(), nav.next_id()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_lists_stats_and_navigation() {
        let detail = PokemonDetail {
            id: 1,
            name: "bulbasaur".into(),
            sprite: None,
            types: vec!["grass".into(), "poison".into()],
            stats: vec![
                StatEntry {
                    name: "hp".into(),
                    base_stat: 45,
                },
                StatEntry {
                    name: "special-attack".into(),
                    base_stat: 65,
                },
            ],
            height: 7,
            weight: 69,
            abilities: vec![Ability {
                name: "chlorophyll".into(),
                is_hidden: true,
            }],
            held_items: Vec::new(),
            forms: vec!["bulbasaur".into()],
        };
        let text = describe(&detail, &DetailNav::new(1, 151));
        assert!(text.starts_with("#1 bulbasaur"));
        assert!(text.contains("types:     grass, poison"));
        assert!(text.contains("height:    0.7 m"));
        assert!(text.contains("chlorophyll (hidden)"));
        assert!(text.contains("SpA"));
        assert!(text.contains("total: 110"));
        assert!(text.ends_with("prev: #151  next: #2"));
    }
}
