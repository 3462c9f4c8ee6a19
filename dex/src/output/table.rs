use std::sync::Arc;

use pokedex::prelude::*;

pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

pub fn render_table<T: TableRow>(items: &[T]) -> String {
    let headers = T::headers();
    let rows: Vec<Vec<String>> = items.iter().map(TableRow::row).collect();
    let widths = column_widths(headers, &rows);

    let mut out = String::new();
    out.push_str(&format_row(
        &headers.iter().map(ToString::to_string).collect::<Vec<_>>(),
        &widths,
    ));
    out.push('\n');
    out.push_str(&format_separator(&widths));

    for row in rows {
        out.push('\n');
        out.push_str(&format_row(&row, &widths));
    }

    out
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if idx >= widths.len() {
                widths.push(len);
            } else {
                widths[idx] = widths[idx].max(len);
            }
        }
    }
    widths
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    for (idx, cell) in row.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        let width = widths.get(idx).copied().unwrap_or(0);
        let _ = write!(out, "{cell:<width$}");
    }
    out.trim_end().to_string()
}

fn format_separator(widths: &[usize]) -> String {
    let mut out = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        out.push_str(&"-".repeat(*width));
    }
    out
}

impl<T: TableRow> TableRow for Arc<T> {
    fn headers() -> &'static [&'static str] {
        T::headers()
    }

    fn row(&self) -> Vec<String> {
        self.as_ref().row()
    }
}

impl TableRow for ViewEntry {
    fn headers() -> &'static [&'static str] {
        &["id", "name", "types", "total"]
    }

    fn row(&self) -> Vec<String> {
        let id = self.id.map(|id| id.to_string()).unwrap_or_default();
        // details not fetched yet show blank columns
        let (types, total) = self.detail.as_ref().map_or_else(
            || (String::new(), String::new()),
            |detail| (detail.types.join("/"), detail.total_stats().to_string()),
        );
        vec![id, self.reference.name.clone(), types, total]
    }
}

impl TableRow for PokemonDetail {
    fn headers() -> &'static [&'static str] {
        &["id", "name", "types", "height", "weight", "total"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.types.join("/"),
            format!("{:.1}m", self.height_m()),
            format!("{:.1}kg", self.weight_kg()),
            self.total_stats().to_string(),
        ]
    }
}

impl TableRow for StatEntry {
    fn headers() -> &'static [&'static str] {
        &["stat", "base"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.label().to_string(), self.base_stat.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let stats = vec![
            StatEntry {
                name: "hp".into(),
                base_stat: 45,
            },
            StatEntry {
                name: "special-defense".into(),
                base_stat: 100,
            },
        ];
        let table = render_table(&stats);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines, vec!["stat  base", "----  ----", "HP    45", "SpD   100"]);
    }

    #[test]
    fn view_entry_without_detail() {
        let entry = ViewEntry {
            reference: PokemonRef::new("pikachu", "https://pokeapi.co/api/v2/pokemon/25/"),
            id: Some(25),
            detail: None,
        };
        assert_eq!(entry.row(), vec!["25", "pikachu", "", ""]);
    }
}
