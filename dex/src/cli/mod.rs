/*
 * dex - list, search, and browse the Pokédex
 *
 * SPDX-License-Identifier: Apache-2.0
 */
use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use pokedex::prelude::*;
use tracing::warn;

use crate::output::{Output, OutputFormat};

pub mod gallery;
pub mod list;
pub mod query;
pub mod show;
pub mod types;

#[derive(Parser, Debug)]
#[command(name = "dex")]
#[command(author, version, about = "dex: list, search, and browse the Pokédex", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// API endpoint URL. Default: environment `POKEDEX_URL` or <https://pokeapi.co/api/v2>
    #[arg(short = 'u', long, env = "POKEDEX_URL")]
    pub url: Option<String>,

    /// Request timeout in seconds (0 waits indefinitely)
    #[arg(long, value_name = "SECS", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Write output to file (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// JSON output (default)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Table output format
    #[arg(short, long, global = true)]
    pub table: bool,

    /// Quiet mode - suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (repeat for more: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global=true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List view: search, sort, and page through the index
    List(ListArgs),

    /// Gallery view: details for one page of the index or of one type
    Gallery(GalleryArgs),

    /// Detail view for one Pokémon id
    Show(ShowArgs),

    /// Types offered as gallery filters
    Types,

    /// Normalize a view query string
    Query {
        /// Query string, with or without a leading '?'
        query: String,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search text. Matches names and ids, or types with `--mode type`
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<SearchModeArg>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Page number, starting at 1
    #[arg(short, long)]
    pub page: Option<String>,

    /// Start from a view query string, e.g. "search=pika&sort=stat"
    #[arg(long, value_name = "QS")]
    pub query: Option<String>,

    /// Fetch every detail before listing, so type search and stat sort see all entries
    #[arg(long)]
    pub warm: bool,
}

#[derive(Args, Debug)]
pub struct GalleryArgs {
    /// Only show this type (see `dex types`)
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: Option<String>,

    /// Page number, starting at 1
    #[arg(short, long)]
    pub page: Option<String>,

    /// Start from a view query string, e.g. "type=fire&page=1"
    #[arg(long, value_name = "QS")]
    pub query: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("step").args(["next", "prev"])))]
pub struct ShowArgs {
    /// Pokémon id
    pub id: u32,

    /// Show the following id instead (wraps to 1 after the last)
    #[arg(long)]
    pub next: bool,

    /// Show the preceding id instead (wraps to the last id before 1)
    #[arg(long)]
    pub prev: bool,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum SearchModeArg {
    #[value(name = "name/id", alias = "name")]
    NameId,
    Type,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum SortArg {
    Id,
    Name,
    Stat,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl SearchModeArg {
    pub fn to_mode(self) -> SearchMode {
        match self {
            Self::NameId => SearchMode::NameOrId,
            Self::Type => SearchMode::Type,
        }
    }
}

impl SortArg {
    pub fn to_sort(self) -> SortMode {
        match self {
            Self::Id => SortMode::Id,
            Self::Name => SortMode::Name,
            Self::Stat => SortMode::Stat,
        }
    }
}

impl OrderArg {
    pub fn to_order(self) -> SortOrder {
        match self {
            Self::Asc => SortOrder::Asc,
            Self::Desc => SortOrder::Desc,
        }
    }
}

pub struct AppContext {
    pub client: PokedexClient,
    pub output: Output,
}

pub async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(resolve_output_format(&cli), cli.output.clone());
    let client = build_client(&cli)?;

    let ctx = AppContext { client, output };

    match cli.command {
        Commands::List(args) => list::handle(&ctx, args).await,
        Commands::Gallery(args) => gallery::handle(&ctx, args).await,
        Commands::Show(args) => show::handle(&ctx, args).await,
        Commands::Types => types::handle(&ctx),
        Commands::Query { query } => query::handle(&ctx, &query),
    }
}

fn resolve_output_format(cli: &Cli) -> OutputFormat {
    if cli.quiet {
        OutputFormat::Quiet
    } else if cli.pretty {
        if cli.table {
            warn!("--pretty conflicts with --table. Using json pretty format");
        }
        OutputFormat::Pretty
    } else if cli.json {
        if cli.table {
            warn!("--json conflicts with --table. Using json format");
        }
        OutputFormat::Json
    } else if cli.table {
        OutputFormat::Table
    } else {
        OutputFormat::Json
    }
}

fn build_client(cli: &Cli) -> Result<PokedexClient> {
    let mut config = ClientConfig::default()
        .warm_on_index(matches!(&cli.command, Commands::List(args) if args.warm))
        .request_timeout((cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)));
    if let Some(url) = &cli.url {
        config = config.base_url(url.as_str());
    }
    let client = PokedexClient::with_config(config)?;
    Ok(client)
}

/// Reads the starting view parameters from an optional query string.
pub fn params_from(query: Option<&str>) -> ViewParams {
    query.map(ViewParams::from_query).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_precedence() {
        let cli = Cli::parse_from(["dex", "--table", "--pretty", "types"]);
        assert_eq!(resolve_output_format(&cli), OutputFormat::Pretty);
        let cli = Cli::parse_from(["dex", "-q", "types"]);
        assert_eq!(resolve_output_format(&cli), OutputFormat::Quiet);
        let cli = Cli::parse_from(["dex", "types"]);
        assert_eq!(resolve_output_format(&cli), OutputFormat::Json);
    }

    #[test]
    fn list_args_parse() {
        let cli = Cli::parse_from([
            "dex", "list", "--search", "pika", "--mode", "name/id", "--sort", "stat", "--order",
            "desc", "--page", "2",
        ]);
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.search.as_deref(), Some("pika"));
        assert_eq!(args.mode.map(SearchModeArg::to_mode), Some(SearchMode::NameOrId));
        assert_eq!(args.sort.map(SortArg::to_sort), Some(SortMode::Stat));
        assert_eq!(args.order.map(OrderArg::to_order), Some(SortOrder::Desc));
        assert_eq!(args.page.as_deref(), Some("2"));
        assert!(!args.warm);
    }

    #[test]
    fn show_rejects_next_with_prev() {
        assert!(Cli::try_parse_from(["dex", "show", "25", "--next", "--prev"]).is_err());
        assert!(Cli::try_parse_from(["dex", "show", "25", "--next"]).is_ok());
    }

    #[test]
    fn params_from_query_or_default() {
        assert_eq!(params_from(None), ViewParams::default());
        assert_eq!(params_from(Some("?sort=name")).sort, SortMode::Name);
    }
}
