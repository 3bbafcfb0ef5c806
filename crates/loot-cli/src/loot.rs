use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use loot_core::{
    apply_filters, build_options, extract_all, option_label, profiles, quality::MAX_QUALITY,
    CanonicalPayload, DisplayRow, FilterCriteria, OptionField, ANY_OPTION,
};
use loot_storage::{
    fetch_shared, open_payload_store, ImportMode, ImportOutcome, ImportReport, PayloadStore,
    SharedSource, SqliteStore, TrackerConfig,
};
use std::fs;
use std::io::{self, Read};
use tracing::debug;

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
pub enum LootCommand {
    /// Import an export file, or `-` for text on stdin.
    Import(ImportArgs),
    /// Import the shared export.
    Fetch(FetchArgs),
    /// Show loot rows, newest first.
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show the choices available for a filter.
    Options(OptionsArgs),
    /// Show characters with stored exports.
    Profiles(ProfilesArgs),
    /// Delete every stored export.
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub path: String,
    /// Discard everything stored before importing.
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL or path; defaults to `shared_source` from the config.
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub winner: Option<String>,
    #[arg(long)]
    pub instance: Option<String>,
    /// Case-insensitive item name fragment.
    #[arg(long, alias = "search")]
    pub item: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_QUALITY))]
    pub min_quality: Option<i64>,
    /// Drop loot below each export's own min_quality.
    #[arg(long)]
    pub respect_min_quality: bool,
    /// Add an item database link column.
    #[arg(long)]
    pub links: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// `winners` or `instances`.
    pub field: OptionField,
    #[arg(long)]
    pub respect_min_quality: bool,
}

#[derive(Args, Debug)]
pub struct ProfilesArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm the deletion.
    #[arg(long)]
    pub yes: bool,
}

pub fn handle_loot_command(command: LootCommand, config: &TrackerConfig) -> Result<()> {
    match command {
        LootCommand::Import(args) => import(config, &args),
        LootCommand::Fetch(args) => fetch(config, &args),
        LootCommand::List(args) => list(config, &args),
        LootCommand::Options(args) => options(config, &args),
        LootCommand::Profiles(args) => show_profiles(config, &args),
        LootCommand::Clear(args) => clear(config, &args),
    }
}

fn open_store(config: &TrackerConfig) -> Result<PayloadStore<SqliteStore>> {
    let path = config.resolved_db_path();
    debug!(path = %path.display(), "opening loot store");
    open_payload_store(&path).with_context(|| format!("Failed to open {}", path.display()))
}

fn import_mode(replace: bool) -> ImportMode {
    ImportMode::from_merge(!replace)
}

fn import(config: &TrackerConfig, args: &ImportArgs) -> Result<()> {
    let text = if args.path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(&args.path).with_context(|| format!("Failed to read {}", args.path))?
    };

    let mut store = open_store(config)?;
    let report = store
        .import_text(&text, import_mode(args.replace))
        .with_context(|| format!("Import of {} failed", args.path))?;
    println!("{}", import_summary(&report));
    Ok(())
}

fn fetch(config: &TrackerConfig, args: &FetchArgs) -> Result<()> {
    let source = match &args.source {
        Some(raw) => raw.parse::<SharedSource>().map_err(|err| anyhow!(err))?,
        None => config
            .shared_source()
            .ok_or_else(|| anyhow!("No shared source configured; pass --source"))?,
    };

    let mut store = open_store(config)?;
    let report = if args.replace {
        let body =
            fetch_shared(&source).with_context(|| format!("Failed to fetch {source}"))?;
        store
            .import_text(&body, ImportMode::Replace)
            .with_context(|| format!("Shared export from {source} is invalid"))?
    } else {
        store
            .import_shared(&source)
            .with_context(|| format!("Failed to load shared export from {source}"))?
    };
    println!("{}", import_summary(&report));
    Ok(())
}

fn list(config: &TrackerConfig, args: &ListArgs) -> Result<()> {
    let store = open_store(config)?;
    let payloads = store.load_payloads()?;
    let (rows, total) = matching_rows(&payloads, args, config.respect_min_quality);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No loot matches.");
        return Ok(());
    }

    let link_base = args.links.then_some(config.item_link_base.as_str());
    for line in render_table(&rows, link_base) {
        println!("{line}");
    }
    println!("{} of {} rows", rows.len(), total);
    Ok(())
}

/// Rows passing every given criterion, plus the unfiltered row count.
///
/// Names are matched exactly; one that matches nothing yields no rows.
fn matching_rows(
    payloads: &[CanonicalPayload],
    args: &ListArgs,
    respect_min_quality: bool,
) -> (Vec<DisplayRow>, usize) {
    let criteria = FilterCriteria {
        winner: args.winner.clone(),
        instance: args.instance.clone(),
        item_substring: args.item.clone(),
        min_quality: args.min_quality,
    };
    let rows = extract_all(payloads, args.respect_min_quality || respect_min_quality);
    (apply_filters(&rows, &criteria), rows.len())
}

fn options(config: &TrackerConfig, args: &OptionsArgs) -> Result<()> {
    let store = open_store(config)?;
    let payloads = store.load_payloads()?;
    let rows = extract_all(
        &payloads,
        args.respect_min_quality || config.respect_min_quality,
    );
    for value in build_options(&rows, args.field) {
        if value == ANY_OPTION {
            println!("({})", option_label(&value));
        } else {
            println!("{value}");
        }
    }
    Ok(())
}

fn show_profiles(config: &TrackerConfig, args: &ProfilesArgs) -> Result<()> {
    let store = open_store(config)?;
    let found = profiles(&store.load_payloads()?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    if found.is_empty() {
        println!("No profiles stored.");
        return Ok(());
    }
    for profile in found {
        println!(
            "- {} ({}): {} export(s), {} loot(s)",
            profile.player, profile.realm, profile.payloads, profile.loots
        );
    }
    Ok(())
}

fn clear(config: &TrackerConfig, args: &ClearArgs) -> Result<()> {
    if !args.yes {
        bail!("Refusing to delete stored exports without --yes");
    }
    let mut store = open_store(config)?;
    store.clear()?;
    println!("Cleared all stored exports.");
    Ok(())
}

fn import_summary(report: &ImportReport) -> String {
    let stored = report.payloads.len();
    match report.outcome {
        ImportOutcome::Added => format!(
            "Imported {} loot(s) for {} ({}); {} export(s) stored",
            report.loots, report.player, report.realm, stored
        ),
        ImportOutcome::Duplicate => format!(
            "Already imported [{}]; {} export(s) stored",
            report.signature, stored
        ),
        ImportOutcome::Replaced => format!(
            "Replaced stored exports with {} ({}): {} loot(s)",
            report.player, report.realm, report.loots
        ),
    }
}

const HEADERS: [&str; 7] = ["Date", "Instance", "Boss", "Winner", "Item", "Quality", "Roll"];

fn row_cells(row: &DisplayRow, link_base: Option<&str>) -> Vec<String> {
    let mut cells = vec![
        row.date.clone(),
        row.instance.clone(),
        row.boss.clone(),
        row.winner.clone(),
        row.item.clone(),
        row.quality_name.clone(),
        row.roll_label(),
    ];
    if let Some(base) = link_base {
        cells.push(row.item_link(base).unwrap_or_default());
    }
    cells
}

/// Space-aligned text table, header first.
fn render_table(rows: &[DisplayRow], link_base: Option<&str>) -> Vec<String> {
    let mut header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    if link_base.is_some() {
        header.push("Link".to_string());
    }
    let body: Vec<Vec<String>> = rows.iter().map(|row| row_cells(row, link_base)).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (idx, cell) in cells.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    std::iter::once(&header)
        .chain(body.iter())
        .map(|cells| {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let pad = widths[idx] - cell.chars().count();
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect();
            padded.join("  ").trim_end().to_string()
        })
        .collect()
}
