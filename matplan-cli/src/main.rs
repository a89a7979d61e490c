mod loader;
mod reports;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use loader::{FileSources, JsonFileStorage};
use matplan_core::{
    CalcOptions, FarmingReport, InventoryLedger, InventoryStorage, MaterialFilter, PlannerEngine,
    ProgressionTarget, RawResourceId, SourceUpdate, ValidationErrors, lookup, recompute,
};
use reports::PlanView;
use util::{
    parse_assignment, parse_quick_action, parse_range, parse_skill_tracks, parse_small_range,
    split_csv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored terminal output
    Console,
    /// Pretty-printed JSON
    Json,
    /// Markdown tables
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "matplan", version)]
#[command(about = "Plan upgrade materials, track inventory deficits, and find farming spots")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the merged material plan for one entity
    Plan(PlanArgs),
    /// Look up farming spots for materials by name
    Farm(FarmArgs),
    /// Inspect or edit a saved inventory
    Inventory(InventoryArgs),
}

#[derive(Debug, Clone, clap::Args)]
struct PlanArgs {
    /// Catalog JSON with entity and item metadata
    #[arg(long, default_value = "assets/data/catalog.json")]
    catalog: PathBuf,

    /// Entity id to plan for
    #[arg(long)]
    entity: u32,

    /// Level range as current:target
    #[arg(long, default_value = "1:1")]
    level: String,

    /// Ascension range as current:target
    #[arg(long, default_value = "0:0")]
    ascension: String,

    /// Skill ranges (comma-separated current:target, up to three)
    #[arg(long, default_value = "1:1,1:1,1:1")]
    skills: String,

    /// Leave QP out of the plan
    #[arg(long)]
    no_currency: bool,

    /// Inventory JSON file to reconcile against
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Set an owned quantity before reporting (key=quantity, repeatable)
    #[arg(long = "set")]
    sets: Vec<String>,

    /// Only list materials with a remaining deficit
    #[arg(long)]
    only_outstanding: bool,

    /// Case-insensitive name filter
    #[arg(long)]
    search: Option<String>,

    /// Farming dataset JSON
    #[arg(long)]
    farming: Option<PathBuf>,

    /// Attach farming spots for every outstanding catalog material
    #[arg(long)]
    farm: bool,
}

#[derive(Debug, Clone, clap::Args)]
struct FarmArgs {
    /// Farming dataset JSON
    #[arg(long, default_value = "assets/data/farming.json")]
    dataset: PathBuf,

    /// Material names to look up (comma-separated)
    #[arg(long)]
    material: String,

    /// Quantity still needed
    #[arg(long, default_value_t = 1)]
    deficit: u64,
}

#[derive(Debug, Clone, clap::Args)]
struct InventoryArgs {
    /// Inventory JSON file
    #[arg(long)]
    inventory: PathBuf,

    /// Zero every known resource first
    #[arg(long)]
    clear: bool,

    /// Merge a JSON object of quantities; rejected whole if any value is invalid
    #[arg(long)]
    import: Option<PathBuf>,

    /// Set an owned quantity (key=quantity, repeatable)
    #[arg(long = "set")]
    sets: Vec<String>,

    /// Apply a shortcut (key:add1|add10|add100|sub1|zero, repeatable)
    #[arg(long = "action")]
    actions: Vec<String>,

    /// Remove the inventory file instead of printing it
    #[arg(long)]
    delete: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(&args).await
}

async fn run(args: &Args) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match &args.command {
        Command::Plan(plan_args) => run_plan(plan_args, args.report, &mut output_target).await?,
        Command::Farm(farm_args) => run_farm(farm_args, args.report, &mut output_target).await?,
        Command::Inventory(inventory_args) => {
            run_inventory(inventory_args, args.report, &mut output_target).await?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn build_target(args: &PlanArgs) -> Result<ProgressionTarget> {
    let (current_level, target_level) = parse_range(&args.level).context("--level")?;
    let (current_ascension, target_ascension) =
        parse_small_range(&args.ascension).context("--ascension")?;
    let skills = parse_skill_tracks(&args.skills).context("--skills")?;
    Ok(ProgressionTarget {
        current_level,
        target_level,
        current_ascension,
        target_ascension,
        skills,
    })
}

fn report_validation_errors(errors: ValidationErrors) -> anyhow::Error {
    for field_error in &errors.0 {
        eprintln!(
            "❌ {}: {}",
            field_error.field.to_string().red(),
            field_error.error
        );
    }
    anyhow::Error::new(errors).context("invalid progression target")
}

fn open_inventory(path: Option<&Path>) -> (JsonFileStorage, Option<String>) {
    match path {
        Some(path) => {
            let (storage, name) = JsonFileStorage::for_file(path);
            (storage, Some(name))
        }
        None => (JsonFileStorage::new("."), None),
    }
}

async fn run_plan(args: &PlanArgs, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    let target = build_target(args)?;
    let sources = FileSources::read(Some(&args.catalog), args.farming.as_deref()).await;
    let (storage, slot) = open_inventory(args.inventory.as_deref());
    let engine = PlannerEngine::new(sources, storage);
    let data = engine.load_reference_data();

    let entity = data
        .catalog
        .entity(args.entity)
        .with_context(|| format!("entity {} not found in catalog", args.entity))?;

    let mut ledger = match &slot {
        Some(name) => engine.load_inventory(name)?,
        None => InventoryLedger::new(),
    };
    let options = CalcOptions {
        include_currency: !args.no_currency,
    };
    let mut plan = recompute(&target, entity, &data.catalog, &mut ledger, options)
        .map_err(report_validation_errors)?;

    let mut updates: Vec<SourceUpdate> = Vec::new();
    for token in &args.sets {
        let (id, quantity) = parse_assignment(token)?;
        updates.extend(ledger.update(id, quantity, &mut plan.materials));
    }
    if let (Some(name), false) = (&slot, args.sets.is_empty()) {
        engine.save_inventory(name, &ledger)?;
        log::info!("saved inventory to {name}");
    }

    let farming: Vec<FarmingReport> = if args.farm {
        if data.farming.is_empty() {
            log::warn!("--farm requested but no farming data is loaded");
        }
        plan.outstanding()
            .filter(|m| matches!(m.id, RawResourceId::CatalogItem { .. }))
            .map(|m| lookup(&m.name, m.deficit(), &data.farming))
            .collect()
    } else {
        Vec::new()
    };

    let filter = MaterialFilter {
        search: args.search.clone(),
        only_outstanding: args.only_outstanding,
    };
    let view = PlanView {
        entity_id: entity.id,
        entity_name: &entity.name,
        plan: &plan,
        filter: &filter,
        updates: &updates,
        farming: &farming,
    };
    match format {
        ReportFormat::Console => reports::generate_plan_console(out, &view)?,
        ReportFormat::Json => reports::generate_plan_json(out, &view)?,
        ReportFormat::Markdown => reports::generate_plan_markdown(out, &view)?,
    }
    Ok(())
}

async fn run_farm(args: &FarmArgs, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    let names = split_csv(&args.material);
    if names.is_empty() {
        bail!("--material needs at least one name");
    }
    let sources = FileSources::read(None, Some(&args.dataset)).await;
    let (storage, _) = open_inventory(None);
    let dataset = PlannerEngine::new(sources, storage).load_farming();

    let found: Vec<FarmingReport> = names
        .iter()
        .map(|name| lookup(name, args.deficit, &dataset))
        .collect();
    match format {
        ReportFormat::Console => reports::generate_farming_console(out, &found)?,
        ReportFormat::Json => reports::generate_farming_json(out, &found)?,
        ReportFormat::Markdown => reports::generate_farming_markdown(out, &found)?,
    }
    Ok(())
}

async fn run_inventory(
    args: &InventoryArgs,
    format: ReportFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let (storage, name) = JsonFileStorage::for_file(&args.inventory);
    if args.delete {
        storage.delete_inventory(&name)?;
        writeln!(out, "🗑️  Deleted {}", args.inventory.display())?;
        return Ok(());
    }

    let mut ledger = storage
        .load_inventory(&name)?
        .map_or_else(InventoryLedger::new, InventoryLedger::from_snapshot);
    let mut changed = false;

    if args.clear {
        ledger.clear();
        changed = true;
    }
    if let Some(path) = &args.import {
        let payload = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let applied = ledger
            .import_json(&payload)
            .with_context(|| format!("rejected import from {}", path.display()))?;
        log::info!("imported {applied} entries from {}", path.display());
        changed = true;
    }
    for token in &args.sets {
        let (id, quantity) = parse_assignment(token)?;
        ledger.update(id, quantity, &mut []);
        changed = true;
    }
    for token in &args.actions {
        let (id, action) = parse_quick_action(token)?;
        ledger.quick_action(id, action, &mut []);
        changed = true;
    }

    if changed {
        storage.save_inventory(&name, &ledger.export())?;
    }

    match format {
        ReportFormat::Console => reports::generate_inventory_console(out, &ledger)?,
        ReportFormat::Json => reports::generate_inventory_json(out, &ledger)?,
        ReportFormat::Markdown => reports::generate_inventory_markdown(out, &ledger)?,
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
