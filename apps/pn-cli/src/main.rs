use clap::{Parser, Subcommand};
use pn_app::{AppResult, PipelineContext, ProjectConfig, init_logging, load_config};
use pn_engine::JsonModelFactory;
use pn_sim::{CaseOutcome, MatrixEvent};
use pn_tables::JsonWorkbookStore;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "pn-cli")]
#[command(about = "PipeNet CLI - spreadsheet-driven pipeline network case runs", long_about = None)]
struct Cli {
    /// Path to the project YAML file
    #[arg(short, long, default_value = "project.yaml")]
    project: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the project file
    Validate,
    /// Author the topology sheet into the base model
    BuildTopology,
    /// Run the configured populate mode against the base model
    Populate,
    /// Run every case of the matrix
    RunCases,
    /// Save each case's model variant without running it
    BuildModels,
    /// Run every model in a folder as it stands
    RunExisting {
        /// Folder holding the models (defaults to the models folder)
        folder: Option<PathBuf>,
    },
    /// Re-apply case conditions to existing variants
    UpdateModels,
    /// Copy flowline data from one model into every variant
    CopyFlowlines {
        /// Model to copy from
        source: PathBuf,
    },
    /// Summarize the result workbooks
    Summarize,
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    let config = load_config(&cli.project)?;
    let factory = JsonModelFactory::disk();
    let store = JsonWorkbookStore::new();
    let ctx = PipelineContext::new(&config, &factory, &store);

    match cli.command {
        Commands::Validate => cmd_validate(&cli.project, &config),
        Commands::BuildTopology => cmd_build_topology(&ctx),
        Commands::Populate => {
            println!("✓ {}", ctx.populate()?);
            Ok(())
        }
        Commands::RunCases => cmd_run_cases(&ctx),
        Commands::BuildModels => {
            print_outcomes("Built", &ctx.build_models()?);
            Ok(())
        }
        Commands::RunExisting { folder } => {
            let folder = folder.unwrap_or_else(|| config.simulation.settings.models_dir.clone());
            print_outcomes("Ran", &ctx.run_existing_models(&folder)?);
            Ok(())
        }
        Commands::UpdateModels => {
            print_outcomes("Updated", &ctx.update_models()?);
            Ok(())
        }
        Commands::CopyFlowlines { source } => cmd_copy_flowlines(&ctx, &source),
        Commands::Summarize => cmd_summarize(&ctx),
    }
}

fn cmd_validate(path: &Path, config: &ProjectConfig) -> AppResult<()> {
    println!("✓ Project is valid: {}", path.display());
    println!("  base model: {}", config.simulation.base_model.display());
    println!("  workbook:   {}", config.workbook.path.display());
    println!("  workers:    {}", config.simulation.settings.workers.max(1));
    Ok(())
}

fn cmd_build_topology(ctx: &PipelineContext<'_>) -> AppResult<()> {
    let report = ctx.build_topology()?;
    println!(
        "✓ {} sections: {} components created ({} existing), {} connections made ({} existing)",
        report.sections,
        report.components_created,
        report.components_existing,
        report.connections_made,
        report.connections_existing
    );
    Ok(())
}

fn cmd_run_cases(ctx: &PipelineContext<'_>) -> AppResult<()> {
    let cancel = AtomicBool::new(false);
    let progress = |event: &MatrixEvent| match event {
        MatrixEvent::Started { total, workers } => {
            println!("Running {total} cases on {workers} worker(s)");
        }
        MatrixEvent::CaseFinished { record, done, total } => {
            print!("\r[{done}/{total}] {} {}", record.case, record.status);
            let _ = io::stdout().flush();
        }
        MatrixEvent::Finished { .. } => clear_progress_line(),
    };
    let report = ctx.run_cases(&cancel, Some(&progress))?;

    println!(
        "✓ {} cases: {} succeeded, {} failed, {} cancelled",
        report.total, report.succeeded, report.failed, report.cancelled
    );
    for case in report.cases.iter().filter(|c| c.error.is_some()) {
        println!(
            "  ✗ {} at {}: {}",
            case.case,
            case.stage,
            case.error.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_copy_flowlines(ctx: &PipelineContext<'_>, source: &Path) -> AppResult<()> {
    let report = ctx.copy_flowlines(source)?;
    println!("✓ Flowline data copied to {} models", report.updated.len());
    for (model, message) in &report.failed {
        println!("  ✗ {}: {message}", model.display());
    }
    Ok(())
}

fn cmd_summarize(ctx: &PipelineContext<'_>) -> AppResult<()> {
    let report = ctx.summarize()?;
    println!("✓ Node summary: {} rows", report.node_rows);
    for sheet in &report.profile_sheets {
        println!("✓ Profile summary: {sheet}");
    }
    if report.pump_rows > 0 {
        println!("✓ Pump operating points: {} rows", report.pump_rows);
    }
    Ok(())
}

fn print_outcomes(verb: &str, outcomes: &[CaseOutcome]) {
    let ok = outcomes.iter().filter(|o| o.is_success()).count();
    println!("✓ {verb} {ok} of {} models", outcomes.len());
    for outcome in outcomes {
        if let Some(error) = &outcome.error {
            println!("  ✗ {} at {}: {error}", outcome.key, outcome.stage);
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}
