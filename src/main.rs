// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use valid_guard::{
    check_digits, classify, format_id_number, read_input, read_stdin, resolve_region, summarize,
    validate, validate_form, write_csv, DisplayRecord, ExportLayout, Filter, FormData, Pipeline,
    RecordStore, RegistryConfig, SimulatedRegistry, Submission,
};

#[derive(Parser)]
#[command(name = "valid-guard", version, about = "CPF validation and registry status checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract person records (name, CPF, date of birth) and check them
    Check(BatchArgs),
    /// Extract bare CPF numbers and check them
    Extract(BatchArgs),
    /// Validate a single CPF
    Validate {
        id_number: String,
    },
    /// Validate a single person entry
    Form {
        #[arg(long)]
        name: String,
        #[arg(long = "id")]
        id_number: String,
        #[arg(long = "birth")]
        date_of_birth: String,
    },
    /// Interactive results table
    Tui {
        /// Input file, stdin when omitted
        file: Option<PathBuf>,
        /// Treat input as a bare list of numbers
        #[arg(long)]
        ids: bool,
        #[arg(long, default_value = "all")]
        filter: Filter,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// Input file, stdin when omitted
    file: Option<PathBuf>,
    /// all, valid, invalid or regular
    #[arg(long, default_value = "all")]
    filter: Filter,
    /// Write the filtered rows to this file
    #[arg(long)]
    export: Option<PathBuf>,
    /// registry or person
    #[arg(long, default_value = "registry")]
    layout: ExportLayout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => run_batch(args, false).await?,
        Command::Extract(args) => run_batch(args, true).await?,
        Command::Validate { id_number } => run_validate(&id_number),
        Command::Form {
            name,
            id_number,
            date_of_birth,
        } => run_form(FormData {
            name,
            id_number,
            date_of_birth,
        })?,
        Command::Tui { file, ids, filter } => run_ui_mode(file, ids, filter).await?,
    }

    Ok(())
}

fn load_text(file: Option<&Path>) -> Result<String> {
    let text = match file {
        Some(path) => read_input(path)?,
        None => read_stdin()?,
    };
    Ok(text)
}

fn new_pipeline() -> Pipeline {
    let registry = SimulatedRegistry::new(RegistryConfig::from_env());
    Pipeline::new(RecordStore::new(), Arc::new(registry))
}

fn submit(pipeline: &Pipeline, text: &str, ids_only: bool) -> Result<Submission> {
    let submission = if ids_only {
        pipeline.process_id_list(text)
    } else {
        pipeline.process_text(text)
    };
    submission.context("Nothing to check in the input")
}

async fn run_batch(args: BatchArgs, ids_only: bool) -> Result<()> {
    println!("🛡️  Valid Guard - CPF Check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Read input
    println!("\n📂 Reading input...");
    let text = load_text(args.file.as_deref())?;

    // 2. Extract + validate
    println!("\n🔍 Extracting CPFs...");
    let pipeline = new_pipeline();
    let mut submission = submit(&pipeline, &text, ids_only)?;
    let checks = submission.outstanding();
    println!(
        "✓ Found {} records, {} sent to the registry",
        submission.record_ids().len(),
        checks
    );

    // 3. Registry checks
    if checks > 0 {
        println!("\n⏳ Consulting registry...");
        let mut resolved = 0;
        while let Some(update) = submission.next_update().await {
            resolved += 1;
            tracing::debug!(record_id = %update.id, status = %update.status, "status resolved");
        }
        println!("✓ {}/{} checks resolved", resolved, checks);
    }

    // 4. Results
    let snapshot = pipeline.store().snapshot();
    let rows = classify(&snapshot, args.filter);
    println!("\n📊 Results ({})", args.filter.label());
    print_table(&rows);

    let stats = summarize(&snapshot);
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", stats.summary());

    // 5. Export
    if let Some(path) = args.export {
        write_csv(&path, &rows, args.layout)?;
        println!("💾 Exported {} rows to {}", rows.len(), path.display());
    }

    Ok(())
}

fn print_table(rows: &[DisplayRecord]) {
    if rows.is_empty() {
        println!("   (no records)");
        return;
    }

    println!(
        "   {:<30} {:<16} {:<12} {:<9} {:<10} {}",
        "Nome", "CPF", "Nascimento", "Status", "Receita", "Região"
    );
    for d in rows {
        println!(
            "   {:<30} {:<16} {:<12} {:<9} {:<10} {}",
            d.record.name,
            d.formatted_id_number,
            d.record.date_of_birth,
            d.status_label,
            d.registry_label,
            d.record.region.as_deref().unwrap_or("-")
        );
    }
}

fn run_validate(id_number: &str) {
    let formatted = format_id_number(id_number);

    if validate(id_number) {
        println!("✅ {} is valid", formatted);
        println!("   Região: {}", resolve_region(id_number));
        if let Some((first, second)) = check_digits(id_number) {
            println!("   Check digits: {}{}", first, second);
        }
    } else {
        println!("❌ {} is invalid", formatted);
        if let Some((first, second)) = check_digits(id_number) {
            println!("   Expected check digits: {}{}", first, second);
        }
    }
}

fn run_form(form: FormData) -> Result<()> {
    let result = validate_form(&form, Local::now().date_naive());

    if result.is_valid {
        println!("✅ Form is valid");
        println!("   {} - {}", form.name.trim(), format_id_number(&form.id_number));
        return Ok(());
    }

    println!("❌ Form has errors:");
    let errors = [
        ("name", &result.errors.name),
        ("id", &result.errors.id_number),
        ("birth", &result.errors.date_of_birth),
    ];
    for (field, message) in errors {
        if let Some(message) = message {
            println!("   --{}: {}", field, message);
        }
    }
    anyhow::bail!("form validation failed")
}

#[cfg(feature = "tui")]
async fn run_ui_mode(file: Option<PathBuf>, ids_only: bool, filter: Filter) -> Result<()> {
    println!("🖥️  Loading Valid Guard UI...\n");

    let text = load_text(file.as_deref())?;
    let pipeline = new_pipeline();
    let submission = submit(&pipeline, &text, ids_only)?;
    println!("✓ Loaded {} records", submission.record_ids().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    // Checks keep resolving on the runtime while the UI redraws
    submission.detach();

    let mut app = ui::App::new(pipeline.store().clone(), filter);
    tokio::task::spawn_blocking(move || ui::run_ui(&mut app))
        .await
        .context("UI thread panicked")??;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_ui_mode(_file: Option<PathBuf>, _ids_only: bool, _filter: Filter) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin valid-guard-server --features server");
    std::process::exit(1);
}
