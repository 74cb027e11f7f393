//! Shortfall CLI
//!
//! ```bash
//! shortfall process orders.xlsb          # Write orders_result.xlsx
//! shortfall sheets orders.xlsb           # List worksheets
//! shortfall serve                        # Start HTTP server (port 8000)
//! shortfall jobs list                    # Show recorded jobs
//! ```

use clap::{Parser, Subcommand};
use shortfall::{
    sheet_names, Config, FileJobStore, JobStore, Pipeline, PipelineOptions, SheetSelector,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shortfall")]
#[command(version, about = "Report rows where the requested quantity exceeds the received quantity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on a local workbook
    Process {
        /// Input workbook (.xlsx, .xlsm, .xltx, .xltm or .xlsb)
        input: PathBuf,

        /// Output workbook (default: <input stem>_result.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet name or zero-based index (default: first sheet)
        #[arg(short, long)]
        sheet: Option<SheetSelector>,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Input workbook
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage directory for uploads, results and job status
        #[arg(long)]
        storage: Option<PathBuf>,
    },

    /// Inspect recorded jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,

        /// Storage directory
        #[arg(long, global = true)]
        storage: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum JobsAction {
    /// List all jobs
    List,

    /// Show one job
    Show {
        /// Task ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => match cli.command {
            Commands::Process {
                input,
                output,
                sheet,
            } => cmd_process(&input, output.as_deref(), sheet.unwrap_or(config.sheet)),

            Commands::Sheets { input } => cmd_sheets(&input),

            Commands::Serve { port, storage } => cmd_serve(config, port, storage).await,

            Commands::Jobs { action, storage } => cmd_jobs(config, action, storage),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}_result.xlsx", stem))
}

fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    sheet: SheetSelector,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    eprintln!("📄 Processing: {} (sheet {})", input.display(), sheet);

    let mut pipeline = Pipeline::new(PipelineOptions {
        sheet,
        ..Default::default()
    });
    let summary = pipeline.run(input, &output)?;

    eprintln!("   Rows read: {}", summary.loaded_rows);
    eprintln!("   Rows kept: {}", summary.retained_rows);
    eprintln!("   Columns: {}", summary.columns.join(", "));
    if !summary.annotated {
        eprintln!("   ⚠️  Quantity columns not found, rows were not filtered");
    }
    eprintln!("💾 Output written to: {}", output.display());

    Ok(())
}

fn cmd_sheets(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    for (index, name) in sheet_names(input)?.iter().enumerate() {
        println!("{:>3}  {}", index, name);
    }
    Ok(())
}

async fn cmd_serve(
    config: Config,
    port: Option<u16>,
    storage: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = storage {
        config = config.with_storage_dir(dir);
    }
    shortfall::server::start_server(&config).await
}

fn cmd_jobs(
    config: Config,
    action: JobsAction,
    storage: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match storage {
        Some(dir) => config.with_storage_dir(dir),
        None => config,
    };
    let store = FileJobStore::new(config.layout().status_file());

    match action {
        JobsAction::List => {
            let jobs = store.list()?;
            if jobs.is_empty() {
                eprintln!("📋 No jobs recorded in {}", store.path().display());
                return Ok(());
            }
            for (id, record) in jobs {
                println!(
                    "{}  {:<8} {}  {}",
                    id,
                    record.status.as_str(),
                    record.updated_at,
                    record.file_name.as_deref().unwrap_or("-")
                );
            }
        }

        JobsAction::Show { id } => match store.get(&id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => return Err(format!("Task not found: {}", id).into()),
        },
    }

    Ok(())
}
