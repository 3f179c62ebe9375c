//! Jazz Archive CLI - turn the history sheet into the archive
//!
//! # Main Commands
//!
//! ```bash
//! jazz-archive serve                       # Start HTTP server (port 3000)
//! jazz-archive migrate history.csv        # Replace the store with the sheet
//! jazz-archive migrate history.csv --upsert
//! jazz-archive export --format csv        # Dump the store
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! jazz-archive parse history.csv          # Raw rows as JSON
//! jazz-archive build history.csv          # {stats, data} without touching the store
//! jazz-archive stats                      # Statistics of the stored entries
//! ```
//!
//! Settings come from the environment (see `config`); flags override them.

use clap::{Parser, Subcommand};
use jazz_archive::{
    build_dataset_from_file, build_stats, export, migrate_into_store, parse_csv_file,
    ArchiveConfig, EntryStore, ExportFormat, MigrateMode,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jazz-archive")]
#[command(about = "Build and serve the jazz society band history", long_about = None)]
struct Cli {
    /// Entry store directory (overrides ARCHIVE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Preferred CSV encoding label (overrides ARCHIVE_ENCODING)
    #[arg(long, global = true)]
    encoding: Option<String>,

    /// Skip lines with unbalanced quotes
    #[arg(long, global = true)]
    skip_malformed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output raw rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the history document from a CSV file
    Build {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Migrate a CSV file into the entry store
    Migrate {
        /// Input CSV file
        input: PathBuf,

        /// Merge on year + band instead of replacing everything
        #[arg(long)]
        upsert: bool,
    },

    /// Export the entry store
    Export {
        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Piece/member columns in the CSV export
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Show statistics of the entry store
    Stats,

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = ArchiveConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding;
    }
    if cli.skip_malformed {
        config.skip_malformed = true;
    }

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&config, &input, output.as_deref()),

        Commands::Build { input, output } => cmd_build(&config, &input, output.as_deref()),

        Commands::Migrate { input, upsert } => {
            let mode = if upsert {
                MigrateMode::Upsert
            } else {
                MigrateMode::Replace
            };
            cmd_migrate(&config, &input, mode)
        }

        Commands::Export {
            format,
            output,
            max_items,
        } => cmd_export(&config, &format, output.as_deref(), max_items),

        Commands::Stats => cmd_stats(&config),

        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(config: &ArchiveConfig, input: &Path, output: Option<&Path>) -> CliResult {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let options = config.migration_options(MigrateMode::default())?;
    let (decoded, result) = parse_csv_file(input, &options.decode, &options.parse)?;

    eprintln!(
        "   Encoding: {}{}",
        decoded.encoding,
        if decoded.lossy { " (lossy)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    if !result.skipped_lines.is_empty() {
        eprintln!("   Skipped lines: {:?}", result.skipped_lines);
    }
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_build(config: &ArchiveConfig, input: &Path, output: Option<&Path>) -> CliResult {
    eprintln!("📄 Building history from: {}", input.display());

    let options = config.migration_options(MigrateMode::default())?;
    let report = build_dataset_from_file(input, &options)?;

    let json = serde_json::to_string_pretty(&report.dataset)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_migrate(config: &ArchiveConfig, input: &Path, mode: MigrateMode) -> CliResult {
    eprintln!("📄 Migrating: {} ({:?})", input.display(), mode);

    let options = config.migration_options(mode)?;
    let bytes = fs::read(input)?;
    let mut store = EntryStore::open(&config.data_dir)?;

    let (report, summary) = migrate_into_store(&mut store, &bytes, &options)?;

    eprintln!("\n📊 Summary");
    eprintln!("   Entries:  {}", report.dataset.stats.total_years);
    eprintln!("   Created:  {}", summary.created);
    eprintln!("   Updated:  {}", summary.updated);
    eprintln!("   Dropped:  {}", report.dropped.len());
    eprintln!("   Store:    {}", store.dir().display());

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_export(
    config: &ArchiveConfig,
    format: &str,
    output: Option<&Path>,
    max_items: Option<usize>,
) -> CliResult {
    let format: ExportFormat = format.parse()?;
    let store = EntryStore::open(&config.data_dir)?;
    eprintln!(
        "📦 Exporting {} entries as {}",
        store.len(),
        format.extension()
    );

    let max_items = max_items.unwrap_or(config.export_max_items);
    let content = export(store.year_entries(), format, max_items)?;
    write_output(&content, output)?;

    Ok(())
}

fn cmd_stats(config: &ArchiveConfig) -> CliResult {
    let store = EntryStore::open(&config.data_dir)?;
    let stats = build_stats(&store.year_entries());

    eprintln!("📊 Store: {}", store.dir().display());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn cmd_serve(config: ArchiveConfig) -> CliResult {
    jazz_archive::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
