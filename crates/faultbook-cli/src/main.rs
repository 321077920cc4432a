mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "faultbook",
    version,
    about = "Extract error-code tables from equipment manuals into a local database"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON settings file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the settings file)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract error-code rows from a page range of a PDF manual
    Extract {
        /// Path to the PDF manual
        #[arg(value_name = "PDF")]
        pdf_path: PathBuf,

        /// Table to store the error codes in
        #[arg(long = "table", visible_alias = "table-name", value_name = "NAME")]
        table_name: String,

        /// First page to process (1-based, inclusive)
        #[arg(long = "start", visible_alias = "start-page", value_name = "N")]
        start_page: usize,

        /// Last page to process (inclusive)
        #[arg(long = "end", visible_alias = "end-page", value_name = "N")]
        end_page: usize,

        /// Parse SEW fault tables (fault code, sub-error code, description)
        #[arg(long)]
        sew: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Look up stored error codes
    Search {
        /// Table to search
        #[arg(long = "table", visible_alias = "table-name", value_name = "NAME")]
        table_name: Option<String>,

        /// Search an SEW table (default table: sew_error_codes)
        #[arg(long)]
        sew: bool,

        /// Error code / fault code fragment
        #[arg(long = "fault", visible_alias = "code", value_name = "CODE")]
        code: Option<String>,

        /// Sub-error code fragment (SEW only)
        #[arg(long, requires = "sew")]
        sub: Option<String>,

        /// Description fragment
        #[arg(long)]
        text: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Print the effective settings as JSON
    Config,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = commands::Settings {
        config: cli.config,
        db: cli.db,
    };

    let result = match cli.command {
        Commands::Extract {
            pdf_path,
            table_name,
            start_page,
            end_page,
            sew,
            output,
        } => commands::extract::run(
            &settings,
            pdf_path,
            table_name,
            start_page,
            end_page,
            sew,
            &output,
        ),
        Commands::Search {
            table_name,
            sew,
            code,
            sub,
            text,
            output,
        } => commands::search::run(
            &settings,
            commands::search::SearchArgs {
                table_name,
                sew,
                code,
                sub,
                text,
            },
            &output,
        ),
        Commands::Config => commands::config::show(&settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
