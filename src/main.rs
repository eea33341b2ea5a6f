use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, builder::styling};
use eyre::Result;
use mca_company_extractor::{DateRange, ExtractConfig, cli};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// MCA Company Extractor: download company registrations from data.gov.in, one day at a time
#[derive(Parser)]
#[command(name = "mcax", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source DATA_GOV_API_KEY and DATA_GOV_API_URL from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every registration in the date range into <year>.json files
    Fetch(FetchArgs),

    /// Fetch the first page for one date to check the key and endpoint
    Probe {
        /// Registration date to query (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Records to request
        #[arg(short, long, default_value_t = 10)]
        limit: u64,
    },

    /// Check that year files are complete JSON arrays
    Verify {
        /// Year files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// First year to fetch (from January 1)
    #[arg(long, default_value_t = 2014)]
    start_year: i32,

    /// Last year to fetch (through December 31)
    #[arg(long, default_value_t = 2024)]
    end_year: i32,

    /// Exact first date, overrides --start-year (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Exact last date, overrides --end-year (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Directory to write <year>.json files to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Records per request
    #[arg(long, default_value_t = 1000)]
    page_size: u64,

    /// Deepest offset + limit the API serves for one date
    #[arg(long, default_value_t = 10_000)]
    max_result_window: u64,

    /// Pause between successful requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Pause before retrying a failed request, in milliseconds
    #[arg(long, default_value_t = 5000)]
    retry_delay_ms: u64,

    /// Give up after this many attempts per page (default: retry forever)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl FetchArgs {
    fn apply(self, config: &mut ExtractConfig) -> Result<()> {
        let years = DateRange::years(self.start_year, self.end_year)?;
        config.range = DateRange::new(
            self.from.unwrap_or(years.start()),
            self.to.unwrap_or(years.end()),
        );
        config.output_dir = self.output_dir;
        config.page_size = self.page_size;
        config.max_result_window = self.max_result_window;
        config.request_delay = Duration::from_millis(self.delay_ms);
        config.retry_delay = Duration::from_millis(self.retry_delay_ms);
        config.max_attempts = self.max_attempts;
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
        log::debug!("Loaded environment from {}", cli.env.bright_black());
    }

    match cli.command {
        Commands::Fetch(args) => {
            let mut config = ExtractConfig::from_env()?;
            args.apply(&mut config)?;
            log::info!(
                "Fetching {} into {}",
                config.range.cyan(),
                config.output_dir.display().bright_black()
            );
            log::warn!("Existing <year>.json files in the output directory are overwritten");
            cli::fetch(&config).await?;
        }
        Commands::Probe { date, limit } => {
            let mut config = ExtractConfig::from_env()?;
            config.page_size = limit;
            config.max_result_window = config.max_result_window.max(limit);
            cli::probe(&config, date).await?;
        }
        Commands::Verify { files } => {
            let counts = cli::verify(&files)?;
            let total: usize = counts.iter().map(|(_, n)| n).sum();
            log::info!("{} record(s) in {} file(s)", total, counts.len());
        }
    }

    Ok(())
}
