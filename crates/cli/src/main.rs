// tyrebay CLI - align branch plate lists against the fleet master list

mod align;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "tyrebay")]
#[command(about = "Tyre-bay alignment: match branch plates to fleet tractors and bodies")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Log engine decisions (ambiguous plates, unresolved IDs) at debug level.
    /// RUST_LOG overrides this.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Align branch sheets (or CSV files) against the master vehicle list
    #[command(after_help = "\
Examples:
  tyrebay run fleet.xlsx
  tyrebay run fleet.xlsx --branch Obajana --branch Ibese -o aligned.xlsx
  tyrebay run fleet.xlsx --config weekly.align.toml --json
  tyrebay run --master master.csv --branch obajana.csv --csv-dir out/")]
    Run {
        /// Workbook holding the master and branch sheets (xlsx, xls, xlsb, ods)
        #[arg(conflicts_with = "master")]
        workbook: Option<PathBuf>,

        /// Alignment config (.align.toml); defaults apply without one
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Master sheet name (overrides the config)
        #[arg(long, value_name = "SHEET", requires = "workbook")]
        master_sheet: Option<String>,

        /// Master list CSV file (CSV mode, instead of a workbook)
        #[arg(long, value_name = "FILE")]
        master: Option<PathBuf>,

        /// Branch sheet name, or branch CSV file in CSV mode. Repeatable.
        #[arg(long, short = 'b', value_name = "SHEET|FILE")]
        branch: Vec<String>,

        /// Branch key column kind (overrides the config)
        #[arg(long, value_enum)]
        key: Option<KeyArg>,

        /// Result workbook path (default: <WORKBOOK stem>-aligned.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also write one CSV per branch into this directory
        #[arg(long, value_name = "DIR")]
        csv_dir: Option<PathBuf>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, value_name = "FILE")]
        output_json: Option<PathBuf>,
    },

    /// Validate an alignment config without running
    #[command(after_help = "\
Examples:
  tyrebay validate weekly.align.toml")]
    Validate {
        /// Path to the .align.toml config file
        config: PathBuf,
    },

    /// Show how plates and vehicle IDs are classified and normalized
    #[command(after_help = "\
Examples:
  tyrebay normalize ' kja234xc ' APP552THT DT4521 TRK100T")]
    Normalize {
        /// Raw plate or vehicle ID values
        #[arg(required = true)]
        values: Vec<String>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KeyArg {
    License,
    VehicleId,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => Err(CliError::args("no command given").with_hint("run tyrebay --help")),
        Some(Commands::Run {
            workbook,
            config,
            master_sheet,
            master,
            branch,
            key,
            output,
            csv_dir,
            json,
            output_json,
        }) => align::cmd_run(align::RunArgs {
            workbook,
            config,
            master_sheet,
            master,
            branches: branch,
            key,
            output,
            csv_dir,
            json,
            output_json,
        }),
        Some(Commands::Validate { config }) => align::cmd_validate(config),
        Some(Commands::Normalize { values, json }) => align::cmd_normalize(values, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<tyrebay_recon::ReconError> for CliError {
    fn from(err: tyrebay_recon::ReconError) -> Self {
        Self::new(exit_codes::recon_exit_code(&err), err.to_string())
    }
}
