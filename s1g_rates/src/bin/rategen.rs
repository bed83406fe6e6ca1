use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use s1g_rates::config::{Config, Order};
use s1g_rates::phy;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
/// Generate the S1G OFDM rate fragments of the wifi PHY from an MCS table,
/// e.g. `rategen generate data/mcs_data_rate_table_formated.txt -o gen`
struct Args {
    /// TOML configuration, defaults apply to anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// More logging, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the five fragment files
    Generate {
        /// MCS table
        input: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        order: Option<Order>,
    },
    /// Compare table rates against the rates the PHY will compute
    Check {
        input: PathBuf,
        /// Fail if any rate is off
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration
    Config,
}

fn read_table(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simple_logger::SimpleLogger::new().with_level(level).env().init()?;

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    match args.command {
        Command::Generate {
            input,
            out_dir,
            order,
        } => {
            if let Some(dir) = out_dir {
                config.output.directory = dir;
            }
            if let Some(order) = order {
                config.table.order = order;
            }
            let text = read_table(&input)?;
            let written = s1g_rates::generate(&text, &config)
                .with_context(|| format!("generating from {}", input.display()))?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Check { input, strict } => {
            let text = read_table(&input)?;
            let records = s1g_rates::load(&text, &config)
                .with_context(|| format!("loading {}", input.display()))?;
            let found = phy::check(&records, config.table.guard_interval, config.check.tolerance);
            for d in &found {
                log::warn!("{}", d);
            }
            println!("{} rates checked, {} off", records.len(), found.len());
            ensure!(!strict || found.is_empty(), "{} rates disagree with the PHY", found.len());
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
