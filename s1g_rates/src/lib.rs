//! Turns an 802.11ah MCS data rate table into the S1G OFDM rate fragments of
//! an ns-3 style wifi PHY: accessor declarations, the modulation lookup
//! table, the mode macros, the per-width bps list and the rate switch.
use std::path::PathBuf;
use thiserror::Error;

use config::{Config, Naming};
use output::Rendered;
use record::RateRecord;

pub mod config;
pub mod fragment;
pub mod mcs;
pub mod output;
pub mod phy;
pub mod record;
pub mod table;

pub use fragment::Fragment;

#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {column}: invalid data rate {value:?}")]
    InvalidRate {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("line {line}: unknown modulation {value:?}")]
    UnknownModulation { line: usize, value: String },
    #[error("line {line}: unknown code rate {value:?}")]
    UnknownCodeRate { line: usize, value: String },
    #[error("{0} would be generated twice")]
    DuplicateSymbol(String),
    #[error("{bps} bps appears twice at {bandwidth}")]
    DuplicateRate {
        bandwidth: mcs::Bandwidth,
        bps: u64,
    },
    #[error("{first} and {second} both write {}", .path.display())]
    OutputCollision {
        path: PathBuf,
        first: Fragment,
        second: Fragment,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config")]
    Config(#[from] toml::de::Error),
    #[error("Rendering failed")]
    Format(#[from] std::fmt::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Parses and names every rate of `text`.
pub fn load(text: &str, config: &Config) -> Result<Vec<RateRecord>> {
    let entries = table::parse(text, &config.table)?;
    record::enrich(&entries, &config.naming)
}

/// Renders all five fragments, in [`Fragment::ALL`] order.
pub fn render(records: &[RateRecord], naming: &Naming) -> Result<Vec<Rendered>> {
    Fragment::ALL
        .iter()
        .map(|&fragment| -> Result<Rendered> {
            let text = fragment.render(records, naming)?;
            log::debug!("rendered {} ({} bytes)", fragment, text.len());
            Ok(Rendered { fragment, text })
        })
        .collect()
}

/// Load, render and write. Nothing is written unless every step before the
/// write succeeded.
pub fn generate(text: &str, config: &Config) -> Result<Vec<PathBuf>> {
    let records = load(text, config)?;
    let rendered = render(&records, &config.naming)?;
    output::write(&rendered, &config.output)
}

#[cfg(test)]
const BUNDLED: &str = include_str!("../data/mcs_data_rate_table_formated.txt");

#[cfg(test)]
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("s1g-rates-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn bundled_table_has_fifty_rates() {
    let records = load(BUNDLED, &Config::default()).unwrap();
    assert_eq!(50, records.len());
    assert_eq!("S1gOfdmRate0_30MbpsBW1MHz", records[0].symbol_name());
    assert_eq!("S1gOfdmRate0_15MbpsBW1MHz", records[10].symbol_name());
    assert_eq!("S1gOfdmRate78_00MbpsBW16MHz", records[49].symbol_name());
}

#[test]
fn bundled_rate_list_matches_phy() {
    let records = load(BUNDLED, &Config::default()).unwrap();
    let text = Fragment::RateList.render(&records, &Naming::default()).unwrap();
    assert_eq!(
        "                {1, {300000,600000,900000,1200000,1800000,2400000,2700000,3000000,3600000,4000000,150000,}},\n\
         \x20               {2, {650000,1300000,1950000,2600000,3900000,5200000,5850000,6500000,7800000,}},\n\
         \x20               {4, {1350000,2700000,4050000,5400000,8100000,10800000,12200000,13500000,16200000,18000000,}},\n\
         \x20               {8, {2930000,5850000,8780000,11700000,17600000,23400000,26300000,29300000,35100000,39000000,}},\n\
         \x20               {16, {5850000,11700000,17600000,23400000,35100000,46800000,52700000,58500000,70200000,78000000,}},\n",
        text
    );
}

#[test]
fn bundled_switch_dispatches_every_rate() {
    let records = load(BUNDLED, &Config::default()).unwrap();
    let text = Fragment::RateSwitch.render(&records, &Naming::default()).unwrap();
    assert_eq!(50, text.matches("        case ").count());
    assert!(text.contains("        case 150000:\n          return GetS1gOfdmRate0_15MbpsBW1MHz();\n"));
    assert!(text.contains("        case 12200000:\n          return GetS1gOfdmRate12_20MbpsBW4MHz();\n"));
}

#[test]
fn checker_flags_aliased_and_repetition_rates() {
    let config = Config::default();
    let records = load(BUNDLED, &config).unwrap();
    let found = phy::check(&records, config.table.guard_interval, config.check.tolerance);
    assert_eq!(6, found.len());
    assert_eq!(5, found.iter().filter(|d| d.mcs == "5").count());
    assert!(found.iter().any(|d| d.mcs == "10" && d.computed_bps == 300_000));

    let mut config = Config::default();
    config.naming.alias_two_thirds = false;
    let records = load(BUNDLED, &config).unwrap();
    let found = phy::check(&records, config.table.guard_interval, config.check.tolerance);
    assert_eq!(1, found.len());
    assert_eq!("S1gOfdmRate0_15MbpsBW1MHz", found[0].symbol_name);
}

#[test]
fn generate_is_repeatable() {
    let mut config = Config::default();
    config.output.directory = scratch("repeat");

    let first = generate(BUNDLED, &config).unwrap();
    let before: Vec<Vec<u8>> = first.iter().map(|p| std::fs::read(p).unwrap()).collect();
    let second = generate(BUNDLED, &config).unwrap();
    let after: Vec<Vec<u8>> = second.iter().map(|p| std::fs::read(p).unwrap()).collect();

    assert_eq!(first, second);
    assert_eq!(5, first.len());
    assert_eq!(before, after);
    assert!(first.iter().all(|p| p.starts_with(&config.output.directory)));
    std::fs::remove_dir_all(&config.output.directory).unwrap();
}

#[test]
fn failed_run_writes_nothing() {
    let mut config = Config::default();
    config.output.directory = scratch("failed");
    let text = format!("{}11,1,BPSK,7/8,0.1,0,0,0,0,0,0,0,0\n", BUNDLED);

    assert!(matches!(
        generate(&text, &config),
        Err(Error::UnknownCodeRate { line: 12, .. })
    ));
    assert!(!config.output.directory.exists());
}

#[test]
fn shared_output_file_keeps_previous_run() {
    let mut config = Config::default();
    config.output.directory = scratch("shared");
    let good = generate(BUNDLED, &config).unwrap();
    let before: Vec<Vec<u8>> = good.iter().map(|p| std::fs::read(p).unwrap()).collect();

    config.output.lookup_table = config.output.declarations.clone();
    assert!(matches!(
        generate(BUNDLED, &config),
        Err(Error::OutputCollision { first: Fragment::Declarations, second: Fragment::LookupTable, .. })
    ));

    let after: Vec<Vec<u8>> = good.iter().map(|p| std::fs::read(p).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(5, std::fs::read_dir(&config.output.directory).unwrap().count());
    std::fs::remove_dir_all(&config.output.directory).unwrap();
}
