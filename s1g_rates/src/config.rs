use crate::mcs::GuardInterval;
use crate::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Order in which (row, bandwidth) pairs become records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    /// Every row at 1 MHz, then every row at 2 MHz, ...
    #[default]
    BandwidthMajor,
    /// Every bandwidth of the first row, then the second row, ...
    RowMajor,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Table {
    pub order: Order,
    pub guard_interval: GuardInterval,
}

/// Identifiers spliced into the generated fragments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Naming {
    pub mode_prefix: String,
    pub accessor_prefix: String,
    pub mode_type: String,
    pub code_rate_prefix: String,
    pub mode_macro: String,
    pub mandatory: bool,
    pub abort_macro: String,
    pub alias_two_thirds: bool,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            mode_prefix: "S1gOfdmRate".into(),
            accessor_prefix: "Get".into(),
            mode_type: "WifiMode".into(),
            code_rate_prefix: "WIFI_".into(),
            mode_macro: "GET_S1G_OFDM_MODE".into(),
            mandatory: true,
            abort_macro: "NS_ABORT_MSG".into(),
            alias_two_thirds: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Output {
    pub directory: PathBuf,
    pub declarations: PathBuf,
    pub lookup_table: PathBuf,
    pub mode_macros: PathBuf,
    pub rate_list: PathBuf,
    pub rate_switch: PathBuf,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            directory: ".".into(),
            declarations: "gen_s1g_rates_fnames.txt".into(),
            lookup_table: "gen_s1g_rates_lookup.txt".into(),
            mode_macros: "gen_s1g_rates_modes.txt".into(),
            rate_list: "gen_s1g_rates_bps_list.txt".into(),
            rate_switch: "gen_s1g_rates_switch.txt".into(),
        }
    }
}

impl Output {
    pub fn path(&self, fragment: Fragment) -> PathBuf {
        let name: &Path = match fragment {
            Fragment::Declarations => &self.declarations,
            Fragment::LookupTable => &self.lookup_table,
            Fragment::ModeMacros => &self.mode_macros,
            Fragment::RateList => &self.rate_list,
            Fragment::RateSwitch => &self.rate_switch,
        };
        self.directory.join(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Check {
    /// Relative deviation allowed between the table and the computed rate
    pub tolerance: f64,
}

impl Default for Check {
    fn default() -> Self {
        // The table rounds to 10 kbps, 12.15 Mbps is listed as 12.2
        Self { tolerance: 0.01 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub table: Table,
    pub naming: Naming,
    pub output: Output,
    pub check: Check,
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }
}

#[test]
fn empty_config_is_default() {
    assert_eq!(Config::default(), Config::from_toml("").unwrap());
}

#[test]
fn partial_sections_keep_defaults() {
    let config = Config::from_toml(
        r#"
        [table]
        order = "row-major"
        guard_interval = "short"

        [naming]
        mandatory = false

        [output]
        directory = "gen"
        "#,
    )
    .unwrap();

    assert_eq!(Order::RowMajor, config.table.order);
    assert_eq!(GuardInterval::Short, config.table.guard_interval);
    assert!(!config.naming.mandatory);
    assert_eq!("S1gOfdmRate", config.naming.mode_prefix);
    assert_eq!(
        Path::new("gen/gen_s1g_rates_switch.txt"),
        config.output.path(Fragment::RateSwitch)
    );
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(matches!(
        Config::from_toml("[table]\nordre = \"row-major\"\n"),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Config::from_toml("[table]\norder = \"column-major\"\n"),
        Err(Error::Config(_))
    ));
}

#[test]
fn default_config_survives_toml() {
    let text = toml::to_string(&Config::default()).unwrap();
    assert_eq!(Config::default(), Config::from_toml(&text).unwrap());
}
