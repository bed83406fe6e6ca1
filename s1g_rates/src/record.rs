use crate::config::Naming;
use crate::mcs::{Bandwidth, CodeRate, Modulation};
use crate::table::TableEntry;
use crate::*;
use std::collections::HashSet;
#[cfg(test)] use itertools::Itertools;
#[cfg(test)] use proptest::prelude::*;

/// A fully named S1G OFDM rate. Built once from a table entry, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct RateRecord {
    id: usize,
    line: usize,
    mcs: String,
    modulation: Modulation,
    code_rate: CodeRate,
    emitted_code_rate: CodeRate,
    bandwidth: Bandwidth,
    data_rate_mbps: f64,
    rate_label: String,
    symbol_name: String,
}

/// `6.5` -> `6_50`
pub fn rate_label(data_rate_mbps: f64) -> String {
    format!("{:.2}", data_rate_mbps).replace('.', "_")
}

impl RateRecord {
    pub fn new(entry: &TableEntry, naming: &Naming) -> Result<Self> {
        let modulation = entry
            .modulation
            .parse::<Modulation>()
            .map_err(|_| Error::UnknownModulation {
                line: entry.line,
                value: entry.modulation.clone(),
            })?;
        let code_rate = entry
            .code_rate
            .parse::<CodeRate>()
            .map_err(|_| Error::UnknownCodeRate {
                line: entry.line,
                value: entry.code_rate.clone(),
            })?;
        let rate_label = rate_label(entry.data_rate_mbps);
        let symbol_name = format!(
            "{}{}MbpsBW{}MHz",
            naming.mode_prefix,
            rate_label,
            entry.bandwidth.mhz()
        );

        Ok(Self {
            id: entry.id,
            line: entry.line,
            mcs: entry.mcs.clone(),
            modulation,
            code_rate,
            emitted_code_rate: code_rate.emitted(naming.alias_two_thirds),
            bandwidth: entry.bandwidth,
            data_rate_mbps: entry.data_rate_mbps,
            rate_label,
            symbol_name,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn mcs(&self) -> &str {
        &self.mcs
    }

    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Code rate as listed in the table
    pub fn code_rate(&self) -> CodeRate {
        self.code_rate
    }

    /// Code rate as carried by the generated lookup table
    pub fn emitted_code_rate(&self) -> CodeRate {
        self.emitted_code_rate
    }

    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    pub fn data_rate_mbps(&self) -> f64 {
        self.data_rate_mbps
    }

    pub fn rate_label(&self) -> &str {
        &self.rate_label
    }

    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    pub fn constellation_size(&self) -> u16 {
        self.modulation.constellation_size()
    }

    pub fn code_rate_symbol(&self) -> &'static str {
        self.emitted_code_rate.symbol()
    }

    /// Truncated, as the PHY switch labels expect
    pub fn bits_per_second(&self) -> u64 {
        (self.data_rate_mbps * 1_000_000.0) as u64
    }
}

/// Names every entry. Fails on the first unknown modulation or code rate, or
/// when two records would generate the same function or the same case label.
pub fn enrich(entries: &[TableEntry], naming: &Naming) -> Result<Vec<RateRecord>> {
    let records = entries
        .iter()
        .map(|entry| RateRecord::new(entry, naming))
        .collect::<Result<Vec<_>>>()?;

    let mut symbols = HashSet::new();
    let mut rates = HashSet::new();
    for record in &records {
        if !symbols.insert(record.symbol_name()) {
            return Err(Error::DuplicateSymbol(record.symbol_name().to_string()));
        }
        if !rates.insert((record.bandwidth(), record.bits_per_second())) {
            return Err(Error::DuplicateRate {
                bandwidth: record.bandwidth(),
                bps: record.bits_per_second(),
            });
        }
    }
    for record in &records {
        log::trace!(
            "#{} {} ({} Mbps, line {})",
            record.id(),
            record.symbol_name(),
            record.data_rate_mbps(),
            record.line()
        );
    }
    log::debug!("enriched {} records", records.len());
    Ok(records)
}

#[cfg(test)]
fn load(text: &str) -> Result<Vec<RateRecord>> {
    let entries = table::parse(text, &config::Table::default())?;
    enrich(&entries, &Naming::default())
}

#[test]
fn bpsk_row_names() {
    let records = load("X,Y,BPSK,1/2,6.0,_,12.0,_,24.0,_,48.0,_,96.0").unwrap();
    let symbols: Vec<&str> = records.iter().map(|r| r.symbol_name()).collect();
    assert_eq!(
        vec![
            "S1gOfdmRate6_00MbpsBW1MHz",
            "S1gOfdmRate12_00MbpsBW2MHz",
            "S1gOfdmRate24_00MbpsBW4MHz",
            "S1gOfdmRate48_00MbpsBW8MHz",
            "S1gOfdmRate96_00MbpsBW16MHz",
        ],
        symbols
    );
    for record in &records {
        assert_eq!(2, record.constellation_size());
        assert_eq!("CODE_RATE_1_2", record.code_rate_symbol());
        assert_eq!("X", record.mcs());
    }
    assert_eq!(96_000_000, records[4].bits_per_second());
}

#[test]
fn two_thirds_is_emitted_as_three_quarters() {
    let records = load("5,1,64-QAM,2/3,2.4,2.67,5.2,5.78,10.8,12,23.4,26,46.8,52").unwrap();
    assert!(records.iter().all(|r| r.code_rate() == CodeRate::TwoThirds));
    assert!(records.iter().all(|r| r.code_rate_symbol() == "CODE_RATE_3_4"));
    assert!(records.iter().all(|r| r.constellation_size() == 64));

    let entries = table::parse("5,1,64-QAM,2/3,2.4,0,0,0,0,0,0,0,0", &config::Table::default()).unwrap();
    let naming = Naming {
        alias_two_thirds: false,
        ..Default::default()
    };
    let records = enrich(&entries, &naming).unwrap();
    assert_eq!("CODE_RATE_2_3", records[0].code_rate_symbol());
}

#[test]
fn unknown_modulation_fails() {
    let err = load("0,1,BPSK,1/2,1,0,0,0,0,0,0,0,0\n1,1,8-PSK,1/2,1.5,0,0,0,0,0,0,0,0").unwrap_err();
    match err {
        Error::UnknownModulation { line, value } => {
            assert_eq!(2, line);
            assert_eq!("8-PSK", value);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn unknown_code_rate_fails() {
    let err = load("0,1,QPSK,7/8,1,0,0,0,0,0,0,0,0").unwrap_err();
    assert!(matches!(err, Error::UnknownCodeRate { line: 1, ref value } if value == "7/8"));
}

#[test]
fn close_rates_keep_distinct_symbols() {
    let records = load(
        "0,1,QPSK,1/2,6.5,0,0,0,0,0,0,0,0\n\
         1,1,QPSK,3/4,6.05,0,0,0,0,0,0,0,0\n\
         2,1,QPSK,5/6,65,0,0,0,0,0,0,0,0\n",
    )
    .unwrap();
    assert!(records.iter().map(|r| r.symbol_name()).all_unique());
    assert_eq!(
        vec!["6_50", "6_05", "65_00"],
        records.iter().map(|r| r.rate_label()).collect::<Vec<_>>()
    );
}

#[test]
fn same_rate_same_bandwidth_is_duplicate() {
    let err = load(
        "0,1,QPSK,1/2,6.5,0,0,0,0,0,0,0,0\n\
         1,1,BPSK,3/4,6.50,0,0,0,0,0,0,0,0\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateSymbol(ref s) if s == "S1gOfdmRate6_50MbpsBW1MHz"));
}

#[test]
fn same_case_label_under_different_names_is_duplicate() {
    // 0.145 is stored just below itself and rounds down to 0_14, the
    // other rounds up to 0_15, both truncate to 145000 bps
    let err = load(
        "0,1,QPSK,1/2,0.145,0,0,0,0,0,0,0,0\n\
         1,1,BPSK,3/4,0.1450001,0,0,0,0,0,0,0,0\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateRate {
            bandwidth: Bandwidth::MHz1,
            bps: 145_000
        }
    ));
}

#[test]
fn records_keep_table_order_and_rate() {
    let records = load("0,1,BPSK,1/2,0.3,0,0.65,0,0,0,0,0,0\n1,1,QPSK,1/2,0.6,0,0,0,0,0,0,0,0").unwrap();
    assert_eq!(vec![0, 1, 2], records.iter().map(|r| r.id()).collect::<Vec<_>>());
    assert_eq!(
        vec![0.3, 0.6, 0.65],
        records.iter().map(|r| r.data_rate_mbps()).collect::<Vec<_>>()
    );
    assert_eq!(vec![1, 2, 1], records.iter().map(|r| r.line()).collect::<Vec<_>>());
}

#[test]
fn same_rate_other_bandwidth_is_distinct() {
    let records = load("0,1,QPSK,1/2,5.85,0,5.85,0,0,0,0,0,0").unwrap();
    assert_eq!("S1gOfdmRate5_85MbpsBW1MHz", records[0].symbol_name());
    assert_eq!("S1gOfdmRate5_85MbpsBW2MHz", records[1].symbol_name());
}

#[test]
fn prefix_comes_from_naming() {
    let entries = table::parse("0,1,QPSK,1/2,0.6,0,0,0,0,0,0,0,0", &config::Table::default()).unwrap();
    let naming = Naming {
        mode_prefix: "HtRate".into(),
        ..Default::default()
    };
    let records = enrich(&entries, &naming).unwrap();
    assert_eq!("HtRate0_60MbpsBW1MHz", records[0].symbol_name());
}

#[cfg(test)]
proptest! {
    #[test]
    fn label_is_two_decimal_rate(rate in 0.01f64..1000.0) {
        let label = rate_label(rate);
        prop_assert_eq!(format!("{:.2}", rate), label.replace('_', "."));
        let back: f64 = label.replace('_', ".").parse().unwrap();
        prop_assert!((back - rate).abs() <= 0.005 + f64::EPSILON * 1000.0);
    }
}
