use crate::config::{Order, Table};
use crate::mcs::{Bandwidth, GuardInterval};
use crate::*;
#[cfg(test)] use proptest::prelude::*;

const MODULATION_COLUMN: usize = 2;
const CODE_RATE_COLUMN: usize = 3;
const FIRST_RATE_COLUMN: usize = 4;

/// One non-zero rate cell of the MCS table, before names are derived.
#[derive(Clone, Debug, PartialEq)]
pub struct TableEntry {
    pub id: usize,
    /// 1-based line in the table file
    pub line: usize,
    pub mcs: String,
    pub modulation: String,
    pub code_rate: String,
    pub bandwidth: Bandwidth,
    pub data_rate_mbps: f64,
}

/// Column holding the rate for `bandwidth`. Rate columns come in long/short
/// guard interval pairs, one pair per bandwidth.
pub fn rate_column(bandwidth: Bandwidth, gi: GuardInterval) -> usize {
    FIRST_RATE_COLUMN + 2 * bandwidth.index() + gi.column_offset()
}

struct Row<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl Row<'_> {
    fn rate(&self, bandwidth: Bandwidth, gi: GuardInterval) -> Result<f64> {
        let column = rate_column(bandwidth, gi);
        let value = self.fields[column];
        match value.parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate >= 0.0 => Ok(rate),
            _ => Err(Error::InvalidRate {
                line: self.line,
                column,
                value: value.to_string(),
            }),
        }
    }
}

fn split_rows(text: &str, gi: GuardInterval) -> Result<Vec<Row>> {
    let expected = rate_column(Bandwidth::MHz16, gi) + 1;
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < expected {
            return Err(Error::ShortRow {
                line: i + 1,
                expected,
                found: fields.len(),
            });
        }
        rows.push(Row { line: i + 1, fields });
    }
    Ok(rows)
}

/// Expands every row of the table into one entry per bandwidth with a
/// non-zero rate.
/// Any malformed row or rate cell fails the whole load.
pub fn parse(text: &str, table: &Table) -> Result<Vec<TableEntry>> {
    let gi = table.guard_interval;
    let rows = split_rows(text, gi)?;

    let mut cells = Vec::with_capacity(rows.len() * Bandwidth::ALL.len());
    match table.order {
        Order::BandwidthMajor => {
            for bandwidth in Bandwidth::ALL {
                for row in &rows {
                    cells.push((row, bandwidth));
                }
            }
        }
        Order::RowMajor => {
            for row in &rows {
                for bandwidth in Bandwidth::ALL {
                    cells.push((row, bandwidth));
                }
            }
        }
    }

    let mut entries = Vec::new();
    for (row, bandwidth) in cells {
        let rate = row.rate(bandwidth, gi)?;
        if rate == 0.0 {
            continue;
        }
        entries.push(TableEntry {
            id: entries.len(),
            line: row.line,
            mcs: row.fields[0].to_string(),
            modulation: row.fields[MODULATION_COLUMN].to_string(),
            code_rate: row.fields[CODE_RATE_COLUMN].to_string(),
            bandwidth,
            data_rate_mbps: rate,
        });
    }
    log::debug!("{} rows expanded into {} entries", rows.len(), entries.len());
    Ok(entries)
}

#[cfg(test)]
fn row_major() -> Table {
    Table {
        order: Order::RowMajor,
        ..Default::default()
    }
}

#[test]
fn bpsk_row_expands_to_five() {
    let entries = parse("X,Y,BPSK,1/2,6.0,_,12.0,_,24.0,_,48.0,_,96.0", &Table::default()).unwrap();
    assert_eq!(5, entries.len());
    for (entry, bandwidth) in entries.iter().zip(Bandwidth::ALL) {
        assert_eq!(bandwidth, entry.bandwidth);
        assert_eq!("BPSK", entry.modulation);
        assert_eq!("1/2", entry.code_rate);
        assert_eq!(6.0 * f64::from(bandwidth.mhz()), entry.data_rate_mbps);
    }
    assert_eq!(vec![0, 1, 2, 3, 4], entries.iter().map(|e| e.id).collect::<Vec<_>>());
}

#[test]
fn zero_rate_drops_only_that_bandwidth() {
    let entries = parse("0,1,QPSK,3/4,0.9,1,0,0,4.05,4.5,8.78,9.76,17.6,19.56", &Table::default()).unwrap();
    let widths: Vec<_> = entries.iter().map(|e| e.bandwidth).collect();
    assert_eq!(
        vec![Bandwidth::MHz1, Bandwidth::MHz4, Bandwidth::MHz8, Bandwidth::MHz16],
        widths
    );
}

#[test]
fn order_controls_iteration() {
    let text = "0,1,BPSK,1/2,1,0,2,0,3,0,4,0,5,0\n1,1,QPSK,1/2,10,0,20,0,30,0,40,0,50,0\n";

    let bw_major = parse(text, &Table::default()).unwrap();
    let rates: Vec<f64> = bw_major.iter().map(|e| e.data_rate_mbps).collect();
    assert_eq!(vec![1., 10., 2., 20., 3., 30., 4., 40., 5., 50.], rates);

    let row_major = parse(text, &row_major()).unwrap();
    let rates: Vec<f64> = row_major.iter().map(|e| e.data_rate_mbps).collect();
    assert_eq!(vec![1., 2., 3., 4., 5., 10., 20., 30., 40., 50.], rates);
    assert_eq!(2, row_major[5].line);
}

#[test]
fn short_guard_interval_reads_odd_columns() {
    let table = Table {
        guard_interval: GuardInterval::Short,
        ..Default::default()
    };
    let entries = parse("0,1,BPSK,1/2,0.3,0.33,0.65,0.72,1.35,1.5,2.93,3.26,5.85,6.5", &table).unwrap();
    let rates: Vec<f64> = entries.iter().map(|e| e.data_rate_mbps).collect();
    assert_eq!(vec![0.33, 0.72, 1.5, 3.26, 6.5], rates);
}

#[test]
fn short_guard_interval_needs_last_column() {
    let table = Table {
        guard_interval: GuardInterval::Short,
        ..Default::default()
    };
    let err = parse("X,Y,BPSK,1/2,6.0,_,12.0,_,24.0,_,48.0,_,96.0", &table).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 1, expected: 14, found: 13 }));
}

#[test]
fn short_row_reports_line() {
    let text = "0,1,BPSK,1/2,1,0,2,0,3,0,4,0,5,0\n\n1,1,QPSK,1/2,10,0,20\n";
    let err = parse(text, &Table::default()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 3, expected: 13, found: 7 }));
}

#[test]
fn bad_rate_reports_line_and_column() {
    let text = "0,1,BPSK,1/2,1,0,2,0,3,0,4,0,5,0\n1,1,QPSK,1/2,10,0,20,0,3O,0,40,0,50\n";
    match parse(text, &row_major()) {
        Err(Error::InvalidRate { line, column, value }) => {
            assert_eq!(2, line);
            assert_eq!(8, column);
            assert_eq!("3O", value);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn negative_and_non_finite_rates_are_invalid() {
    for bad in ["-1", "inf", "NaN"] {
        let text = format!("0,1,BPSK,1/2,{},0,2,0,3,0,4,0,5", bad);
        assert!(matches!(
            parse(&text, &Table::default()),
            Err(Error::InvalidRate { column: 4, .. })
        ));
    }
}

#[test]
fn crlf_and_padding_are_tolerated() {
    let entries = parse("0, 1, BPSK, 1/2, 0.3 ,0,0,0,0,0,0,0,0\r\n", &Table::default()).unwrap();
    assert_eq!(1, entries.len());
    assert_eq!("BPSK", entries[0].modulation);
    assert_eq!(0.3, entries[0].data_rate_mbps);
}

#[cfg(test)]
proptest! {
    #[test]
    fn one_entry_per_nonzero_cell(
        rows in prop::collection::vec(prop::array::uniform5(prop_oneof![Just(0u32), 1..10_000u32]), 0..12),
        bw_major in any::<bool>(),
    ) {
        let text: String = rows
            .iter()
            .enumerate()
            .map(|(i, rates)| {
                let cells: Vec<String> = rates.iter().map(|r| format!("{}.{:02},0", r / 100, r % 100)).collect();
                format!("{},1,QPSK,1/2,{}\n", i, cells.join(","))
            })
            .collect();
        let table = if bw_major { Table::default() } else { row_major() };
        let entries = parse(&text, &table).unwrap();
        let nonzero = rows.iter().flatten().filter(|&&r| r != 0).count();
        prop_assert_eq!(nonzero, entries.len());
        prop_assert!(entries.iter().all(|e| e.data_rate_mbps != 0.0));
    }
}
