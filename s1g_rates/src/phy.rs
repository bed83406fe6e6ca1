/* S1G OFDM numerology
 *
 * The simulator never reads the table rates back. It recomputes a mode's rate
 * from the lookup entry (code rate, constellation) and the channel width, so
 * a table rate that disagrees with its entry silently changes meaning.
 * */
use crate::mcs::{Bandwidth, CodeRate, GuardInterval, Modulation};
use crate::record::RateRecord;
use std::fmt;
#[cfg(test)] use proptest::prelude::*;

const SYMBOL_NS: u64 = 32_000;

/// Data rate in bps, rounded up like the PHY does.
pub fn data_rate(
    code_rate: CodeRate,
    modulation: Modulation,
    bandwidth: Bandwidth,
    gi: GuardInterval,
) -> u64 {
    let (num, den) = code_rate.ratio();
    let bits_per_ofdm_symbol = u64::from(bandwidth.usable_subcarriers())
        * u64::from(modulation.bits_per_symbol())
        * num;
    let symbol_ns = SYMBOL_NS + u64::from(gi.nanoseconds());
    (bits_per_ofdm_symbol * 1_000_000_000).div_ceil(den * symbol_ns)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Discrepancy {
    pub symbol_name: String,
    pub mcs: String,
    pub line: usize,
    pub modulation: Modulation,
    pub code_rate: CodeRate,
    pub bandwidth: Bandwidth,
    pub tabulated_bps: u64,
    pub computed_bps: u64,
}

impl Discrepancy {
    pub fn deviation(&self) -> f64 {
        relative_deviation(self.tabulated_bps, self.computed_bps)
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (MCS {}, line {}): table lists {} bps, {} {} at {} gives {} bps, off by {:.1}%",
            self.symbol_name,
            self.mcs,
            self.line,
            self.tabulated_bps,
            self.modulation,
            self.code_rate,
            self.bandwidth,
            self.computed_bps,
            100.0 * self.deviation()
        )
    }
}

fn relative_deviation(tabulated: u64, computed: u64) -> f64 {
    (tabulated as f64 - computed as f64).abs() / computed as f64
}

/// Records whose tabulated rate differs from what their lookup entry yields
/// by more than `tolerance` (relative).
pub fn check(records: &[RateRecord], gi: GuardInterval, tolerance: f64) -> Vec<Discrepancy> {
    records
        .iter()
        .filter_map(|r| {
            let computed = data_rate(r.emitted_code_rate(), r.modulation(), r.bandwidth(), gi);
            let tabulated = r.bits_per_second();
            if relative_deviation(tabulated, computed) <= tolerance {
                return None;
            }
            Some(Discrepancy {
                symbol_name: r.symbol_name().to_string(),
                mcs: r.mcs().to_string(),
                line: r.line(),
                modulation: r.modulation(),
                code_rate: r.emitted_code_rate(),
                bandwidth: r.bandwidth(),
                tabulated_bps: tabulated,
                computed_bps: computed,
            })
        })
        .collect()
}

#[test]
fn known_rates() {
    use Bandwidth::*;
    let gi = GuardInterval::Long;
    assert_eq!(300_000, data_rate(CodeRate::Half, Modulation::BPSK, MHz1, gi));
    assert_eq!(650_000, data_rate(CodeRate::Half, Modulation::BPSK, MHz2, gi));
    assert_eq!(2_925_000, data_rate(CodeRate::Half, Modulation::BPSK, MHz8, gi));
    assert_eq!(2_400_000, data_rate(CodeRate::TwoThirds, Modulation::QAM64, MHz1, gi));
    assert_eq!(12_150_000, data_rate(CodeRate::ThreeQuarters, Modulation::QAM64, MHz4, gi));
    assert_eq!(78_000_000, data_rate(CodeRate::FiveSixths, Modulation::QAM256, MHz16, gi));
}

#[test]
fn short_guard_interval_is_faster() {
    // 12 data bits per 36 us symbol
    assert_eq!(
        333_334,
        data_rate(CodeRate::Half, Modulation::BPSK, Bandwidth::MHz1, GuardInterval::Short)
    );
}

#[cfg(test)]
proptest! {
    #[test]
    fn wider_channel_is_never_slower(r in any::<CodeRate>(), m in any::<Modulation>(), b in 0..4usize) {
        let narrow = Bandwidth::from_index(b).unwrap();
        let wide = Bandwidth::from_index(b + 1).unwrap();
        for gi in [GuardInterval::Long, GuardInterval::Short] {
            prop_assert!(data_rate(r, m, wide, gi) >= data_rate(r, m, narrow, gi));
            prop_assert!(data_rate(r, m, narrow, GuardInterval::Short) >= data_rate(r, m, narrow, GuardInterval::Long));
        }
    }
}
