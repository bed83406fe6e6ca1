/* Modulation and coding scheme vocabulary
 *
 * Names accepted here are the spellings used by the 802.11ah MCS table, not
 * the names emitted into generated code.
 * */
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
#[cfg(test)] use proptest::prelude::*;
#[cfg(test)] use proptest_derive::Arbitrary;

// Discriminant is the constellation size
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(test, derive(Arbitrary))]
#[repr(u16)]
#[rustfmt::skip]
pub enum Modulation {
    BPSK   = 2,
    QPSK   = 4,
    QAM16  = 16,
    QAM64  = 64,
    QAM256 = 256,
}

impl Modulation {
    pub fn constellation_size(self) -> u16 {
        self.into()
    }

    pub fn bits_per_symbol(self) -> u32 {
        self.constellation_size().trailing_zeros()
    }

    #[rustfmt::skip]
    pub fn name(self) -> &'static str {
        match self {
            Modulation::BPSK   => "BPSK",
            Modulation::QPSK   => "QPSK",
            Modulation::QAM16  => "16-QAM",
            Modulation::QAM64  => "64-QAM",
            Modulation::QAM256 => "256-QAM",
        }
    }
}

impl FromStr for Modulation {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BPSK" => Ok(Modulation::BPSK),
            "QPSK" => Ok(Modulation::QPSK),
            "16-QAM" => Ok(Modulation::QAM16),
            "64-QAM" => Ok(Modulation::QAM64),
            "256-QAM" => Ok(Modulation::QAM256),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum CodeRate {
    Half,
    TwoThirds,
    ThreeQuarters,
    FiveSixths,
}

impl CodeRate {
    /// (numerator, denominator)
    #[rustfmt::skip]
    pub fn ratio(self) -> (u64, u64) {
        match self {
            CodeRate::Half          => (1, 2),
            CodeRate::TwoThirds     => (2, 3),
            CodeRate::ThreeQuarters => (3, 4),
            CodeRate::FiveSixths    => (5, 6),
        }
    }

    #[rustfmt::skip]
    pub fn fraction(self) -> &'static str {
        match self {
            CodeRate::Half          => "1/2",
            CodeRate::TwoThirds     => "2/3",
            CodeRate::ThreeQuarters => "3/4",
            CodeRate::FiveSixths    => "5/6",
        }
    }

    /// The code rate the PHY lookup table carries for this rate.
    ///
    /// The S1G lookup table has always listed 2/3 entries as 3/4. That is kept
    /// unless `alias_two_thirds` is cleared.
    pub fn emitted(self, alias_two_thirds: bool) -> CodeRate {
        match self {
            CodeRate::TwoThirds if alias_two_thirds => CodeRate::ThreeQuarters,
            rate => rate,
        }
    }

    #[rustfmt::skip]
    pub fn symbol(self) -> &'static str {
        match self {
            CodeRate::Half          => "CODE_RATE_1_2",
            CodeRate::TwoThirds     => "CODE_RATE_2_3",
            CodeRate::ThreeQuarters => "CODE_RATE_3_4",
            CodeRate::FiveSixths    => "CODE_RATE_5_6",
        }
    }
}

impl FromStr for CodeRate {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1/2" => Ok(CodeRate::Half),
            "2/3" => Ok(CodeRate::TwoThirds),
            "3/4" => Ok(CodeRate::ThreeQuarters),
            "5/6" => Ok(CodeRate::FiveSixths),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CodeRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.fraction())
    }
}

// Discriminant is the channel width in MHz
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(test, derive(Arbitrary))]
#[repr(u8)]
#[rustfmt::skip]
pub enum Bandwidth {
    MHz1  = 1,
    MHz2  = 2,
    MHz4  = 4,
    MHz8  = 8,
    MHz16 = 16,
}

impl Bandwidth {
    pub const ALL: [Bandwidth; 5] = [
        Bandwidth::MHz1,
        Bandwidth::MHz2,
        Bandwidth::MHz4,
        Bandwidth::MHz8,
        Bandwidth::MHz16,
    ];

    pub fn mhz(self) -> u8 {
        self.into()
    }

    /// b such that the width is 2^b MHz
    pub fn index(self) -> usize {
        self.mhz().trailing_zeros() as usize
    }

    pub fn from_index(b: usize) -> Option<Self> {
        Self::ALL.get(b).copied()
    }

    #[rustfmt::skip]
    pub fn usable_subcarriers(self) -> u32 {
        match self {
            Bandwidth::MHz1  => 24,
            Bandwidth::MHz2  => 52,
            Bandwidth::MHz4  => 108,
            Bandwidth::MHz8  => 234,
            Bandwidth::MHz16 => 468,
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} MHz", self.mhz())
    }
}

/// Which of the paired rate columns of the table is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardInterval {
    /// 8 us, the columns the S1G PHY is built from
    #[default]
    Long,
    /// 4 us
    Short,
}

impl GuardInterval {
    pub fn nanoseconds(self) -> u32 {
        match self {
            GuardInterval::Long => 8_000,
            GuardInterval::Short => 4_000,
        }
    }

    pub fn column_offset(self) -> usize {
        match self {
            GuardInterval::Long => 0,
            GuardInterval::Short => 1,
        }
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn bandwidth_index_inverse(bw: Bandwidth) {
        assert_eq!(Some(bw), Bandwidth::from_index(bw.index()));
        assert_eq!(u32::from(bw.mhz()), 2_u32.pow(bw.index() as u32));
    }

    #[test]
    fn modulation_name_parses(m: Modulation) {
        assert_eq!(Ok(m), m.name().parse());
    }

    #[test]
    fn code_rate_fraction_parses(r: CodeRate) {
        assert_eq!(Ok(r), r.fraction().parse());
    }

    #[test]
    fn emitted_without_alias_is_identity(r: CodeRate) {
        assert_eq!(r, r.emitted(false));
    }
}

#[test]
fn constellation_sizes() {
    assert_eq!(2, Modulation::BPSK.constellation_size());
    assert_eq!(4, Modulation::QPSK.constellation_size());
    assert_eq!(16, Modulation::QAM16.constellation_size());
    assert_eq!(64, Modulation::QAM64.constellation_size());
    assert_eq!(256, Modulation::QAM256.constellation_size());
    assert_eq!(8, Modulation::QAM256.bits_per_symbol());
}

#[test]
fn modulation_names_are_exact() {
    assert!("bpsk".parse::<Modulation>().is_err());
    assert!("16QAM".parse::<Modulation>().is_err());
    assert!("QAM-16".parse::<Modulation>().is_err());
}

#[test]
fn two_thirds_aliases_to_three_quarters() {
    assert_eq!("CODE_RATE_3_4", CodeRate::TwoThirds.emitted(true).symbol());
    assert_eq!("CODE_RATE_2_3", CodeRate::TwoThirds.emitted(false).symbol());
    assert_eq!("CODE_RATE_5_6", CodeRate::FiveSixths.emitted(true).symbol());
}

#[test]
fn discriminants_are_physical() {
    assert_eq!(Some(Modulation::QAM64), Modulation::try_from(64_u16).ok());
    assert!(Modulation::try_from(8_u16).is_err());
    assert_eq!(Some(Bandwidth::MHz8), Bandwidth::try_from(8_u8).ok());
    assert!(Bandwidth::try_from(3_u8).is_err());
}
