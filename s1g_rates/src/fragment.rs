/* Generated code fragments
 *
 * Each fragment is pasted by hand into the S1G OFDM PHY sources. The default
 * naming reproduces the text already present there byte for byte.
 * */
use crate::config::Naming;
use crate::mcs::Bandwidth;
use crate::record::RateRecord;
use crate::*;
use std::fmt::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Static accessor declarations for the PHY header
    Declarations,
    /// `m_s1gOfdmModulationLookupTable` initializer rows
    LookupTable,
    /// One mode-defining macro invocation per rate
    ModeMacros,
    /// Rates in bps, grouped by channel width
    RateList,
    /// Body of the `switch (bw)` mapping (rate, width) to an accessor
    RateSwitch,
}

impl Fragment {
    pub const ALL: [Fragment; 5] = [
        Fragment::Declarations,
        Fragment::LookupTable,
        Fragment::ModeMacros,
        Fragment::RateList,
        Fragment::RateSwitch,
    ];

    pub fn write(self, w: &mut impl Write, records: &[RateRecord], naming: &Naming) -> fmt::Result {
        match self {
            Fragment::Declarations => declarations(w, records, naming),
            Fragment::LookupTable => lookup_table(w, records, naming),
            Fragment::ModeMacros => mode_macros(w, records, naming),
            Fragment::RateList => rate_list(w, records),
            Fragment::RateSwitch => rate_switch(w, records, naming),
        }
    }

    pub fn render(self, records: &[RateRecord], naming: &Naming) -> Result<String> {
        let mut text = String::new();
        self.write(&mut text, records, naming)?;
        Ok(text)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Fragment::Declarations => "declarations",
            Fragment::LookupTable => "lookup table",
            Fragment::ModeMacros => "mode macros",
            Fragment::RateList => "rate list",
            Fragment::RateSwitch => "rate switch",
        };
        f.write_str(name)
    }
}

fn at(records: &[RateRecord], bandwidth: Bandwidth) -> impl Iterator<Item = &RateRecord> {
    records.iter().filter(move |r| r.bandwidth() == bandwidth)
}

fn declarations(w: &mut impl Write, records: &[RateRecord], naming: &Naming) -> fmt::Result {
    for r in records {
        writeln!(
            w,
            "        static {} {}{} ();",
            naming.mode_type,
            naming.accessor_prefix,
            r.symbol_name()
        )?;
    }
    Ok(())
}

fn lookup_table(w: &mut impl Write, records: &[RateRecord], naming: &Naming) -> fmt::Result {
    for r in records {
        writeln!(
            w,
            "      {{\"{}\",\t{{{}{},\t{}}}}},",
            r.symbol_name(),
            naming.code_rate_prefix,
            r.code_rate_symbol(),
            r.constellation_size()
        )?;
    }
    Ok(())
}

fn mode_macros(w: &mut impl Write, records: &[RateRecord], naming: &Naming) -> fmt::Result {
    for r in records {
        writeln!(
            w,
            "{} ({}, {})",
            naming.mode_macro,
            r.symbol_name(),
            naming.mandatory
        )?;
    }
    Ok(())
}

fn rate_list(w: &mut impl Write, records: &[RateRecord]) -> fmt::Result {
    for bandwidth in Bandwidth::ALL {
        write!(w, "                {{{}, {{", bandwidth.mhz())?;
        for r in at(records, bandwidth) {
            write!(w, "{},", r.bits_per_second())?;
        }
        writeln!(w, "}}}},")?;
    }
    Ok(())
}

fn rate_switch(w: &mut impl Write, records: &[RateRecord], naming: &Naming) -> fmt::Result {
    for bandwidth in Bandwidth::ALL {
        writeln!(w, "    case {}:", bandwidth.mhz())?;
        writeln!(w, "      switch (rate)")?;
        writeln!(w, "      {{")?;
        for r in at(records, bandwidth) {
            writeln!(w, "        case {}:", r.bits_per_second())?;
            writeln!(
                w,
                "          return {}{}();",
                naming.accessor_prefix,
                r.symbol_name()
            )?;
        }
        writeln!(w, "        default:")?;
        writeln!(
            w,
            "          {} (\"Inexistent rate (\" << rate << \" bps) requested for s1g OFDM (default)\");",
            naming.abort_macro
        )?;
        writeln!(w, "          return {} ();", naming.mode_type)?;
        writeln!(w, "      }}")?;
    }
    Ok(())
}

#[cfg(test)]
fn fixture() -> Vec<RateRecord> {
    let text = "0,1,BPSK,1/2,0.3,0.33,0.65,0.72,0,0,0,0,0,0\n\
                5,1,64-QAM,2/3,2.4,2.67,0,0,0,0,0,0,0,0\n";
    let entries = table::parse(text, &config::Table::default()).unwrap();
    record::enrich(&entries, &Naming::default()).unwrap()
}

#[test]
fn declarations_shape() {
    let text = Fragment::Declarations.render(&fixture(), &Naming::default()).unwrap();
    assert_eq!(
        "        static WifiMode GetS1gOfdmRate0_30MbpsBW1MHz ();\n\
         \x20       static WifiMode GetS1gOfdmRate2_40MbpsBW1MHz ();\n\
         \x20       static WifiMode GetS1gOfdmRate0_65MbpsBW2MHz ();\n",
        text
    );
}

#[test]
fn lookup_table_shape() {
    let text = Fragment::LookupTable.render(&fixture(), &Naming::default()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(3, lines.len());
    assert_eq!("      {\"S1gOfdmRate0_30MbpsBW1MHz\",\t{WIFI_CODE_RATE_1_2,\t2}},", lines[0]);
    assert_eq!("      {\"S1gOfdmRate2_40MbpsBW1MHz\",\t{WIFI_CODE_RATE_3_4,\t64}},", lines[1]);
    assert_eq!("      {\"S1gOfdmRate0_65MbpsBW2MHz\",\t{WIFI_CODE_RATE_1_2,\t2}},", lines[2]);
}

#[test]
fn mode_macros_shape() {
    let naming = Naming {
        mandatory: false,
        ..Default::default()
    };
    let text = Fragment::ModeMacros.render(&fixture(), &naming).unwrap();
    assert_eq!(
        "GET_S1G_OFDM_MODE (S1gOfdmRate0_30MbpsBW1MHz, false)\n\
         GET_S1G_OFDM_MODE (S1gOfdmRate2_40MbpsBW1MHz, false)\n\
         GET_S1G_OFDM_MODE (S1gOfdmRate0_65MbpsBW2MHz, false)\n",
        text
    );
}

#[test]
fn rate_list_covers_every_width() {
    let text = Fragment::RateList.render(&fixture(), &Naming::default()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        vec![
            "                {1, {300000,2400000,}},",
            "                {2, {650000,}},",
            "                {4, {}},",
            "                {8, {}},",
            "                {16, {}},",
        ],
        lines
    );
}

#[test]
fn rate_switch_shape() {
    let text = Fragment::RateSwitch.render(&fixture(), &Naming::default()).unwrap();
    let expected_head = "    case 1:
      switch (rate)
      {
        case 300000:
          return GetS1gOfdmRate0_30MbpsBW1MHz();
        case 2400000:
          return GetS1gOfdmRate2_40MbpsBW1MHz();
        default:
          NS_ABORT_MSG (\"Inexistent rate (\" << rate << \" bps) requested for s1g OFDM (default)\");
          return WifiMode ();
      }
    case 2:
";
    assert!(text.starts_with(expected_head), "{}", text);
    assert_eq!(5, text.matches("switch (rate)").count());
    assert_eq!(5, text.matches("        default:").count());
    assert!(text.ends_with("    case 16:\n      switch (rate)\n      {\n        default:\n          NS_ABORT_MSG (\"Inexistent rate (\" << rate << \" bps) requested for s1g OFDM (default)\");\n          return WifiMode ();\n      }\n"));
}

#[test]
fn empty_records_still_render() {
    for fragment in Fragment::ALL {
        let text = fragment.render(&[], &Naming::default()).unwrap();
        match fragment {
            Fragment::RateList | Fragment::RateSwitch => assert!(!text.is_empty()),
            _ => assert!(text.is_empty()),
        }
    }
}
