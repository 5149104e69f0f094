use std::io::{self, Write};

use tabled::{Table, Tabled};
use tabled::settings::{Alignment, Height, object::{Columns, Rows}, style::Style};

use crate::metrics::TrafficInfo;

const DIVIDER: &str = "------------------------------------------------";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Table,
}

pub struct Stat {
    vlans: Vec<(String, TrafficInfo)>,
}

impl Stat {
    pub fn new() -> Stat {
        Stat {
            vlans: Vec::new(),
        }
    }

    pub fn add(&mut self, vlan: &str, info: TrafficInfo) {
        self.vlans.push((vlan.to_owned(), info));
    }

    pub fn print(&self, format: OutputFormat) {
        let mut stdout = io::stdout().lock();
        let _ = self.write(&mut stdout, format);
    }

    pub fn write<W: Write>(&self, writer: &mut W, format: OutputFormat) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.write_text(writer),
            OutputFormat::Table => self.write_table(writer),
        }
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (index, (vlan, info)) in self.vlans.iter().enumerate() {
            if index != 0 {
                writeln!(writer, "\n{DIVIDER}\n")?;
            }

            writeln!(writer, "info vlan {vlan} (Gb):")?;
            for (name, value) in [
                ("maximum:", info.maximum),
                ("mean:", info.mean),
                ("fact mean:", info.fact_mean),
                ("percentile:", info.percentile95),
            ] {
                writeln!(writer, "{name:<13} {value:?}")?;
            }
        }

        Ok(())
    }

    fn write_table<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let rows: Vec<_> = self.vlans.iter().map(|(vlan, info)| StatRow {
            vlan: vlan.clone(),
            maximum: format_gb(info.maximum),
            mean: format_gb(info.mean),
            fact_mean: format_gb(info.fact_mean),
            percentile95: format_gb(info.percentile95),
        }).collect();

        let mut table = Table::new(&rows);
        table.with(Style::blank());
        table.modify(Rows::first(), Height::increase(2));
        table.modify(Columns::new(1..), Alignment::right());

        writeln!(writer, "{}", table)
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "VLAN")]
    vlan: String,

    #[tabled(rename = "Maximum (Gb)")]
    maximum: String,

    #[tabled(rename = "Mean (Gb)")]
    mean: String,

    #[tabled(rename = "Fact mean (Gb)")]
    fact_mean: String,

    #[tabled(rename = "95th percentile (Gb)")]
    percentile95: String,
}

fn format_gb(value: f64) -> String {
    format!("{value:.3}")
}
