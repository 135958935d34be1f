//! CSV output for domain results and critical temperatures.
//!
//! Domain files hold one row per sample in visitation order: the swept
//! values, the verdict tag, then every metric any sample reported (blank
//! where a sample lacks it).

use crate::domain::{DomainResult, Sample};
use crate::temperature::TemperatureEstimate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Which samples end up in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleWritingMode {
    #[default]
    AllSamples,
    OperationalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteParams {
    pub operational_tag: String,
    pub non_operational_tag: String,
    pub mode: SampleWritingMode,
}

impl Default for WriteParams {
    fn default() -> Self {
        Self {
            operational_tag: "1".to_string(),
            non_operational_tag: "0".to_string(),
            mode: SampleWritingMode::AllSamples,
        }
    }
}

/// Write `domain` as CSV to `out`.
pub fn write_domain_csv<W: Write>(
    domain: &DomainResult,
    mut out: W,
    params: &WriteParams,
) -> io::Result<()> {
    let metric_names: BTreeSet<&str> = domain
        .samples()
        .iter()
        .flat_map(|s| s.metrics.keys().map(String::as_str))
        .collect();

    let mut header: Vec<&str> = domain
        .space()
        .dimensions()
        .iter()
        .map(|d| d.parameter.name())
        .collect();
    header.push("operational");
    header.extend(metric_names.iter().copied());
    writeln!(out, "{}", header.join(","))?;

    let rows = domain.samples().iter().filter(|s| match params.mode {
        SampleWritingMode::AllSamples => true,
        SampleWritingMode::OperationalOnly => s.is_operational(),
    });
    for sample in rows {
        writeln!(out, "{}", format_row(sample, &metric_names, params))?;
    }
    out.flush()
}

/// Write `domain` as CSV to the file at `path`, replacing it.
pub fn write_domain_csv_file<P: AsRef<Path>>(
    domain: &DomainResult,
    path: P,
    params: &WriteParams,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_domain_csv(domain, BufWriter::new(file), params)
}

/// Write the critical temperatures (K) and energy gaps (meV) under the
/// established and revised constants as a one-row CSV.
pub fn write_critical_temperature_csv<W: Write>(
    old: &TemperatureEstimate,
    new: &TemperatureEstimate,
    mut out: W,
) -> io::Result<()> {
    writeln!(
        out,
        "critical_temperature_old,critical_temperature_new,e_gap_old,e_gap_new"
    )?;
    writeln!(
        out,
        "{},{},{},{}",
        old.critical_temperature, new.critical_temperature, old.energy_gap, new.energy_gap
    )?;
    out.flush()
}

pub fn write_critical_temperature_csv_file<P: AsRef<Path>>(
    old: &TemperatureEstimate,
    new: &TemperatureEstimate,
    path: P,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_critical_temperature_csv(old, new, BufWriter::new(file))
}

fn format_row(sample: &Sample, metric_names: &BTreeSet<&str>, params: &WriteParams) -> String {
    let mut fields: Vec<String> = sample.values.iter().map(|v| v.to_string()).collect();
    fields.push(if sample.is_operational() {
        params.operational_tag.clone()
    } else {
        params.non_operational_tag.clone()
    });
    for name in metric_names {
        fields.push(
            sample
                .metrics
                .get(*name)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        );
    }
    fields.join(",")
}
