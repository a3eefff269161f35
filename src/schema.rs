use crate::AlgorithmLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// What a record was measured for: one algorithm, or all four back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordLabel {
    Algorithm(AlgorithmLabel),
    Multi(MultiTag),
}

/// Serializes as the literal `"multi"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiTag {
    Multi,
}

impl RecordLabel {
    pub const MULTI: RecordLabel = RecordLabel::Multi(MultiTag::Multi);

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordLabel::Algorithm(alg) => alg.as_str(),
            RecordLabel::Multi(_) => "multi",
        }
    }
}

impl From<AlgorithmLabel> for RecordLabel {
    fn from(alg: AlgorithmLabel) -> Self {
        RecordLabel::Algorithm(alg)
    }
}

impl fmt::Display for RecordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call time in nanoseconds.
///
/// In-process timings are computed here; external timings are the benchmark
/// binary's own per-iteration figure, carried through as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nanos {
    Measured(u64),
    Reported(String),
}

impl fmt::Display for Nanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nanos::Measured(ns) => write!(f, "{ns}"),
            Nanos::Reported(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    InProcess,
    External,
}

/// One normalized timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub image_label: String,
    pub algorithm_label: RecordLabel,
    pub nanoseconds_per_call: Nanos,
    pub source: Source,
}

/// `<image_label>_<algorithm_label>,<nanoseconds_per_call>`
impl fmt::Display for MeasurementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{},{}",
            self.image_label, self.algorithm_label, self.nanoseconds_per_call
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub repetitions: u64,
    pub hash_size: u32,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingReport {
    pub run: RunMeta,
    pub measurements: Vec<MeasurementRecord>,
}
