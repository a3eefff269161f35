//! Drives both measurement passes over the corpus.
//!
//! All in-process records (corpus order) come first, then a pass separator,
//! then all external records (corpus order). Measurements never overlap.

use crate::benches::{external, in_process};
use crate::benches::external::BenchmarkInvoker;
use crate::corpus::Corpus;
use crate::harness::RunConfig;
use crate::hashing::HashLibrary;
use crate::schema::MeasurementRecord;
use std::io::{self, Write};

/// Receives records as soon as each image finishes.
pub trait RecordSink {
    fn record(&mut self, record: &MeasurementRecord) -> io::Result<()>;

    /// Called once between the in-process and external passes.
    fn end_pass(&mut self) -> io::Result<()>;
}

/// Writes `<image>_<algorithm>,<ns>` lines and a blank line between passes.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for TextSink<W> {
    fn record(&mut self, record: &MeasurementRecord) -> io::Result<()> {
        writeln!(self.out, "{record}")?;
        self.out.flush()
    }

    fn end_pass(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Collects records in memory (used for the JSON report).
impl RecordSink for Vec<MeasurementRecord> {
    fn record(&mut self, record: &MeasurementRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn end_pass(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Passes {
    pub in_process: bool,
    pub external: bool,
}

impl Default for Passes {
    fn default() -> Self {
        Self {
            in_process: true,
            external: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub in_process_records: usize,
    pub external_records: usize,
}

pub struct Orchestrator<'a, L: HashLibrary, I: BenchmarkInvoker> {
    pub cfg: &'a RunConfig,
    pub library: &'a L,
    pub invoker: &'a I,
    pub passes: Passes,
    pub verbose: bool,
}

impl<'a, L: HashLibrary, I: BenchmarkInvoker> Orchestrator<'a, L, I> {
    pub fn new(cfg: &'a RunConfig, library: &'a L, invoker: &'a I) -> Self {
        Self {
            cfg,
            library,
            invoker,
            passes: Passes::default(),
            verbose: false,
        }
    }

    /// Run the enabled passes over `corpus`, streaming into `sink`.
    ///
    /// A hashing failure stops the whole run; external problems only reduce
    /// the number of external records.
    pub fn run<S: RecordSink + ?Sized>(&self, corpus: &Corpus, sink: &mut S) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        if self.passes.in_process {
            for image in corpus.images() {
                if self.verbose {
                    eprintln!(
                        "in-process {} ({} reps, hash size {})",
                        image.label, self.cfg.repetitions, self.cfg.hash_size
                    );
                }
                for rec in in_process::run(self.cfg, self.library, image)? {
                    sink.record(&rec)?;
                    summary.in_process_records += 1;
                }
            }
        }

        if self.passes.in_process && self.passes.external {
            sink.end_pass()?;
        }

        if self.passes.external {
            for image in corpus.images() {
                for rec in external::run(self.invoker, image, self.verbose) {
                    sink.record(&rec)?;
                    summary.external_records += 1;
                }
            }
        }

        Ok(summary)
    }
}
