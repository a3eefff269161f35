use clap::{Parser, Subcommand, ValueEnum};
use imagehash_timing_bench::benches::external::{self, SubprocessInvoker};
use imagehash_timing_bench::corpus::{self, Corpus, DEFAULT_CORPUS};
use imagehash_timing_bench::harness::RunConfig;
use imagehash_timing_bench::hashing::ImageHasherLibrary;
use imagehash_timing_bench::orchestrator::{Orchestrator, Passes, RecordSink, TextSink};
use imagehash_timing_bench::schema::{MeasurementRecord, RunMeta, TimingReport, SCHEMA_VERSION};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// `<image>_<algorithm>,<ns>` lines, blank line between passes.
    Text,
    /// Single JSON report.
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time every algorithm in-process, then via the external benchmark binary.
    Run {
        /// Directory holding the corpus images (and the working dir of the binary).
        #[arg(long, value_name = "DIR", default_value = ".")]
        corpus_dir: PathBuf,

        /// Image label to measure, in order. Defaults to 100px..8000px.
        #[arg(long = "image", value_name = "LABEL", action = clap::ArgAction::Append)]
        images: Vec<String>,

        /// Discover `<N>px` files in --corpus-dir instead of using labels.
        #[arg(long, default_value_t = false, conflicts_with = "images")]
        scan: bool,

        /// External benchmark binary.
        #[arg(long, value_name = "PATH", default_value = "./bm")]
        bm: PathBuf,

        #[arg(long, default_value_t = false)]
        skip_in_process: bool,

        #[arg(long, default_value_t = false)]
        skip_external: bool,
    },

    /// Normalize a saved capture of the external binary's CSV output.
    Parse {
        /// Image label the capture belongs to.
        #[arg(long, value_name = "LABEL")]
        label: String,

        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Write a deterministic synthetic corpus (one PNG per `<N>px` label).
    GenerateCorpus {
        #[arg(long, short = 'o', value_name = "DIR")]
        output: PathBuf,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Labels to generate. Defaults to 100px..8000px.
        #[arg(long = "image", value_name = "LABEL", action = clap::ArgAction::Append)]
        images: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "imagehash-timing-bench")]
#[command(about = "Per-call timings for ahash/phash/dhash/whash across an image corpus")]
struct Args {
    /// Timed calls per measurement.
    #[arg(long, default_value_t = 20, global = true,
          value_parser = clap::value_parser!(u64).range(1..))]
    repetitions: u64,

    #[arg(long, default_value_t = 8, global = true,
          value_parser = clap::value_parser!(u32).range(1..))]
    hash_size: u32,

    #[arg(long, value_enum, default_value_t = FormatArg::Text, global = true)]
    format: FormatArg,

    /// Where to write results. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Progress and external-run diagnostics on stderr.
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn now_utc_unix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn open_output(out: Option<&PathBuf>) -> io::Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

fn labels_or_default(images: &[String]) -> Vec<String> {
    if images.is_empty() {
        DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect()
    } else {
        images.to_vec()
    }
}

fn write_report(
    out: &mut dyn Write,
    cfg: &RunConfig,
    measurements: Vec<MeasurementRecord>,
) -> io::Result<()> {
    let report = TimingReport {
        run: RunMeta {
            schema_version: SCHEMA_VERSION,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            repetitions: cfg.repetitions,
            hash_size: cfg.hash_size,
            timestamp_utc: now_utc_unix(),
            git_sha: git_sha_short(),
        },
        measurements,
    };
    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    writeln!(out, "{json}")?;
    out.flush()
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let cfg = RunConfig {
        repetitions: args.repetitions,
        hash_size: args.hash_size,
        ..RunConfig::default()
    };

    match &args.cmd {
        Command::Run {
            corpus_dir,
            images,
            scan,
            bm,
            skip_in_process,
            skip_external,
        } => {
            let corpus = if *scan {
                Corpus::scan(corpus_dir)?
            } else {
                Corpus::from_labels(corpus_dir, &labels_or_default(images))
            };
            if corpus.is_empty() {
                return Err(io::Error::other(format!(
                    "no corpus images found in {}",
                    corpus_dir.display()
                )));
            }

            let library = ImageHasherLibrary;
            // The binary runs inside the corpus dir; pin its path first.
            let bm = fs::canonicalize(bm).unwrap_or_else(|_| bm.clone());
            let invoker = SubprocessInvoker::new(bm).in_dir(corpus_dir);
            let mut orch = Orchestrator::new(&cfg, &library, &invoker);
            orch.passes = Passes {
                in_process: !skip_in_process,
                external: !skip_external,
            };
            orch.verbose = args.verbose;

            let mut out = open_output(args.out.as_ref())?;
            match args.format {
                FormatArg::Text => {
                    let mut sink = TextSink::new(&mut out);
                    let summary = orch.run(&corpus, &mut sink)?;
                    if args.verbose {
                        eprintln!(
                            "{} images: {} in-process, {} external records",
                            corpus.len(),
                            summary.in_process_records,
                            summary.external_records
                        );
                    }
                }
                FormatArg::Json => {
                    let mut records: Vec<MeasurementRecord> = Vec::new();
                    orch.run(&corpus, &mut records)?;
                    write_report(&mut out, &cfg, records)?;
                }
            }
        }
        Command::Parse { label, path } => {
            let stdout = fs::read_to_string(path)?;
            let parsed = external::parse_rows(label, &stdout);
            if args.verbose {
                eprintln!(
                    "{}: {} rows, {} dropped",
                    path.display(),
                    parsed.records.len(),
                    parsed.dropped
                );
            }

            let mut out = open_output(args.out.as_ref())?;
            match args.format {
                FormatArg::Text => {
                    let mut sink = TextSink::new(&mut out);
                    for rec in &parsed.records {
                        sink.record(rec)?;
                    }
                }
                FormatArg::Json => write_report(&mut out, &cfg, parsed.records)?,
            }
        }
        Command::GenerateCorpus {
            output,
            seed,
            images,
        } => {
            let labels = labels_or_default(images);
            eprintln!(
                "Generating {} images in {} (seed={})...",
                labels.len(),
                output.display(),
                seed
            );
            let start = std::time::Instant::now();
            let corpus = corpus::generate_corpus(output, &labels, *seed)?;
            eprintln!(
                "Wrote {} images in {:.2}s",
                corpus.len(),
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
