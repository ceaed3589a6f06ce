// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! probemap CLI
//!
//! Command-line interface for resolving genome alignments to genes.

use clap::{Parser, Subcommand};
use ferro_probemap::annotation::MockAnnotationStore;
use ferro_probemap::batch::{BatchConfig, BatchProcessor, BatchResult, ItemResult, SequenceMapping};
use ferro_probemap::cli::{
    output_associations, output_error, output_header, parse_reporter_line, parse_sequence_line,
    table_line, OutputFormat,
};
use ferro_probemap::model::{AlignmentHit, QuerySequence, Taxon};
use ferro_probemap::psl::{to_hits, PslReader, PslRecord};
use ferro_probemap::sequence::collapse_reporters;
use ferro_probemap::{
    AnnotationStore, ProbeMapError, ProbeMapper, ProbeMapperConfig, ThreePrimeMethod,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "probemap")]
#[command(author, version, about = "Resolve genome alignments of sequences to genes")]
#[command(
    long_about = "Resolve BLAT alignments of probes, ESTs and mRNAs to annotated gene products.

Examples:
  probemap map --psl hits.psl.gz --annotations hg38.json
  probemap map --psl hits.psl --annotations hg38.json --sequences probes.tsv -f json
  probemap map --accessions accessions.txt --annotations hg38.json
  probemap config -o .probemap.toml
  probemap collapse -i reporters.tsv"
)]
struct Cli {
    /// Log level filter (e.g. info, debug, ferro_probemap=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map alignment hits or stored accessions to gene products
    Map {
        /// PSL alignments (optionally gzipped)
        #[arg(long, required_unless_present = "accessions", conflicts_with = "accessions")]
        psl: Option<PathBuf>,

        /// File of GenBank accessions, one per line, mapped by stored alignments
        #[arg(long)]
        accessions: Option<PathBuf>,

        /// Annotation snapshot (JSON)
        #[arg(long)]
        annotations: PathBuf,

        /// Sequence table: name, length, type, repeat fraction (tab-separated)
        #[arg(long)]
        sequences: Option<PathBuf>,

        /// Configuration file (default: search .probemap.toml, ~/.config/ferro/probemap.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "tsv", value_parser = ["tsv", "json"])]
        format: String,

        /// Minimum alignment score
        #[arg(long)]
        blat_score_threshold: Option<f64>,

        /// Minimum alignment identity
        #[arg(long)]
        identity_threshold: Option<f64>,

        /// Minimum fraction of aligned bases in exons (0 disables)
        #[arg(long)]
        min_exon_overlap: Option<f64>,

        /// How to measure the distance to the 3' end (right or middle)
        #[arg(long)]
        three_prime_method: Option<String>,

        /// Ignore alignment strand for all sequence types
        #[arg(long)]
        ignore_strand: bool,

        /// Do not create provisional regions
        #[arg(long)]
        no_provisional: bool,

        /// Do not consult gene prediction tracks
        #[arg(long)]
        no_predicted: bool,

        /// Worker threads (requires the parallel feature; 0 = rayon default)
        #[arg(long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print or write the effective configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge overlapping reporter sequences into one sequence
    Collapse {
        /// Reporter table: name, sequence, start in parent (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Map {
            psl,
            accessions,
            annotations,
            sequences,
            config,
            output,
            format,
            blat_score_threshold,
            identity_threshold,
            min_exon_overlap,
            three_prime_method,
            ignore_strand,
            no_provisional,
            no_predicted,
            threads,
            quiet,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(v) = blat_score_threshold {
                config.blat_score_threshold = v;
            }
            if let Some(v) = identity_threshold {
                config.identity_threshold = v;
            }
            if let Some(v) = min_exon_overlap {
                config.minimum_exon_overlap_fraction = v;
            }
            if let Some(method) = three_prime_method {
                config.three_prime_method = ThreePrimeMethod::from_str(&method)?;
            }
            config.ignore_strand |= ignore_strand;
            config.allow_provisional &= !no_provisional;
            config.allow_predicted &= !no_predicted;

            let options = MapOptions {
                format: OutputFormat::from_str(&format)?,
                output,
                threads,
                quiet,
            };
            let store = MockAnnotationStore::from_json(&annotations)?;
            info!("Loaded annotations from {}", annotations.display());
            let mapper = ProbeMapper::new(store, config)?;

            match (psl, accessions) {
                (Some(psl), _) => run_map_psl(mapper, &psl, sequences.as_deref(), &options),
                (None, Some(accessions)) => run_map_accessions(mapper, &accessions, &options),
                (None, None) => Err("either --psl or --accessions is required".into()),
            }
        }
        Commands::Config { output } => run_config(output.as_deref()),
        Commands::Collapse { input } => run_collapse(&input),
    }
}

struct MapOptions {
    format: OutputFormat,
    output: Option<PathBuf>,
    threads: Option<usize>,
    quiet: bool,
}

impl MapOptions {
    fn writer(&self) -> io::Result<Box<dyn Write>> {
        Ok(match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout())),
        })
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style);
        }
        pb
    }
}

fn load_config(path: Option<&Path>) -> Result<ProbeMapperConfig, ProbeMapError> {
    match path {
        Some(path) => ProbeMapperConfig::from_file(path),
        None => Ok(ProbeMapperConfig::load()?.unwrap_or_default()),
    }
}

fn open_lines(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn read_sequence_table(path: &Path, taxon: &Taxon) -> Result<HashMap<String, QuerySequence>, ProbeMapError> {
    let mut table = HashMap::new();
    for (i, line) in open_lines(path)?.lines().enumerate() {
        let line = line?;
        let Some(line) = table_line(&line, i == 0) else {
            continue;
        };
        match parse_sequence_line(line) {
            Ok(seq) => {
                table.insert(seq.name.clone(), seq.with_taxon(taxon.clone()));
            }
            Err(e) => warn!("{}:{}: {}", path.display(), i + 1, e),
        }
    }
    Ok(table)
}

fn read_hits(
    psl: &Path,
    known: &HashMap<String, QuerySequence>,
    taxon: &Taxon,
) -> Result<Vec<AlignmentHit>, ProbeMapError> {
    let mut records: Vec<PslRecord> = Vec::new();
    for record in PslReader::open(psl)? {
        match record {
            Ok(record) => records.push(record),
            Err(e) => warn!("{}: {}", psl.display(), e),
        }
    }

    let mut known = known.clone();
    for record in &records {
        known
            .entry(record.q_name.clone())
            .or_insert_with(|| record.query_sequence().with_taxon(taxon.clone()));
    }

    let mut hits = Vec::with_capacity(records.len());
    for result in to_hits(&records, &known) {
        match result {
            Ok(hit) => hits.push(hit),
            Err(e) => warn!("Skipping alignment: {}", e),
        }
    }
    info!("Read {} hits from {}", hits.len(), psl.display());
    Ok(hits)
}

fn run_map_psl(
    mapper: ProbeMapper<MockAnnotationStore>,
    psl: &Path,
    sequences: Option<&Path>,
    options: &MapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let taxon = mapper.lookup().store().taxon().clone();
    let known = match sequences {
        Some(path) => read_sequence_table(path, &taxon)?,
        None => HashMap::new(),
    };
    let hits = read_hits(psl, &known, &taxon)?;

    #[cfg(feature = "parallel")]
    if let Some(threads) = options.threads {
        return write_parallel(&mapper, hits, threads, options);
    }
    #[cfg(not(feature = "parallel"))]
    if options.threads.is_some() {
        warn!("--threads ignored: built without the parallel feature");
    }

    let processor = BatchProcessor::with_config(mapper, BatchConfig::new().progress_interval(50));
    let pb = options.progress_bar(0);
    let result = processor.map_hits_with_progress(hits, |progress| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.processed as u64);
        pb.set_message(format!("{} failed", progress.errors));
    });
    pb.finish_and_clear();

    write_batch(result, options)
}

#[cfg(feature = "parallel")]
fn write_parallel(
    mapper: &ProbeMapper<MockAnnotationStore>,
    hits: Vec<AlignmentHit>,
    threads: usize,
    options: &MapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    use ferro_probemap::parallel::{map_hits_parallel, ParallelConfig, ParallelStats};

    let outcome = ParallelConfig::new()
        .with_num_threads(threads)
        .install(|| map_hits_parallel(mapper, hits))?;
    let mut writer = options.writer()?;
    output_header(&mut writer, options.format)?;
    let mut names: Vec<&String> = outcome.associations.keys().collect();
    names.sort();
    for name in names {
        output_associations(&mut writer, &outcome.associations[name], options.format)?;
    }
    for failure in &outcome.failures {
        output_error(&mut io::stderr(), &failure.sequence, &failure.error, options.format)?;
    }
    writer.flush()?;

    let stats = ParallelStats::from(&outcome);
    eprintln!(
        "{} sequences: {} mapped, {} unmapped, {} failed",
        stats.total, stats.mapped, stats.unmapped, stats.errors
    );
    Ok(())
}

fn run_map_accessions(
    mapper: ProbeMapper<MockAnnotationStore>,
    path: &Path,
    options: &MapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut accessions = Vec::new();
    for (i, line) in open_lines(path)?.lines().enumerate() {
        let line = line?;
        if let Some(accession) = table_line(&line, i == 0) {
            accessions.push(accession.to_string());
        }
    }

    let processor = BatchProcessor::with_config(mapper, BatchConfig::new().progress_interval(10));
    let pb = options.progress_bar(accessions.len());
    let result = processor.map_accessions_with_progress(&accessions, |progress| {
        pb.set_position(progress.processed as u64);
    });
    pb.finish_and_clear();

    write_batch(result, options)
}

fn write_batch(
    result: BatchResult<SequenceMapping>,
    options: &MapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mapped = result.mapped_count();
    let unmapped = result.unmapped_count();
    let failed = result.error_count();
    let duration = result.duration;

    let mut writer = options.writer()?;
    let mut stderr = io::stderr();
    output_header(&mut writer, options.format)?;
    for item in result.results {
        match item {
            ItemResult::Ok(mapping) => {
                output_associations(&mut writer, &mapping.associations, options.format)?
            }
            ItemResult::Err { input, error } => output_error(
                &mut stderr,
                input.as_deref().unwrap_or("<unknown>"),
                &error,
                options.format,
            )?,
        }
    }
    writer.flush()?;

    eprintln!(
        "{} mapped, {} unmapped, {} failed in {:.2}s",
        mapped,
        unmapped,
        failed,
        duration.as_secs_f64()
    );
    Ok(())
}

fn run_config(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ProbeMapperConfig::load()?.unwrap_or_default();
    match output {
        Some(path) => {
            config.to_file(path)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}

fn run_collapse(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut reporters = Vec::new();
    for (i, line) in open_lines(input)?.lines().enumerate() {
        let line = line?;
        if let Some(line) = table_line(&line, i == 0) {
            reporters.push(parse_reporter_line(line)?);
        }
    }
    let collapsed = collapse_reporters(&reporters)?;
    println!("{}", collapsed);
    Ok(())
}
