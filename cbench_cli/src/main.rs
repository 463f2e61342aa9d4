use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cbench_codecs::{default_registry, DEFAULT_ALIAS};
use cbench_core::config::{KB, MB};
use cbench_core::{
    render, run_benchmark, BenchConfig, InputFile, OutputFormat, Preprocessor, Registry, SortKey,
    TimeStat,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cbench",
    about = "Compression benchmark: ratio, compression and decompression speed of many codecs",
    version
)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Benchmark an encoder list against one or more files
    Bench(BenchArgs),
    /// Print the codec catalog and aliases
    List,
}

#[derive(clap::Args, Debug)]
struct BenchArgs {
    /// Input files
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Encoder list: `/`-separated `name[,level...]` entries or aliases
    #[arg(short = 'e', long, default_value = DEFAULT_ALIAS)]
    encoders: String,
    /// Chunk size in KiB (0 = whole file)
    #[arg(short = 'b', long, default_value_t = 0)]
    chunk_kib: usize,
    /// Iteration caps as `compress,decompress` (one value sets both)
    #[arg(short = 'i', long, default_value = "1,1", value_parser = parse_pair)]
    iterations: (u32, u32),
    /// Minimum cumulative time in ms as `compress,decompress`
    #[arg(short = 't', long, default_value = "0,0", value_parser = parse_pair)]
    min_time: (u32, u32),
    /// Repeat each pass until this many ms elapse and report the mean
    #[arg(short = 'l', long, default_value_t = 0)]
    loop_ms: u64,
    /// Abandon an invocation whose first compression runs slower (MB/s)
    #[arg(short = 's', long, default_value_t = 0)]
    speed_threshold: u64,
    /// Output buffer limit per invocation in MiB (0 = unlimited)
    #[arg(short = 'm', long, default_value_t = 0)]
    mem_limit_mib: usize,
    /// Worker threads
    #[arg(short = 'T', long, default_value_t = 1)]
    threads: usize,
    /// Reported statistic: fastest | average | median
    #[arg(short = 'p', long, default_value = "fastest")]
    stat: TimeStat,
    /// Output format: markdown | text | textfull | csv | turbobench | markdown2
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,
    /// Sort key: name | ctime | dtime | size | original
    #[arg(short = 'c', long)]
    sort: Option<SortKey>,
    /// Skip round-trip verification
    #[arg(short = 'U', long)]
    unverified: bool,
    /// Only measure compression
    #[arg(short = 'z', long)]
    compress_only: bool,
    /// Preprocess inputs: delta1 | delta2 | delta4 | delta8 (repeatable)
    #[arg(short = 'd', long = "preprocess")]
    preprocessors: Vec<Preprocessor>,
    /// Benchmark all files concatenated as one input
    #[arg(short = 'j', long)]
    join: bool,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{v}' is not a non-negative integer"))
    };
    match s.split_once(',') {
        Some((c, d)) => Ok((parse(c)?, parse(d)?)),
        None => {
            let v = parse(s)?;
            Ok((v, v))
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

impl BenchArgs {
    fn config(&self) -> BenchConfig {
        let mut config = BenchConfig::default();
        config
            .set_chunk_size(self.chunk_kib.saturating_mul(KB))
            .set_iterations(self.iterations.0, self.iterations.1)
            .set_min_time(
                Duration::from_millis(self.min_time.0.into()),
                Duration::from_millis(self.min_time.1.into()),
            )
            .set_loop_time(Duration::from_millis(self.loop_ms))
            .set_speed_threshold(self.speed_threshold.saturating_mul(1_000_000))
            .set_mem_limit(self.mem_limit_mib.saturating_mul(MB))
            .set_threads(self.threads)
            .set_time_stat(self.stat)
            .set_format(self.format)
            .set_sort(self.sort)
            .set_verify(!self.unverified)
            .set_compress_only(self.compress_only);
        for p in &self.preprocessors {
            config.add_preprocessor(*p);
        }
        config
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn load_inputs(files: &[PathBuf], join: bool) -> anyhow::Result<Vec<InputFile>> {
    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let data =
            std::fs::read(path).with_context(|| format!("reading input file {:?}", path))?;
        info!("loaded {} ({})", path.display(), human_bytes(data.len() as u64));
        inputs.push(InputFile::new(path.display().to_string(), data));
    }
    if join && inputs.len() > 1 {
        inputs = vec![InputFile::join(inputs)];
    }
    Ok(inputs)
}

fn run_bench(args: BenchArgs) -> anyhow::Result<()> {
    let config = args.config();
    let inputs = load_inputs(&args.files, args.join)?;
    let total: u64 = inputs.iter().map(|f| f.data.len() as u64).sum();

    let registry = default_registry();
    let t0 = Instant::now();
    let table = run_benchmark(&registry, &config, &args.encoders, inputs)?;
    info!(
        "benchmarked {} in {:.2}s: {} rows, {} failures",
        human_bytes(total),
        t0.elapsed().as_secs_f64(),
        table.rows().len(),
        table.failures().len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&table, config.format, &mut out).context("writing report")?;
    out.flush()?;

    if table.rows().is_empty() && !table.failures().is_empty() {
        anyhow::bail!("no invocation succeeded");
    }
    Ok(())
}

fn write_catalog(registry: &Registry, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Codecs:")?;
    writeln!(
        out,
        "  {:<14} {:<8} {:>7} {:>12}  notes",
        "name", "version", "levels", "max block"
    )?;
    for c in registry.codecs() {
        let levels = if c.first_level == c.last_level {
            "-".to_string()
        } else {
            format!("{}-{}", c.first_level, c.last_level)
        };
        let max_block = if c.max_block_size == 0 {
            "-".to_string()
        } else {
            human_bytes(c.max_block_size as u64)
        };
        let mut notes = Vec::new();
        if c.additional_param != 0 {
            notes.push(format!("param {}", c.additional_param));
        }
        if c.query_only {
            notes.push("query-only".to_string());
        }
        writeln!(
            out,
            "  {:<14} {:<8} {:>7} {:>12}  {}",
            c.name,
            c.version,
            levels,
            max_block,
            notes.join(", ")
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Aliases:")?;
    for a in registry.aliases() {
        writeln!(out, "  {:<14} {}", a.name, a.expansion)?;
    }
    Ok(())
}

fn run_list() -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_catalog(&default_registry(), &mut out).context("writing catalog")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Bench(args) => run_bench(args),
        Commands::List => run_list(),
    }
}
