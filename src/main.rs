use anyhow::{Context, Result};
use clap::Parser;
use lookup_bench::{
    DEFAULT_SEED, Recorder, generate_dataset, generate_queries,
    report::{render_summary, write_table},
    standard_strategies,
};
use std::{fs::File, io::BufWriter, path::PathBuf};
use tracing::{Level, error, info};

#[derive(Parser, Debug)]
#[command(name = "lookup-bench", about = "Times lookup strategies against growing key sets")]
struct Cli {
    /// Number of records in the dataset; ids are i32, so at most i32::MAX.
    #[arg(long, default_value_t = 100_000, value_parser = clap::value_parser!(u32).range(..=i32::MAX as i64))]
    total: u32,

    /// Number of queries; query i samples (total / 100) * (i + 1) ids.
    #[arg(long, default_value_t = 10)]
    rounds: usize,

    /// Seed for key sampling.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Worker threads for the parallel strategies.
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Write the CSV report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also print setup time and per-run lines for each strategy.
    #[arg(long)]
    summary: bool,

    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let threads = cli.threads.max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("building rayon pool")?;

    let total = cli.total as usize;
    info!(total, "generating data");
    let dataset = generate_dataset(total)?;
    info!(rounds = cli.rounds, seed = cli.seed, "generating ids for query");
    let queries = generate_queries(total, cli.rounds, cli.seed)?;

    let mut strategies = standard_strategies(threads);
    let mut recorder = Recorder::new();

    info!("setup");
    for strategy in strategies.iter_mut() {
        let elapsed = recorder
            .time_setup(strategy.as_mut(), dataset.clone())
            .with_context(|| format!("setting up {}", strategy.name()))?;
        info!(strategy = strategy.name(), ?elapsed, "ready");
    }

    for strategy in &strategies {
        info!(strategy = strategy.name(), "performing");
        for keys in &queries {
            recorder
                .time_query(strategy.as_ref(), keys)
                .with_context(|| format!("querying {}", strategy.name()))?;
        }
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_table(&recorder, BufWriter::new(file))?;
            info!(path = %path.display(), "report written");
        }
        None => write_table(&recorder, std::io::stdout().lock())?,
    }
    if cli.summary {
        print!("{}", render_summary(&recorder));
    }

    if let Err(err) = recorder.verify_agreement() {
        error!(%err, "strategies disagree");
        return Err(err.into());
    }
    info!("all strategies agree");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn total_is_bounded_by_i32() {
        let max = i32::MAX.to_string();
        let cli = Cli::try_parse_from(["lookup-bench", "--total", max.as_str()]).unwrap();
        assert_eq!(cli.total as i64, i32::MAX as i64);
        assert!(Cli::try_parse_from(["lookup-bench", "--total", "2147483648"]).is_err());
        assert!(Cli::try_parse_from(["lookup-bench", "--total", "3000000000"]).is_err());
        assert!(Cli::try_parse_from(["lookup-bench", "--total", "-1"]).is_err());
    }

    #[test]
    fn defaults_match_the_reference_run() {
        let cli = Cli::try_parse_from(["lookup-bench"]).unwrap();
        assert_eq!((cli.total, cli.rounds, cli.seed), (100_000, 10, DEFAULT_SEED));
        assert!(cli.threads >= 1);
    }
}
