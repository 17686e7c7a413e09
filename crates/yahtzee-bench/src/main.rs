use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use yahtzee_bench::config::BenchmarkConfig;
use yahtzee_bench::logging::init_telemetry;
use yahtzee_bench::tournament::GameRunner;

/// Plays seeded Yahtzee games between bot strengths and reports how they compare.
#[derive(Debug, Parser)]
#[command(name = "yahtzee-bench", version)]
struct Cli {
    /// YAML run description.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "bench/bench.yaml",
        global = true
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play the configured games and write the report (the default).
    Run(Overrides),
    /// Validate the configuration and print what a run would do.
    Check(Overrides),
}

#[derive(Debug, Default, Args)]
struct Overrides {
    /// Replace `run_id` (and with it every `{run_id}` in report paths).
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    games: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Attach each turn's reroll history to the telemetry events.
    #[arg(long)]
    turn_details: bool,
}

impl Overrides {
    fn apply(self, config: &mut BenchmarkConfig) {
        if let Some(run_id) = self.run_id {
            config.run_id = run_id;
        }
        if let Some(games) = self.games {
            config.games.count = games;
        }
        if let Some(seed) = self.seed {
            config.games.seed = seed;
        }
        config.logging.turn_details |= self.turn_details;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (overrides, check_only) = match cli.command {
        Some(Command::Check(overrides)) => (overrides, true),
        Some(Command::Run(overrides)) => (overrides, false),
        None => (Overrides::default(), false),
    };

    let mut config = BenchmarkConfig::from_path(&cli.config)?;
    overrides.apply(&mut config);
    config
        .validate()
        .with_context(|| format!("applying overrides to {}", cli.config.display()))?;
    let paths = config.report_paths();

    if check_only {
        let names: Vec<String> = config
            .agents
            .iter()
            .map(|agent| format!("{} ({})", agent.name, agent.strength))
            .collect();
        println!(
            "{}: {} games from seed {}; agents {}; baseline {}; report in {}",
            config.run_id,
            config.games.count,
            config.games.seed,
            names.join(", "),
            config.baseline().unwrap_or("-"),
            paths.dir.display()
        );
        return Ok(());
    }

    let telemetry = init_telemetry(&config.logging, &paths)?;
    let summary = GameRunner::new(config, paths).run()?;

    println!(
        "{} games x {} agents: {} rows in {}",
        summary.games_played,
        summary.agents,
        summary.rows_written,
        summary.games_path.display()
    );
    println!("Summary: {}", summary.summary_path.display());
    if let Some(plot) = &summary.plot_path {
        println!("Totals chart: {}", plot.display());
    }
    if let Some(telemetry) = &telemetry {
        if telemetry.installed {
            println!("Telemetry: {}", telemetry.path.display());
        } else {
            eprintln!("WARN: another tracing subscriber was active; telemetry not captured");
        }
    }

    Ok(())
}
