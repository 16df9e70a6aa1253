use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tradeledger::synthetic::{LogScenario, SyntheticLogGenerator};

#[derive(Parser)]
#[command(name = "genlog")]
#[command(about = "Writes synthetic order logs for exercising the ledger pipeline")]
#[command(version)]
struct Cli {
    /// Scenario to simulate: profitable-day, losing-day, mixed-week,
    /// heavy-cancellations, with-noise or malformed
    #[arg(short = 'S', long, default_value = "mixed-week")]
    scenario: LogScenario,

    /// Number of order events to emit
    #[arg(short, long, default_value = "200")]
    count: usize,

    /// RNG seed; the same seed always produces the same log
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Where to write the log
    #[arg(short, long, default_value = "order_status_log.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("tradeledger=info")
        .init();

    let mut generator = SyntheticLogGenerator::new(cli.seed);
    let lines = generator.generate(cli.scenario, cli.count);

    let mut text = lines.join("\n");
    text.push('\n');
    std::fs::write(&cli.output, text)?;

    println!(
        "Wrote {} lines ({:?}, seed {}) to {}",
        lines.len(),
        cli.scenario,
        cli.seed,
        cli.output.display()
    );
    Ok(())
}
