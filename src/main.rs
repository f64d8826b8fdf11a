use anyhow::{Context, Result};
use clap::Parser;
use genesis_lib::app::App;
use genesis_observer::{BlockingAdvisor, HttpParentService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path; created with defaults when missing
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of ticks to run (runs until shutdown or extinction when omitted)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Run seed, overriding `world.seed`
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for saves and the event history
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Save every N ticks (0 saves only on exit)
    #[arg(long, default_value_t = 500)]
    save_every: u64,

    /// Continue from the latest save in `--save-dir`
    #[arg(long)]
    resume: bool,

    /// Parent advisory endpoint; local fallbacks are used when omitted
    #[arg(long)]
    advisor_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    genesis_core::init_logging();
    let args = Args::parse();

    let mut config = App::load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    let timeout = Duration::from_millis(config.advisory.timeout_ms);

    let mut app = App::new(config, args.save_dir, args.resume)?;
    app.save_interval = args.save_every;
    if let Some(ticks) = args.ticks {
        app.set_tick_budget(ticks);
    }

    if let Some(url) = args.advisor_url {
        let service = HttpParentService::new(&url, timeout)
            .map_err(|e| anyhow::anyhow!("Failed to build parent client: {e}"))?;
        let advisor = BlockingAdvisor::new(tokio::runtime::Handle::current(), Arc::new(service), timeout);
        tracing::info!(url = %url, "Parent advisory enabled");
        app.world = app.world.with_advisor(Box::new(advisor));
    }

    app.shutdown.listen_for_ctrl_c();

    // The tick blocks on the parent through the runtime handle, so it has to
    // run off the async workers.
    let reason = tokio::task::spawn_blocking(move || app.run())
        .await
        .context("Simulation thread panicked")??;
    println!("Simulation finished: {reason}");
    Ok(())
}
