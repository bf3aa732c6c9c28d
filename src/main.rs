//! Terminal shell for the leaderboard client.
//!
//! Composes the three components: watch the polled leaderboard, submit a
//! score, or look up a single player's rank.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leaderboard_client::leaderboard::{ClientBuilder, ClientConfig, SyncPhase};
use leaderboard_client::render::{render_leaderboard, render_rank, render_status};
use leaderboard_client::types::GameMode;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "leaderboard-client")]
#[command(about = "Watch, submit to and query a leaderboard service", long_about = None)]
struct Cli {
    /// Override the service base URL
    #[arg(short, long)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the leaderboard and print every update
    Watch {
        /// Stop after this many completed fetches
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Fetch the leaderboard once
    Top,
    /// Submit a score, then show the refreshed leaderboard
    Submit {
        username: String,
        score: String,
        #[arg(short, long, default_value = "classic")]
        mode: GameMode,
    },
    /// Look up a player's rank
    Rank { user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    let mut config = ClientConfig::from_env().context("Invalid leaderboard configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    info!("Using leaderboard service at {}", config.base_url);

    let client = ClientBuilder::from_config(config).build()?;

    match cli.command {
        Command::Watch { ticks } => {
            let mut updates = client.sync.subscribe();
            client.sync.start();

            let mut completed = 0;
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = updates.borrow_and_update().clone();
                        if state.is_loading() {
                            continue;
                        }
                        println!("{}\n", render_leaderboard(&state));
                        completed += 1;
                        if ticks.is_some_and(|limit| completed >= limit) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, shutting down");
                        break;
                    }
                }
            }

            client.sync.stop();
        }
        Command::Top => {
            let fetched = client.sync.fetch().await;
            println!("{}", render_leaderboard(&client.sync.state()));
            if let Err(err) = fetched {
                bail!("Leaderboard fetch failed: {err}");
            }
        }
        Command::Submit {
            username,
            score,
            mode,
        } => {
            client.submitter.set_username(username);
            client.submitter.set_score(score);
            client.submitter.set_game_mode(mode);

            let outcome = client.submitter.submit().await;
            if let Some(status) = client.submitter.state().status {
                println!("{}", render_status(&status));
            }

            let receipt = outcome?;
            if let Some(refresh) = receipt.refresh {
                refresh.await.context("Leaderboard refresh task failed")?;
            }
            let state = client.sync.state();
            if !matches!(state.phase, SyncPhase::Idle) {
                println!("\n{}", render_leaderboard(&state));
            }
        }
        Command::Rank { user_id } => {
            let outcome = client.rank_query.query(&user_id).await;
            println!("{}", render_rank(&client.rank_query.state()));
            outcome?;
        }
    }

    Ok(())
}
