use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lottery_relay::config::Config;
use lottery_relay::services::countdown::countdown_message;
use lottery_relay::services::{EthersLottery, LotteryDispatcher, LotterySession, SharedSession};
use lottery_relay::utils::format_address;

#[derive(Parser)]
#[command(name = "lottery-console")]
#[command(about = "Drive the lottery contract from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print organizer, pot, participants, round and winner history.
    Status,
    /// Enter the current round with the configured wallet.
    Participate,
    /// Request a random winner, then wait for the draw.
    Results {
        /// Return once the request is mined instead of waiting for the winner.
        #[arg(long)]
        no_wait: bool,
    },
    /// Hand the organizer role over and open the next round.
    Rotate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lottery_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let lottery = Arc::new(
        EthersLottery::connect(&config)
            .await
            .context("failed to connect wallet")?,
    );
    let session = LotterySession::new(lottery.clone(), config.history_dedupe).shared();
    let dispatcher = LotteryDispatcher::connect(
        lottery,
        session.clone(),
        config.chain_id,
        Duration::from_secs(config.result_wait_secs),
    )
    .await?;

    match cli.command {
        Command::Status => {}
        Command::Participate => {
            let outcome = dispatcher.participate().await?;
            println!("Participated in tx {:#x}", outcome.tx_hash);
        }
        Command::Results { no_wait } => {
            let mut countdown = dispatcher.request_results().await?;
            println!(
                "Random number request initiated in tx {:#x}. Wait for the result.",
                countdown.transaction().tx_hash
            );

            if no_wait {
                countdown.cancel();
            } else {
                let mut remaining = countdown.remaining();
                let display = tokio::spawn(async move {
                    while remaining.changed().await.is_ok() {
                        let left = *remaining.borrow();
                        if left == 0 {
                            break;
                        }
                        println!("{}", countdown_message(left));
                    }
                });

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        countdown.cancel();
                        println!("Stopped waiting for the result");
                    }
                    _ = display => {}
                }
                countdown.finished().await;
            }
        }
        Command::Rotate => {
            let outcome = dispatcher.rotate_organizer().await?;
            println!("New organizer set in tx {:#x}", outcome.tx_hash);
        }
    }

    print_session(&session).await;
    Ok(())
}

async fn print_session(session: &SharedSession) {
    let mut session = session.lock().await;

    if let Some(notice) = session.take_notice() {
        println!("{}", notice.message());
    }

    match session.snapshot() {
        Some(snapshot) => {
            println!("Organizer:    {}", format_address(&snapshot.organizer));
            println!("Round:        {}", snapshot.round);
            println!("Pot:          {} Ether", snapshot.pot_display);
            println!("Participants: {}", snapshot.participant_count());
            for participant in &snapshot.participants {
                println!("  {}", format_address(participant));
            }
        }
        None => println!("Lottery state unavailable"),
    }

    if !session.history().is_empty() {
        println!("Winners:");
        for record in session.history() {
            println!("  #{} {}", record.round, format_address(&record.winner));
        }
    }
}
