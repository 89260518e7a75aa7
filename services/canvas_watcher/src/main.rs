//! SolPlace Canvas Watcher
//!
//! Headless owner of a canvas view:
//! - Mirrors the canvas account and logs live activity
//! - Optionally funds a session key and paints pixels given on the command line
//!
//! Usage: `canvas_watcher [watch]` or `canvas_watcher paint X Y COLOR [X Y COLOR ...]`

mod config;
mod feed;

use anyhow::{bail, Context, Result};
use solplace_client::{CanvasView, Cell, Collaborators, SessionPhase, ViewHandle};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Watch,
    Paint(Vec<(Cell, u8)>),
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args.split_first() {
        None => Ok(Command::Watch),
        Some((cmd, [])) if cmd == "watch" => Ok(Command::Watch),
        Some((cmd, rest)) if cmd == "paint" => {
            if rest.is_empty() || rest.len() % 3 != 0 {
                bail!("paint expects X Y COLOR triples");
            }
            let mut pixels = Vec::with_capacity(rest.len() / 3);
            for triple in rest.chunks(3) {
                let x = triple[0].parse().context("Invalid X")?;
                let y = triple[1].parse().context("Invalid Y")?;
                let color = triple[2].parse().context("Invalid COLOR")?;
                pixels.push((Cell::new(x, y), color));
            }
            Ok(Command::Paint(pixels))
        }
        Some((cmd, _)) => bail!("Unknown command: {cmd}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SolPlace Canvas Watcher");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    let config = config::Config::from_env()?;

    let client_config = config.client_config();
    let collaborators = Collaborators::solana(&client_config, config.wallet.clone());
    let view = CanvasView::mount(client_config, collaborators)
        .await
        .context("Failed to mount canvas view")?;
    info!("Watching canvas {}", view.canvas_address());

    let mut events = view.subscribe();
    let feed = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => feed::log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Feed skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Command::Paint(pixels) = command {
        if let Err(e) = paint(&view, &pixels).await {
            error!("Painting failed: {:#}", e);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    view.teardown().await;
    feed.abort();

    info!("Shutting down SolPlace Canvas Watcher");
    Ok(())
}

async fn paint(view: &ViewHandle, pixels: &[(Cell, u8)]) -> Result<()> {
    view.start_drawing().await?;

    let mut session = view.session();
    loop {
        match *session.borrow_and_update() {
            SessionPhase::Ready => break,
            SessionPhase::Uninitialized => bail!("Session key could not be funded"),
            SessionPhase::Funding => {}
        }
        session.changed().await?;
    }

    for &(cell, color) in pixels {
        let entry = view.draw(cell, color).await?;
        info!("Submitted {}", entry.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_watch() {
        assert_eq!(parse_command(&[]).unwrap(), Command::Watch);
        assert_eq!(parse_command(&args(&["watch"])).unwrap(), Command::Watch);
    }

    #[test]
    fn test_parse_paint() {
        let command = parse_command(&args(&["paint", "5", "5", "3", "10", "2", "7"])).unwrap();
        assert_eq!(
            command,
            Command::Paint(vec![(Cell::new(5, 5), 3), (Cell::new(10, 2), 7)])
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command(&args(&["paint"])).is_err());
        assert!(parse_command(&args(&["paint", "1", "2"])).is_err());
        assert!(parse_command(&args(&["paint", "1", "2", "x"])).is_err());
        assert!(parse_command(&args(&["paint", "300", "2", "1"])).is_err());
        assert!(parse_command(&args(&["erase"])).is_err());
    }
}
