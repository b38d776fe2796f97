use std::process;

use agent::{
    config::{Config, Reconnect},
    driver::RoundDriver,
    error::Result,
    transport::WebSocketTransport,
};
use clap::Parser;
use common::utility::shutdown_signal;
use tokio::time;
use tracing::{error, info, warn};

/// Plays one session after another until the process is stopped.
async fn play(config: Config) -> Result<()> {
    let mut driver = RoundDriver::new(config.name.clone(), config.build_engine()?);
    loop {
        let mut transport =
            WebSocketTransport::connect_with_retry(&config.server_url, config.retry_delay(), None)
                .await?;
        match driver.run(&mut transport).await {
            Ok(summary) => info!(
                "Session {} finished after {} rounds",
                summary.session, summary.rounds_played
            ),
            Err(e) => warn!("Session {} dropped: {}", driver.session(), e),
        }

        if config.reconnect == Reconnect::Fresh {
            info!("Starting over with a fresh engine");
            driver.replace_engine(config.build_engine()?);
        }
        time::sleep(config.retry_delay()).await;
    }
}

#[tokio::main]
async fn main() {
    let config = Config::parse();
    let level = match config.validate().and_then(|_| config.level()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    tracing_subscriber::fmt()
        .with_line_number(true)
        .with_file(true)
        .with_max_level(level)
        .init();
    info!(
        "Playing as '{}' with {:?} against {}",
        config.name, config.policy, config.server_url
    );

    tokio::select! {
        result = play(config) => {
            if let Err(e) = result {
                error!("{}", e);
                process::exit(1);
            }
        }
        _ = shutdown_signal() => {}
    }
}
