use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{debug, info, warn};

use gossip_chain::api::{self, AppState};
use gossip_chain::config::Config;
use gossip_chain::network::HttpTransport;
use gossip_chain::{Ledger, storage};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env().map_err(io::Error::other)?;
    let transport = Arc::new(HttpTransport::new(config.peer_timeout).map_err(io::Error::other)?);

    let restored = match &config.data_file {
        Some(path) => storage::load(path).map_err(io::Error::other)?,
        None => None,
    };
    let ledger = match restored {
        Some(snapshot) => {
            let ledger = Ledger::restore(snapshot, transport).map_err(io::Error::other)?;
            if let Err(e) = ledger.set_difficulty(config.difficulty) {
                warn!("keeping difficulty {}: {e}", ledger.difficulty());
            }
            ledger
        }
        None => Ledger::open(config.difficulty, transport).map_err(io::Error::other)?,
    };

    info!(
        "⛓️ Starting node {} on {}:{}, advertised as {} (difficulty {}, {} blocks)",
        config.node_name,
        config.host,
        config.port,
        config.public_address,
        ledger.difficulty(),
        ledger.len()
    );

    for peer in config.peers.clone() {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            if let Err(e) = ledger.register_peer(peer.clone()).await {
                warn!("cannot register peer {} at {}: {e}", peer.name, peer.address);
            }
        });
    }

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(interval) = config.mine_interval {
        tokio::spawn(run_miner(ledger.clone(), interval, cancel.clone()));
    }

    let state = web::Data::new(AppState {
        ledger: ledger.clone(),
        node_name: config.node_name.clone(),
        public_address: config.public_address.clone(),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    cancel.store(true, Ordering::Relaxed);
    if let Some(path) = &config.data_file {
        storage::save(path, &ledger.snapshot()).map_err(io::Error::other)?;
    }
    Ok(())
}

/// Periodically mine whatever is pending.
async fn run_miner(ledger: Ledger, interval: Duration, cancel: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let (ledger, cancel) = (ledger.clone(), cancel.clone());
        match tokio::task::spawn_blocking(move || ledger.process_pending_until(&cancel)).await {
            Ok(Ok(elapsed)) if !elapsed.is_zero() => {
                debug!("Mining time spent: {:.3}s", elapsed.as_secs_f64())
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("background mining failed: {e}"),
            Err(e) => warn!("miner task panicked: {e}"),
        }
    }
}
