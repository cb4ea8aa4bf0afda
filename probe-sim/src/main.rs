//! Точка входа `probe-sim`.
//!
//! Симулятор прибора для ручной проверки клиента без железа:
//! TCP listener, на каждое подключение - один тест.

mod cli;
mod config;
mod generator;
mod tcp;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use clap::Parser;
use log::info;

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=info/debug
    env_logger::init();

    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl+C => ставим shutdown=true
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            info!("shutting down...");
        })?;
    }

    let args = cli::Args::parse();
    let cfg = args.stream_config();

    info!(
        "Starting probe-sim: bind={}, records_per_minute={}, pace={:?}",
        args.bind, cfg.records_per_minute, cfg.pace
    );

    tcp::run_tcp_listener(args.bind, cfg, shutdown)
}
