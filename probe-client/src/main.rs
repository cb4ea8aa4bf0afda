//! Точка входа `probe-client`.
//!
//! Жизненный цикл:
//! - парсинг CLI и статической конфигурации прибора
//! - запуск сессии теста в фоновом потоке
//! - ожидание терминального состояния (Ctrl+C прерывает чтение)
//! - вывод таблицы последних значений, опционально сводки рядов и CSV

mod cli;
mod config;
mod export;
mod net;
mod report;
mod session;
mod tcp;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use anyhow::{Context, bail};
use clap::Parser;
use log::{info, warn};

use crate::config::DEVICE_SSID;
use crate::session::{SessionState, TestSession};

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=info/debug
    env_logger::init();

    let cancel = Arc::new(AtomicBool::new(false));

    // Ctrl+C => прерываем чтение на ближайшем тике
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
            warn!("cancelling test session...");
        })?;
    }

    let args = cli::Args::parse();
    args.validate()?;

    let device = args.device_config();
    info!(
        "Starting probe-client: device={}, ssid={}, local_ip={}, timeout={:?}",
        device.addr,
        DEVICE_SSID,
        net::local_ip().map_or_else(|| "unknown".to_string(), |ip| ip.to_string()),
        device.timeout
    );

    let mut session = TestSession::new(device, cancel);
    session.start_from_input(&args.depth, &args.duration, !args.probe)?;
    info!("test session state: {:?}", session.state());

    let state = session.wait();
    let outcome = session
        .report()
        .context("session finished without a report")?;

    if state != SessionState::Completed {
        bail!("test failed: {}", outcome.result);
    }

    println!("Test completed: {}", outcome.result);
    if outcome.skipped > 0 {
        println!("Skipped {} malformed lines", outcome.skipped);
    }

    let history = session
        .history()
        .context("completed session without history")?;
    print!("{}", report::render_summary(history));

    if args.series {
        print!("{}", report::render_series(history));
    }

    if let Some(dir) = &args.csv_dir {
        let captured_at = chrono::Local::now().naive_local();
        let path = export::export_csv(dir, history, &captured_at)?;
        println!("Data saved as {}", path.display());
    }

    Ok(())
}
