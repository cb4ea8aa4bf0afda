use crate::config::{ACCEPT_TICK, StreamConfig, TCP_READ_TIMEOUT_S, TCP_WRITE_TIMEOUT_S};
use crate::generator::{GeneratorConfig, ReadingGenerator};
use anyhow::Context;
use log::{debug, info, warn};
use probe_core::record::format_record;
use probe_core::{REQUEST_FRAME_LEN, TestRequest, WireError, wire};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum SimError {
    #[error("bad test request: {0}")]
    BadRequest(#[from] WireError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

// accept loop + по потоку на подключение
pub(crate) fn run_tcp_listener(
    tcp_addr: SocketAddr,
    cfg: StreamConfig,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener =
        TcpListener::bind(tcp_addr).with_context(|| format!("bind TCP listener {}", tcp_addr))?;
    listener
        .set_nonblocking(true)
        .context("listener.set_nonblocking(true)")?;
    info!("probe simulator listening on {tcp_addr}");

    let mut session_handles = Vec::new();

    loop {
        reap_finished_sessions(&mut session_handles);

        if shutdown.load(Ordering::Relaxed) {
            info!("shutting down tcp listener");
            break;
        }

        match listener.accept() {
            Ok((stream, addr)) => {
                stream
                    .set_nonblocking(false)
                    .context("stream.set_nonblocking(false)")?;

                stream.set_nodelay(true).ok();
                stream
                    .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT_S)))
                    .ok();
                stream
                    .set_write_timeout(Some(Duration::from_secs(TCP_WRITE_TIMEOUT_S)))
                    .ok();

                let shutdown = shutdown.clone();
                let h = thread::spawn(move || match handle_conn(stream, cfg, shutdown) {
                    Ok(n) => info!("session with {addr} done: {n} records sent"),
                    Err(e) => warn!("session with {addr} failed: {e}"),
                });
                session_handles.push(h);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                // нет новых соединений прямо сейчас
                thread::sleep(ACCEPT_TICK);
            }
            Err(e) => {
                warn!("accept error: {e}");
                thread::sleep(ACCEPT_TICK);
            }
        }
    }

    for h in session_handles {
        if let Err(panic) = h.join() {
            warn!("session thread panicked: {:?}", panic);
        }
    }

    Ok(())
}

fn reap_finished_sessions(handles: &mut Vec<thread::JoinHandle<()>>) {
    let mut i = 0;
    while i < handles.len() {
        if handles[i].is_finished() {
            let h = handles.swap_remove(i);
            if let Err(panic) = h.join() {
                warn!("session thread panicked: {:?}", panic);
            }
        } else {
            i += 1;
        }
    }
}

fn read_request(stream: &mut TcpStream) -> Result<TestRequest, SimError> {
    let mut frame = [0u8; REQUEST_FRAME_LEN];
    stream.read_exact(&mut frame)?;
    debug!("request frame {:02x?}", frame);
    Ok(wire::decode(&frame)?)
}

/// Одна сессия: запрос -> записи -> финальная запись с `;1`.
/// Возвращает число отправленных записей.
fn handle_conn(
    mut stream: TcpStream,
    cfg: StreamConfig,
    shutdown: Arc<AtomicBool>,
) -> Result<u64, SimError> {
    // на кривой запрос прибор просто закрывает соединение
    let req = read_request(&mut stream)?;
    info!(
        "test request: depth={}m duration={}min save={}",
        req.depth_m, req.duration_min, req.save
    );

    let total = cfg.records_for(req.duration_min);
    let mut generator = ReadingGenerator::new(
        req.depth_m,
        GeneratorConfig {
            sample_step_ms: cfg.sample_step_ms(),
            ..GeneratorConfig::default()
        },
    );

    let mut sent = 0;
    while sent < total {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutting down session early after {sent} records");
            break;
        }

        let finished = sent + 1 == total;
        let mut line = format_record(&generator.next_reading(), finished);
        line.push('\n');
        stream.write_all(line.as_bytes())?;
        sent += 1;

        if !finished && !cfg.pace.is_zero() {
            thread::sleep(cfg.pace);
        }
    }

    stream.flush()?;
    if req.save {
        info!("{sent} records stored on simulated SD card");
    }
    Ok(sent)
}
