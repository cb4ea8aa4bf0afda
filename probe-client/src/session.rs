//! Сессия теста: один фоновый поток на сессию, передача результата
//! в управляющий поток одним сообщением через канал.

use std::fmt;
use std::io;
use std::sync::{Arc, atomic::AtomicBool};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, warn};
use probe_core::record::parse_record;
use probe_core::{ReadingHistory, RecordError, TestRequest};
use thiserror::Error;

use crate::config::DeviceConfig;
use crate::tcp::{DeviceLink, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Sending,
    Receiving,
    Completed,
    Failed,
}

impl SessionState {
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

/// Итог сессии
#[derive(Debug)]
pub(crate) enum SessionResult {
    Success { count: usize },
    TransportError(TransportError),
    /// ни одной валидной записи
    ParseError { skipped: usize },
}

impl fmt::Display for SessionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionResult::Success { count } => write!(f, "received {count} records"),
            SessionResult::TransportError(e) => write!(f, "{e}"),
            SessionResult::ParseError { skipped } => {
                write!(f, "no valid records in response ({skipped} skipped)")
            }
        }
    }
}

/// То, что поток сессии отдаёт наружу целиком, после завершения
#[derive(Debug)]
pub(crate) struct SessionReport {
    pub(crate) result: SessionResult,
    pub(crate) history: ReadingHistory,
    /// строки, которые не удалось разобрать
    pub(crate) skipped: usize,
}

impl SessionReport {
    fn failed(e: TransportError) -> Self {
        Self {
            result: SessionResult::TransportError(e),
            history: ReadingHistory::new(),
            skipped: 0,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("a test session is already running")]
    AlreadyRunning,
}

enum WorkerEvent {
    Receiving,
    Finished(SessionReport),
}

struct Worker {
    handle: thread::JoinHandle<()>,
    events: Receiver<WorkerEvent>,
}

/// Машина состояний `Idle -> Sending -> Receiving -> {Completed, Failed}`.
///
/// Одновременно работает не больше одного потока сессии. История и результат
/// доступны только в терминальном состоянии.
pub(crate) struct TestSession {
    config: DeviceConfig,
    cancel: Arc<AtomicBool>,
    state: SessionState,
    worker: Option<Worker>,
    report: Option<SessionReport>,
}

impl TestSession {
    pub(crate) fn new(config: DeviceConfig, cancel: Arc<AtomicBool>) -> Self {
        Self {
            config,
            cancel,
            state: SessionState::Idle,
            worker: None,
            report: None,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref().filter(|_| self.state.is_terminal())
    }

    pub(crate) fn history(&self) -> Option<&ReadingHistory> {
        self.report().map(|r| &r.history)
    }

    /// Запускает сессию. Предыдущий результат и история сбрасываются.
    pub(crate) fn start(&mut self, req: TestRequest) -> Result<(), SessionError> {
        self.ensure_idle()?;

        self.report = None;
        self.state = SessionState::Sending;

        let (tx, rx) = crossbeam_channel::bounded(2);
        let config = self.config.clone();
        let cancel = self.cancel.clone();

        let handle = thread::spawn(move || {
            let report = run_session(&config, req, cancel, &tx);
            if tx.send(WorkerEvent::Finished(report)).is_err() {
                warn!("session owner is gone; dropping report");
            }
        });

        self.worker = Some(Worker { handle, events: rx });
        Ok(())
    }

    /// То же, но из строк, как их ввёл оператор. Не-целые значения сразу дают `Failed`.
    pub(crate) fn start_from_input(
        &mut self,
        depth: &str,
        duration: &str,
        save: bool,
    ) -> Result<(), SessionError> {
        self.ensure_idle()?;

        match TestRequest::from_input(depth, duration, save) {
            Ok(req) => self.start(req),
            Err(e) => {
                warn!("invalid test parameters: {e}");
                self.report = Some(SessionReport::failed(e.into()));
                self.state = SessionState::Failed;
                Ok(())
            }
        }
    }

    /// Неблокирующая проверка: забирает события потока, если они есть
    pub(crate) fn poll(&mut self) -> SessionState {
        loop {
            let Some(worker) = &self.worker else {
                return self.state;
            };

            match worker.events.try_recv() {
                Ok(ev) => self.apply(ev),
                Err(TryRecvError::Empty) => return self.state,
                Err(TryRecvError::Disconnected) => self.worker_lost(),
            }
        }
    }

    /// Блокируется до терминального состояния
    pub(crate) fn wait(&mut self) -> SessionState {
        loop {
            let Some(worker) = &self.worker else {
                return self.state;
            };

            match worker.events.recv() {
                Ok(ev) => self.apply(ev),
                Err(_) => self.worker_lost(),
            }
        }
    }

    fn ensure_idle(&mut self) -> Result<(), SessionError> {
        self.poll();
        if self.worker.is_some() {
            return Err(SessionError::AlreadyRunning);
        }
        Ok(())
    }

    fn apply(&mut self, ev: WorkerEvent) {
        match ev {
            WorkerEvent::Receiving => self.state = SessionState::Receiving,
            WorkerEvent::Finished(report) => {
                self.state = match report.result {
                    SessionResult::Success { .. } => SessionState::Completed,
                    _ => SessionState::Failed,
                };
                self.report = Some(report);
                self.join_worker();
            }
        }
    }

    // поток умер, не отдав отчёт (паника)
    fn worker_lost(&mut self) {
        self.join_worker();
        self.report = Some(SessionReport::failed(TransportError::Io(io::Error::other(
            "session worker terminated unexpectedly",
        ))));
        self.state = SessionState::Failed;
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(panic) = worker.handle.join() {
                warn!("session thread panicked: {:?}", panic);
            }
        }
    }
}

fn run_session(
    config: &DeviceConfig,
    req: TestRequest,
    cancel: Arc<AtomicBool>,
    events: &Sender<WorkerEvent>,
) -> SessionReport {
    let mut history = ReadingHistory::new();
    let mut skipped = 0usize;

    if let Err(e) = receive(config, req, cancel, events, &mut history, &mut skipped) {
        warn!("test session failed: {e}");
        return SessionReport::failed(e);
    }

    let result = if history.is_empty() {
        warn!("no valid records received ({skipped} skipped)");
        SessionResult::ParseError { skipped }
    } else {
        info!(
            "test session completed: records={} skipped={}",
            history.len(),
            skipped
        );
        SessionResult::Success {
            count: history.len(),
        }
    };

    SessionReport {
        result,
        history,
        skipped,
    }
}

fn receive(
    config: &DeviceConfig,
    req: TestRequest,
    cancel: Arc<AtomicBool>,
    events: &Sender<WorkerEvent>,
    history: &mut ReadingHistory,
    skipped: &mut usize,
) -> Result<(), TransportError> {
    let mut link = DeviceLink::connect(&config.addr, config.timeout, config.read_tick, cancel)?;
    link.send_request(&req)?;
    info!(
        "test request sent to {}: depth={}m duration={}min save={}",
        link.peer(),
        req.depth_m,
        req.duration_min,
        req.save
    );

    // владелец мог уже уйти, это не повод рвать сессию
    let _ = events.send(WorkerEvent::Receiving);

    link.read_records(|line| match parse_record(line) {
        Ok(reading) => history.append(line, reading),
        Err(RecordError::TooFewFields(n)) => {
            debug!("skipping short line ({n} fields): {line:?}");
            *skipped += 1;
        }
        Err(e) => {
            warn!("skipping unparsable record: {e}: {line:?}");
            *skipped += 1;
        }
    })?;

    Ok(())
}
