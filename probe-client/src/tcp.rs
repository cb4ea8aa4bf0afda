use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use log::{debug, info};
use probe_core::record::{LineKind, classify_line};
use probe_core::{TestRequest, WireError, wire};
use thiserror::Error;

/// Ошибки транспорта. Ни одна не ретраится автоматически.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("device response timeout")]
    Timeout,

    #[error("connection refused (device offline?)")]
    Refused,

    #[error("network error: {0}")]
    Io(io::Error),

    #[error("request encoding error: {0}")]
    Encoding(#[from] WireError),

    #[error("session cancelled")]
    Cancelled,
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            io::ErrorKind::ConnectionRefused => TransportError::Refused,
            _ => TransportError::Io(e),
        }
    }
}

/// Итог чтения ответа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadSummary {
    /// сколько непустых строк отдано наружу
    pub(crate) lines: usize,
    /// встретили финальную запись (`...;1`), а не пустую строку/EOF
    pub(crate) finished: bool,
}

/// Соединение с прибором на время одной сессии.
///
/// Дедлайн общий на connect + запись + чтение. Сокет закрывается на любом выходе:
/// явно после чтения, в остальных случаях через Drop.
pub(crate) struct DeviceLink {
    stream: TcpStream,
    peer: SocketAddr,
    deadline: Instant,
    tick: Duration,
    cancel: Arc<AtomicBool>,
}

impl DeviceLink {
    pub(crate) fn connect(
        addr: &str,
        timeout: Duration,
        tick: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, TransportError> {
        let deadline = Instant::now() + timeout;

        let mut last_err =
            io::Error::new(io::ErrorKind::NotFound, format!("no addresses resolved for {addr}"));

        for peer in addr.to_socket_addrs()? {
            let remaining = remaining_until(deadline)?;
            match TcpStream::connect_timeout(&peer, remaining) {
                Ok(stream) => {
                    info!("connected to device {peer}");

                    stream.set_nodelay(true).ok();
                    stream.set_write_timeout(Some(remaining)).ok();

                    return Ok(Self {
                        stream,
                        peer,
                        deadline,
                        tick,
                        cancel,
                    });
                }
                Err(e) => {
                    debug!("connect to {peer} failed: {e}");
                    last_err = e;
                }
            }
        }

        Err(last_err.into())
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Отправляет кадр запроса одной записью
    pub(crate) fn send_request(&mut self, req: &TestRequest) -> Result<(), TransportError> {
        let frame = wire::encode(req);
        debug!("sending request frame {:02x?}", frame);

        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Читает строки ответа и отдаёт каждую непустую в `on_line` (без `\r\n`).
    ///
    /// Останов:
    /// - пустая строка или EOF: чистое (возможно неполное) завершение
    /// - строка с `;`, у которой последнее поле `1`: отдаётся и чтение заканчивается,
    ///   даже если в буфере есть ещё байты
    pub(crate) fn read_records(
        self,
        mut on_line: impl FnMut(&str),
    ) -> Result<ReadSummary, TransportError> {
        let mut reader = BufReader::new(&self.stream);
        let mut buf: Vec<u8> = Vec::with_capacity(256);
        let mut summary = ReadSummary {
            lines: 0,
            finished: false,
        };

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(TransportError::Cancelled);
            }

            let remaining = remaining_until(self.deadline)?;
            self.stream.set_read_timeout(Some(remaining.min(self.tick)))?;

            match reader.read_until(b'\n', &mut buf) {
                Ok(n) => {
                    // read_until возвращает строку без '\n' только на EOF
                    let eof = n == 0 || buf.last() != Some(&b'\n');
                    if buf.is_empty() {
                        break;
                    }

                    let stop = {
                        let text = String::from_utf8_lossy(&buf);
                        match classify_line(&text) {
                            LineKind::End => true,
                            LineKind::Record(line) => {
                                summary.lines += 1;
                                on_line(line);
                                false
                            }
                            LineKind::Final(line) => {
                                summary.lines += 1;
                                summary.finished = true;
                                on_line(line);
                                true
                            }
                        }
                    };

                    buf.clear();
                    if stop || eof {
                        break;
                    }
                }
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    // просто "тик": уже прочитанная часть строки остаётся в buf
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        drop(reader);
        self.stream.shutdown(Shutdown::Both).ok();
        debug!(
            "device {} read done: lines={} finished={}",
            self.peer, summary.lines, summary.finished
        );

        Ok(summary)
    }
}

fn remaining_until(deadline: Instant) -> Result<Duration, TransportError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(TransportError::Timeout);
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    const TICK: Duration = Duration::from_millis(20);

    fn no_cancel() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    /// Фейковый прибор: принимает одно соединение, читает кадр и пишет `response`
    fn fake_device(response: &'static [u8]) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let h = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut frame = vec![0u8; 12];
            stream.read_exact(&mut frame).unwrap();
            stream.write_all(response).unwrap();
            frame
        });

        (addr, h)
    }

    fn collect(addr: &str, timeout: Duration) -> Result<(Vec<String>, ReadSummary), TransportError> {
        let mut link = DeviceLink::connect(addr, timeout, TICK, no_cancel())?;
        link.send_request(&TestRequest::new(5, 2, true))?;

        let mut lines = Vec::new();
        let summary = link.read_records(|l| lines.push(l.to_string()))?;
        Ok((lines, summary))
    }

    #[test]
    fn sends_frame_and_stops_at_final_record() {
        let (addr, h) = fake_device(b"a;0\r\nb;1\nc;0\n");

        let (lines, summary) = collect(&addr, Duration::from_secs(5)).unwrap();
        assert_eq!(lines, vec!["a;0", "b;1"]);
        assert_eq!(
            summary,
            ReadSummary {
                lines: 2,
                finished: true
            }
        );

        let frame = h.join().unwrap();
        assert_eq!(frame, vec![0x41, 0x42, 0x43, 5, 0, 0, 0, 2, 0, 0, 0, 1]);
    }

    #[test]
    fn empty_line_ends_read_without_error() {
        let (addr, h) = fake_device(b"a;0\n\nb;1\n");

        let (lines, summary) = collect(&addr, Duration::from_secs(5)).unwrap();
        assert_eq!(lines, vec!["a;0"]);
        assert!(!summary.finished);
        h.join().unwrap();
    }

    #[test]
    fn eof_delivers_trailing_partial_line() {
        let (addr, h) = fake_device(b"a;0\nb;0");

        let (lines, summary) = collect(&addr, Duration::from_secs(5)).unwrap();
        assert_eq!(lines, vec!["a;0", "b;0"]);
        assert!(!summary.finished);
        h.join().unwrap();
    }

    #[test]
    fn line_split_across_read_ticks_is_reassembled() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let h = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.set_nodelay(true).unwrap();
            let mut frame = [0u8; 12];
            stream.read_exact(&mut frame).unwrap();

            stream.write_all(b"aaa;bb").unwrap();
            // несколько тиков чтения проходят посреди строки
            thread::sleep(TICK * 8);
            stream.write_all(b"b;0\nccc;1\n").unwrap();
        });

        let (lines, summary) = collect(&addr, Duration::from_secs(5)).unwrap();
        assert_eq!(lines, vec!["aaa;bbb;0", "ccc;1"]);
        assert_eq!(
            summary,
            ReadSummary {
                lines: 2,
                finished: true
            }
        );
        h.join().unwrap();
    }

    #[test]
    fn expired_deadline_fails_before_connecting() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let err = DeviceLink::connect(&addr, Duration::ZERO, TICK, no_cancel())
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Timeout), "got {err:?}");
    }

    #[test]
    fn unreachable_device_is_bounded_by_connect_deadline() {
        // TEST-NET-1: пакеты уходят в никуда
        let started = Instant::now();
        let err = DeviceLink::connect("192.0.2.1:80", Duration::from_millis(300), TICK, no_cancel())
            .err()
            .unwrap();

        // без маршрута в сеть ядро отвечает сразу, и это не таймаут
        let no_route = matches!(
            &err,
            TransportError::Io(e) if matches!(
                e.kind(),
                io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable
            )
        );
        assert!(matches!(err, TransportError::Timeout) || no_route, "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn silent_device_times_out_on_session_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let h = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let mut frame = [0u8; 12];
            stream.read_exact(&mut frame).unwrap();
            // ждём, пока клиент закроет сокет
            let mut rest = [0u8; 1];
            stream.read(&mut rest).unwrap()
        });

        let started = Instant::now();
        let err = collect(&addr, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));

        // 0 байт => клиент закрыл соединение
        assert_eq!(h.join().unwrap(), 0);
    }

    #[test]
    fn closed_port_is_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let err = DeviceLink::connect(&addr, Duration::from_secs(2), TICK, no_cancel())
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Refused), "got {err:?}");
    }

    #[test]
    fn cancel_flag_aborts_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let h = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let cancel = Arc::new(AtomicBool::new(false));
        let link = DeviceLink::connect(&addr, Duration::from_secs(5), TICK, cancel.clone()).unwrap();
        cancel.store(true, Ordering::Relaxed);

        let err = link.read_records(|_| {}).unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
        h.join().unwrap();
    }

    #[test]
    fn io_error_kinds_map_to_transport_errors() {
        let e: TransportError = io::Error::from(io::ErrorKind::TimedOut).into();
        assert!(matches!(e, TransportError::Timeout));

        let e: TransportError = io::Error::from(io::ErrorKind::ConnectionRefused).into();
        assert!(matches!(e, TransportError::Refused));

        let e: TransportError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(matches!(e, TransportError::Io(_)));
    }
}
