//! # probe-core
//!
//! Базовые типы и протокол полевого зонда качества воды (pH, температура,
//! растворённый кислород, мутность).
//!
//! Этот крейт содержит:
//!
//! - [`wire`] — бинарный кадр запроса теста (`"ABC"` + depth + duration + save)
//! - [`record`] — разбор и классификация текстовых записей ответа
//! - [`history`] — история сессии и поиск последнего зафиксированного значения
//! - [`types`] — доменные типы
//! - [`error`] — типы ошибок, которые возвращают компоненты `probe-core`
//!
//! ## Пример: кадр запроса
//!
//! ```rust
//! use probe_core::wire::{encode, decode};
//! use probe_core::TestRequest;
//!
//! let req = TestRequest::new(5, 2, true);
//! let frame = encode(&req);
//! assert_eq!(frame, [0x41, 0x42, 0x43, 5, 0, 0, 0, 2, 0, 0, 0, 1]);
//! assert_eq!(decode(&frame).unwrap(), req);
//! ```
//!
//! ## Пример: разбор ответа
//!
//! ```rust
//! use probe_core::record::{classify_line, parse_record, LineKind};
//! use probe_core::{Channel, ReadingHistory};
//!
//! let line = "0:0:1:0;1;7.10;1000;0;0;2000;0;0;3000;0;0;4000;0.1;12.0;1\n";
//! let LineKind::Final(line) = classify_line(line) else { panic!() };
//!
//! let mut history = ReadingHistory::new();
//! history.append(line, parse_record(line).unwrap());
//! assert_eq!(history.last_valid(Channel::Ph).unwrap().value, 7.1);
//! assert!(history.last_valid(Channel::Temperature).is_none());
//! ```
//!
//! ## Дизайн
//!
//! `probe-core` не делает I/O: сокеты, потоки и логирование живут в клиенте
//! и симуляторе. Здесь только типы, кодеки и агрегация.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Бинарный кадр запроса.
pub mod wire;

/// Записи ответа прибора.
pub mod record;

/// История сессии.
pub mod history;

/// Доменные типы (запрос, канал, запись).
pub mod types;

/// Ошибки `probe-core`.
pub mod error;

/// Общие константы протокола
mod constants;
pub use constants::{
    FIELD_SEPARATOR, FINISHED_FLAG, RECORD_FIELD_COUNT, RECORD_HEADERS, REQUEST_FRAME_LEN,
    REQUEST_SIGNATURE,
};

// --- Re-exports (публичный фасад API) ---

pub use crate::error::{ProbeCoreError, RecordError, WireError};
pub use crate::history::{ChannelSeries, HistoryEntry, LastValid, ReadingHistory};
pub use crate::types::{Channel, ChannelSample, Reading, TestRequest};
