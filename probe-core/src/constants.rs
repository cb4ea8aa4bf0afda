/// Сигнатура кадра запроса
pub const REQUEST_SIGNATURE: &[u8; 3] = b"ABC";

/// Полная длина кадра запроса: сигнатура + depth + duration + флаг
pub const REQUEST_FRAME_LEN: usize = 12;

/// Сколько полей `;` обязано быть в записи
pub const RECORD_FIELD_COUNT: usize = 15;

/// Разделитель полей записи
pub const FIELD_SEPARATOR: char = ';';

/// Значение последнего поля, которым прибор помечает финальную запись сессии
pub const FINISHED_FLAG: &str = "1";

/// Заголовки CSV в порядке полей записи
pub const RECORD_HEADERS: [&str; RECORD_FIELD_COUNT] = [
    "waktu",
    "save_pH",
    "value_pH",
    "interval_pH",
    "save_temp",
    "value_temp",
    "interval_temp",
    "save_DO",
    "value_DO",
    "interval_DO",
    "save_turb",
    "value_turb",
    "interval_turb",
    "current",
    "voltage",
];
