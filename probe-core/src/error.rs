use thiserror::Error;

/// Верхнеуровневый тип ошибок крейта
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeCoreError {
    /// Ошибки кадра запроса
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Ошибки разбора записи
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Ошибки кодирования/декодирования кадра запроса
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Параметр не является целым числом
    #[error("{field} is not an integer: {value:?}")]
    NotAnInteger {
        /// Имя параметра
        field: &'static str,
        /// Что ввели
        value: String,
    },

    /// Параметр не влезает в i32
    #[error("{field} does not fit into 32 bits: {value}")]
    OutOfRange {
        /// Имя параметра
        field: &'static str,
        /// Исходное значение
        value: i64,
    },

    /// Кадр короче 12 байт
    #[error("request frame too short: {0} bytes")]
    FrameTooShort(usize),

    /// Неверная сигнатура
    #[error("bad request signature: {0:02x?}")]
    BadSignature([u8; 3]),

    /// Флаг сохранения не 0 и не 1
    #[error("bad save flag: {0}")]
    BadSaveFlag(u8),
}

/// Ошибки разбора одной записи прибора
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Полей меньше 15
    #[error("record has {0} fields, expected at least 15")]
    TooFewFields(usize),

    /// Поле не парсится как число
    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber {
        /// Имя поля из заголовка
        field: &'static str,
        /// Содержимое поля
        value: String,
    },

    /// NaN/inf в поле, которое должно быть целым
    #[error("field {field} is not a finite integer: {value:?}")]
    NonFiniteInteger {
        /// Имя поля из заголовка
        field: &'static str,
        /// Содержимое поля
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_error_wraps_layers_transparently() {
        let e: ProbeCoreError = WireError::FrameTooShort(3).into();
        assert_eq!(e, ProbeCoreError::Wire(WireError::FrameTooShort(3)));
        assert_eq!(e.to_string(), "request frame too short: 3 bytes");

        let e: ProbeCoreError = RecordError::TooFewFields(2).into();
        assert!(matches!(e, ProbeCoreError::Record(RecordError::TooFewFields(2))));
        assert_eq!(e.to_string(), RecordError::TooFewFields(2).to_string());
    }
}
