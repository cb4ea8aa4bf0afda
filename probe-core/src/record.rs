use std::fmt::Write as _;

use crate::constants::{FIELD_SEPARATOR, FINISHED_FLAG, RECORD_FIELD_COUNT, RECORD_HEADERS};
use crate::error::RecordError;
use crate::types::{ChannelSample, Reading};

/// Что делать со строкой, прочитанной из сокета
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Пустая строка (или EOF): чтение заканчивается, это не ошибка
    End,
    /// Обычная запись, читаем дальше
    Record(&'a str),
    /// Последняя запись сессии (последнее поле == "1"), дальше не читаем
    Final(&'a str),
}

/// Классифицирует строку ответа. Хвостовые пробелы и `\r\n` отрезаются.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim_end();
    if line.is_empty() {
        return LineKind::End;
    }

    if line.contains(FIELD_SEPARATOR) && line.rsplit(FIELD_SEPARATOR).next() == Some(FINISHED_FLAG)
    {
        LineKind::Final(line)
    } else {
        LineKind::Record(line)
    }
}

/// Разбирает одну запись вида
/// `waktu;save_pH;value_pH;interval_pH;...;current;voltage[;finished]`.
///
/// Поля сверх 15-го игнорируются. Флаги и интервалы прибор может прислать как float,
/// они округляются до ближайшего целого.
pub fn parse_record(line: &str) -> Result<Reading, RecordError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < RECORD_FIELD_COUNT {
        return Err(RecordError::TooFewFields(fields.len()));
    }

    Ok(Reading {
        timestamp: fields[0].to_string(),
        ph: channel_at(&fields, 1)?,
        temperature: channel_at(&fields, 4)?,
        dissolved_oxygen: channel_at(&fields, 7)?,
        turbidity: channel_at(&fields, 10)?,
        current: float_at(&fields, 13)?,
        voltage: float_at(&fields, 14)?,
    })
}

/// Первые 15 полей сырой записи (без флага завершения), для экспорта
pub fn record_fields(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(FIELD_SEPARATOR).take(RECORD_FIELD_COUNT)
}

/// Форматирует запись так, как её шлёт прибор: 15 полей и флаг завершения
pub fn format_record(reading: &Reading, finished: bool) -> String {
    let mut out = reading.timestamp.clone();
    for ch in [
        &reading.ph,
        &reading.temperature,
        &reading.dissolved_oxygen,
        &reading.turbidity,
    ] {
        let _ = write!(
            out,
            ";{};{:.2};{}",
            u8::from(ch.saved),
            ch.value,
            ch.interval_ms
        );
    }
    let _ = write!(
        out,
        ";{:.3};{:.2};{}",
        reading.current,
        reading.voltage,
        u8::from(finished)
    );
    out
}

// флаг, значение, интервал идут подряд начиная с `start`
fn channel_at(fields: &[&str], start: usize) -> Result<ChannelSample, RecordError> {
    Ok(ChannelSample {
        saved: rounded_at(fields, start)? == 1,
        value: float_at(fields, start + 1)?,
        interval_ms: rounded_at(fields, start + 2)?,
    })
}

fn float_at(fields: &[&str], idx: usize) -> Result<f64, RecordError> {
    let raw = fields[idx];
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RecordError::InvalidNumber {
            field: RECORD_HEADERS[idx],
            value: raw.to_string(),
        })
}

fn rounded_at(fields: &[&str], idx: usize) -> Result<i64, RecordError> {
    let v = float_at(fields, idx)?.round_ties_even();
    if !v.is_finite() || v < i64::MIN as f64 || v > i64::MAX as f64 {
        return Err(RecordError::NonFiniteInteger {
            field: RECORD_HEADERS[idx],
            value: fields[idx].to_string(),
        });
    }
    Ok(v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "10:15:30:250;1;7.02;1000;0;24.50;2000;1;8.10;3000;0;5.00;4000;0.120;12.30";

    #[test]
    fn classify_line_detects_end_record_and_final() {
        assert_eq!(classify_line(""), LineKind::End);
        assert_eq!(classify_line("  \r\n"), LineKind::End);
        assert_eq!(classify_line("a;b;0\r\n"), LineKind::Record("a;b;0"));
        assert_eq!(classify_line("a;b;1\n"), LineKind::Final("a;b;1"));
        // без `;` флаг не ищем
        assert_eq!(classify_line("1"), LineKind::Record("1"));
        assert_eq!(classify_line("a;b;11"), LineKind::Record("a;b;11"));
    }

    #[test]
    fn parse_record_extracts_all_fields() {
        let r = parse_record(LINE).unwrap();
        assert_eq!(r.timestamp, "10:15:30:250");
        assert_eq!(
            r.ph,
            ChannelSample {
                saved: true,
                value: 7.02,
                interval_ms: 1000
            }
        );
        assert!(!r.temperature.saved);
        assert_eq!(r.temperature.value, 24.5);
        assert!(r.dissolved_oxygen.saved);
        assert_eq!(r.dissolved_oxygen.interval_ms, 3000);
        assert_eq!(r.turbidity.interval_ms, 4000);
        assert_eq!(r.current, 0.12);
        assert_eq!(r.voltage, 12.3);
    }

    #[test]
    fn parse_record_ignores_finished_flag_and_extra_fields() {
        let with_flag = format!("{LINE};1");
        let with_extra = format!("{LINE};0;garbage");
        assert_eq!(parse_record(&with_flag).unwrap(), parse_record(LINE).unwrap());
        assert_eq!(parse_record(&with_extra).unwrap(), parse_record(LINE).unwrap());
    }

    #[test]
    fn parse_record_rounds_float_flags_and_intervals() {
        let line = "0:0:1:0;1.0;7;999.6;0.4;20;1500.5;1.49;6;2500.5;2;1;10;0;0";
        let r = parse_record(line).unwrap();
        assert!(r.ph.saved);
        assert_eq!(r.ph.interval_ms, 1000);
        assert!(!r.temperature.saved);
        // половинки округляются к чётному
        assert_eq!(r.temperature.interval_ms, 1500);
        assert!(r.dissolved_oxygen.saved);
        assert_eq!(r.dissolved_oxygen.interval_ms, 2500);
        // 2 != 1 => канал не зафиксирован
        assert!(!r.turbidity.saved);
    }

    #[test]
    fn parse_record_rejects_short_lines() {
        assert_eq!(
            parse_record("1;2;3").unwrap_err(),
            RecordError::TooFewFields(3)
        );
        assert_eq!(parse_record("").unwrap_err(), RecordError::TooFewFields(1));
    }

    #[test]
    fn parse_record_rejects_bad_numbers() {
        let line = LINE.replace(";24.50;", ";abc;");
        assert_eq!(
            parse_record(&line).unwrap_err(),
            RecordError::InvalidNumber {
                field: "value_temp",
                value: "abc".to_string()
            }
        );

        let line = LINE.replacen(";1000;", ";nan;", 1);
        assert!(matches!(
            parse_record(&line).unwrap_err(),
            RecordError::NonFiniteInteger {
                field: "interval_pH",
                ..
            }
        ));
    }

    #[test]
    fn parse_record_is_deterministic() {
        assert_eq!(parse_record(LINE).unwrap(), parse_record(LINE).unwrap());
    }

    #[test]
    fn format_record_is_parseable_and_flags_final() {
        let r = parse_record(LINE).unwrap();

        let last = format_record(&r, true);
        assert!(matches!(classify_line(&last), LineKind::Final(_)));
        assert_eq!(parse_record(&last).unwrap(), r);

        let mid = format_record(&r, false);
        assert!(matches!(classify_line(&mid), LineKind::Record(_)));
    }

    #[test]
    fn record_fields_truncates_to_fifteen() {
        let raw = format!("{LINE};1");
        let fields: Vec<&str> = record_fields(&raw).collect();
        assert_eq!(fields.len(), 15);
        assert_eq!(fields[14], "12.30");
    }
}
