use crate::types::{Channel, ChannelSample, Reading};

/// Запись истории: сырая строка и то, что из неё получилось
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Строка как пришла, без `\r\n`
    pub raw: String,
    /// Разобранная запись
    pub reading: Reading,
}

/// Упорядоченная по времени прихода история одной сессии
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingHistory {
    entries: Vec<HistoryEntry>,
}

/// Последнее зафиксированное значение канала
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastValid {
    /// Значение канала
    pub value: f64,
    /// Интервал сохранения, мс
    pub interval_ms: i64,
}

/// Данные для графика одного канала.
/// `points` и `intervals_s` идут параллельно и содержат только зафиксированные отсчёты.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSeries {
    /// (секунды от первой записи, значение)
    pub points: Vec<(f64, f64)>,
    /// (секунды от первой записи, интервал в секундах)
    pub intervals_s: Vec<(f64, f64)>,
    /// Средний интервал, с. `None`, если точек нет
    pub mean_interval_s: Option<f64>,
}

impl ReadingHistory {
    /// Пустая история
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет запись в конец
    pub fn append(&mut self, raw: impl Into<String>, reading: Reading) {
        self.entries.push(HistoryEntry {
            raw: raw.into(),
            reading,
        });
    }

    /// Сброс перед новой сессией
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Число записей
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Нет ни одной записи
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Все записи в порядке прихода
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Сырые строки для CSV
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.raw.as_str())
    }

    /// Последняя сырая строка
    pub fn last_raw(&self) -> Option<&str> {
        self.entries.last().map(|e| e.raw.as_str())
    }

    /// Последнее значение канала с поднятым флагом сохранения.
    /// Обход с конца, O(n): история ограничена длительностью теста.
    pub fn last_valid(&self, channel: Channel) -> Option<LastValid> {
        self.entries
            .iter()
            .rev()
            .map(|e| e.reading.channel(channel))
            .find(|s| s.saved)
            .map(|s: &ChannelSample| LastValid {
                value: s.value,
                interval_ms: s.interval_ms,
            })
    }

    /// Секунды от первой записи с разбираемой меткой времени.
    /// Неразбираемая метка даёт 0.0.
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        let mut base: Option<f64> = None;
        self.entries
            .iter()
            .map(|e| match parse_device_time(&e.reading.timestamp) {
                Some(t) => t - *base.get_or_insert(t),
                None => 0.0,
            })
            .collect()
    }

    /// Ряд для графика канала
    pub fn series(&self, channel: Channel) -> ChannelSeries {
        let mut out = ChannelSeries::default();

        for (e, t) in self.entries.iter().zip(self.elapsed_seconds()) {
            let s = e.reading.channel(channel);
            if !s.saved {
                continue;
            }
            out.points.push((t, s.value));
            out.intervals_s.push((t, s.interval_ms as f64 / 1000.0));
        }

        if !out.intervals_s.is_empty() {
            let sum: f64 = out.intervals_s.iter().map(|&(_, i)| i).sum();
            out.mean_interval_s = Some(sum / out.intervals_s.len() as f64);
        }

        out
    }
}

/// `H:M:S:ms` -> секунды
pub fn parse_device_time(ts: &str) -> Option<f64> {
    let mut parts = ts.split(':');
    let h: i64 = parts.next()?.trim().parse().ok()?;
    let m: i64 = parts.next()?.trim().parse().ok()?;
    let s: i64 = parts.next()?.trim().parse().ok()?;
    let ms: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    // метку прибор шлёт как есть, переполнение = неразбираемая метка
    let secs = h
        .checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)?;
    Some(secs as f64 + ms as f64 / 1000.0)
}
