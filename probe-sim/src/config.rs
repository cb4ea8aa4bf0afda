use std::time::Duration;

pub(crate) const TCP_BIND_ADDR: &str = "0.0.0.0:8080";

/// Сколько записей прибор отдаёт на минуту теста
pub(crate) const RECORDS_PER_MINUTE: u32 = 12;

/// Пауза между записями при отправке
pub(crate) const PACE_MS: u64 = 100;

/// Верхняя граница записей на одну сессию
pub(crate) const MAX_RECORDS: u64 = 100_000;

pub(crate) const ACCEPT_TICK: Duration = Duration::from_millis(50);

pub(crate) const TCP_READ_TIMEOUT_S: u64 = 5;
pub(crate) const TCP_WRITE_TIMEOUT_S: u64 = 5;

/// Как отдавать записи одной сессии
#[derive(Debug, Clone, Copy)]
pub(crate) struct StreamConfig {
    pub(crate) records_per_minute: u32,
    pub(crate) pace: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            records_per_minute: RECORDS_PER_MINUTE,
            pace: Duration::from_millis(PACE_MS),
        }
    }
}

impl StreamConfig {
    /// Число записей на тест; не меньше одной, чтобы всегда была финальная
    pub(crate) fn records_for(&self, duration_min: i32) -> u64 {
        let n = u64::try_from(duration_min).unwrap_or(0) * u64::from(self.records_per_minute);
        n.clamp(1, MAX_RECORDS)
    }

    /// Шаг часов прибора между записями
    pub(crate) fn sample_step_ms(&self) -> u64 {
        60_000 / u64::from(self.records_per_minute.max(1))
    }
}
