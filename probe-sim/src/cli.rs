use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::{self, StreamConfig};

/// Probe Sim - симулятор полевого зонда: принимает 12-байтный запрос теста
/// и отдаёт записи `;` с финальным флагом `1`.
#[derive(Parser, Debug, Clone)]
#[command(name = "probe-sim", version, about)]
pub(crate) struct Args {
    /// TCP bind address, например 0.0.0.0:8080
    #[arg(long, default_value = config::TCP_BIND_ADDR)]
    pub(crate) bind: SocketAddr,

    /// Записей на минуту теста
    #[arg(long, default_value_t = config::RECORDS_PER_MINUTE,
          value_parser = clap::value_parser!(u32).range(1..=60_000))]
    pub(crate) records_per_minute: u32,

    /// Пауза между записями, мс
    #[arg(long, default_value_t = config::PACE_MS)]
    pub(crate) pace_ms: u64,
}

impl Args {
    pub(crate) fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            records_per_minute: self.records_per_minute,
            pace: Duration::from_millis(self.pace_ms),
        }
    }
}
