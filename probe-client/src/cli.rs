use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::config::{self, DeviceConfig};

/// Probe Client - запуск теста качества воды на полевом зонде.
///
/// По TCP отправляется 12-байтный запрос, в ответ прибор шлёт записи `;`
/// до финальной записи с флагом `1`. Итог: таблица последних значений,
/// опционально CSV и сводка для графиков.
#[derive(Parser, Debug, Clone)]
#[command(name = "probe-client", version, about)]
pub(crate) struct Args {
    /// TCP адрес прибора, например 192.168.1.100:80
    #[arg(long, default_value = config::DEVICE_ADDR)]
    pub(crate) device: String,

    /// Глубина погружения, м (целое)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) depth: String,

    /// Длительность теста, мин (целое)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) duration: String,

    /// Пробный замер: прибор не сохраняет данные у себя (флаг 0)
    #[arg(long)]
    pub(crate) probe: bool,

    /// Дедлайн на всю сессию, секунды
    #[arg(long, default_value_t = config::SESSION_TIMEOUT_S,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) timeout_secs: u64,

    /// Каталог для CSV после успешной сессии
    #[arg(long)]
    pub(crate) csv_dir: Option<PathBuf>,

    /// Печатать сводку рядов для графиков
    #[arg(long)]
    pub(crate) series: bool,
}

impl Args {
    /// Валидация аргументов (адрес похож на HOST:PORT, каталог существует)
    pub(crate) fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            bail!("--device is empty");
        }
        if !self.device.contains(':') {
            bail!("--device must look like HOST:PORT (got: {})", self.device);
        }

        if let Some(dir) = &self.csv_dir {
            let md = std::fs::metadata(dir)
                .with_context(|| format!("csv dir not found: {:?}", dir))?;
            if !md.is_dir() {
                bail!("--csv-dir must point to a directory: {:?}", dir);
            }
        }

        Ok(())
    }

    pub(crate) fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            addr: self.device.trim().to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..DeviceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::{TestRequest, WireError};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("probe-client").chain(args.iter().copied())).unwrap()
    }

    // то же, что main передаёт в start_from_input
    fn request(args: &Args) -> Result<TestRequest, WireError> {
        TestRequest::from_input(&args.depth, &args.duration, !args.probe)
    }

    #[test]
    fn defaults_take_persisted_test_on_static_device() {
        let args = parse(&["--depth", "5", "--duration", "2"]);
        args.validate().unwrap();

        assert_eq!(request(&args).unwrap(), TestRequest::new(5, 2, true));
        let cfg = args.device_config();
        assert_eq!(cfg.addr, config::DEVICE_ADDR);
        assert_eq!(cfg.timeout, Duration::from_secs(config::SESSION_TIMEOUT_S));
    }

    #[test]
    fn probe_flag_clears_save_and_negative_values_pass_through() {
        let args = parse(&["--depth", "-3", "--duration", "1", "--probe"]);
        assert_eq!(request(&args).unwrap(), TestRequest::new(-3, 1, false));
    }

    #[test]
    fn non_integer_depth_is_an_encoding_error() {
        let args = parse(&["--depth", "deep", "--duration", "1"]);
        assert!(matches!(
            request(&args),
            Err(WireError::NotAnInteger { field: "depth", .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_device_and_missing_dir() {
        let args = parse(&["--device", "localhost", "--depth", "1", "--duration", "1"]);
        assert!(args.validate().is_err());

        let args = parse(&[
            "--depth",
            "1",
            "--duration",
            "1",
            "--csv-dir",
            "/definitely/not/here",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected_by_clap() {
        let res = Args::try_parse_from([
            "probe-client",
            "--depth",
            "1",
            "--duration",
            "1",
            "--timeout-secs",
            "0",
        ]);
        assert!(res.is_err());
    }
}
