use std::time::Duration;

/// Адрес прибора в полевой сети
pub(crate) const DEVICE_ADDR: &str = "192.168.1.100:80";

/// SSID точки доступа прибора, только для информации оператору
pub(crate) const DEVICE_SSID: &str = "titanium";

/// Дедлайн на всю сессию: connect + отправка + чтение всех записей
pub(crate) const SESSION_TIMEOUT_S: u64 = 30;

/// Шаг блокирующего чтения: на каждом тике проверяем дедлайн и Ctrl+C
pub(crate) const READ_TICK: Duration = Duration::from_millis(200);

/// Статическая конфигурация подключения к прибору
#[derive(Debug, Clone)]
pub(crate) struct DeviceConfig {
    pub(crate) addr: String,
    pub(crate) timeout: Duration,
    pub(crate) read_tick: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            addr: DEVICE_ADDR.to_string(),
            timeout: Duration::from_secs(SESSION_TIMEOUT_S),
            read_tick: READ_TICK,
        }
    }
}
