use std::fmt;

use crate::error::WireError;

/// Параметры одного теста. Создаётся на каждое действие пользователя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRequest {
    /// Глубина, м
    pub depth_m: i32,
    /// Длительность, мин
    pub duration_min: i32,
    /// true - прибор сохраняет данные у себя, false - пробный замер
    pub save: bool,
}

impl TestRequest {
    /// Без проверок, значения уже в i32
    pub fn new(depth_m: i32, duration_min: i32, save: bool) -> Self {
        Self {
            depth_m,
            duration_min,
            save,
        }
    }

    /// Проверка диапазона для значений, пришедших как i64
    pub fn try_new(depth_m: i64, duration_min: i64, save: bool) -> Result<Self, WireError> {
        Ok(Self::new(
            fit_i32("depth", depth_m)?,
            fit_i32("duration", duration_min)?,
            save,
        ))
    }

    /// Разбор того, что ввёл оператор, например `"5"` и `" 2 "`
    pub fn from_input(depth: &str, duration: &str, save: bool) -> Result<Self, WireError> {
        Self::try_new(
            parse_int("depth", depth)?,
            parse_int("duration", duration)?,
            save,
        )
    }
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, WireError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| WireError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}

fn fit_i32(field: &'static str, value: i64) -> Result<i32, WireError> {
    i32::try_from(value).map_err(|_| WireError::OutOfRange { field, value })
}

/// Измеряемая величина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// pH
    Ph,
    /// Температура воды
    Temperature,
    /// Растворённый кислород
    DissolvedOxygen,
    /// Мутность
    Turbidity,
}

impl Channel {
    /// Все каналы в порядке полей записи
    pub const ALL: [Channel; 4] = [
        Channel::Ph,
        Channel::Temperature,
        Channel::DissolvedOxygen,
        Channel::Turbidity,
    ];

    /// Подпись для таблицы
    pub fn label(self) -> &'static str {
        match self {
            Channel::Ph => "pH",
            Channel::Temperature => "Temperature",
            Channel::DissolvedOxygen => "Dissolved oxygen",
            Channel::Turbidity => "Turbidity",
        }
    }

    /// Единица измерения, у pH пустая
    pub fn unit(self) -> &'static str {
        match self {
            Channel::Ph => "",
            Channel::Temperature => "°C",
            Channel::DissolvedOxygen => "mg/L",
            Channel::Turbidity => "NTU",
        }
    }

    /// Значение для показа: два знака и единица измерения
    pub fn format_value(self, value: f64) -> String {
        match self.unit() {
            "" => format!("{value:.2}"),
            unit => format!("{value:.2} {unit}"),
        }
    }

    /// Интервал приходит в мс, показываем в секундах
    pub fn format_interval(interval_ms: i64) -> String {
        format!("{:.1} s", interval_ms as f64 / 1000.0)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Состояние одного канала в записи
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSample {
    /// Значение зафиксировано прибором. Если false, `value` может быть устаревшим или нулём
    pub saved: bool,
    /// Значение в единицах канала
    pub value: f64,
    /// Интервал сохранения, мс
    pub interval_ms: i64,
}

/// Одна запись прибора
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Локальное время прибора `H:M:S:ms`, как есть
    pub timestamp: String,
    /// pH
    pub ph: ChannelSample,
    /// Температура, °C
    pub temperature: ChannelSample,
    /// Растворённый кислород, mg/L
    pub dissolved_oxygen: ChannelSample,
    /// Мутность, NTU
    pub turbidity: ChannelSample,
    /// Ток, A
    pub current: f64,
    /// Напряжение питания, V
    pub voltage: f64,
}

impl Reading {
    /// Выборка канала
    pub fn channel(&self, channel: Channel) -> &ChannelSample {
        match channel {
            Channel::Ph => &self.ph,
            Channel::Temperature => &self.temperature,
            Channel::DissolvedOxygen => &self.dissolved_oxygen,
            Channel::Turbidity => &self.turbidity,
        }
    }
}
