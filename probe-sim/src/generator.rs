use probe_core::{ChannelSample, Reading};
use rand::Rng;

/// Интервалы сохранения каналов pH, температура, DO, мутность
const INTERVALS_MS: [u64; 4] = [1000, 2000, 3000, 4000];

#[derive(Debug, Clone)]
pub(crate) struct GeneratorConfig {
    /// Максимальный относительный шаг значения за один отсчёт (0.01 = 1%)
    pub(crate) max_rel_step: f64,
    /// Сколько мс часов прибора проходит между записями
    pub(crate) sample_step_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_rel_step: 0.01,
            sample_step_ms: 1000,
        }
    }
}

/// Внутреннее состояние канала.
#[derive(Debug, Clone)]
struct ChannelState {
    value: f64,
    min: f64,
    max: f64,
    interval_ms: u64,
    since_save_ms: u64,
}

impl ChannelState {
    fn new(value: f64, min: f64, max: f64, interval_ms: u64) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
            interval_ms,
            since_save_ms: 0,
        }
    }
}

pub(crate) struct ReadingGenerator {
    cfg: GeneratorConfig,
    channels: [ChannelState; 4],
    /// часы прибора, мс от полуночи
    clock_ms: u64,
    first: bool,
}

impl ReadingGenerator {
    pub(crate) fn new(depth_m: i32, cfg: GeneratorConfig) -> Self {
        let mut rng = rand::rng();

        // на глубине холоднее и меньше кислорода
        let depth = f64::from(depth_m.clamp(0, 200));

        let channels = [
            ChannelState::new(rng.random_range(6.5..8.0), 0.0, 14.0, INTERVALS_MS[0]),
            ChannelState::new(26.0 - depth * 0.1, 0.0, 40.0, INTERVALS_MS[1]),
            ChannelState::new(8.5 - depth * 0.05, 0.0, 20.0, INTERVALS_MS[2]),
            ChannelState::new(rng.random_range(1.0..10.0), 0.0, 1000.0, INTERVALS_MS[3]),
        ];

        Self {
            cfg,
            channels,
            clock_ms: rng.random_range(0..86_400_000),
            first: true,
        }
    }

    /// Следующая запись. Канал помечается сохранённым, когда истёк его интервал,
    /// в остальных записях прибор повторяет старое значение.
    pub(crate) fn next_reading(&mut self) -> Reading {
        let mut rng = rand::rng();

        if !self.first {
            self.clock_ms = (self.clock_ms + self.cfg.sample_step_ms) % 86_400_000;
        }

        let mut samples = [ChannelSample {
            saved: false,
            value: 0.0,
            interval_ms: 0,
        }; 4];

        for (st, out) in self.channels.iter_mut().zip(samples.iter_mut()) {
            if !self.first {
                st.since_save_ms += self.cfg.sample_step_ms;
            }

            let saved = self.first || st.since_save_ms >= st.interval_ms;
            if saved {
                st.since_save_ms = 0;
                let delta = rng.random_range(-self.cfg.max_rel_step..self.cfg.max_rel_step);
                st.value = ((1.0 + delta) * st.value).clamp(st.min, st.max);
            }

            *out = ChannelSample {
                saved,
                value: st.value,
                interval_ms: st.interval_ms as i64,
            };
        }
        self.first = false;

        let [ph, temperature, dissolved_oxygen, turbidity] = samples;
        Reading {
            timestamp: format_clock(self.clock_ms),
            ph,
            temperature,
            dissolved_oxygen,
            turbidity,
            current: rng.random_range(0.10..0.15),
            voltage: rng.random_range(11.8..12.6),
        }
    }
}

/// мс от полуночи -> `H:M:S:ms`
fn format_clock(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = ms / 60_000 % 60;
    let s = ms / 1000 % 60;
    format!("{h}:{m}:{s}:{}", ms % 1000)
}
