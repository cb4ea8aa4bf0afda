use std::fmt::Write;

use probe_core::{Channel, ReadingHistory};

const NO_DATA: &str = "no data";

/// Таблица последних зафиксированных значений и последняя сырая запись
pub(crate) fn render_summary(history: &ReadingHistory) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:<18} {:>14} {:>10}", "Parameter", "Value", "Interval");
    for ch in Channel::ALL {
        let (value, interval) = match history.last_valid(ch) {
            Some(v) => (ch.format_value(v.value), Channel::format_interval(v.interval_ms)),
            None => (NO_DATA.to_string(), NO_DATA.to_string()),
        };
        let _ = writeln!(out, "{:<18} {:>14} {:>10}", ch.label(), value, interval);
    }

    if let Some(raw) = history.last_raw() {
        let _ = writeln!(out, "Last record: {raw}");
    }

    out
}

/// Сводка рядов для графиков: сколько точек, охват по времени, средний интервал
pub(crate) fn render_series(history: &ReadingHistory) -> String {
    let mut out = String::new();

    for ch in Channel::ALL {
        let s = history.series(ch);
        let Some(mean) = s.mean_interval_s else {
            let _ = writeln!(out, "{ch}: {NO_DATA}");
            continue;
        };

        let (min_v, max_v) = s
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
                (lo.min(v), hi.max(v))
            });
        let span = s.points.last().map(|&(t, _)| t).unwrap_or(0.0);

        let _ = writeln!(
            out,
            "{ch}: points={} span={span:.1}s min={} max={} avg interval={mean:.2}s",
            s.points.len(),
            ch.format_value(min_v),
            ch.format_value(max_v),
        );
    }

    out
}
