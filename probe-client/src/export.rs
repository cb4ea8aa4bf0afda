use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use log::info;
use probe_core::record::record_fields;
use probe_core::{FIELD_SEPARATOR, RECORD_HEADERS, ReadingHistory};

const LINE_END: &str = "\r\n";

/// Имя файла по времени захвата: `water_quality_YYYYMMDD_HHMMSS.csv`
pub(crate) fn csv_file_name(captured_at: &NaiveDateTime) -> String {
    format!("water_quality_{}.csv", captured_at.format("%Y%m%d_%H%M%S"))
}

/// Заголовок и по строке на запись, только первые 15 полей (без флага завершения).
/// Возвращает число записанных строк данных.
pub(crate) fn write_csv<W: Write>(out: W, history: &ReadingHistory) -> io::Result<usize> {
    let mut w = BufWriter::new(out);
    let sep = FIELD_SEPARATOR.to_string();

    write_row(&mut w, RECORD_HEADERS.iter().copied(), &sep)?;

    let mut rows = 0;
    for raw in history.raw_lines() {
        write_row(&mut w, record_fields(raw), &sep)?;
        rows += 1;
    }

    w.flush()?;
    Ok(rows)
}

pub(crate) fn export_csv(
    dir: &Path,
    history: &ReadingHistory,
    captured_at: &NaiveDateTime,
) -> Result<PathBuf> {
    if history.is_empty() {
        bail!("no data to save");
    }

    let path = dir.join(csv_file_name(captured_at));
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let rows = write_csv(file, history).with_context(|| format!("write {}", path.display()))?;

    info!("saved {rows} records to {}", path.display());
    Ok(path)
}

fn write_row<'a, W: Write>(
    w: &mut W,
    fields: impl Iterator<Item = &'a str>,
    sep: &str,
) -> io::Result<()> {
    let row: Vec<Cow<'a, str>> = fields.map(quote_field).collect();
    write!(w, "{}{LINE_END}", row.join(sep))
}

// минимальное CSV-экранирование: кавычки и переводы строк
fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains(['"', '\r', '\n']) || field.contains(FIELD_SEPARATOR) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
