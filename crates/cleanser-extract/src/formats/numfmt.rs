//! SpreadsheetML number formats: which cell styles display dates, and how a
//! date serial reads as text

use super::ooxml::attr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_MICROS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIME_MICROS_FORMAT: &str = "%H:%M:%S%.6f";

/// 9999-12-31, the last day Excel can display
const MAX_SERIAL: f64 = 2_958_466.0;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Built-in format ids that display a date or time
fn is_builtin_date(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Whether a custom format code displays a date or time.
///
/// Only the first section counts. Quoted literals, escaped characters and
/// bracketed colours or locales are ignored; elapsed-time formats such as
/// `[h]:mm` are durations, not dates.
pub(crate) fn is_date_format(code: &str) -> bool {
    let section = code.split(';').next().unwrap_or_default();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for quoted in chars.by_ref() {
                    if quoted == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|&b| b != ']').collect();
                let elapsed = !inner.is_empty()
                    && inner
                        .chars()
                        .all(|b| matches!(b.to_ascii_lowercase(), 'h' | 'm' | 's'));
                if elapsed {
                    return false;
                }
            }
            c if matches!(c.to_ascii_lowercase(), 'd' | 'm' | 'y' | 'h' | 's') => return true,
            _ => {}
        }
    }
    false
}

/// Date-ness of every entry of `cellXfs`, indexed by a cell's `s` attribute
#[derive(Debug, Default)]
pub(crate) struct DateStyles {
    dates: Vec<bool>,
}

impl DateStyles {
    pub(crate) fn parse(xml: &str) -> std::result::Result<Self, quick_xml::Error> {
        let mut custom: HashMap<u32, String> = HashMap::new();
        let mut xf_formats: Vec<u32> = Vec::new();
        let mut in_cell_xfs = false;

        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"numFmt" => {
                        let id = attr(&e, b"numFmtId").and_then(|v| v.parse().ok());
                        if let (Some(id), Some(code)) = (id, attr(&e, b"formatCode")) {
                            custom.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        xf_formats.push(
                            attr(&e, b"numFmtId")
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(0),
                        );
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Eof => break,
                _ => {}
            }
        }

        let dates = xf_formats
            .into_iter()
            .map(|id| match custom.get(&id) {
                Some(code) => is_date_format(code),
                None => is_builtin_date(id),
            })
            .collect();
        Ok(Self { dates })
    }

    /// Whether the style at `index` displays a date
    pub(crate) fn is_date(&self, index: Option<usize>) -> bool {
        index
            .and_then(|i| self.dates.get(i))
            .copied()
            .unwrap_or(false)
    }
}

/// Render a date serial the way `str()` renders the equivalent Python value:
/// `YYYY-MM-DD HH:MM:SS`, or `HH:MM:SS` for a pure time below one day.
/// Returns `None` for serials no calendar date corresponds to.
pub(crate) fn serial_to_text(serial: f64, date1904: bool) -> Option<String> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }

    let day = serial.trunc();
    let millis = ((serial - day) * MILLIS_PER_DAY as f64).round() as i64;
    let has_micros = millis % 1000 != 0;

    if day == 0.0 && millis < MILLIS_PER_DAY {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (millis / 1000) as u32,
            (millis % 1000) as u32 * 1_000_000,
        )?;
        let format = if has_micros { TIME_MICROS_FORMAT } else { TIME_FORMAT };
        return Some(time.format(format).to_string());
    }

    let mut days = day as i64;
    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        // Serials below 60 predate the fictitious 1900-02-29
        if serial < 60.0 {
            days += 1;
        }
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let datetime = epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))?;
    let format = if has_micros { DATETIME_MICROS_FORMAT } else { DATETIME_FORMAT };
    Some(datetime.format(format).to_string())
}

/// Render an ISO 8601 `t="d"` cell value, `None` when it does not parse
pub(crate) fn iso_to_text(value: &str) -> Option<String> {
    let value = value.trim().trim_end_matches('Z');
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.format(DATETIME_FORMAT).to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(format!("{} 00:00:00", date.format("%Y-%m-%d")));
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .ok()
        .map(|time| time.format(TIME_FORMAT).to_string())
}
