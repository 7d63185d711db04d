use chrono::{DateTime, NaiveDate, NaiveDateTime};

re!(re_iso, r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$");
re!(re_numeric_us, r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{2}|\d{4})$");

/// Month-name layouts tried after the numeric forms.
const NAMED_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse statement date text into a calendar date.
///
/// Numeric dates are read month-first (`MM/DD/YYYY`), two-digit years land in
/// 20YY. Returns `None` for anything that is not a real date.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(c) = re_iso().captures(s) {
        let y: i32 = c[1].parse().ok()?;
        let m: u32 = c[2].parse().ok()?;
        let d: u32 = c[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(c) = re_numeric_us().captures(s) {
        let m: u32 = c[1].parse().ok()?;
        let d: u32 = c[2].parse().ok()?;
        let y = expand_year(c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    // `%Y` would happily accept a two-digit year, so the numeric forms above
    // are matched by hand and only named months go through chrono.
    for fmt in NAMED_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

pub(crate) fn expand_year(y: i32) -> i32 {
    if y < 100 {
        2000 + y
    } else {
        y
    }
}
