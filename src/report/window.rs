//! Report periods and the time windows they cover.

use crate::error::ApiError;
use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Weekly,
    Monthly,
    Custom,
    All,
}

/// Report parameters as supplied by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub period: ReportPeriod,
    /// `YYYY-MM-DD`, required for custom periods.
    #[serde(default)]
    pub start: Option<String>,
    /// `YYYY-MM-DD`, inclusive, required for custom periods.
    #[serde(default)]
    pub end: Option<String>,
    /// Restrict to tasks assigned to this employee.
    #[serde(default)]
    pub employee: Option<String>,
}

/// Inclusive local-day bounds on `created_at`, with their ms equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("{0} is required for a custom period")]
    MissingDate(&'static str),
    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    #[error("date out of range")]
    OutOfRange,
}

impl From<WindowError> for ApiError {
    fn from(err: WindowError) -> Self {
        match &err {
            WindowError::MissingDate(field) => ApiError::missing_field(field),
            WindowError::InvalidDate { field, .. } => {
                ApiError::invalid_value(field, &err.to_string())
            }
            WindowError::StartAfterEnd { .. } => ApiError::invalid_value("start", &err.to_string()),
            WindowError::OutOfRange => ApiError::invalid_value("period", &err.to_string()),
        }
    }
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<NaiveDate, WindowError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(WindowError::MissingDate(field))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| WindowError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Milliseconds at local midnight starting `date`.
fn day_start_ms(date: NaiveDate, offset: FixedOffset) -> Result<i64, WindowError> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.timestamp_millis())
        .ok_or(WindowError::OutOfRange)
}

fn window(
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> Result<ReportWindow, WindowError> {
    let after_end = end.checked_add_days(Days::new(1)).ok_or(WindowError::OutOfRange)?;
    Ok(ReportWindow {
        start_date: start,
        end_date: end,
        start_ms: day_start_ms(start, offset)?,
        end_ms: day_start_ms(after_end, offset)? - 1,
    })
}

/// Compute the window for a request, evaluated at `now` in `offset`.
pub fn resolve_window(
    request: &ReportRequest,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Option<ReportWindow>, WindowError> {
    let today = now.with_timezone(&offset).date_naive();

    let (start, end) = match request.period {
        ReportPeriod::All => return Ok(None),
        ReportPeriod::Weekly => {
            let since_sunday = u64::from(today.weekday().num_days_from_sunday());
            let start = today
                .checked_sub_days(Days::new(since_sunday))
                .ok_or(WindowError::OutOfRange)?;
            let end = start
                .checked_add_days(Days::new(6))
                .ok_or(WindowError::OutOfRange)?;
            (start, end)
        }
        ReportPeriod::Monthly => {
            let start = today.with_day(1).ok_or(WindowError::OutOfRange)?;
            let end = start
                .checked_add_months(chrono::Months::new(1))
                .and_then(|next| next.pred_opt())
                .ok_or(WindowError::OutOfRange)?;
            (start, end)
        }
        ReportPeriod::Custom => {
            let start = parse_date("start", request.start.as_deref())?;
            let end = parse_date("end", request.end.as_deref())?;
            if start > end {
                return Err(WindowError::StartAfterEnd { start, end });
            }
            (start, end)
        }
    };

    window(start, end, offset).map(Some)
}

/// Offset from minutes east of UTC, clamped to a valid range.
pub fn utc_offset(minutes: i32) -> FixedOffset {
    let seconds = minutes.clamp(-23 * 60, 23 * 60) * 60;
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cairo() -> FixedOffset {
        utc_offset(120)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn request(period: ReportPeriod) -> ReportRequest {
        ReportRequest {
            period,
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_starts_on_sunday() {
        // Wednesday 2026-10-14
        let w = resolve_window(&request(ReportPeriod::Weekly), at(2026, 10, 14, 10), cairo())
            .unwrap()
            .unwrap();
        assert_eq!(w.start_date, date(2026, 10, 11));
        assert_eq!(w.end_date, date(2026, 10, 17));
    }

    #[test]
    fn weekly_on_sunday_starts_today() {
        let w = resolve_window(&request(ReportPeriod::Weekly), at(2026, 10, 18, 10), cairo())
            .unwrap()
            .unwrap();
        assert_eq!(w.start_date, date(2026, 10, 18));
    }

    #[test]
    fn local_offset_decides_the_day() {
        // 23:30 UTC Saturday is already Sunday in Cairo.
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 30, 0).unwrap();
        let w = resolve_window(&request(ReportPeriod::Weekly), now, cairo())
            .unwrap()
            .unwrap();
        assert_eq!(w.start_date, date(2026, 10, 18));
        // Window starts at local midnight, 22:00 UTC the previous day.
        assert_eq!(
            w.start_ms,
            Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap().timestamp_millis()
        );
    }

    #[test]
    fn monthly_covers_whole_month() {
        let w = resolve_window(&request(ReportPeriod::Monthly), at(2028, 2, 10, 12), cairo())
            .unwrap()
            .unwrap();
        assert_eq!(w.start_date, date(2028, 2, 1));
        assert_eq!(w.end_date, date(2028, 2, 29));
    }

    #[test]
    fn custom_end_is_inclusive() {
        let req = ReportRequest {
            period: ReportPeriod::Custom,
            start: Some("2026-10-01".into()),
            end: Some("2026-10-01".into()),
            employee: None,
        };
        let w = resolve_window(&req, at(2026, 10, 18, 0), cairo()).unwrap().unwrap();
        assert_eq!(w.end_ms - w.start_ms, 24 * 60 * 60 * 1000 - 1);
    }

    #[test]
    fn custom_validates_dates() {
        let mut req = ReportRequest {
            period: ReportPeriod::Custom,
            start: Some("2026-10-05".into()),
            end: None,
            employee: None,
        };
        let now = at(2026, 10, 18, 0);
        assert_eq!(resolve_window(&req, now, cairo()), Err(WindowError::MissingDate("end")));

        req.end = Some("05/10/2026".into());
        assert!(matches!(
            resolve_window(&req, now, cairo()),
            Err(WindowError::InvalidDate { field: "end", .. })
        ));

        req.end = Some("2026-10-01".into());
        assert!(matches!(
            resolve_window(&req, now, cairo()),
            Err(WindowError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn all_has_no_window() {
        assert_eq!(
            resolve_window(&request(ReportPeriod::All), at(2026, 1, 1, 0), cairo()).unwrap(),
            None
        );
    }
}
