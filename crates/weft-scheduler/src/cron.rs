//! A deliberately constrained cron subset: five whitespace-separated
//! fields `minute hour day month dow`. Only the minute field is actually
//! evaluated; the rest are accepted syntactically and otherwise ignored —
//! this is the documented contract, not an oversight (see the scheduler's
//! module docs).

use chrono::{DateTime, Duration, Timelike, Utc};

use weft_core::error::{ValidationError, WeftResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MinuteSpec {
    Specific(u32),
    EveryN(u32),
}

#[derive(Debug, Clone)]
pub struct CronSchedule {
    minute: MinuteSpec,
}

/// Parses the minute field of a five-field cron expression.
///
/// Supported: a specific minute (`"30"`) or a step (`"*/N"`). A bare `"*"`
/// is rejected — this subset has no notion of "every minute". Hour/day/
/// month/day-of-week are required to be present but are never interpreted.
pub fn parse_cron(expr: &str) -> WeftResult<CronSchedule> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(ValidationError::InvalidCron.into());
    }
    if fields[1..].iter().any(|f| f.is_empty()) {
        return Err(ValidationError::InvalidCron.into());
    }

    let minute_field = fields[0];
    if minute_field == "*" {
        return Err(ValidationError::WildcardMinute.into());
    }

    let minute = if let Some(step) = minute_field.strip_prefix("*/") {
        let n: u32 = step.parse().map_err(|_| ValidationError::InvalidCron)?;
        if n == 0 || n > 59 {
            return Err(ValidationError::InvalidCron.into());
        }
        MinuteSpec::EveryN(n)
    } else {
        let m: u32 = minute_field.parse().map_err(|_| ValidationError::InvalidCron)?;
        if m > 59 {
            return Err(ValidationError::InvalidCron.into());
        }
        MinuteSpec::Specific(m)
    };

    Ok(CronSchedule { minute })
}

impl CronSchedule {
    /// The next fire time strictly after `from`, per the minute rule.
    pub fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let base = from
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(from);

        match self.minute {
            MinuteSpec::Specific(m) => {
                let candidate = base.with_minute(m).unwrap_or(base);
                if candidate <= from {
                    candidate + Duration::hours(1)
                } else {
                    candidate
                }
            }
            MinuteSpec::EveryN(n) => {
                let next_multiple = ((from.minute() / n) + 1) * n;
                if next_multiple >= 60 {
                    (base + Duration::hours(1))
                        .with_minute(0)
                        .unwrap_or(base + Duration::hours(1))
                } else {
                    base.with_minute(next_multiple).unwrap_or(base)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bare_wildcard_is_rejected() {
        let err = parse_cron("*").unwrap_err();
        assert!(err.to_string().contains("invalid cron expression format"));
    }

    #[test]
    fn wildcard_minute_field_is_rejected() {
        let err = parse_cron("* * * * *").unwrap_err();
        assert!(err.to_string().contains("wildcard minutes not supported"));
    }

    #[test]
    fn step_minute_yields_a_time_within_the_next_n_minutes() {
        let schedule = parse_cron("*/5 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 12, 30).unwrap();
        let next = schedule.next_after(now);
        assert!(next > now);
        assert!(next - now <= Duration::minutes(5));
    }

    #[test]
    fn step_minute_rolls_over_to_the_next_hour_on_overflow() {
        let schedule = parse_cron("*/20 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 55, 0).unwrap();
        let next = schedule.next_after(now);
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn specific_minute_rolls_to_next_hour_when_already_past() {
        let schedule = parse_cron("15 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 20, 0).unwrap();
        let next = schedule.next_after(now);
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 15);
    }

    #[test]
    fn specific_minute_fires_later_this_hour_when_still_ahead() {
        let schedule = parse_cron("45 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 20, 0).unwrap();
        let next = schedule.next_after(now);
        assert_eq!(next.hour(), 10);
        assert_eq!(next.minute(), 45);
    }

    #[test]
    fn rejects_non_five_field_input() {
        assert!(parse_cron("*/5 * * *").is_err());
        assert!(parse_cron("*/5 * * * * *").is_err());
    }

    #[test]
    fn rejects_non_numeric_minute() {
        assert!(parse_cron("soon * * * *").is_err());
    }

    #[test]
    fn rejects_out_of_range_minute() {
        assert!(parse_cron("60 * * * *").is_err());
        assert!(parse_cron("*/0 * * * *").is_err());
    }
}
