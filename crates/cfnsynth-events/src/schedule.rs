//! Schedule expressions for scheduled rules.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("schedule rate cannot be zero")]
    ZeroRate,
    #[error("schedule rate must be a whole number of minutes, got {0:?}")]
    FractionalMinutes(Duration),
    #[error("cannot supply both day and week_day, use at most one")]
    DayAndWeekDay,
}

/// A `rate(...)` or `cron(...)` schedule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    expression: String,
}

/// Fields of a cron schedule; unset fields match every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CronOptions {
    pub minute: Option<String>,
    pub hour: Option<String>,
    pub day: Option<String>,
    pub month: Option<String>,
    pub week_day: Option<String>,
    pub year: Option<String>,
}

impl Schedule {
    /// A raw expression passed through as-is, e.g. `rate(5 minutes)`.
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Runs every `duration`, expressed in the largest unit that divides it.
    pub fn rate(duration: Duration) -> Result<Self, ScheduleError> {
        if duration.is_zero() {
            return Err(ScheduleError::ZeroRate);
        }
        if duration.subsec_nanos() != 0 || duration.as_secs() % 60 != 0 {
            return Err(ScheduleError::FractionalMinutes(duration));
        }
        let minutes = duration.as_secs() / 60;
        let expression = if minutes % (24 * 60) == 0 {
            make_rate(minutes / (24 * 60), "day")
        } else if minutes % 60 == 0 {
            make_rate(minutes / 60, "hour")
        } else {
            make_rate(minutes, "minute")
        };
        Ok(Self { expression })
    }

    pub fn cron(options: CronOptions) -> Result<Self, ScheduleError> {
        if options.day.is_some() && options.week_day.is_some() {
            return Err(ScheduleError::DayAndWeekDay);
        }
        let minute = options.minute.as_deref().unwrap_or("*");
        let hour = options.hour.as_deref().unwrap_or("*");
        let month = options.month.as_deref().unwrap_or("*");
        let year = options.year.as_deref().unwrap_or("*");
        // CloudWatch requires '?' in whichever of day/week-day is not constrained.
        let day = options
            .day
            .as_deref()
            .unwrap_or(if options.week_day.is_some() { "?" } else { "*" });
        let week_day = options.week_day.as_deref().unwrap_or("?");
        Ok(Self {
            expression: format!("cron({minute} {hour} {day} {month} {week_day} {year})"),
        })
    }

    pub fn expression_string(&self) -> &str {
        &self.expression
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn make_rate(interval: u64, unit: &str) -> String {
    if interval == 1 {
        format!("rate(1 {unit})")
    } else {
        format!("rate({interval} {unit}s)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_uses_largest_exact_unit() {
        let minutes = |m: u64| Duration::from_secs(m * 60);
        assert_eq!(
            Schedule::rate(minutes(1)).expect("rate").expression_string(),
            "rate(1 minute)"
        );
        assert_eq!(
            Schedule::rate(minutes(90)).expect("rate").expression_string(),
            "rate(90 minutes)"
        );
        assert_eq!(
            Schedule::rate(minutes(120)).expect("rate").expression_string(),
            "rate(2 hours)"
        );
        assert_eq!(
            Schedule::rate(minutes(24 * 60)).expect("rate").expression_string(),
            "rate(1 day)"
        );
    }

    #[test]
    fn rate_rejects_zero_and_fractions() {
        assert_eq!(Schedule::rate(Duration::ZERO), Err(ScheduleError::ZeroRate));
        assert!(matches!(
            Schedule::rate(Duration::from_secs(90)),
            Err(ScheduleError::FractionalMinutes(_))
        ));
    }

    #[test]
    fn cron_fills_defaults() {
        let schedule = Schedule::cron(CronOptions {
            minute: Some("0".into()),
            hour: Some("3".into()),
            ..CronOptions::default()
        })
        .expect("cron");
        assert_eq!(schedule.to_string(), "cron(0 3 * * ? *)");

        let schedule = Schedule::cron(CronOptions {
            week_day: Some("MON".into()),
            ..CronOptions::default()
        })
        .expect("cron");
        assert_eq!(schedule.to_string(), "cron(* * ? * MON *)");
    }

    #[test]
    fn cron_rejects_day_with_week_day() {
        let err = Schedule::cron(CronOptions {
            day: Some("1".into()),
            week_day: Some("MON".into()),
            ..CronOptions::default()
        })
        .expect_err("both");
        assert_eq!(err, ScheduleError::DayAndWeekDay);
    }
}
