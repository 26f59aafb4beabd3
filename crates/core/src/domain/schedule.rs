use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use error_stack::report;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid schedule '{expression}': {details}")]
    InvalidExpression { expression: String, details: String },
}

impl ScheduleError {
    fn invalid<S: Into<String>>(expression: &str, details: S) -> Self {
        ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            details: details.into(),
        }
    }
}

/// A trigger that fires once per day at a fixed UTC time of day.
///
/// Accepts either a daily cron expression (`"M H * * *"`, the shape used by CI
/// schedules) or a plain `"HH:MM"` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn at(hour: u32, minute: u32) -> error_stack::Result<Self, ScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or_else(|| {
                report!(ScheduleError::invalid(
                    &format!("{hour}:{minute}"),
                    "hour must be 0-23 and minute 0-59"
                ))
            })
    }

    pub fn parse(expression: &str) -> error_stack::Result<Self, ScheduleError> {
        let expression = expression.trim();

        if let Ok(time) = NaiveTime::parse_from_str(expression, "%H:%M") {
            return Ok(Self { time });
        }

        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(report!(ScheduleError::invalid(
                expression,
                "expected 'HH:MM' or a five-field cron expression"
            )));
        }

        if fields[2..].iter().any(|field| *field != "*") {
            return Err(report!(ScheduleError::invalid(
                expression,
                "only daily cron expressions are supported (day, month and weekday must be '*')"
            )));
        }

        let minute = fields[0]
            .parse::<u32>()
            .map_err(|_| report!(ScheduleError::invalid(expression, "minute must be a number")))?;
        let hour = fields[1]
            .parse::<u32>()
            .map_err(|_| report!(ScheduleError::invalid(expression, "hour must be a number")))?;

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or_else(|| {
                report!(ScheduleError::invalid(
                    expression,
                    "hour must be 0-23 and minute 0-59"
                ))
            })
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.time));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    pub fn duration_until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

impl FromStr for DailySchedule {
    type Err = error_stack::Report<ScheduleError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DailySchedule::parse(s)
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daily at {} UTC", self.time.format("%H:%M"))
    }
}
