//! Daily fire-time definition and next-run computation.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};

/// Errors produced while building a [`DailyTime`] from user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// Hour outside `0..=23`.
    #[error("hour must be between 0 and 23, got {0}")]
    HourOutOfRange(u32),
    /// Minute outside `0..=59`.
    #[error("minute must be between 0 and 59, got {0}")]
    MinuteOutOfRange(u32),
    /// Text that is not `HH:MM`.
    #[error("expected time as HH:MM, got '{0}'")]
    Malformed(String),
}

/// Wall-clock time of day at which the daily job fires.
///
/// Always holds a valid hour (0-23) and minute (0-59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailyTime {
    hour: u8,
    minute: u8,
}

impl DailyTime {
    /// Schedule installed at startup unless configured otherwise (09:00).
    pub const DEFAULT: Self = Self { hour: 9, minute: 0 };

    /// Validate and build a daily time.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when either field is out of range.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(ScheduleError::MinuteOutOfRange(minute));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    fn as_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl Default for DailyTime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for DailyTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::str::FromStr for DailyTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (hour, minute) = trimmed
            .split_once(':')
            .ok_or_else(|| ScheduleError::Malformed(trimmed.to_owned()))?;

        let parse = |part: &str| {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ScheduleError::Malformed(trimmed.to_owned()));
            }
            part.parse::<u32>()
                .map_err(|_| ScheduleError::Malformed(trimmed.to_owned()))
        };

        Self::new(parse(hour)?, parse(minute)?)
    }
}

/// First instant strictly after `after` whose local time of day is `at`.
///
/// Days where `at` does not exist (DST gap) are skipped. When `at` occurs
/// twice (DST fold) the earlier instant is used.
pub fn next_fire_after<Tz: TimeZone>(after: &DateTime<Tz>, at: DailyTime) -> DateTime<Tz> {
    let tz = after.timezone();
    let time = at.as_naive();
    let mut date = after.date_naive();

    // A zone can only skip a given wall time on isolated days, so a short
    // search always finds a valid instant.
    for _ in 0..8 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).earliest()
            && candidate > *after
        {
            return candidate;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    after.clone() + Duration::days(1)
}
