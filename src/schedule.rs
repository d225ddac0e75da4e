use std::{fmt, str::FromStr};

use jiff::civil::{Date, Time, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid schedule format {0:?}, expected a weekday and a 24h time such as \"Mon 18:00\"")]
    InvalidFormat(String),
    #[error("start date {start} is after end date {end}")]
    InvertedWindow { start: Date, end: Date },
}

/// A parsed schedule descriptor: every `weekday` at `time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleRule {
    pub weekday: Weekday,
    pub time: Time,
}

impl ScheduleRule {
    pub fn matches(&self, date: Date) -> bool {
        date.weekday() == self.weekday
    }
}

impl FromStr for ScheduleRule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidFormat(s.to_string());

        let mut parts = s.split_ascii_whitespace();
        let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let weekday = parse_weekday(day).ok_or_else(invalid)?;
        let time = parse_time(time).ok_or_else(invalid)?;
        Ok(Self { weekday, time })
    }
}

impl fmt::Display for ScheduleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", weekday_abbrev(self.weekday), hhmm(self.time))
    }
}

/// Parses every descriptor, failing on the first one that is malformed.
pub fn parse_all<S: AsRef<str>>(descriptors: &[S]) -> Result<Vec<ScheduleRule>, ScheduleError> {
    descriptors.iter().map(|d| d.as_ref().parse()).collect()
}

/// Formats a time of day the way sessions are stored, e.g. `18:00`.
pub fn hhmm(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    let day = match s.to_ascii_lowercase().as_str() {
        "mon" | "monday" => Weekday::Monday,
        "tue" | "tuesday" => Weekday::Tuesday,
        "wed" | "wednesday" => Weekday::Wednesday,
        "thu" | "thursday" => Weekday::Thursday,
        "fri" | "friday" => Weekday::Friday,
        "sat" | "saturday" => Weekday::Saturday,
        "sun" | "sunday" => Weekday::Sunday,
        _ => return None,
    };
    Some(day)
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

// Strict HH:MM, no single-digit hours and no seconds.
fn parse_time(s: &str) -> Option<Time> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let digit = |i: usize| bytes[i].is_ascii_digit().then(|| (bytes[i] - b'0') as i8);

    let hour = digit(0)? * 10 + digit(1)?;
    let minute = digit(3)? * 10 + digit(4)?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Time::new(hour, minute, 0, 0).ok()
}
