use jiff::civil::{Date, Time};
use crate::schedule::{self, ScheduleError};

/// Every calendar date in `[start, end]`, ascending. Empty when `start > end`.
#[derive(Clone, Debug)]
pub struct DateRange {
    next: Option<Date>,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { next: (start <= end).then_some(start), end }
    }
}

impl Iterator for DateRange {
    type Item = Date;

    fn next(&mut self) -> Option<Date> {
        let current = self.next?;
        self.next = current.tomorrow().ok().filter(|d| *d <= self.end);
        Some(current)
    }
}

/// One concrete screening, not yet persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub movie_id: i32,
    pub date: Date,
    pub time: Time,
}

/// Expands recurring schedule descriptors into concrete sessions over
/// `[start, end]`.
///
/// Output is ordered by date, then by the position of the descriptor in
/// `schedules`. Every descriptor is parsed before anything is produced, so a
/// single malformed entry yields an error and no sessions.
pub fn generate<S: AsRef<str>>(
    movie_id: i32,
    schedules: &[S],
    start: Date,
    end: Date,
) -> Result<Vec<SessionRecord>, ScheduleError> {
    let rules = schedule::parse_all(schedules)?;
    if start > end {
        return Err(ScheduleError::InvertedWindow { start, end });
    }
    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let sessions = DateRange::new(start, end)
        .flat_map(|date| {
            rules
                .iter()
                .filter(move |rule| rule.matches(date))
                .map(move |rule| SessionRecord { movie_id, date, time: rule.time })
        })
        .collect();

    Ok(sessions)
}
