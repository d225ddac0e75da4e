use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{movie, session},
    error::{AppError, AppResult},
    schedule::{self, ScheduleError},
};

/// Mutable movie fields as submitted by clients.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub schedules: Vec<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub id: i32,
    #[serde(flatten)]
    pub fields: MovieFields,
}

/// Movie fields that passed validation: dates are real calendar dates in
/// order and every schedule descriptor parses.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieInput {
    pub title: String,
    pub description: String,
    pub schedules: Vec<String>,
    pub start_date: Date,
    pub end_date: Date,
}

impl MovieFields {
    pub fn validate(self) -> AppResult<MovieInput> {
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        if start_date > end_date {
            return Err(ScheduleError::InvertedWindow { start: start_date, end: end_date }.into());
        }
        schedule::parse_all(self.schedules.as_slice())?;

        Ok(MovieInput {
            title: self.title,
            description: self.description,
            schedules: self.schedules,
            start_date,
            end_date,
        })
    }
}

fn parse_date(value: &str) -> AppResult<Date> {
    value
        .trim()
        .parse()
        .map_err(|source| AppError::InvalidDate { value: value.to_string(), source })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct MovieList {
    pub count: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub movies: Vec<movie::Model>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub count: usize,
    pub sessions: Vec<session::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
