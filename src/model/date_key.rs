use crate::config;
use crate::error::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Number of items found in one date folder. Zero doubles as "not fetched".
pub type AssembleCount = u32;

/// `EEEMMDD`: era year (Gregorian - 1911) padded to three digits, month, day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DateKey(String);

/// Era year followed by the year suffix, e.g. `114年`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FolderYearKey(String);

pub fn era_year(date: NaiveDate) -> i32 {
    date.year() - config::ERA_BASE_YEAR
}

fn checked_era_year(date: NaiveDate) -> AppResult<i32> {
    let era = era_year(date);
    if (1..=999).contains(&era) {
        Ok(era)
    } else {
        Err(AppError::Argument(format!(
            "{} is outside the representable era range",
            date
        )))
    }
}

impl DateKey {
    pub fn from_date(date: NaiveDate) -> AppResult<Self> {
        let era = checked_era_year(date)?;
        Ok(DateKey(format!(
            "{:03}{:02}{:02}",
            era,
            date.month(),
            date.day()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FolderYearKey {
    pub fn from_date(date: NaiveDate) -> AppResult<Self> {
        let era = checked_era_year(date)?;
        Ok(FolderYearKey(format!("{}{}", era, config::FOLDER_YEAR_SUFFIX)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FolderYearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One day of the look-back window and the folder labels that lead to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePlan {
    pub offset: u32,
    pub date: NaiveDate,
    pub date_key: DateKey,
    pub folder_year_key: FolderYearKey,
}

impl DatePlan {
    pub fn new(offset: u32, date: NaiveDate) -> AppResult<Self> {
        Ok(DatePlan {
            offset,
            date,
            date_key: DateKey::from_date(date)?,
            folder_year_key: FolderYearKey::from_date(date)?,
        })
    }
}
