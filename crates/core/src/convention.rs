use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DATE_TOKEN_LEN: usize = 8;
const TIME_TOKEN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min_year: i32,
    pub max_year: i32,
}

impl YearBounds {
    pub fn new(min_year: i32, max_year: i32) -> Result<Self, ConventionError> {
        if min_year > max_year {
            return Err(ConventionError::InvalidBounds { min_year, max_year });
        }
        Ok(Self { min_year, max_year })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self {
            min_year: 1800,
            max_year: 2300,
        }
    }
}

impl fmt::Display for YearBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min_year, self.max_year)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConventionError {
    #[error("日付入りファイル名ではありません: {0}")]
    NotCanonical(String),
    #[error("年が範囲外です: {year} (許容範囲 {bounds})")]
    YearOutOfBounds { year: i32, bounds: YearBounds },
    #[error("年の範囲が不正です: {min_year} > {max_year}")]
    InvalidBounds { min_year: i32, max_year: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDate {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl NameDate {
    pub fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn to_naive_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or_default())
    }

    pub fn token(&self) -> String {
        match self.time {
            Some(time) => format!("{}_{}", self.date.format("%Y%m%d"), time.format("%H%M%S")),
            None => self.date.format("%Y%m%d").to_string(),
        }
    }
}

impl From<NaiveDateTime> for NameDate {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            date: value.date(),
            time: Some(value.time()),
        }
    }
}

pub fn is_canonical(name: &str, bounds: &YearBounds) -> bool {
    decode(name, bounds).is_ok()
}

pub fn decode(name: &str, bounds: &YearBounds) -> Result<NameDate, ConventionError> {
    let not_canonical = || ConventionError::NotCanonical(name.to_string());
    let stem = file_stem(name);
    let bytes = stem.as_bytes();

    let date = parse_date_digits(bytes).ok_or_else(not_canonical)?;
    let rest = &bytes[DATE_TOKEN_LEN..];
    let time = match rest.split_first() {
        None => None,
        Some((sep, after)) if is_separator(*sep) => parse_time_group(after),
        Some(_) => return Err(not_canonical()),
    };

    let decoded = NameDate::new(date, time);
    if !bounds.contains(decoded.year()) {
        return Err(ConventionError::YearOutOfBounds {
            year: decoded.year(),
            bounds: *bounds,
        });
    }
    Ok(decoded)
}

pub(crate) fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

pub(crate) fn is_separator(byte: u8) -> bool {
    matches!(byte, b'_' | b'-' | b' ' | b'.')
}

pub(crate) fn parse_date_digits(bytes: &[u8]) -> Option<NaiveDate> {
    let token = digits(bytes, DATE_TOKEN_LEN)?;
    let year = (token / 10_000) as i32;
    let month = (token / 100 % 100) as u32;
    let day = (token % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub(crate) fn parse_time_digits(bytes: &[u8]) -> Option<NaiveTime> {
    let token = digits(bytes, TIME_TOKEN_LEN)?;
    NaiveTime::from_hms_opt(
        (token / 10_000) as u32,
        (token / 100 % 100) as u32,
        (token % 100) as u32,
    )
}

fn parse_time_group(bytes: &[u8]) -> Option<NaiveTime> {
    let time = parse_time_digits(bytes)?;
    match bytes.get(TIME_TOKEN_LEN) {
        None => Some(time),
        Some(next) if is_separator(*next) => Some(time),
        Some(_) => None,
    }
}

fn digits(bytes: &[u8], len: usize) -> Option<u32> {
    let token = bytes.get(..len)?;
    if !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        token
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}
