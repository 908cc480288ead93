use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static TARGET_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2})\s*/\s*(\d{1,2})\s*$").expect("target date pattern is valid")
});

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// Leap year used to validate month/day pairs that carry no year.
const VALIDATION_YEAR: i32 = 2000;

/// A calendar day of interest, without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetDate {
    month: u32,
    day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetDateError {
    #[error("`{0}` is not in M/D form")]
    Malformed(String),
    #[error("{month}/{day} is not a day of the year")]
    OutOfRange { month: u32, day: u32 },
}

impl TargetDate {
    pub fn new(month: u32, day: u32) -> Result<Self, TargetDateError> {
        if NaiveDate::from_ymd_opt(VALIDATION_YEAR, month, day).is_none() {
            return Err(TargetDateError::OutOfRange { month, day });
        }
        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// English month name, e.g. "February".
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// Three letter month abbreviation, e.g. "Feb".
    pub fn month_abbrev(&self) -> &'static str {
        &self.month_name()[..3]
    }

    /// The date in a specific year, if it exists there (2/29 only exists in leap years).
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// Parses a comma separated list such as `2/21,2/22`, skipping empty entries.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, TargetDateError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for TargetDate {
    type Err = TargetDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = TARGET_DATE_PATTERN.captures(s) else {
            return Err(TargetDateError::Malformed(s.to_string()));
        };
        let (Ok(month), Ok(day)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return Err(TargetDateError::Malformed(s.to_string()));
        };
        Self::new(month, day)
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.day)
    }
}
