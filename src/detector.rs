//! Heuristic availability detection over rendered page text.
//!
//! The page's markup is not ours and changes without notice, so detection
//! works on plain text only. Known limitations:
//!
//! - Negative keywords are page-wide. A "sold out" marker anywhere makes every
//!   target Unavailable, including targets that are in fact open. Short
//!   keywords such as "full" also match inside longer words ("helpful").
//! - Every literal, even a numeric one, only counts once the target's month
//!   name is on the page. A calendar showing another month lists the same
//!   day numbers.
//! - A bare day number matches any standalone occurrence of that number on
//!   a page that names the month (prices, counts), so it is the weakest
//!   encoding and is tried last.
//! - Month names are matched as whole words, but "May" and "March" are also
//!   ordinary English ("you may ..."), so for those months the page almost
//!   always looks like it shows the month.
//! - Month names are English only.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local};

use crate::{ChallengePhrases, TargetDate, Verdict, Verdicts, text::normalize};

pub const DEFAULT_NEGATIVE_KEYWORDS: [&str; 4] = ["sold out", "unavailable", "full", "closed"];

/// A literal way a date may be written on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// "February 21"
    FullMonthDay,
    /// "Feb 21"
    AbbrevMonthDay,
    /// "2/21"
    Numeric,
    /// "02/21"
    PaddedNumeric,
    /// "2026-02-21", once per year in the detector's window.
    Iso,
    /// "21"
    BareDay,
}

impl DateEncoding {
    pub const ALL: [DateEncoding; 6] = [
        DateEncoding::FullMonthDay,
        DateEncoding::AbbrevMonthDay,
        DateEncoding::Numeric,
        DateEncoding::PaddedNumeric,
        DateEncoding::Iso,
        DateEncoding::BareDay,
    ];

    /// Parses a comma separated list such as `full,numeric,day`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, UnknownDateEncoding> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }

    fn render(self, date: TargetDate, years: &[i32], out: &mut Vec<String>) {
        let (month, day) = (date.month(), date.day());
        match self {
            DateEncoding::FullMonthDay => out.push(format!("{} {day}", date.month_name())),
            DateEncoding::AbbrevMonthDay => out.push(format!("{} {day}", date.month_abbrev())),
            DateEncoding::Numeric => out.push(format!("{month}/{day}")),
            DateEncoding::PaddedNumeric => out.push(format!("{month:02}/{day:02}")),
            DateEncoding::Iso => out.extend(
                years
                    .iter()
                    .filter_map(|year| date.in_year(*year))
                    .map(|full| full.format("%Y-%m-%d").to_string()),
            ),
            DateEncoding::BareDay => out.push(day.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown date format `{0}` (expected full, abbrev, numeric, padded, iso or day)")]
pub struct UnknownDateEncoding(String);

impl FromStr for DateEncoding {
    type Err = UnknownDateEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(DateEncoding::FullMonthDay),
            "abbrev" => Ok(DateEncoding::AbbrevMonthDay),
            "numeric" => Ok(DateEncoding::Numeric),
            "padded" => Ok(DateEncoding::PaddedNumeric),
            "iso" => Ok(DateEncoding::Iso),
            "day" => Ok(DateEncoding::BareDay),
            _ => Err(UnknownDateEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for DateEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateEncoding::FullMonthDay => "full",
            DateEncoding::AbbrevMonthDay => "abbrev",
            DateEncoding::Numeric => "numeric",
            DateEncoding::PaddedNumeric => "padded",
            DateEncoding::Iso => "iso",
            DateEncoding::BareDay => "day",
        };
        f.write_str(name)
    }
}

/// Decides per target date whether the page shows it as purchasable.
#[derive(Debug, Clone)]
pub struct AvailabilityDetector {
    challenge: ChallengePhrases,
    negative_keywords: Vec<String>,
    encodings: Vec<DateEncoding>,
    years: Vec<i32>,
}

impl Default for AvailabilityDetector {
    fn default() -> Self {
        let this_year = Local::now().year();
        Self {
            challenge: ChallengePhrases::default(),
            negative_keywords: DEFAULT_NEGATIVE_KEYWORDS.map(String::from).to_vec(),
            encodings: DateEncoding::ALL.to_vec(),
            years: vec![this_year, this_year + 1],
        }
    }
}

impl AvailabilityDetector {
    pub fn with_challenge_phrases(mut self, challenge: ChallengePhrases) -> Self {
        self.challenge = challenge;
        self
    }

    pub fn with_negative_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.negative_keywords = keywords
            .into_iter()
            .map(|keyword| normalize(keyword.as_ref()))
            .filter(|keyword| !keyword.is_empty())
            .collect();
        self
    }

    /// Encodings to try, in order. The first one found on the page wins.
    pub fn with_encodings(mut self, encodings: Vec<DateEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Years used for the ISO encoding.
    pub fn with_years(mut self, years: Vec<i32>) -> Self {
        self.years = years;
        self
    }

    pub fn evaluate(&self, rendered_text: &str, date: TargetDate) -> Verdict {
        self.evaluate_normalized(&normalize(rendered_text), date)
    }

    /// Evaluates every target against one text. No text means no signal.
    pub fn evaluate_all(&self, rendered_text: Option<&str>, targets: &[TargetDate]) -> Verdicts {
        let Some(text) = rendered_text else {
            return Verdicts::uniform(targets, Verdict::Indeterminate);
        };
        let text = normalize(text);
        targets
            .iter()
            .map(|date| (*date, self.evaluate_normalized(&text, *date)))
            .collect()
    }

    /// The literal encodings tried for `date`, lowercased, in order.
    pub fn encodings_for(&self, date: TargetDate) -> Vec<String> {
        let mut out = Vec::new();
        for encoding in &self.encodings {
            encoding.render(date, &self.years, &mut out);
        }
        out.iter().map(|literal| literal.to_lowercase()).collect()
    }

    fn evaluate_normalized(&self, text: &str, date: TargetDate) -> Verdict {
        if self.challenge.matches_normalized(text) {
            return Verdict::Indeterminate;
        }
        if self
            .negative_keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
        {
            return Verdict::Unavailable;
        }
        // A literal only counts on a page that renders the date's month.
        let month_rendered = contains_literal(text, &date.month_name().to_lowercase());
        if !month_rendered {
            return Verdict::Unavailable;
        }
        if self
            .encodings_for(date)
            .iter()
            .any(|literal| contains_literal(text, literal))
        {
            return Verdict::Available;
        }
        Verdict::Indeterminate
    }
}

/// Substring search that will not split a number or a word: a literal whose
/// first (or last) character is a digit or letter must not touch another
/// character of the same kind on that side.
fn contains_literal(text: &str, literal: &str) -> bool {
    if literal.is_empty() {
        return false;
    }
    let same_kind = |a: char, b: char| {
        (a.is_ascii_digit() && b.is_ascii_digit()) || (a.is_alphabetic() && b.is_alphabetic())
    };
    let (Some(first), Some(last)) = (literal.chars().next(), literal.chars().next_back()) else {
        return false;
    };

    text.match_indices(literal).any(|(start, _)| {
        let end = start + literal.len();
        let joined_before = text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| same_kind(c, first));
        let joined_after = text[end..].chars().next().is_some_and(|c| same_kind(c, last));
        !joined_before && !joined_after
    })
}
