use std::fmt;

use crate::TargetDate;

/// Outcome of one detection pass for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Available,
    Unavailable,
    /// No usable signal. Never notifies and never clears notification state.
    Indeterminate,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Available => "available",
            Verdict::Unavailable => "unavailable",
            Verdict::Indeterminate => "indeterminate",
        };
        f.write_str(label)
    }
}

/// Verdicts of one check cycle, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdicts {
    entries: Vec<(TargetDate, Verdict)>,
}

impl Verdicts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every date gets the same verdict.
    pub fn uniform(dates: &[TargetDate], verdict: Verdict) -> Self {
        dates.iter().map(|date| (*date, verdict)).collect()
    }

    /// Inserts or replaces the verdict for `date`, keeping its original position.
    pub fn insert(&mut self, date: TargetDate, verdict: Verdict) {
        match self.entries.iter_mut().find(|(d, _)| *d == date) {
            Some(entry) => entry.1 = verdict,
            None => self.entries.push((date, verdict)),
        }
    }

    pub fn get(&self, date: TargetDate) -> Option<Verdict> {
        self.entries
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, verdict)| *verdict)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetDate, Verdict)> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<(TargetDate, Verdict)> for Verdicts {
    fn from_iter<I: IntoIterator<Item = (TargetDate, Verdict)>>(iter: I) -> Self {
        let mut verdicts = Verdicts::new();
        for (date, verdict) in iter {
            verdicts.insert(date, verdict);
        }
        verdicts
    }
}
