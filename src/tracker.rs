use std::collections::HashMap;

use crate::{TargetDate, Verdict, Verdicts};

/// Remembers which dates were already alerted in their current availability
/// window.
///
/// Per date there are two states, unnotified and notified. Available moves an
/// unnotified date to notified and reports it; Unavailable re-arms it;
/// Indeterminate changes nothing.
#[derive(Debug, Default)]
pub struct NotificationStateTracker {
    already_notified: HashMap<TargetDate, bool>,
}

impl NotificationStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one cycle's verdicts into the state and returns the dates to
    /// notify now, in verdict order. Dates missing from `verdicts` keep
    /// their state.
    pub fn apply(&mut self, verdicts: &Verdicts) -> Vec<TargetDate> {
        let mut newly_available = Vec::new();
        for (date, verdict) in verdicts.iter() {
            match verdict {
                Verdict::Indeterminate => {}
                Verdict::Unavailable => {
                    self.already_notified.insert(date, false);
                }
                Verdict::Available => {
                    let notified = self.already_notified.entry(date).or_insert(false);
                    if !*notified {
                        *notified = true;
                        newly_available.push(date);
                    }
                }
            }
        }
        newly_available
    }

    pub fn is_notified(&self, date: TargetDate) -> bool {
        self.already_notified.get(&date).copied().unwrap_or(false)
    }
}
