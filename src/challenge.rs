use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::{renderer::PageRenderer, text::normalize};

pub const DEFAULT_CHALLENGE_PHRASES: [&str; 5] = [
    "just a moment",
    "checking your browser",
    "verifying you are human",
    "needs to review the security of your connection",
    "enable javascript and cookies to continue",
];

/// Phrases that mark an anti-automation interstitial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePhrases {
    phrases: Vec<String>,
}

impl ChallengePhrases {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|phrase| normalize(phrase.as_ref()))
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_normalized(&normalize(text))
    }

    /// `text` must already be lowercased with whitespace collapsed.
    pub(crate) fn matches_normalized(&self, text: &str) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }
}

impl Default for ChallengePhrases {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_PHRASES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The carried text no longer shows the challenge.
    Passed(String),
    /// The budget ran out; carries the last sample obtained.
    TimedOut(String),
    Cancelled,
}

impl GateOutcome {
    pub fn into_text(self) -> Option<String> {
        match self {
            GateOutcome::Passed(text) | GateOutcome::TimedOut(text) => Some(text),
            GateOutcome::Cancelled => None,
        }
    }
}

/// Waits out an anti-automation interstitial with a hard deadline.
#[derive(Debug, Clone)]
pub struct ChallengeGate {
    phrases: ChallengePhrases,
    poll_interval: Duration,
    timeout: Duration,
    settle_delay: Duration,
}

impl Default for ChallengeGate {
    fn default() -> Self {
        Self {
            phrases: ChallengePhrases::default(),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
            settle_delay: Duration::from_secs(3),
        }
    }
}

impl ChallengeGate {
    pub fn new(phrases: ChallengePhrases) -> Self {
        Self {
            phrases,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause after a challenge clears, before the final sample is taken.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Re-samples `renderer` until its text stops looking like a challenge.
    ///
    /// `initial` is checked first; a clean initial sample passes without any
    /// polling. Sampling failures are skipped, never returned.
    pub async fn await_passage<R>(
        &self,
        renderer: &mut R,
        initial: String,
        cancel: &CancellationToken,
    ) -> GateOutcome
    where
        R: PageRenderer + ?Sized,
    {
        if !self.phrases.matches(&initial) {
            return GateOutcome::Passed(initial);
        }

        info!("Challenge page detected, waiting up to {:?}", self.timeout);
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut last = initial;

        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!("Challenge still present after {:?}", self.timeout);
                return GateOutcome::TimedOut(last);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return GateOutcome::Cancelled,
                _ = sleep(self.poll_interval.min(deadline - now)) => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                continue;
            }

            let sample = tokio::select! {
                biased;
                _ = cancel.cancelled() => return GateOutcome::Cancelled,
                sample = timeout(remaining, renderer.resample_text()) => sample,
            };
            match sample {
                Ok(Ok(text)) if self.phrases.matches(&text) => {
                    debug!("Still challenged after {:?}", started.elapsed());
                    last = text;
                }
                Ok(Ok(text)) => {
                    info!("Challenge passed after {:?}", started.elapsed());
                    return self.settle(renderer, text, cancel).await;
                }
                Ok(Err(e)) => debug!("Challenge sample failed: {e}"),
                Err(_) => debug!("Challenge sample timed out"),
            }
        }
    }

    async fn settle<R>(
        &self,
        renderer: &mut R,
        passed: String,
        cancel: &CancellationToken,
    ) -> GateOutcome
    where
        R: PageRenderer + ?Sized,
    {
        if self.settle_delay.is_zero() {
            return GateOutcome::Passed(passed);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return GateOutcome::Cancelled,
            _ = sleep(self.settle_delay) => {}
        }

        let sample = tokio::select! {
            biased;
            _ = cancel.cancelled() => return GateOutcome::Cancelled,
            sample = timeout(self.timeout, renderer.resample_text()) => sample,
        };
        match sample {
            Ok(Ok(text)) if !self.phrases.matches(&text) => GateOutcome::Passed(text),
            Ok(Ok(_)) => GateOutcome::Passed(passed),
            Ok(Err(e)) => {
                debug!("Settled sample failed, keeping the passing one: {e}");
                GateOutcome::Passed(passed)
            }
            Err(_) => GateOutcome::Passed(passed),
        }
    }
}
