mod challenge;
mod detector;
mod error;
mod poll_loop;
mod target_date;
mod text;
mod tracker;
mod verdict;

pub mod config;
pub mod notifier;
pub mod renderer;
pub mod requests;

pub use challenge::{ChallengeGate, ChallengePhrases, DEFAULT_CHALLENGE_PHRASES, GateOutcome};
pub use detector::{
    AvailabilityDetector, DEFAULT_NEGATIVE_KEYWORDS, DateEncoding, UnknownDateEncoding,
};
pub use error::{NotifyError, RenderError};
pub use poll_loop::{CycleOutcome, CycleReport, PollLoop};
pub use target_date::{TargetDate, TargetDateError};
pub use text::visible_text;
pub use tracker::NotificationStateTracker;
pub use verdict::{Verdict, Verdicts};
