use std::time::Duration;

use log::{error, info, warn};
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::{
    AvailabilityDetector, ChallengeGate, GateOutcome, NotificationStateTracker, RenderError,
    TargetDate, Verdict, Verdicts, notifier::Notifier, renderer::PageRenderer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Text was acquired and the challenge (if any) cleared.
    Checked,
    /// Text was acquired but the challenge never cleared.
    ChallengeTimedOut,
    /// No text this cycle; every target is Indeterminate.
    RenderFailed,
    /// Stopped mid-cycle; nothing was notified.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub verdicts: Verdicts,
    pub newly_available: Vec<TargetDate>,
    pub notify_failed: bool,
}

/// Drives check cycles against one page. Each loop owns its tracker.
pub struct PollLoop<R, N> {
    renderer: R,
    notifier: N,
    targets: Vec<TargetDate>,
    gate: ChallengeGate,
    detector: AvailabilityDetector,
    tracker: NotificationStateTracker,
    poll_interval: Duration,
    render_timeout: Duration,
}

impl<R: PageRenderer, N: Notifier> PollLoop<R, N> {
    pub fn new(renderer: R, notifier: N, targets: Vec<TargetDate>) -> Self {
        Self {
            renderer,
            notifier,
            targets,
            gate: ChallengeGate::default(),
            detector: AvailabilityDetector::default(),
            tracker: NotificationStateTracker::new(),
            poll_interval: Duration::from_secs(1800),
            render_timeout: Duration::from_secs(45),
        }
    }

    pub fn with_gate(mut self, gate: ChallengeGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_detector(mut self, detector: AvailabilityDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }

    pub fn tracker(&self) -> &NotificationStateTracker {
        &self.tracker
    }

    /// Runs cycles until `cancel` fires, then releases the renderer.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Monitoring {} date(s) every {:?}",
            self.targets.len(),
            self.poll_interval
        );
        while !cancel.is_cancelled() {
            let report = self.run_cycle(&cancel).await;
            if report.outcome == CycleOutcome::Cancelled {
                break;
            }

            info!("Next check in {:?}", self.poll_interval);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }
        info!("Monitoring stopped");
        self.release().await;
    }

    /// A single cycle followed by renderer release.
    pub async fn run_once(mut self, cancel: CancellationToken) -> CycleReport {
        let report = self.run_cycle(&cancel).await;
        self.release().await;
        report
    }

    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        info!("Checking availability");

        let (outcome, text) = match self.acquire(cancel).await {
            Ok(Some(text)) => {
                let gate = self.gate.await_passage(&mut self.renderer, text, cancel);
                match gate.await {
                    GateOutcome::Passed(text) => (CycleOutcome::Checked, Some(text)),
                    GateOutcome::TimedOut(text) => (CycleOutcome::ChallengeTimedOut, Some(text)),
                    GateOutcome::Cancelled => return self.cancelled_report(),
                }
            }
            Ok(None) => return self.cancelled_report(),
            Err(e) => {
                warn!("Could not render the page: {e}");
                (CycleOutcome::RenderFailed, None)
            }
        };
        if let Some(text) = &text {
            info!("Page text is {} characters", text.chars().count());
        }

        let verdicts = self.detector.evaluate_all(text.as_deref(), &self.targets);
        for (date, verdict) in verdicts.iter() {
            info!("  {date}: {verdict}");
        }

        let newly_available = self.tracker.apply(&verdicts);
        let mut notify_failed = false;
        if newly_available.is_empty() {
            if verdicts.iter().all(|(_, v)| v != Verdict::Available) {
                info!("Nothing available");
            }
        } else {
            let dates: Vec<String> = newly_available.iter().map(ToString::to_string).collect();
            info!("Newly available: {}", dates.join(", "));
            if let Err(e) = self.notifier.notify(&newly_available, &verdicts).await {
                error!("Notification failed: {e}");
                notify_failed = true;
            }
        }

        info!("Cycle finished in {:?} ({outcome:?})", started.elapsed());
        CycleReport {
            outcome,
            verdicts,
            newly_available,
            notify_failed,
        }
    }

    /// `Ok(None)` means cancelled.
    async fn acquire(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, RenderError> {
        let fetch = timeout(self.render_timeout, self.renderer.fetch_rendered_text());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(None),
            fetched = fetch => match fetched {
                Ok(text) => text.map(Some),
                Err(_) => Err(RenderError::Timeout(self.render_timeout)),
            },
        }
    }

    fn cancelled_report(&self) -> CycleReport {
        info!("Cycle cancelled");
        CycleReport {
            outcome: CycleOutcome::Cancelled,
            verdicts: Verdicts::uniform(&self.targets, Verdict::Indeterminate),
            newly_available: Vec::new(),
            notify_failed: false,
        }
    }

    async fn release(&mut self) {
        if let Err(e) = self.renderer.release().await {
            warn!("Could not release the renderer: {e}");
        }
    }
}
