#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slotwatch::{
    NotifyError, RenderError, TargetDate, Verdicts, notifier::Notifier, renderer::PageRenderer,
};

pub const CHALLENGE: &str = "Just a moment...\nChecking your browser before accessing the site.";

pub fn date(s: &str) -> TargetDate {
    s.parse().unwrap()
}

pub enum Fetch {
    Text(&'static str),
    Fail,
    Hang,
}

#[derive(Default)]
pub struct PageState {
    fetches: VecDeque<Fetch>,
    resamples: VecDeque<&'static str>,
    current: String,
    pub fetch_count: usize,
    pub resample_count: usize,
    pub released: bool,
}

/// Renderer driven by a script. Fetches and resamples pop their queues; once
/// a queue is empty the last page text is served again.
#[derive(Clone, Default)]
pub struct FakeRenderer {
    state: Arc<Mutex<PageState>>,
}

impl FakeRenderer {
    pub fn new(fetches: Vec<Fetch>) -> Self {
        let renderer = Self::default();
        renderer.state.lock().unwrap().fetches = fetches.into();
        renderer
    }

    pub fn with_resamples(self, resamples: Vec<&'static str>) -> Self {
        self.state.lock().unwrap().resamples = resamples.into();
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    /// `None` means the fetch never completes.
    fn next_fetch(&self) -> Option<Result<String, RenderError>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_count += 1;
        match state.fetches.pop_front() {
            Some(Fetch::Text(text)) => {
                state.current = text.to_string();
                Some(Ok(state.current.clone()))
            }
            Some(Fetch::Fail) => Some(Err(RenderError::Timeout(Duration::from_secs(30)))),
            Some(Fetch::Hang) => None,
            None => Some(Ok(state.current.clone())),
        }
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn fetch_rendered_text(&mut self) -> Result<String, RenderError> {
        match self.next_fetch() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn resample_text(&mut self) -> Result<String, RenderError> {
        let mut state = self.state.lock().unwrap();
        state.resample_count += 1;
        if let Some(text) = state.resamples.pop_front() {
            state.current = text.to_string();
        }
        Ok(state.current.clone())
    }

    async fn release(&mut self) -> Result<(), RenderError> {
        self.state.lock().unwrap().released = true;
        Ok(())
    }
}

/// Records every notification; optionally rejects them all.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<Vec<TargetDate>>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<TargetDate>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        newly_available: &[TargetDate],
        _verdicts: &Verdicts,
    ) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(newly_available.to_vec());
        if self.failing {
            return Err(NotifyError::Rejected {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "webhook down".to_string(),
            });
        }
        Ok(())
    }
}
