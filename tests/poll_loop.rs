mod common;

use std::time::Duration;

use common::{CHALLENGE, Fetch, FakeRenderer, RecordingNotifier, date};
use slotwatch::{ChallengeGate, CycleOutcome, PollLoop, Verdict, Verdicts};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const FEBRUARY_21: &str = "Select parking\nFebruary 2026\nSu Mo Tu We Th Fr Sa\n21";
const SOLD_OUT: &str = "Select parking\nFebruary 2026\n21\nSOLD OUT";

fn poll_loop(
    renderer: &FakeRenderer,
    notifier: &RecordingNotifier,
    targets: &[&str],
) -> PollLoop<FakeRenderer, RecordingNotifier> {
    let targets = targets.iter().map(|t| date(t)).collect();
    PollLoop::new(renderer.clone(), notifier.clone(), targets)
        .with_poll_interval(Duration::from_secs(1800))
        .with_render_timeout(Duration::from_secs(45))
}

#[tokio::test(start_paused = true)]
async fn alerts_once_per_availability_window() {
    let renderer = FakeRenderer::new(vec![
        Fetch::Text(FEBRUARY_21),
        Fetch::Text(FEBRUARY_21),
        Fetch::Text(SOLD_OUT),
        Fetch::Text(FEBRUARY_21),
    ]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21", "2/22"]);
    let cancel = CancellationToken::new();

    let first = poll_loop.run_cycle(&cancel).await;
    assert_eq!(first.outcome, CycleOutcome::Checked);
    let expected: Verdicts = [
        (date("2/21"), Verdict::Available),
        (date("2/22"), Verdict::Indeterminate),
    ]
    .into_iter()
    .collect();
    assert_eq!(first.verdicts, expected);
    assert_eq!(first.newly_available, [date("2/21")]);

    let second = poll_loop.run_cycle(&cancel).await;
    assert!(second.newly_available.is_empty());
    assert!(poll_loop.tracker().is_notified(date("2/21")));

    let third = poll_loop.run_cycle(&cancel).await;
    assert_eq!(third.verdicts.get(date("2/21")), Some(Verdict::Unavailable));
    assert!(third.newly_available.is_empty());
    assert!(!poll_loop.tracker().is_notified(date("2/21")));

    let fourth = poll_loop.run_cycle(&cancel).await;
    assert_eq!(fourth.newly_available, [date("2/21")]);

    assert_eq!(notifier.calls(), [vec![date("2/21")], vec![date("2/21")]]);
}

#[tokio::test(start_paused = true)]
async fn batches_all_new_dates_into_one_notification() {
    let renderer = FakeRenderer::new(vec![Fetch::Text("February 21 22 March 1")]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21", "2/22", "3/1", "4/2"]);

    let report = poll_loop.run_cycle(&CancellationToken::new()).await;
    assert_eq!(
        report.verdicts.get(date("4/2")),
        Some(Verdict::Unavailable),
        "April never rendered"
    );
    assert_eq!(
        notifier.calls(),
        [vec![date("2/21"), date("2/22"), date("3/1")]]
    );
}

#[tokio::test(start_paused = true)]
async fn next_months_dates_stay_quiet_on_this_months_calendar() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(
        "Select parking\nFebruary 2026\n1 2 3 4 5 6 7\n21 22 23 24 25 26 27 28",
    )]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21", "3/1"]);

    let report = poll_loop.run_cycle(&CancellationToken::new()).await;
    assert_eq!(report.verdicts.get(date("3/1")), Some(Verdict::Unavailable));
    assert_eq!(notifier.calls(), [vec![date("2/21")]]);
}

#[tokio::test(start_paused = true)]
async fn render_failure_leaves_state_alone() {
    let renderer = FakeRenderer::new(vec![
        Fetch::Text(FEBRUARY_21),
        Fetch::Fail,
        Fetch::Text(FEBRUARY_21),
    ]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21", "2/22"]);
    let cancel = CancellationToken::new();

    poll_loop.run_cycle(&cancel).await;
    let failed = poll_loop.run_cycle(&cancel).await;
    assert_eq!(failed.outcome, CycleOutcome::RenderFailed);
    assert_eq!(
        failed.verdicts,
        Verdicts::uniform(&[date("2/21"), date("2/22")], Verdict::Indeterminate)
    );
    assert!(failed.newly_available.is_empty());
    assert!(poll_loop.tracker().is_notified(date("2/21")));

    let recovered = poll_loop.run_cycle(&cancel).await;
    assert!(recovered.newly_available.is_empty());
    assert_eq!(notifier.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stuck_renderer_times_out() {
    let renderer = FakeRenderer::new(vec![Fetch::Hang]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21"]);

    let started = Instant::now();
    let report = poll_loop.run_cycle(&CancellationToken::new()).await;
    assert_eq!(report.outcome, CycleOutcome::RenderFailed);
    assert_eq!(started.elapsed(), Duration::from_secs(45));
}

#[tokio::test(start_paused = true)]
async fn waits_out_the_challenge_before_detecting() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(CHALLENGE)])
        .with_resamples(vec![CHALLENGE, FEBRUARY_21]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21"]);

    let report = poll_loop.run_cycle(&CancellationToken::new()).await;
    assert_eq!(report.outcome, CycleOutcome::Checked);
    assert_eq!(report.newly_available, [date("2/21")]);
    // two polls, then one more after settling
    assert_eq!(renderer.state().resample_count, 3);
}

#[tokio::test(start_paused = true)]
async fn unresolved_challenge_is_indeterminate() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(CHALLENGE), Fetch::Text(FEBRUARY_21)]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21"])
        .with_gate(ChallengeGate::default().with_timeout(Duration::from_secs(10)));
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let report = poll_loop.run_cycle(&cancel).await;
    assert_eq!(report.outcome, CycleOutcome::ChallengeTimedOut);
    assert_eq!(report.verdicts.get(date("2/21")), Some(Verdict::Indeterminate));
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert!(notifier.calls().is_empty());

    let next = poll_loop.run_cycle(&cancel).await;
    assert_eq!(next.newly_available, [date("2/21")]);
}

#[tokio::test(start_paused = true)]
async fn notifier_failure_does_not_stop_the_cycle() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(FEBRUARY_21), Fetch::Text(FEBRUARY_21)]);
    let notifier = RecordingNotifier::failing();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21"]);
    let cancel = CancellationToken::new();

    let report = poll_loop.run_cycle(&cancel).await;
    assert!(report.notify_failed);
    assert_eq!(report.newly_available, [date("2/21")]);

    let next = poll_loop.run_cycle(&cancel).await;
    assert!(!next.notify_failed);
    assert!(next.newly_available.is_empty());
    assert_eq!(notifier.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_the_gate_aborts_the_cycle() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(CHALLENGE)]);
    let notifier = RecordingNotifier::default();
    let mut poll_loop = poll_loop(&renderer, &notifier, &["2/21"]);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let canceller = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    };
    let (report, ()) = tokio::join!(poll_loop.run_cycle(&cancel), canceller);

    assert_eq!(report.outcome, CycleOutcome::Cancelled);
    assert!(report.newly_available.is_empty());
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn run_keeps_going_after_a_failed_cycle_and_releases_on_stop() {
    let renderer = FakeRenderer::new(vec![Fetch::Fail, Fetch::Text(FEBRUARY_21)]);
    let notifier = RecordingNotifier::default();
    let poll_loop = poll_loop(&renderer, &notifier, &["2/21"]);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(poll_loop.run(cancel.clone()));
    // cycle 1 at t=0 fails, cycle 2 at t=1800 succeeds
    tokio::time::sleep(Duration::from_secs(1801)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(notifier.calls(), [vec![date("2/21")]]);
    let state = renderer.state();
    assert_eq!(state.fetch_count, 2);
    assert!(state.released);
}

#[tokio::test(start_paused = true)]
async fn run_once_releases_the_renderer() {
    let renderer = FakeRenderer::new(vec![Fetch::Text(FEBRUARY_21)]);
    let notifier = RecordingNotifier::default();

    let report = poll_loop(&renderer, &notifier, &["2/21", "3/1"])
        .run_once(CancellationToken::new())
        .await;
    assert_eq!(report.verdicts.get(date("3/1")), Some(Verdict::Unavailable));
    assert!(renderer.state().released);
}
