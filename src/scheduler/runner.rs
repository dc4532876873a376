//! Daily job runner.
//!
//! Holds at most one recurring job. Each active job owns a background tokio
//! task that sleeps until the next fire time, spawns the job, and computes the
//! following fire time. Replacing the schedule cancels that task before the
//! new one starts, so two recurring jobs never coexist.

use crate::clock::Clock;
use crate::scheduler::schedule::{DailyTime, next_fire_after};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Logical id of the single recurring job.
pub const DAILY_JOB_ID: &str = "daily_quote";

/// Unit of work run on each scheduled tick and on manual triggers.
#[async_trait]
pub trait DailyJob: Send + Sync + 'static {
    /// Value produced by one run.
    type Output: Send + 'static;

    /// Run the job once.
    async fn run(&self) -> Self::Output;
}

/// Why the scheduler refused a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// [`Scheduler::shutdown`] already ran.
    #[error("scheduler is shut down")]
    Stopped,
    /// The job task panicked or was aborted.
    #[error("job run failed: {0}")]
    JobFailed(String),
}

/// Point-in-time view of the active schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    /// Job identifier (always [`DAILY_JOB_ID`]).
    pub id: &'static str,
    /// Configured time of day.
    pub at: DailyTime,
    /// Next planned fire time.
    pub next_run: DateTime<Local>,
}

/// The currently installed recurring job.
struct ActiveJob {
    at: DailyTime,
    next_run: watch::Receiver<DateTime<Local>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveJob {
    /// Cancel future firings. Runs already spawned are left to finish.
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Scheduler holding at most one daily job.
pub struct Scheduler<J: DailyJob> {
    job: Arc<J>,
    clock: Arc<dyn Clock>,
    active: Mutex<Option<ActiveJob>>,
    /// Parent of every job token; cancelled on shutdown.
    root: CancellationToken,
}

impl<J: DailyJob> Scheduler<J> {
    /// Create an unscheduled scheduler for `job`.
    pub fn new(job: Arc<J>, clock: Arc<dyn Clock>) -> Self {
        Self {
            job,
            clock,
            active: Mutex::new(None),
            root: CancellationToken::new(),
        }
    }

    /// Replace any existing job with one firing daily at `at`.
    ///
    /// Returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Stopped`] after [`Scheduler::shutdown`]; no
    /// job is installed.
    pub async fn set(&self, at: DailyTime) -> Result<ScheduleSnapshot, SchedulerError> {
        let mut active = self.active.lock().await;
        if self.root.is_cancelled() {
            warn!("refusing to schedule {DAILY_JOB_ID} at {at}: scheduler is shut down");
            return Err(SchedulerError::Stopped);
        }

        if let Some(previous) = active.take() {
            debug!("removing existing {DAILY_JOB_ID} job at {}", previous.at);
            previous.stop();
        }

        let next_run = next_fire_after(&self.clock.now(), at);
        let (next_tx, next_rx) = watch::channel(next_run);
        let cancel = self.root.child_token();

        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.job),
            Arc::clone(&self.clock),
            at,
            next_tx,
            cancel.clone(),
        ));

        *active = Some(ActiveJob {
            at,
            next_run: next_rx,
            cancel,
            handle,
        });

        info!("{DAILY_JOB_ID} scheduled daily at {at}, next run {next_run}");
        Ok(ScheduleSnapshot {
            id: DAILY_JOB_ID,
            at,
            next_run,
        })
    }

    /// Current schedule, or `None` when no job is installed.
    pub async fn current(&self) -> Option<ScheduleSnapshot> {
        let active = self.active.lock().await;
        active.as_ref().map(|job| ScheduleSnapshot {
            id: DAILY_JOB_ID,
            at: job.at,
            next_run: *job.next_run.borrow(),
        })
    }

    /// Whether a recurring job is installed.
    pub async fn is_scheduled(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Run the job immediately without touching the recurring schedule.
    ///
    /// The run happens on its own task, so it completes even if the caller
    /// is dropped while waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::JobFailed`] if the run panicked.
    pub async fn trigger_now(&self) -> Result<J::Output, SchedulerError> {
        debug!("{DAILY_JOB_ID} triggered manually");
        let job = Arc::clone(&self.job);
        tokio::spawn(async move { job.run().await })
            .await
            .map_err(|e| SchedulerError::JobFailed(e.to_string()))
    }

    /// Stop the execution loop and drop the installed job.
    ///
    /// Pending firings are cancelled; a run already in flight completes on
    /// its own task. Later calls to [`Scheduler::set`] are refused.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        self.root.cancel();
        if let Some(job) = active.take() {
            job.stop();
        }
        drop(active);
        info!("scheduler stopped");
    }
}

impl<J: DailyJob> Drop for Scheduler<J> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Background loop for one installed job.
async fn run_loop<J: DailyJob>(
    job: Arc<J>,
    clock: Arc<dyn Clock>,
    at: DailyTime,
    next_tx: watch::Sender<DateTime<Local>>,
    cancel: CancellationToken,
) {
    let mut planned = *next_tx.borrow();

    loop {
        let wait = (planned - clock.now()).to_std().unwrap_or_default();

        tokio::select! {
            () = cancel.cancelled() => {
                debug!("{DAILY_JOB_ID} loop for {at} cancelled");
                return;
            }
            () = tokio::time::sleep(wait) => {}
        }

        info!("{DAILY_JOB_ID} firing (planned {planned})");
        let runner = Arc::clone(&job);
        tokio::spawn(async move {
            runner.run().await;
        });

        // Compute from the planned instant so an early wake-up cannot fire
        // the same slot twice.
        let now = clock.now();
        let base = if now > planned { now } else { planned };
        planned = next_fire_after(&base, at);
        if next_tx.send(planned).is_err() {
            warn!("{DAILY_JOB_ID} schedule receiver dropped, stopping loop");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::clock::SystemClock;
    use chrono::Timelike;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct CountingJob {
        runs: AtomicUsize,
        fired: mpsc::UnboundedSender<usize>,
    }

    #[async_trait]
    impl DailyJob for CountingJob {
        type Output = usize;

        async fn run(&self) -> usize {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.fired.send(n);
            n
        }
    }

    fn make_scheduler() -> (
        Scheduler<CountingJob>,
        Arc<CountingJob>,
        mpsc::UnboundedReceiver<usize>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fired: tx,
        });
        let scheduler = Scheduler::new(Arc::clone(&job), Arc::new(SystemClock));
        (scheduler, job, rx)
    }

    fn minutes_from_now(minutes: i64) -> DailyTime {
        let at = Local::now() + chrono::Duration::minutes(minutes);
        DailyTime::new(at.hour(), at.minute()).unwrap()
    }

    #[tokio::test]
    async fn new_scheduler_reports_no_schedule() {
        let (scheduler, _job, _rx) = make_scheduler();
        assert!(scheduler.current().await.is_none());
        assert!(!scheduler.is_scheduled().await);
    }

    #[tokio::test]
    async fn set_then_current_round_trips() {
        let (scheduler, _job, _rx) = make_scheduler();
        let at = DailyTime::new(14, 30).unwrap();
        let set = scheduler.set(at).await.unwrap();

        let current = scheduler.current().await.expect("scheduled");
        assert_eq!(current.id, DAILY_JOB_ID);
        assert_eq!(current.at, at);
        assert_eq!(current.next_run, set.next_run);
        assert!(current.next_run > Local::now());
        assert_eq!(current.next_run.format("%H:%M").to_string(), "14:30");
    }

    #[tokio::test]
    async fn second_set_replaces_first() {
        let (scheduler, _job, _rx) = make_scheduler();
        scheduler.set(DailyTime::new(9, 0).unwrap()).await.unwrap();
        let first_cancel = {
            let active = scheduler.active.lock().await;
            active.as_ref().map(|j| j.cancel.clone()).expect("job installed")
        };

        let second = DailyTime::new(21, 15).unwrap();
        scheduler.set(second).await.unwrap();

        assert!(first_cancel.is_cancelled(), "old loop must be cancelled");
        let current = scheduler.current().await.expect("scheduled");
        assert_eq!(current.at, second);
        let active = scheduler.active.lock().await;
        assert!(!active.as_ref().expect("job").cancel.is_cancelled());
    }

    #[tokio::test]
    async fn trigger_now_runs_job_without_touching_schedule() {
        let (scheduler, job, mut rx) = make_scheduler();
        let at = DailyTime::new(3, 0).unwrap();
        let before = scheduler.set(at).await.unwrap();

        assert_eq!(scheduler.trigger_now().await.unwrap(), 1);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);

        let after = scheduler.current().await.expect("still scheduled");
        assert_eq!(after, before);
    }

    #[tokio::test(start_paused = true)]
    async fn installed_job_fires_at_planned_time() {
        let (scheduler, job, mut rx) = make_scheduler();
        scheduler.set(minutes_from_now(2)).await.unwrap();

        let fired = tokio::time::timeout(std::time::Duration::from_secs(3 * 24 * 3600), rx.recv())
            .await
            .expect("job fired before timeout");
        assert_eq!(fired, Some(1));
        assert!(job.runs.load(Ordering::SeqCst) >= 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_schedule_never_fires() {
        let (scheduler, job, _rx) = make_scheduler();
        let first = scheduler.set(minutes_from_now(1)).await.unwrap();
        let cancel = {
            let active = scheduler.active.lock().await;
            active.as_ref().map(|j| j.cancel.clone()).expect("job installed")
        };
        scheduler.set(minutes_from_now(-30)).await.unwrap();
        assert!(cancel.is_cancelled());

        let wait = (first.next_run - Local::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait + std::time::Duration::from_secs(5)).await;

        assert_eq!(
            job.runs.load(Ordering::SeqCst),
            0,
            "cancelled schedule must not fire"
        );
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_clears_schedule() {
        let (scheduler, _job, _rx) = make_scheduler();
        scheduler.set(DailyTime::DEFAULT).await.unwrap();
        scheduler.shutdown().await;
        assert!(scheduler.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn set_after_shutdown_is_refused() {
        let (scheduler, job, _rx) = make_scheduler();
        scheduler.set(DailyTime::DEFAULT).await.unwrap();
        scheduler.shutdown().await;

        assert_eq!(
            scheduler.set(minutes_from_now(1)).await,
            Err(SchedulerError::Stopped)
        );
        assert!(scheduler.current().await.is_none());
        assert!(!scheduler.is_scheduled().await);

        tokio::time::sleep(std::time::Duration::from_secs(3 * 3600)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_scheduled().await);
    }

    struct SlowJob {
        started: mpsc::UnboundedSender<()>,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl DailyJob for SlowJob {
        type Output = ();

        async fn run(&self) -> Self::Output {
            let _ = self.started.send(());
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_now_completes_when_caller_is_dropped() {
        let (tx, mut started) = mpsc::unbounded_channel();
        let job = Arc::new(SlowJob {
            started: tx,
            finished: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&job), Arc::new(SystemClock)));

        let caller = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.trigger_now().await })
        };
        started.recv().await.expect("job started");
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(std::time::Duration::from_secs(20)).await;
        assert_eq!(job.finished.load(Ordering::SeqCst), 1);
    }
}
