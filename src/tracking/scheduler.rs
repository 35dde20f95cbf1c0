use crate::core::config::SchedulerKind;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub type JobFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A repeatable unit of work. Each call produces one cycle.
pub type Job = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Wrap an async closure as a [`Job`]
pub fn job<F, Fut>(f: F) -> Job
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as JobFuture)
}

/// Capability to run a job every `interval`, first run after one interval
pub trait RepeatingScheduler: Send + Sync {
    fn schedule_repeating(&self, name: &str, interval: Duration, job: Job) -> ScheduleHandle;
}

/// Handle to a running schedule
pub struct ScheduleHandle {
    name: String,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raise the stop flag and wait for the schedule task to exit
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!(job = %self.name, error = %e, "Scheduler task ended abnormally");
        } else {
            info!(job = %self.name, "Scheduler stopped");
        }
    }
}

/// Run one cycle on its own task so a failing or panicking job cannot
/// take the schedule down with it
async fn run_cycle(name: &str, job: &Job) {
    match tokio::spawn(job()).await {
        Ok(Ok(())) => debug!(job = name, "Scheduled cycle finished"),
        Ok(Err(e)) => warn!(job = name, error = %e, "Scheduled cycle failed"),
        Err(e) => error!(job = name, error = %e, "Scheduled cycle panicked"),
    }
}

/// Native scheduling on a tokio interval.
///
/// Stopping is observed immediately while waiting for the next tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalScheduler;

impl RepeatingScheduler for IntervalScheduler {
    fn schedule_repeating(&self, name: &str, interval: Duration, job: Job) -> ScheduleHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task_name = name.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => run_cycle(&task_name, &job).await,
                    _ = stop_rx.changed() => break,
                }
            }
        });

        info!(job = name, interval_secs = interval.as_secs_f64(), "Interval scheduler started");
        ScheduleHandle {
            name: name.to_string(),
            stop_tx,
            task,
        }
    }
}

/// Fallback loop: sleep, run, sleep, ...
///
/// The stop flag is only checked at sleep boundaries, so shutdown can
/// take up to one interval.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopScheduler;

impl RepeatingScheduler for LoopScheduler {
    fn schedule_repeating(&self, name: &str, interval: Duration, job: Job) -> ScheduleHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task_name = name.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            while !*stop_rx.borrow() {
                run_cycle(&task_name, &job).await;
                tokio::time::sleep(interval).await;
            }
        });

        warn!(
            job = name,
            interval_secs = interval.as_secs_f64(),
            "Using fallback loop scheduler"
        );
        ScheduleHandle {
            name: name.to_string(),
            stop_tx,
            task,
        }
    }
}

/// Scheduler implementation selected in the configuration
pub fn scheduler_for(kind: SchedulerKind) -> Box<dyn RepeatingScheduler> {
    match kind {
        SchedulerKind::Interval => Box::new(IntervalScheduler),
        SchedulerKind::Loop => Box::new(LoopScheduler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(10);

    fn counting_job(counter: Arc<AtomicUsize>, fail: bool) -> Job {
        job(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if fail {
                    anyhow::bail!("daemon unreachable");
                }
                Ok(())
            }
        })
    }

    async fn run_for(scheduler: &dyn RepeatingScheduler, job: Job, duration: Duration) {
        let handle = scheduler.schedule_repeating("test", INTERVAL, job);
        assert_eq!(handle.name(), "test");
        tokio::time::sleep(duration).await;
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_first_run_after_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle =
            IntervalScheduler.schedule_repeating("test", INTERVAL, counting_job(counter.clone(), false));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_survives_failures() {
        let counter = Arc::new(AtomicUsize::new(0));
        run_for(&IntervalScheduler, counting_job(counter.clone(), true), Duration::from_secs(35)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_survives_panics() {
        let counter = Arc::new(AtomicUsize::new(0));
        let panicking = {
            let counter = counter.clone();
            job(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < usize::MAX {
                        panic!("cycle blew up");
                    }
                    Ok(())
                }
            })
        };

        run_for(&IntervalScheduler, panicking, Duration::from_secs(25)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_scheduler_runs_and_stops() {
        let counter = Arc::new(AtomicUsize::new(0));
        run_for(&LoopScheduler, counting_job(counter.clone(), true), Duration::from_secs(35)).await;

        // Stop is seen at the next sleep boundary, before another cycle
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler_for(SchedulerKind::Interval);
        let handle = scheduler.schedule_repeating("test", INTERVAL, counting_job(counter.clone(), false));

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
