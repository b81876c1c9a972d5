//! Scheduler - runs jobs contributed by modules on fixed intervals

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::handler::JobSpec;

/// Start every job on its own task. The first run happens one interval after start.
pub fn spawn_jobs(jobs: &[JobSpec]) -> Vec<JoinHandle<()>> {
    jobs.iter().cloned().map(spawn_job).collect()
}

fn spawn_job(job: JobSpec) -> JoinHandle<()> {
    info!("Scheduling job '{}' every {:?}", job.name, job.interval);
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + job.interval;
        let mut ticker = tokio::time::interval_at(start, job.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!("Running job '{}'", job.name);
            // a panicking run must not stop the schedule
            match tokio::spawn((job.run)()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Job '{}' failed: {}", job.name, e),
                Err(e) => warn!("Job '{}' aborted: {}", job.name, e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_on_their_interval_and_survive_failures() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let job = JobSpec::new("flaky", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    return Err(crate::application::errors::HandlerError::Failed("first run".into()));
                }
                Ok(())
            }
        });

        let handles = spawn_jobs(&[job]);
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        for handle in handles {
            handle.abort();
        }
    }
}
