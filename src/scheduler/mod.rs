//! Recurring jobs on a cron schedule.
//!
//! Cron expressions carry a seconds field: `"0 */5 * * * *"` runs every five
//! minutes.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::dispatch::ScheduledJob;

pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        Ok(Self {
            inner: JobScheduler::new().await?,
        })
    }

    /// Run `callback` on the `cron` schedule. Failures are logged.
    pub async fn add_recurring_job<F, Fut>(&self, name: &str, cron: &str, callback: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback = Arc::new(callback);
        let job_name = name.to_string();

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let callback = Arc::clone(&callback);
            let job_name = job_name.clone();
            Box::pin(async move {
                if let Err(e) = callback().await {
                    error!("Job '{}' failed: {:#}", job_name, e);
                }
            })
        })?;

        self.inner.add(job).await?;
        info!("Scheduled job '{}' ({})", name, cron);
        Ok(())
    }

    /// Schedule module jobs, each called with its own clone of `state`.
    pub async fn add_module_jobs<S>(
        &self,
        jobs: Vec<(&'static str, ScheduledJob<S>)>,
        state: S,
    ) -> Result<usize>
    where
        S: Clone + Send + Sync + 'static,
    {
        let count = jobs.len();
        for (module, job) in jobs {
            let state = state.clone();
            let handler = job.handler;
            let name = format!("{}::{}", module, job.name);
            self.add_recurring_job(&name, &job.cron, move || handler.run(state.clone()))
                .await?;
        }
        Ok(count)
    }

    pub async fn start(&self) -> Result<()> {
        self.inner.start().await?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerResult, Module};

    async fn tick(_state: ()) -> HandlerResult {
        Ok(())
    }

    #[tokio::test]
    async fn rejects_invalid_cron() {
        let scheduler = Scheduler::new().await.unwrap();
        let added = scheduler
            .add_recurring_job("broken", "every tuesday", || async { Ok::<(), anyhow::Error>(()) })
            .await;
        assert!(added.is_err());
    }

    #[tokio::test]
    async fn schedules_module_jobs() {
        let scheduler = Scheduler::new().await.unwrap();
        let module: Module<()> = Module::new("ticks", 0)
            .job("tick", "0 */5 * * * *", tick)
            .job("tock", "0 0 * * * *", tick);
        let jobs = module
            .jobs()
            .iter()
            .map(|j| (module.name(), j.clone()))
            .collect();
        assert_eq!(scheduler.add_module_jobs(jobs, ()).await.unwrap(), 2);
    }
}
