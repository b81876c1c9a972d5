//! Interaction counter with a periodic report

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::compose::ModuleContribution;
use crate::application::handler::JobSpec;
use crate::domain::entities::{EventKind, GatewayEvent};
use crate::modules::{Module, ModuleEnv};

const REPORT_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub struct StatsModule {
    interactions: Arc<AtomicU64>,
    report_every: Duration,
}

impl Default for StatsModule {
    fn default() -> Self {
        Self::new(REPORT_INTERVAL)
    }
}

impl StatsModule {
    pub fn new(report_every: Duration) -> Self {
        Self {
            interactions: Arc::new(AtomicU64::new(0)),
            report_every,
        }
    }

    /// Shared handle to the running count
    pub fn counter(&self) -> Arc<AtomicU64> {
        self.interactions.clone()
    }
}

impl Module for StatsModule {
    fn name(&self) -> &str {
        "stats"
    }

    fn description(&self) -> &str {
        "Counts interactions"
    }

    fn contribute(&self, _env: &ModuleEnv) -> ModuleContribution {
        let counter = self.interactions.clone();
        let reported = self.interactions.clone();

        ModuleContribution::new()
            .on(EventKind::InteractionCreate, move |event| {
                if let GatewayEvent::InteractionCreate(_) = event {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                async { Ok(()) }
            })
            .job(JobSpec::new("stats-report", self.report_every, move || {
                let total = reported.load(Ordering::Relaxed);
                async move {
                    info!("Interactions handled since start: {}", total);
                    Ok(())
                }
            }))
    }
}
