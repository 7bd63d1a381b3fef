// src/collect/scheduler.rs
use tokio::task::JoinHandle;
use tracing::info;

use crate::collect::{poll_once, Collector};
use crate::pipeline::InsightPipeline;

#[derive(Clone, Copy, Debug)]
pub struct PollSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the background poll loop: every tick, fetch from all collectors and
/// hand the batch to the pipeline. Runs for the life of the process.
pub fn spawn_poll_task(
    pipeline: InsightPipeline,
    collectors: Vec<Box<dyn Collector>>,
    cfg: PollSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            let report = poll_once(&collectors, &pipeline).await;
            info!(
                target: "collect",
                accepted = report.accepted,
                "collector poll tick"
            );
        }
    })
}
