use std::future::Future;
use std::time::Duration;

use regwatch_pipeline::PipelineReport;

/// Run `attempt` until it reports success, at most `retries + 1` times,
/// sleeping `delay` between attempts. Returns the last report.
///
/// Retrying a run is safe because ingestion is idempotent.
pub async fn run_with_retry<F, Fut>(retries: u32, delay: Duration, mut attempt: F) -> PipelineReport
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PipelineReport>,
{
    let mut n = 0;
    loop {
        let report = attempt(n).await;
        if report.success || n >= retries {
            return report;
        }

        n += 1;
        tracing::warn!(
            run_id = %report.run_id,
            attempt = n,
            retries,
            delay_secs = delay.as_secs(),
            message = %report.message,
            "Ingestion run failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
