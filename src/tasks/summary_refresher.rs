use crate::db::Database;
use crate::tally::{self, WriteStrategy};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::interval;

// Periodic totalization so the stored summary stays fresh between /summary
// requests. The first tick fires immediately, which doubles as the
// refresh-on-startup run.
pub async fn refresh_summary_task(database: Arc<Database>, every_minutes: u64) {
    info!("Starting background summary refresh every {every_minutes} minute(s)...");
    let mut interval = interval(StdDuration::from_secs(every_minutes * 60));

    loop {
        interval.tick().await;

        match tally::run_totalization(&database, WriteStrategy::from_env()).await {
            Ok(count) => info!("Background totalization refreshed {count} summary row(s)"),
            Err(e) => error!("Background totalization failed: {e}"),
        }
    }
}
