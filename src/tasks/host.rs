use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::HostEvent;

/// Cancels `cancel` on the first host event. Returns once cancelled, whether
/// by an event, by someone else, or because every sender is gone.
pub async fn run(mut events: Receiver<HostEvent>, cancel: CancellationToken) -> Result<()> {
    select! {
        _ = cancel.cancelled() => {
            debug!("host watcher stopping; session already cancelled");
        }
        event = events.recv() => match event {
            Some(event) => {
                info!(?event, "host event received; stopping slideshow");
                cancel.cancel();
            }
            None => debug!("host event channel closed"),
        },
    }
    Ok(())
}
