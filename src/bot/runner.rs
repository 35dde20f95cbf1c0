use super::controller::{BotController, ControllerSettings};
use super::messages::MessageFactory;
use super::transport::{ChatTransport, UpdateKind};
use crate::core::config::TelegramConfig;
use crate::core::state::AppState;
use crate::daemon::TorrentDaemon;
use crate::tracking::scheduler::{job, scheduler_for};
use crate::tracking::{CompletedDownload, DownloadMonitor};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const MONITOR_JOB: &str = "torrent-download-monitor";
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Send a completion notice for every finished download
pub async fn notify_completed(transport: &dyn ChatTransport, completed: &[CompletedDownload]) {
    for done in completed {
        let text = MessageFactory::completion_notice(&done.status.name);
        if let Err(e) = transport.send_message(done.session_id, &text).await {
            warn!(
                session_id = done.session_id,
                tracking_id = %done.tracking_id,
                error = %e,
                "Failed to send completion notice"
            );
        }
    }
}

/// Poll the daemon once and notify the chats whose downloads finished
pub async fn monitor_cycle(
    monitor: &DownloadMonitor,
    daemon: &dyn TorrentDaemon,
    transport: &dyn ChatTransport,
) -> usize {
    let completed = monitor.poll_daemon(daemon).await;
    notify_completed(transport, &completed).await;
    completed.len()
}

/// Receive updates and hand them to the controller until `shutdown` resolves.
///
/// Transport failures are logged and retried after a short backoff.
pub async fn run_updates<S>(controller: &BotController, transport: &dyn ChatTransport, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut offset: Option<i64> = None;

    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => break,
            updates = transport.next_updates(offset) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "Fetching chat updates failed");
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                }
                continue;
            }
        };

        for update in updates {
            offset = Some(offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));

            if let UpdateKind::Callback { callback_id, .. } = &update.kind {
                if let Err(e) = transport.answer_callback(callback_id).await {
                    warn!(error = %e, "Failed to answer callback query");
                }
            }
            controller.handle(&update).await;
        }
    }
}

/// Run the chat bot until Ctrl+C
pub async fn run_bot(
    state: AppState,
    transport: Arc<dyn ChatTransport>,
    telegram: TelegramConfig,
    settings: ControllerSettings,
) -> anyhow::Result<()> {
    let controller = BotController::from_state(&state, Arc::clone(&transport), settings);

    let monitor_job = {
        let monitor = Arc::clone(&state.monitor);
        let daemon = Arc::clone(&state.daemon);
        let transport = Arc::clone(&transport);
        job(move || {
            let monitor = Arc::clone(&monitor);
            let daemon = Arc::clone(&daemon);
            let transport = Arc::clone(&transport);
            async move {
                monitor_cycle(&monitor, daemon.as_ref(), transport.as_ref()).await;
                Ok(())
            }
        })
    };

    let scheduler = scheduler_for(telegram.scheduler);
    let schedule = scheduler.schedule_repeating(
        MONITOR_JOB,
        Duration::from_secs(telegram.poll_interval),
        monitor_job,
    );

    info!(
        poll_interval_seconds = telegram.poll_interval,
        scheduler = ?telegram.scheduler,
        allowed_chat_id = ?telegram.chat_id,
        "Telegram bot started"
    );

    run_updates(&controller, transport.as_ref(), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    })
    .await;

    schedule.shutdown().await;
    info!(tracked = state.monitor.tracked_count(), "Telegram bot stopped");
    Ok(())
}
