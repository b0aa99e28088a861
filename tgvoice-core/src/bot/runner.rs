use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::handler::BotHandler;
use crate::telegram::platform::{ChatPlatform, TelegramError};
use crate::telegram::types::Update;

/// Pause after a failed poll before asking again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

type PollFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Update>, TelegramError>> + Send + 'a>>;

/// The receive loop. Long-polls the platform and hands each update to the
/// handler on its own task, so different chats are served concurrently.
pub struct BotRunner {
    platform: Arc<dyn ChatPlatform>,
    handler: Arc<BotHandler>,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl BotRunner {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        handler: Arc<BotHandler>,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            platform,
            handler,
            poll_timeout_secs,
            retry_delay: POLL_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Poll until `shutdown` completes, then wait for in-flight handlers.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut offset: Option<i64> = None;
        let mut tasks: JoinSet<(i64, Result<(), TelegramError>)> = JoinSet::new();
        let mut poll = self.next_poll(offset, Duration::ZERO);

        info!(poll_timeout_secs = self.poll_timeout_secs, "Polling for updates");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping update polling");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_handler_result(joined);
                }
                result = &mut poll => {
                    let delay = match result {
                        Ok(updates) => {
                            for update in updates {
                                offset = Some(update.update_id + 1);
                                self.spawn_handler(&mut tasks, update);
                            }
                            Duration::ZERO
                        }
                        Err(e) => {
                            warn!(error = %e, "Polling for updates failed");
                            self.retry_delay
                        }
                    };
                    poll = self.next_poll(offset, delay);
                }
            }
        }

        drop(poll);
        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for in-flight updates");
        }
        while let Some(joined) = tasks.join_next().await {
            log_handler_result(joined);
        }
        info!("Bot stopped");
    }

    fn next_poll(&self, offset: Option<i64>, delay: Duration) -> PollFuture<'_> {
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.platform
                .get_updates(offset, self.poll_timeout_secs)
                .await
        })
    }

    fn spawn_handler(
        &self,
        tasks: &mut JoinSet<(i64, Result<(), TelegramError>)>,
        update: Update,
    ) {
        let handler = self.handler.clone();
        let update_id = update.update_id;
        debug!(update_id, "Dispatching update");
        tasks.spawn(async move { (update_id, handler.handle_update(update).await) });
    }
}

fn log_handler_result(joined: Result<(i64, Result<(), TelegramError>), JoinError>) {
    match joined {
        Ok((_, Ok(()))) => {}
        Ok((update_id, Err(e))) => {
            warn!(update_id, error = %e, "Failed to handle update");
        }
        Err(e) => {
            error!(error = %e, "Update handler task panicked");
        }
    }
}
