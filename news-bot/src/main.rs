mod handlers;
mod telegram;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use news_core::{
    broadcast_notice, spawn_poller, BotConfig, BotCore, ChatClient, DeliveryFanout, FeedCatalog,
    HttpFeedSource, LatestArticleStore, PollCycle, SubscriberRegistry, WatermarkStore,
};
use reqwest::{redirect, ClientBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handlers::{Command, Handler};
use crate::telegram::TelegramClient;

/// Seconds a getUpdates call may wait for new messages.
const LONG_POLL_SECS: u64 = 30;
const USER_AGENT: &str = "news-bot/0.1 (RSS notifier)";

const STARTED_NOTICE: &str =
    "<i>The bot server is up. All functions are available and news delivery has resumed</i>";
const STOPPED_NOTICE: &str =
    "<i>The bot server is shutting down. News delivery is paused</i>";

#[tokio::main]
async fn main() -> ExitCode {
    let (config, load_error) = match BotConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (BotConfig::default(), Some(e)),
    };
    init_tracing(&config.log_level);
    if let Some(e) = load_error {
        warn!(error = %e, "failed to load configuration, using defaults");
    }

    let token = match BotConfig::bot_token() {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "cannot start without a bot token");
            return ExitCode::FAILURE;
        }
    };

    let client = match ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    run(config, client, &token).await;
    ExitCode::SUCCESS
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run(config: BotConfig, client: reqwest::Client, token: &str) {
    let resources = &config.resources_dir;
    let registry = SubscriberRegistry::load_from_dir(resources).await;
    let latest = LatestArticleStore::load_from_dir(resources).await;
    let watermarks = if config.poll.persist_watermarks {
        WatermarkStore::load_from(config.watermarks_path()).await
    } else {
        WatermarkStore::in_memory()
    };

    let telegram = Arc::new(TelegramClient::new(client.clone(), token));
    let source = Arc::new(HttpFeedSource::new(client, config.poll.request_timeout()));
    let fanout = DeliveryFanout::new(
        telegram.clone(),
        registry.clone(),
        latest.clone(),
        config.poll.delivery_policy,
    );
    let cycle = Arc::new(PollCycle::new(
        source,
        FeedCatalog::from_dir(resources),
        watermarks,
        fanout,
    ));
    if config.notify_on_server_status {
        broadcast_notice(telegram.as_ref(), &registry, STARTED_NOTICE).await;
    }

    info!(
        interval = ?config.poll.interval(),
        resources = %resources.display(),
        "bot started (press Ctrl+C to stop)"
    );
    let poller = spawn_poller(cycle.clone(), config.poll.interval());
    let core = BotCore::new(registry.clone(), latest, cycle).with_trigger(poller.trigger());
    let handler = Handler::new(core, &config);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut offset = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            updates = telegram.get_updates(offset, LONG_POLL_SECS) => match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some((chat_id, text)) = update.text_message() else {
                            continue;
                        };
                        let Some(command) = Command::parse(text) else {
                            continue;
                        };
                        let reply = handler.handle(chat_id, command).await;
                        if let Err(err) = telegram.send(chat_id, &reply.text, &reply.options).await {
                            warn!(chat_id, error = %err, "failed to reply");
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to fetch updates");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    info!("shutdown requested");
    if let Err(err) = poller.stop().await {
        warn!(error = %err, "poller did not stop cleanly");
    }
    if config.notify_on_server_status {
        broadcast_notice(telegram.as_ref(), &registry, STOPPED_NOTICE).await;
    }
    info!("bot stopped");
}
