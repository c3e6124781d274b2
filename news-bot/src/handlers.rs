use news_core::render;
use news_core::{
    parse_publish_args, BotConfig, BotCore, Category, ChatId, ParseMode, RefreshOutcome,
    SendOptions, StartOutcome, StopOutcome,
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Latest,
    Help,
    Mode(Category),
    Check,
    Article(String),
}

impl Command {
    /// Parses `/name[@bot] [args]`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = rest
            .split_once(char::is_whitespace)
            .map(|(h, a)| (h, a.trim()))
            .unwrap_or((rest, ""));
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "latest" => Command::Latest,
            "help" => Command::Help,
            "regional_mode" | "kz_mode" => Command::Mode(Category::Regional),
            "global_mode" | "world_mode" => Command::Mode(Category::Global),
            "check" => Command::Check,
            "article" => Command::Article(args.to_owned()),
            _ => return None,
        };
        Some(command)
    }

    fn admin_only(&self) -> bool {
        matches!(self, Command::Check | Command::Article(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub options: SendOptions,
}

impl Reply {
    fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions::html(),
        }
    }

    fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions {
                parse_mode: Some(ParseMode::Markdown),
                disable_link_preview: false,
            },
        }
    }
}

/// Translates chat commands into core calls and builds the replies.
#[derive(Clone)]
pub struct Handler {
    core: BotCore,
    config: BotConfig,
}

impl Handler {
    pub fn new(core: BotCore, config: &BotConfig) -> Self {
        Self {
            core,
            config: config.clone(),
        }
    }

    pub async fn handle(&self, chat_id: ChatId, command: Command) -> Reply {
        if command.admin_only() && !self.config.is_admin(chat_id) {
            info!(chat_id, ?command, "admin command refused");
            return Reply::html("<i>Access denied. This command is for administrators only.</i>");
        }

        match command {
            Command::Start => match self.core.start_subscription(chat_id).await {
                StartOutcome::Started { .. } => Reply::html(
                    "<i>Bot started! News delivery is on</i>\nCollecting news feeds...",
                ),
                StartOutcome::AlreadyRunning => Reply::html("<i>Already running</i>"),
            },
            Command::Stop => match self.core.stop_subscription(chat_id).await {
                StopOutcome::Stopped => Reply::html(
                    "<i>News delivery is off</i>\nYou can still use /latest to get the most recent article",
                ),
                StopOutcome::AlreadyStopped => Reply::html("<i>Already stopped</i>"),
            },
            Command::Latest => match self.core.latest_article(chat_id).await {
                (_, Some(article)) => Reply::html(render::article_message(&article)),
                (mode, None) => Reply::html(format!("<i>No {mode} articles yet</i>")),
            },
            Command::Help => {
                let path = self.config.help_path();
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => Reply::markdown(text),
                    Err(err) => {
                        warn!(error = %err, path = %path.display(), "help text unavailable");
                        Reply::html("<i>Command temporarily unavailable</i>")
                    }
                }
            }
            Command::Mode(category) => {
                self.core.select_mode(chat_id, category).await;
                let label = match category {
                    Category::Regional => "Regional only",
                    Category::Global => "All countries",
                };
                Reply::html(format!("Mode selected: <b>{label}</b>"))
            }
            Command::Check => match self.core.request_refresh().await {
                RefreshOutcome::Queued => Reply::html("<i>News feeds are being refreshed</i>"),
                RefreshOutcome::Completed(report) => Reply::html(format!(
                    "<i>News feeds refreshed: {} checked, {} sent</i>",
                    report.feeds_checked,
                    report.dispatches.len()
                )),
            },
            Command::Article(args) => match parse_publish_args(&args) {
                Ok(request) => {
                    let report = self.core.publish_article(&request).await;
                    Reply::html(format!(
                        "<i>Article sent to {} of {} subscribers</i>",
                        report.delivered.len(),
                        report.delivered.len() + report.failed.len() + report.skipped.len()
                    ))
                }
                Err(err) => Reply::html(format!(
                    "<i>Invalid command</i>\n{}",
                    render::escape_html(&err.to_string())
                )),
            },
        }
    }
}
