mod config;
mod couples;
mod health;

use std::sync::Arc;

use rand::thread_rng;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use couples::{card, AvatarFetcher, CardComposer, Partner, PartnerSelector, Selection, TelegramClient};

struct BotState {
    selector: PartnerSelector,
    composer: CardComposer,
    avatars: AvatarFetcher,
    telegram: TelegramClient,
    bot_username: Option<String>,
}

impl BotState {
    async fn new(config: Config, bot: &Bot) -> Self {
        // Get bot info so /couples@botname addresses only us
        let bot_username = match bot.get_me().await {
            Ok(me) => {
                info!("Bot user ID: {}, username: @{}", me.id, me.username());
                Some(me.username().to_string())
            }
            Err(e) => {
                warn!("Failed to get bot info: {e}");
                None
            }
        };

        Self {
            selector: PartnerSelector::new(
                config.preferred_pairs,
                config.preferred_chance,
                config.placeholder_names,
            ),
            composer: CardComposer::new(config.font_path.as_deref()),
            avatars: AvatarFetcher::new(bot.clone()),
            telegram: TelegramClient::new(bot.clone()),
            bot_username,
        }
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "couplebot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("couplebot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting couplebot...");
    info!("Loaded config from {config_path}");
    info!(
        "{} preferred pair(s), preferred chance {}",
        config.preferred_pairs.len(),
        config.preferred_chance
    );

    if let Some(port) = config.health_port {
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                error!("Health endpoint failed: {e}");
            }
        });
    }

    let state = Arc::new(BotState::new(config, &bot).await);

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(ref user) = msg.from else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if !is_couples_command(text, state.bot_username.as_deref()) {
        return Ok(());
    }

    info!("💑 /couples from {} ({}) in chat {}", user.full_name(), user.id, msg.chat.id);
    handle_couples(&msg, user, &state).await;

    Ok(())
}

/// The `/couples` request path. Failures past avatar fetching are fatal to
/// the request only: logged and dropped, never a user-visible error.
async fn handle_couples(msg: &Message, user: &User, state: &BotState) {
    let Selection { partner, preferred } = state.selector.select(user.id, &mut thread_rng());

    let (partner_name, partner_img) = match partner {
        Partner::Preferred(partner_id) => {
            let name = match state.telegram.member_display_name(msg.chat.id, partner_id).await {
                Ok(name) => name,
                Err(e) => {
                    warn!("Dropping request: cannot resolve partner {partner_id}: {e}");
                    return;
                }
            };
            let img = state.avatars.fetch(partner_id).await;
            (name, img)
        }
        Partner::Placeholder(name) => (name, card::placeholder_avatar()),
    };

    let user_img = state.avatars.fetch(user.id).await;

    let card = match state.composer.compose(
        &user.full_name(),
        &user_img,
        &partner_name,
        &partner_img,
        preferred,
    ) {
        Ok(card) => card,
        Err(e) => {
            warn!("Dropping request: {e}");
            return;
        }
    };

    if let Err(e) = state.telegram.send_photo(msg.chat.id, card.png, &card.caption).await {
        warn!("Dropping request: {e}");
    }
}

/// Match `/couples`, including the `/couples@botname` group form. Commands
/// addressed to a different bot are ignored.
fn is_couples_command(text: &str, bot_username: Option<&str>) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    match command.split_once('@') {
        None => command == "/couples",
        Some((base, mention)) => {
            base == "/couples" && bot_username.is_none_or(|name| mention.eq_ignore_ascii_case(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command_matches() {
        assert!(is_couples_command("/couples", Some("couple_bot")));
        assert!(is_couples_command("/couples extra words", Some("couple_bot")));
    }

    #[test]
    fn test_addressed_command_matches_own_username() {
        assert!(is_couples_command("/couples@couple_bot", Some("couple_bot")));
        assert!(is_couples_command("/couples@Couple_Bot", Some("couple_bot")));
        assert!(!is_couples_command("/couples@other_bot", Some("couple_bot")));
    }

    #[test]
    fn test_unknown_username_accepts_any_mention() {
        assert!(is_couples_command("/couples@whoever", None));
    }

    #[test]
    fn test_other_text_ignored() {
        assert!(!is_couples_command("hello", Some("couple_bot")));
        assert!(!is_couples_command("/couple", Some("couple_bot")));
        assert!(!is_couples_command("/couplesearch", Some("couple_bot")));
        assert!(!is_couples_command("", Some("couple_bot")));
    }
}
