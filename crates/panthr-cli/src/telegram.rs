//! Telegram front end for Panthr
//! Uses the shared wallet service from panthr-core

use std::sync::Arc;

use panthr_core::{AccountProvider, UserStore, WalletService};
use teloxide::prelude::*;
use tracing::{error, info};

/// Telegram rejects messages longer than 4096 characters
const MAX_MESSAGE_CHARS: usize = 4000;

pub async fn run_telegram_bot<S, A>(token: String, service: Arc<WalletService<S, A>>)
where
    S: UserStore + 'static,
    A: AccountProvider + 'static,
{
    info!("Panthr Telegram bot starting");
    let bot = Bot::new(token);

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let service = Arc::clone(&service);
        async move {
            let (Some(text), Some(from)) = (msg.text(), msg.from()) else {
                return Ok(());
            };
            // Canonical string form of the numeric Telegram id
            let user_id = panthr_core::UserId::from(from.id.0);
            let text = text.to_owned();

            // Store, KDF and account tool are all blocking
            let reply = tokio::task::spawn_blocking(move || service.handle(&user_id, &text)).await;

            match reply {
                Ok(Some(response)) => {
                    for chunk in response.chars().collect::<Vec<_>>().chunks(MAX_MESSAGE_CHARS) {
                        let chunk_str: String = chunk.iter().collect();
                        bot.send_message(msg.chat.id, chunk_str).await?;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "message handler panicked");
                    bot.send_message(msg.chat.id, "Something went wrong. Please try again.").await?;
                }
            }
            Ok(())
        }
    })
    .await;
}
