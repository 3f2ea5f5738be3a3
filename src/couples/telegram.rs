//! Telegram client using teloxide.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::info;

/// The two Telegram operations the bot performs beyond receiving updates.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send a PNG from memory with a caption.
    pub async fn send_photo(
        &self,
        chat_id: ChatId,
        png: Vec<u8>,
        caption: &str,
    ) -> Result<(), String> {
        info!("📷 Sending couple card to chat {} ({} bytes)", chat_id, png.len());

        let input_file = InputFile::memory(png).file_name("couple.png");
        self.bot
            .send_photo(chat_id, input_file)
            .caption(caption)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send photo: {e}"))
    }

    /// Display name of a chat member, as shown in the group.
    pub async fn member_display_name(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<String, String> {
        let member = self
            .bot
            .get_chat_member(chat_id, user_id)
            .await
            .map_err(|e| format!("Failed to get chat member: {e}"))?;

        Ok(member.user.full_name())
    }
}
