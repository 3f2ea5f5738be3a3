//! Avatar retrieval with local fallback.

use image::RgbaImage;
use teloxide::net::Download;
use teloxide::prelude::*;
use tracing::{info, warn};

use super::card;

/// Fetches profile photos, recovering every failure into the stock
/// fallback avatar. No retry, no backoff; the card degrades instead.
pub struct AvatarFetcher {
    bot: Bot,
}

impl AvatarFetcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Fetch a user's avatar as an RGBA bitmap. Never fails: users without
    /// a photo and any fetch or decode error yield the fallback avatar.
    pub async fn fetch(&self, user_id: UserId) -> RgbaImage {
        match self.try_fetch(user_id).await {
            Ok(Some(img)) => img,
            Ok(None) => {
                info!("User {user_id} has no profile photo, using fallback avatar");
                card::fallback_avatar()
            }
            Err(e) => {
                warn!("Avatar fetch for {user_id} failed: {e}");
                card::fallback_avatar()
            }
        }
    }

    async fn try_fetch(&self, user_id: UserId) -> Result<Option<RgbaImage>, String> {
        let photos = self
            .bot
            .get_user_profile_photos(user_id)
            .limit(1)
            .await
            .map_err(|e| format!("Failed to get profile photos: {e}"))?;

        let Some(photo_sizes) = photos.photos.first() else {
            return Ok(None);
        };
        // Sizes are ordered small to large; take the largest for quality
        let Some(photo) = photo_sizes.last() else {
            return Ok(None);
        };

        let file = self
            .bot
            .get_file(photo.file.id.clone())
            .await
            .map_err(|e| format!("Failed to get photo file: {e}"))?;

        let mut data = Vec::new();
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(|e| format!("Failed to download photo: {e}"))?;

        let img = image::load_from_memory(&data)
            .map_err(|e| format!("Failed to decode photo: {e}"))?
            .to_rgba8();

        info!("Downloaded profile photo for {user_id} ({} bytes)", data.len());
        Ok(Some(img))
    }
}
