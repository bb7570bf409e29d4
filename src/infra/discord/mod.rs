//! Discord REST client: member lookups, CDN avatar URLs and follow-up
//! editing of deferred interaction responses.

pub mod types;

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, multipart};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::domain::markdown::extract_mention_ids;

use types::GuildMember;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("discord returned status {status} during {context}")]
    Status { status: u16, context: &'static str },
}

pub struct DiscordClient {
    client: Client,
    api_base: Url,
    cdn_base: Url,
    token: String,
}

impl DiscordClient {
    pub fn new(client: Client, api_base: Url, cdn_base: Url, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base,
            cdn_base,
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    pub async fn guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<GuildMember, DiscordError> {
        let url = self
            .api_base
            .join(&format!("guilds/{guild_id}/members/{user_id}"))?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscordError::Status {
                status: status.as_u16(),
                context: "guild member lookup",
            });
        }
        Ok(response.json().await?)
    }

    /// Edit the deferred original response, attaching the rendered PNG.
    pub async fn attach_quote_image(
        &self,
        application_id: &str,
        token: &str,
        image: Bytes,
    ) -> Result<(), DiscordError> {
        let url = self
            .api_base
            .join(&format!("webhooks/{application_id}/{token}/messages/@original"))?;
        let payload = serde_json::json!({
            "attachments": [{ "id": 0, "filename": "quote.png" }],
        });
        let form = multipart::Form::new()
            .text("payload_json", payload.to_string())
            .part(
                "files[0]",
                multipart::Part::bytes(image.to_vec())
                    .file_name("quote.png")
                    .mime_str("image/png")?,
            );

        let response = self
            .client
            .patch(url)
            .header(AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscordError::Status {
                status: status.as_u16(),
                context: "follow-up attachment",
            });
        }
        Ok(())
    }

    /// Replace the deferred original response with a plain-text notice.
    pub async fn edit_original_message(
        &self,
        application_id: &str,
        token: &str,
        content: &str,
    ) -> Result<(), DiscordError> {
        let url = self
            .api_base
            .join(&format!("webhooks/{application_id}/{token}/messages/@original"))?;
        let response = self
            .client
            .patch(url)
            .header(AUTHORIZATION, self.authorization())
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscordError::Status {
                status: status.as_u16(),
                context: "follow-up edit",
            });
        }
        Ok(())
    }

    /// Avatar URL for a member: guild avatar, then user avatar, then the
    /// default asset derived from the user id.
    pub fn avatar_url(&self, guild_id: &str, member: &GuildMember) -> String {
        let base = self.cdn_base.as_str().trim_end_matches('/');
        if let Some(hash) = &member.avatar {
            return format!(
                "{base}/guilds/{guild_id}/users/{}/avatars/{hash}.png?size=512",
                member.user.id
            );
        }
        if let Some(hash) = &member.user.avatar {
            return format!("{base}/avatars/{}/{hash}.png?size=512", member.user.id);
        }
        format!(
            "{base}/embed/avatars/{}.png",
            default_avatar_index(&member.user.id)
        )
    }

    /// Resolve display names for every user mentioned in `text`. Lookup
    /// failures leave the id unresolved; the renderer paints those as
    /// `unknown`.
    pub async fn resolve_mention_names(
        &self,
        guild_id: &str,
        text: &str,
        quoted: &GuildMember,
    ) -> HashMap<String, String> {
        let ids = extract_mention_ids(text);
        let mut names = HashMap::new();
        if ids.is_empty() {
            return names;
        }

        // The quoted member is already in hand; reuse it.
        names.insert(quoted.user.id.clone(), quoted.display_name().to_string());

        for id in ids {
            if names.contains_key(&id) {
                continue;
            }
            match self.guild_member(guild_id, &id).await {
                Ok(member) => {
                    names.insert(id, member.display_name().to_string());
                }
                Err(error) => {
                    warn!(
                        target = "meigen::discord",
                        user_id = %id,
                        error = %error,
                        "failed to resolve mention"
                    );
                }
            }
        }

        names
    }
}

/// Default avatar index for users on the unique-username system.
fn default_avatar_index(user_id: &str) -> u64 {
    user_id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0)
}
