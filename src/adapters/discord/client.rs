//! Discord REST client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use super::types::{DiscordChannel, DiscordGuild, DiscordMember};
use crate::error::{Error, Result};
use crate::outbound::SendApi;
use crate::types::Attachment;

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10/";

/// Page size for member list pagination, the API maximum.
const MEMBERS_PAGE_LIMIT: usize = 1000;

/// Client for the Discord REST API, authenticated as a bot.
pub struct DiscordRestClient {
    http_client: Client,
    base_url: Url,
    token: String,
}

impl DiscordRestClient {
    /// Create a client against the public Discord API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against an alternate API base (tests, proxies).
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::invalid_argument(format!("invalid base URL: {e}")))?;
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url,
            token: token.into(),
        })
    }

    /// Build the full URL for an endpoint path.
    pub fn api_url(&self, endpoint: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{base}/{endpoint}")
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.api_url(endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| Error::network(format!("GET {endpoint} failed: {e}")))?;
        Self::handle_response(endpoint, response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::auth(format!("{endpoint} rejected credential")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::protocol(format!(
                "{endpoint} failed with status {status}: {body}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Error::protocol(format!("failed to parse {endpoint} response: {e}")))
    }

    /// Fetch the guilds the bot credential belongs to.
    pub async fn current_user_guilds(&self) -> Result<Vec<DiscordGuild>> {
        self.get("users/@me/guilds").await
    }

    /// Fetch all channels of a guild.
    pub async fn guild_channels(&self, guild_id: &str) -> Result<Vec<DiscordChannel>> {
        self.get(&format!("guilds/{guild_id}/channels")).await
    }

    /// Page through a guild's full member list.
    pub async fn guild_members(&self, guild_id: &str) -> Result<Vec<DiscordMember>> {
        let mut members = Vec::new();
        let mut after = String::new();
        loop {
            let endpoint = format!(
                "guilds/{guild_id}/members?limit={MEMBERS_PAGE_LIMIT}&after={after}"
            );
            let page: Vec<DiscordMember> = self.get(&endpoint).await?;
            let full_page = page.len() == MEMBERS_PAGE_LIMIT;
            let last_id = page
                .iter()
                .rev()
                .find_map(|m| m.user.as_ref().map(|u| u.id.clone()));
            members.extend(page);
            match last_id {
                Some(id) if full_page => after = id,
                _ => return Ok(members),
            }
        }
    }

    /// Post a message to a channel or DM.
    pub async fn create_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let endpoint = format!("channels/{channel_id}/messages");
        let response = self
            .http_client
            .post(self.api_url(&endpoint))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| Error::network(format!("POST {endpoint} failed: {e}")))?;
        let _: serde_json::Value = Self::handle_response(&endpoint, response).await?;
        Ok(())
    }
}

#[async_trait]
impl SendApi for DiscordRestClient {
    async fn send_text(&self, channel_or_dm_id: &str, text: &str) -> Result<()> {
        self.create_message(channel_or_dm_id, text).await
    }

    /// Discord has no Slack-style attachment structure for bot text posts,
    /// so rich sends degrade to the attachments' fallback lines appended
    /// under the main text.
    async fn send_rich(
        &self,
        channel_or_dm_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<()> {
        let mut content = text.to_string();
        for attachment in attachments {
            content.push('\n');
            content.push_str(attachment.fallback_text());
        }
        self.create_message(channel_or_dm_id, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = DiscordRestClient::new("token").unwrap();
        assert_eq!(
            client.api_url("users/@me/guilds"),
            "https://discord.com/api/v10/users/@me/guilds"
        );
        assert_eq!(
            client.api_url("/channels/199/messages"),
            "https://discord.com/api/v10/channels/199/messages"
        );
    }

    #[test]
    fn test_auth_header_uses_bot_scheme() {
        let client = DiscordRestClient::new("Njk4...").unwrap();
        assert_eq!(client.auth_header(), "Bot Njk4...");
    }
}
