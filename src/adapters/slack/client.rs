//! Slack Web API client

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::types::{
    ConversationsListResponse, PostMessageResponse, RtmConnectResponse, TeamInfoResponse,
    UsersListResponse,
};
use crate::error::{Error, Result};
use crate::outbound::SendApi;
use crate::types::{Attachment, DEFAULT_FALLBACK};

const DEFAULT_BASE_URL: &str = "https://slack.com/api/";

/// Client for the Slack Web API.
pub struct SlackWebClient {
    http_client: Client,
    base_url: Url,
    token: String,
}

impl SlackWebClient {
    /// Create a client against the public Slack API.
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

    /// Build the full URL for an API method.
    pub fn api_url(&self, method: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{method}")
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.api_url(method))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::network(format!("{method} request failed: {e}")))?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::protocol(format!("failed to parse {method} response: {e}")))
    }

    async fn post<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::network(format!("{method} request failed: {e}")))?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::protocol(format!("failed to parse {method} response: {e}")))
    }

    /// Request an RTM socket URL and the bot's identity.
    pub async fn rtm_connect(&self) -> Result<RtmConnectResponse> {
        let response: RtmConnectResponse = self.get("rtm.connect").await?;
        check_envelope("rtm.connect", response.ok, response.error.as_deref())?;
        Ok(response)
    }

    /// Fetch the full member list.
    pub async fn users_list(&self) -> Result<UsersListResponse> {
        let response: UsersListResponse = self.get("users.list").await?;
        check_envelope("users.list", response.ok, response.error.as_deref())?;
        Ok(response)
    }

    /// Fetch all conversations the credential can see, DMs included.
    pub async fn conversations_list(&self) -> Result<ConversationsListResponse> {
        let response: ConversationsListResponse = self
            .get("conversations.list?types=public_channel,private_channel,im")
            .await?;
        check_envelope("conversations.list", response.ok, response.error.as_deref())?;
        Ok(response)
    }

    /// Fetch workspace info.
    pub async fn team_info(&self) -> Result<TeamInfoResponse> {
        let response: TeamInfoResponse = self.get("team.info").await?;
        check_envelope("team.info", response.ok, response.error.as_deref())?;
        Ok(response)
    }

    /// Post a message, optionally with attachments.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&[Attachment]>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "channel": channel,
            "text": text,
            "as_user": true,
        });
        if let Some(attachments) = attachments {
            body["attachments"] = serde_json::to_value(filled_fallbacks(attachments))
                .map_err(|e| Error::invalid_argument(format!("bad attachments: {e}")))?;
        }
        let response: PostMessageResponse = self.post("chat.postMessage", &body).await?;
        check_envelope("chat.postMessage", response.ok, response.error.as_deref())
    }
}

/// Fill in the default fallback on attachments that carry none, so every
/// attachment posted to Slack has a plain-text rendering on the wire.
fn filled_fallbacks(attachments: &[Attachment]) -> Vec<Attachment> {
    attachments
        .iter()
        .map(|attachment| {
            let mut attachment = attachment.clone();
            if attachment.fallback.is_none() {
                attachment.fallback = Some(DEFAULT_FALLBACK.to_string());
            }
            attachment
        })
        .collect()
}

/// Map a Slack `ok`/`error` envelope to a typed error. Credential errors
/// are fatal; everything else is retriable.
fn check_envelope(method: &str, ok: bool, error: Option<&str>) -> Result<()> {
    if ok {
        return Ok(());
    }
    let reason = error.unwrap_or("unknown_error");
    match reason {
        "invalid_auth" | "account_inactive" | "token_revoked" | "not_authed" => Err(Error::auth(
            format!("{method} rejected credential: {reason}"),
        )),
        _ => Err(Error::protocol(format!("{method} failed: {reason}"))),
    }
}

#[async_trait]
impl SendApi for SlackWebClient {
    async fn send_text(&self, channel_or_dm_id: &str, text: &str) -> Result<()> {
        self.post_message(channel_or_dm_id, text, None).await
    }

    async fn send_rich(
        &self,
        channel_or_dm_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<()> {
        self.post_message(channel_or_dm_id, text, Some(attachments))
            .await
    }
}
