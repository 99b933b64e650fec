//! Live Slack sink adapters: Web API and incoming webhook.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{Attachment, MessageSink, SinkError};

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const SLACK_UPDATE_MESSAGE_URL: &str = "https://slack.com/api/chat.update";

/// Wire form of an attachment.
#[derive(Serialize)]
struct WireAttachment<'a> {
    mrkdwn_in: [&'static str; 1],
    color: &'a str,
    text: &'a str,
    footer: &'a str,
}

impl<'a> From<&'a Attachment> for WireAttachment<'a> {
    fn from(attachment: &'a Attachment) -> Self {
        Self {
            mrkdwn_in: ["text"],
            color: &attachment.color,
            text: &attachment.text,
            footer: &attachment.footer,
        }
    }
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    attachments: [WireAttachment<'a>; 1],
}

#[derive(Serialize)]
struct PostTextRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct UpdateMessageRequest<'a> {
    channel: &'a str,
    ts: &'a str,
    attachments: [WireAttachment<'a>; 1],
}

#[derive(Serialize)]
struct WebhookRequest<'a> {
    text: &'a str,
    attachments: [WireAttachment<'a>; 1],
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

/// Slack Web API sink: posts into a channel, supports in-place updates.
///
/// The message `ts` returned by `chat.postMessage` is the correlation id
/// handed back to callers.
pub struct SlackApiSink {
    client: Client,
    token: String,
    channel: String,
}

impl SlackApiSink {
    /// Creates a sink posting into the given channel with a bot token.
    #[must_use]
    pub fn new(token: &str, channel: &str) -> Self {
        Self { client: Client::new(), token: token.to_string(), channel: channel.to_string() }
    }

    fn call<T: Serialize>(&self, url: &str, body: &T) -> Result<SlackResponse, SinkError> {
        let response = self.client.post(url).bearer_auth(&self.token).json(body).send()?;
        Ok(response.json::<SlackResponse>()?)
    }
}

impl MessageSink for SlackApiSink {
    fn post(&self, text: &str, attachment: &Attachment) -> Result<Option<String>, SinkError> {
        let body = PostMessageRequest {
            channel: &self.channel,
            text,
            attachments: [attachment.into()],
        };
        let response = self.call(SLACK_POST_MESSAGE_URL, &body)?;
        if !response.ok {
            return Err(SinkError::Delivery(
                response.error.unwrap_or_else(|| "unknown Slack error".to_string()),
            ));
        }
        Ok(response.ts)
    }

    fn update(
        &self,
        correlation_id: &str,
        _text: &str,
        attachment: &Attachment,
    ) -> Result<(), SinkError> {
        let body = UpdateMessageRequest {
            channel: &self.channel,
            ts: correlation_id,
            attachments: [attachment.into()],
        };
        let response = self.call(SLACK_UPDATE_MESSAGE_URL, &body)?;
        if response.ok {
            return Ok(());
        }
        match response.error.as_deref() {
            // chat.update needs the channel id, not its name; leave a hint
            // in the channel instead of failing every run.
            Some("channel_not_found") => {
                let hint = PostTextRequest {
                    channel: &self.channel,
                    text: ":warning: please use an ID for CHANNEL (e.g. CXXXXXXXXXX), it is required for syncing edits.",
                };
                self.call(SLACK_POST_MESSAGE_URL, &hint)?;
                Ok(())
            }
            other => Err(SinkError::Delivery(other.unwrap_or("unknown Slack error").to_string())),
        }
    }
}

/// Slack incoming-webhook sink: post-only.
///
/// Webhooks cannot address messages after posting, so `post` returns no
/// correlation id and `update` fails fast.
pub struct SlackWebhookSink {
    client: Client,
    url: String,
}

impl SlackWebhookSink {
    /// Creates a sink posting to the given webhook URL.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self { client: Client::new(), url: url.to_string() }
    }
}

impl MessageSink for SlackWebhookSink {
    fn post(&self, text: &str, attachment: &Attachment) -> Result<Option<String>, SinkError> {
        let body = WebhookRequest { text, attachments: [attachment.into()] };
        let response = self.client.post(&self.url).json(&body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Delivery(format!("webhook returned {status}")));
        }
        Ok(None)
    }

    fn update(
        &self,
        _correlation_id: &str,
        _text: &str,
        _attachment: &Attachment,
    ) -> Result<(), SinkError> {
        Err(SinkError::Unsupported("message updates (incoming webhooks can only post)"))
    }
}
