use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;

use super::Notifier;
use crate::{NotifyError, TargetDate, Verdict, Verdicts, requests::RequestClient};

const EMBED_COLOR_GREEN: u32 = 0x00ff00;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    content: String,
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

/// Posts alerts to a Discord channel webhook.
pub struct DiscordNotifier {
    client: RequestClient,
    webhook_url: String,
    page_url: String,
}

impl DiscordNotifier {
    pub fn new(client: RequestClient, webhook_url: &str, page_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.to_string(),
            page_url: page_url.to_string(),
        }
    }

    fn build_payload(
        &self,
        newly_available: &[TargetDate],
        verdicts: &Verdicts,
        checked_at: DateTime<Local>,
    ) -> WebhookPayload {
        let mut fields: Vec<EmbedField> = newly_available
            .iter()
            .map(|date| EmbedField {
                name: format!("📅 {date}"),
                value: "✅ **Available, book now!**".to_string(),
                inline: true,
            })
            .collect();

        let others: Vec<String> = verdicts
            .iter()
            .filter(|(date, _)| !newly_available.contains(date))
            .map(|(date, verdict)| match verdict {
                Verdict::Available => format!("{date}: still available"),
                _ => format!("{date}: {verdict}"),
            })
            .collect();
        if !others.is_empty() {
            fields.push(EmbedField {
                name: "Other dates".to_string(),
                value: others.join("\n"),
                inline: false,
            });
        }

        fields.push(EmbedField {
            name: "🔗 Booking link".to_string(),
            value: self.page_url.clone(),
            inline: false,
        });

        WebhookPayload {
            content: "@everyone 🎉 Parking is available!".to_string(),
            embeds: vec![Embed {
                title: "🚗 Parking can be booked!".to_string(),
                description: "New availability found, go reserve it!".to_string(),
                color: EMBED_COLOR_GREEN,
                fields,
                footer: EmbedFooter {
                    text: format!("Checked at {}", checked_at.format("%Y-%m-%d %H:%M:%S")),
                },
            }],
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(
        &self,
        newly_available: &[TargetDate],
        verdicts: &Verdicts,
    ) -> Result<(), NotifyError> {
        let payload = self.build_payload(newly_available, verdicts, Local::now());
        let response = self.client.post_json(&self.webhook_url, &payload).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Discord webhook answered {status}");
            return Err(NotifyError::Rejected { status, body });
        }
        info!("Discord notification sent");
        Ok(())
    }
}
