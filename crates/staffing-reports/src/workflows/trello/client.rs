use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::api::{
    assemble_lists, ApiAttachment, ApiCard, ApiCreated, ApiCustomField, ApiList, CardUpdate,
    NewCardBody, NewListBody, TextFieldBody, TextValue,
};
use crate::workflows::board::wire::{move_events_from_wire, snapshot_from_wire, WireAction};
use crate::workflows::board::{BoardError, BoardSnapshot, BoardSource, MoveEvent};
use crate::workflows::hiring::{BoardWriter, NewHireCard};
use crate::workflows::reports::publish::{Publication, PublishError, PublishStep, ReportPublisher};

pub const DEFAULT_API_URL: &str = "https://api.trello.com/1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrelloConfig {
    pub api_url: String,
    pub key: String,
    pub token: String,
    pub board_id: String,
}

/// Fixed-interval retry for rate limits, server errors and dropped connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 30,
        }
    }
}

impl RetryPolicy {
    fn retries_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[derive(Debug, Clone)]
pub struct TrelloClient {
    http: reqwest::Client,
    config: TrelloConfig,
    retry: RetryPolicy,
}

impl TrelloClient {
    pub fn new(config: TrelloConfig) -> Self {
        Self::with_retry(config, RetryPolicy::default())
    }

    pub fn with_retry(config: TrelloConfig, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            retry,
        }
    }

    pub fn config(&self) -> &TrelloConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .query(&[("key", &self.config.key), ("token", &self.config.token)])
    }

    /// Sends the request built by `build`, rebuilding it for every attempt.
    async fn execute<F>(&self, path: &str, build: F) -> Result<String, BoardError>
    where
        F: Fn() -> Result<RequestBuilder, BoardError> + Send + Sync,
    {
        let attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=attempts {
            match build()?.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|source| BoardError::Transport {
                            path: path.to_string(),
                            source,
                        });
                    }
                    if !RetryPolicy::retries_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(BoardError::Status {
                            path: path.to_string(),
                            status: status.as_u16(),
                            body,
                        });
                    }
                    warn!(path, attempt, status = status.as_u16(), "board request throttled; retrying");
                }
                Err(err) => {
                    warn!(path, attempt, error = %err, "board request failed; retrying");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.retry.interval).await;
            }
        }
        Err(BoardError::RetriesExhausted {
            path: path.to_string(),
            attempts,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BoardError> {
        let body = self
            .execute(path, || Ok(self.request(Method::GET, path).query(query)))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn lists(&self) -> Result<Vec<ApiList>, BoardError> {
        let path = format!("boards/{}/lists", self.config.board_id);
        self.fetch(&path, &[("filter", "open".to_string())]).await
    }

    pub async fn cards(&self) -> Result<Vec<ApiCard>, BoardError> {
        let path = format!("boards/{}/cards", self.config.board_id);
        self.fetch(
            &path,
            &[
                ("filter", "open".to_string()),
                ("customFieldItems", "true".to_string()),
            ],
        )
        .await
    }

    pub async fn custom_fields(&self) -> Result<Vec<ApiCustomField>, BoardError> {
        let path = format!("boards/{}/customFields", self.config.board_id);
        self.fetch(&path, &[]).await
    }

    pub async fn attachments(&self, card_id: &str) -> Result<Vec<ApiAttachment>, BoardError> {
        self.fetch(&format!("cards/{card_id}/attachments"), &[]).await
    }

    pub async fn upload_attachment(
        &self,
        card_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<ApiAttachment, BoardError> {
        let path = format!("cards/{card_id}/attachments");
        let body = self
            .execute(&path, || {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(content_type)
                    .map_err(|source| BoardError::Transport {
                        path: path.clone(),
                        source,
                    })?;
                let form = reqwest::multipart::Form::new().part("file", part);
                Ok(self.request(Method::POST, &path).multipart(form))
            })
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn delete_attachment(&self, card_id: &str, attachment_id: &str) -> Result<(), BoardError> {
        let path = format!("cards/{card_id}/attachments/{attachment_id}");
        self.execute(&path, || Ok(self.request(Method::DELETE, &path)))
            .await
            .map(|_| ())
    }

    pub async fn update_card(&self, card_id: &str, update: &CardUpdate<'_>) -> Result<(), BoardError> {
        let path = format!("cards/{card_id}");
        self.execute(&path, || Ok(self.request(Method::PUT, &path).json(update)))
            .await
            .map(|_| ())
    }

    /// Returns the id of the list named `name`, appending it to the board when missing.
    pub async fn find_or_create_list(&self, name: &str) -> Result<String, BoardError> {
        if let Some(list) = self.lists().await?.into_iter().find(|list| list.name == name) {
            return Ok(list.id);
        }
        let path = format!("boards/{}/lists", self.config.board_id);
        let body = NewListBody { name, pos: "bottom" };
        let created = self
            .execute(&path, || Ok(self.request(Method::POST, &path).json(&body)))
            .await?;
        let created: ApiCreated = serde_json::from_str(&created)?;
        info!(list = name, list_id = %created.id, "created board list");
        Ok(created.id)
    }

    async fn set_text_field(&self, card_id: &str, field_id: &str, text: &str) -> Result<(), BoardError> {
        let path = format!("card/{card_id}/customField/{field_id}/item");
        let body = TextFieldBody {
            value: TextValue { text },
        };
        self.execute(&path, || Ok(self.request(Method::PUT, &path).json(&body)))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl BoardSource for TrelloClient {
    async fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        let lists = self.lists().await?;
        let cards = self.cards().await?;
        let definitions = self.custom_fields().await?;
        debug!(lists = lists.len(), cards = cards.len(), "fetched board data");
        snapshot_from_wire(assemble_lists(lists, cards, &definitions))
    }

    async fn move_events(&self, since: DateTime<Utc>) -> Result<Vec<MoveEvent>, BoardError> {
        let path = format!("boards/{}/actions", self.config.board_id);
        let actions: Vec<WireAction> = self
            .fetch(
                &path,
                &[
                    ("filter", "updateCard".to_string()),
                    ("since", since.to_rfc3339_opts(SecondsFormat::Millis, true)),
                    ("limit", "1000".to_string()),
                ],
            )
            .await?;
        move_events_from_wire(actions)
    }
}

#[async_trait]
impl ReportPublisher for TrelloClient {
    /// Uploads the new image, removes every older attachment, then points the
    /// card at the new cover with the new description and title.
    async fn publish(&self, publication: &Publication) -> Result<(), PublishError> {
        let card_id = publication.card_id.as_str();
        let failed = |step: PublishStep| {
            move |source: BoardError| PublishError::Board {
                step,
                card_id: card_id.to_string(),
                source,
            }
        };

        let previous = self
            .attachments(card_id)
            .await
            .map_err(failed(PublishStep::ListAttachments))?;
        let image = &publication.image;
        let uploaded = self
            .upload_attachment(card_id, &image.file_name, image.content_type.as_ref(), &image.bytes)
            .await
            .map_err(failed(PublishStep::Upload))?;

        for attachment in previous.iter().filter(|attachment| attachment.id != uploaded.id) {
            self.delete_attachment(card_id, &attachment.id)
                .await
                .map_err(failed(PublishStep::DeleteAttachment))?;
        }
        debug!(card_id, removed = previous.len(), "replaced report attachments");

        let update = CardUpdate {
            desc: &publication.description,
            id_attachment_cover: &uploaded.id,
            name: publication.title.as_deref(),
        };
        self.update_card(card_id, &update)
            .await
            .map_err(failed(PublishStep::UpdateCard))
    }
}

#[async_trait]
impl BoardWriter for TrelloClient {
    async fn create_card(&self, card: &NewHireCard) -> Result<String, BoardError> {
        let list_id = self.find_or_create_list(&card.list_name).await?;
        let definitions = self.custom_fields().await?;

        let body = NewCardBody {
            id_list: &list_id,
            name: &card.name,
            location_name: &card.location,
        };
        let created = self
            .execute("cards", || Ok(self.request(Method::POST, "cards").json(&body)))
            .await?;
        let created: ApiCreated = serde_json::from_str(&created)?;

        for (field, text) in &card.fields {
            let definition = definitions
                .iter()
                .find(|definition| &definition.name == field)
                .ok_or_else(|| BoardError::InvalidField {
                    card_id: created.id.clone(),
                    field: field.clone(),
                    reason: "no custom field with that name on the board".to_string(),
                })?;
            self.set_text_field(&created.id, &definition.id, text).await?;
        }

        info!(card_id = %created.id, list = %card.list_name, "created new hire card");
        Ok(created.id)
    }
}
