//! HTTP calendar adapter.
//!
//! Implements the `RemoteCalendar` port against a JSON calendar API:
//! an OAuth-style token exchange followed by per-calendar event
//! creation and deletion. Credentials are the tenant's stored refresh
//! token, handled via `secrecy::SecretString`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{CalendarToken, EventDraft, RemoteCalendar};

/// Calendar API configuration.
#[derive(Clone)]
pub struct CalendarApiConfig {
    /// Base URL of the calendar API.
    base_url: String,
}

impl CalendarApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct EventTime {
    date_time: Timestamp,
}

#[derive(Serialize)]
struct CreateEventRequest<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: EventTime,
    end: EventTime,
}

#[derive(Deserialize)]
struct CreatedEventResponse {
    id: String,
}

/// `RemoteCalendar` implementation over HTTP.
pub struct HttpCalendarAdapter {
    config: CalendarApiConfig,
    http_client: reqwest::Client,
}

impl HttpCalendarAdapter {
    pub fn new(config: CalendarApiConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RemoteCalendar for HttpCalendarAdapter {
    async fn authenticate(&self, credential: &SecretString) -> Result<CalendarToken, DomainError> {
        let url = format!("{}/oauth/token", self.config.base_url);
        let body = TokenRequest {
            grant_type: "refresh_token",
            refresh_token: credential.expose_secret(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::calendar(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, error = %error_text, "Calendar token exchange rejected");
            return Err(DomainError::calendar(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::calendar(format!("Invalid token response: {}", e)))?;
        Ok(CalendarToken::new(token.access_token))
    }

    async fn create_event(
        &self,
        token: &CalendarToken,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<String, DomainError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.config.base_url, calendar_id
        );
        let body = CreateEventRequest {
            summary: &draft.title,
            description: draft.description.as_deref(),
            start: EventTime {
                date_time: draft.start,
            },
            end: EventTime {
                date_time: draft.end,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::calendar(format!("Event creation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, error = %error_text, "Calendar event creation rejected");
            return Err(DomainError::calendar(format!(
                "Event creation failed with status {}",
                status
            )));
        }

        let created: CreatedEventResponse = response
            .json()
            .await
            .map_err(|e| DomainError::calendar(format!("Invalid event response: {}", e)))?;
        Ok(created.id)
    }

    async fn delete_event(
        &self,
        token: &CalendarToken,
        calendar_id: &str,
        remote_event_id: &str,
    ) -> Result<(), DomainError> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.config.base_url, calendar_id, remote_event_id
        );

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| DomainError::calendar(format!("Event deletion request failed: {}", e)))?;

        // An event deleted out-of-band is as gone as one we deleted.
        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status() == reqwest::StatusCode::GONE
        {
            tracing::warn!(
                remote_event_id,
                "Remote event already absent during deletion"
            );
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, error = %error_text, "Calendar event deletion rejected");
            return Err(DomainError::calendar(format!(
                "Event deletion failed with status {}",
                status
            )));
        }
        Ok(())
    }
}
