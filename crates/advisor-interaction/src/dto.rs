//! Wire formats of the advisor backend.
//!
//! These mirror the JSON the backend sends and receives. They are converted
//! into `advisor-core` domain types at the edge of the gateway and never
//! leak past it.

use advisor_core::auth::Identity;
use advisor_core::session::{ChatMessage, ChatSessionSummary, MessageRole};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /auth/user`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub has_google_auth: bool,
    #[serde(default)]
    pub has_hub_spot_auth: bool,
    #[serde(default)]
    pub ongoing_instructions: Option<String>,
}

impl From<UserDto> for Identity {
    fn from(dto: UserDto) -> Self {
        let display_name = dto
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| dto.email.clone())
            .unwrap_or_default();

        Identity {
            id: dto.id,
            email: dto.email,
            display_name,
            ongoing_instructions: dto.ongoing_instructions.unwrap_or_default(),
            ..Identity::default()
        }
        .with_integrations(dto.has_google_auth, dto.has_hub_spot_auth)
    }
}

/// Body of `POST /api/chat/message`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

/// Body of `POST /api/chat/instructions`.
#[derive(Debug, Serialize)]
pub struct InstructionsRequest<'a> {
    pub instructions: &'a str,
}

/// One element of `GET /api/chat/sessions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub session_id: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub message_count: u32,
}

impl From<SessionDto> for ChatSessionSummary {
    fn from(dto: SessionDto) -> Self {
        ChatSessionSummary {
            last_message_at: dto.last_message_at.as_deref().and_then(parse_timestamp),
            preview: dto.preview.unwrap_or_default(),
            message_count: dto.message_count,
            session_id: dto.session_id,
        }
    }
}

/// One element of `GET /api/chat/history/{sessionId}`.
#[derive(Debug, Deserialize)]
pub struct HistoryEntryDto {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    pub role: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<HistoryEntryDto> for ChatMessage {
    fn from(dto: HistoryEntryDto) -> Self {
        // SYSTEM entries are shown as flagged assistant messages.
        let (role, is_system) = match dto.role.to_ascii_uppercase().as_str() {
            "USER" => (MessageRole::User, false),
            "SYSTEM" => (MessageRole::Assistant, true),
            _ => (MessageRole::Assistant, false),
        };

        ChatMessage {
            id: dto.id.to_string(),
            content: dto.content,
            role,
            timestamp: dto
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            is_error: false,
            is_system,
        }
    }
}

/// Body of `GET /api/auth/hubspot`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSpotAuthUrlDto {
    #[serde(default)]
    pub auth_url: Option<String>,
}

/// Body of `POST /auth/hubspot/callback`.
#[derive(Debug, Serialize)]
pub struct HubSpotCodeRequest<'a> {
    pub code: &'a str,
}

/// Response of `POST /auth/hubspot/callback`, on success and on failure.
#[derive(Debug, Deserialize)]
pub struct HubSpotCallbackDto {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parses a backend timestamp.
///
/// The backend serializes zone-less local date-times; those are taken as UTC.
/// Full RFC 3339 values are accepted too.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
