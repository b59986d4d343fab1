//! Core data model types for guuk.
//!
//! These are the records exchanged with the quiz, generation and history
//! collaborators. Field names follow the service's snake_case wire format.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// Grouping key for entries that carry neither a media type nor a type.
pub const OTHER_KIND: &str = "other";

// ---------------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------------

/// A quiz as served for an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Identifier assigned by the service.
    pub id: String,
    pub title: String,
    /// Username of the author.
    #[serde(default)]
    pub created_by: String,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt shown to the learner.
    #[serde(rename = "question")]
    pub text: String,
    /// Choices in display order; answers refer to them by index.
    pub options: Vec<String>,
    /// Index of the correct option. The service strips it before serving a
    /// quiz for an attempt, so it is only present on authored quizzes.
    #[serde(rename = "answer", default, skip_serializing_if = "Option::is_none")]
    pub correct_option_index: Option<usize>,
}

/// Entry of the quiz listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    /// Identifier to pass to [`QuizStore::get`](crate::traits::QuizStore::get).
    pub id: String,
    pub title: String,
    /// Username of the author.
    #[serde(default)]
    pub created_by: String,
    /// When the quiz was created, if the service recorded it.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Questions with answers stripped.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuizSummary {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// Answers sent for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub quiz_id: String,
    pub answers: Vec<usize>,
}

/// Scoring response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub score: u32,
    pub total: u32,
}

/// An authored quiz, as sent to the create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Vec<NewQuestion>,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: usize,
}

/// Response of the create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateQuizResponse {
    pub status: String,
    #[serde(default)]
    pub quiz_id: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl CreateQuizResponse {
    pub fn is_created(&self) -> bool {
        self.status == "created"
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The five generation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Animation,
    Voiceover,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Text,
        ContentType::Image,
        ContentType::Video,
        ContentType::Animation,
        ContentType::Voiceover,
    ];

    /// Media type the service stamps on entries of this kind.
    pub fn media_kind(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Animation => "animation",
            ContentType::Voiceover => "audio",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Text => write!(f, "text"),
            ContentType::Image => write!(f, "image"),
            ContentType::Video => write!(f, "video"),
            ContentType::Animation => write!(f, "animation"),
            ContentType::Voiceover => write!(f, "voiceover"),
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            "animation" | "cartoon" => Ok(ContentType::Animation),
            "voiceover" | "voice" | "audio" => Ok(ContentType::Voiceover),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// A content generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user: String,
    pub prompt: String,
    pub provider: Provider,
    /// Provider-specific model. `None` or blank means the provider default.
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(user: impl Into<String>, prompt: impl Into<String>, provider: Provider) -> Self {
        Self {
            user: user.into(),
            prompt: prompt.into(),
            provider,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Whether the request may be submitted. Callers gate on this; the
    /// dispatcher does not re-check it.
    pub fn is_submittable(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    /// The explicitly chosen model, ignoring blank values.
    pub fn explicit_model(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// What a generation capability returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub entry: Option<HistoryEntry>,
    #[serde(default)]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A normalized history record: generated or uploaded content, or a scored
/// quiz attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Owner of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Display title, mostly set on uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media kind such as `image` or `video`; first choice for grouping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Record type such as `text_openai`; grouping fallback.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    /// Where the generated or uploaded media is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
    /// Prompt that produced the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Generated text, for text entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Provider that generated the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Quiz that was attempted, for quiz results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    /// Correct answers, for quiz results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Number of questions, for quiz results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    /// When the quiz attempt was scored.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<NaiveDateTime>,
}

impl HistoryEntry {
    /// Grouping key: media type, then type, then [`OTHER_KIND`].
    pub fn kind(&self) -> &str {
        non_blank(&self.media_type)
            .or_else(|| non_blank(&self.entry_type))
            .unwrap_or(OTHER_KIND)
    }

    /// Whether this entry records a scored quiz attempt.
    pub fn is_quiz_result(&self) -> bool {
        self.quiz_id.is_some() && self.score.is_some()
    }

    /// File name to save the media under, or `None` for entries without
    /// stored media.
    ///
    /// Prefers the last path segment of the storage URL; falls back to the
    /// title (or kind) with an extension guessed from the kind.
    pub fn download_file_name(&self) -> Option<String> {
        let url = non_blank(&self.storage_url)?;
        let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
        let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
        if let Some((_, last)) = after_scheme.rsplit_once('/') {
            if last.contains('.') && !last.starts_with('.') {
                return Some(sanitize_file_name(last));
            }
        }

        let stem = non_blank(&self.title)
            .map(sanitize_file_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.kind().to_string());
        Some(format!("{stem}.{}", extension_for_kind(self.kind())))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn extension_for_kind(kind: &str) -> &'static str {
    match kind {
        "image" => "png",
        "video" => "mp4",
        "animation" => "gif",
        "audio" => "mp3",
        "text" => "txt",
        _ => "bin",
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Serde adapter for the service's timestamps.
///
/// The service writes naive ISO-8601 (`2024-05-01T12:00:00.123456`); RFC 3339
/// values and space-separated dates are accepted too. A value that still
/// cannot be read is logged and dropped, so one odd record never fails the
/// whole history.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    const FALLBACK_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        std::iter::once(FORMAT)
            .chain(FALLBACK_FORMATS)
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
        let parsed = match &raw {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(serde_json::Value::String(s)) => parse(s),
            Some(_) => None,
        };
        if parsed.is_none() {
            if let Some(value) = raw {
                tracing::warn!(%value, "ignoring unreadable timestamp");
            }
        }
        Ok(parsed)
    }
}
