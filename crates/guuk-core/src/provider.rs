//! Generation providers and the catalog of models they expose.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ContentType;

/// An AI provider the generation service can route to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Gemini,
    Claude,
    Manus,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::Gemini,
        Provider::Claude,
        Provider::Manus,
    ];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
            Provider::Claude => write!(f, "claude"),
            Provider::Manus => write!(f, "manus"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            "claude" | "anthropic" => Ok(Provider::Claude),
            "manus" => Ok(Provider::Manus),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Information about a model a provider offers for one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier sent to the service.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    pub provider: Provider,
    pub content_type: ContentType,
    /// Used when a request leaves the model blank.
    pub is_default: bool,
}

/// Known models, keyed by provider and content type.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }

    /// The models the generation service is known to route to.
    pub fn builtin() -> Self {
        use ContentType::{Animation, Image, Text, Video, Voiceover};
        use Provider::{Claude, Gemini, Manus, OpenAi};

        let m = |provider, content_type, id: &str, name: &str, is_default| ModelInfo {
            id: id.into(),
            name: name.into(),
            provider,
            content_type,
            is_default,
        };

        Self::new(vec![
            m(OpenAi, Text, "gpt-3.5-turbo", "GPT-3.5 Turbo", true),
            m(OpenAi, Text, "gpt-4o-mini", "GPT-4o Mini", false),
            m(OpenAi, Image, "dall-e-3", "DALL-E 3", true),
            m(OpenAi, Image, "dall-e-2", "DALL-E 2", false),
            m(OpenAi, Voiceover, "tts-1", "TTS 1", true),
            m(Gemini, Text, "gemini-1.5-flash", "Gemini 1.5 Flash", true),
            m(Gemini, Image, "imagen-3", "Imagen 3", true),
            m(Gemini, Video, "veo-2", "Veo 2", true),
            m(Claude, Text, "claude-3-haiku", "Claude 3 Haiku", true),
            m(Manus, Text, "manus-1", "Manus 1", true),
            m(Manus, Animation, "manus-cartoon", "Manus Cartoon", true),
        ])
    }

    pub fn all(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn for_provider(&self, provider: Provider) -> impl Iterator<Item = &ModelInfo> {
        self.models.iter().filter(move |m| m.provider == provider)
    }

    /// Default model for a provider and content type, if one is known.
    pub fn default_model(&self, provider: Provider, content_type: ContentType) -> Option<&str> {
        self.models
            .iter()
            .find(|m| m.provider == provider && m.content_type == content_type && m.is_default)
            .map(|m| m.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_display_and_parse() {
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("anthropic".parse::<Provider>().unwrap(), Provider::Claude);
        assert!("midjourney".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Provider::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::from_str::<Provider>("\"gemini\"").unwrap(),
            Provider::Gemini
        );
    }

    #[test]
    fn builtin_defaults() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(
            catalog.default_model(Provider::OpenAi, ContentType::Image),
            Some("dall-e-3")
        );
        assert_eq!(
            catalog.default_model(Provider::OpenAi, ContentType::Text),
            Some("gpt-3.5-turbo")
        );
        assert_eq!(
            catalog.default_model(Provider::Claude, ContentType::Video),
            None
        );
    }

    #[test]
    fn one_default_per_provider_and_type() {
        let catalog = ModelCatalog::builtin();
        for provider in Provider::ALL {
            for content_type in ContentType::ALL {
                let defaults = catalog
                    .for_provider(provider)
                    .filter(|m| m.content_type == content_type && m.is_default)
                    .count();
                assert!(defaults <= 1, "{provider}/{content_type} has {defaults} defaults");
            }
        }
    }
}
