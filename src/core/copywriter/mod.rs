use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::CopyConfig;

/// Used when the generator fails, times out or drops the placeholder.
pub const FALLBACK_COPY: &str =
    "Olá [NOME], vi que você tem interesse em saber mais sobre o nosso projeto. Podemos conversar?";
/// Used when the generator answers with nothing.
pub const EMPTY_RESPONSE_COPY: &str =
    "Olá [NOME], tudo bem? Notei seu interesse e gostaria de falar mais sobre nossa novidade!";

/// Drafts a first-contact message for a campaign.
#[async_trait]
pub trait CopySuggester: Send + Sync {
    async fn suggest(&self, campaign_name: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionSource {
    Generated,
    EmptyFallback,
    ErrorFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub copy: String,
    pub source: SuggestionSource,
}

/// Ask `suggester` for a draft, never waiting longer than `timeout`.
pub async fn suggest_copy(
    suggester: &dyn CopySuggester,
    campaign_name: &str,
    placeholder: &str,
    timeout: Duration,
) -> Suggestion {
    let outcome = tokio::time::timeout(timeout, suggester.suggest(campaign_name)).await;
    let fallback = |template: &str, source| Suggestion {
        copy: template.replace(crate::core::leads::dispatch::DEFAULT_PLACEHOLDER, placeholder),
        source,
    };

    match outcome {
        Ok(Ok(text)) if text.trim().is_empty() => {
            warn!("Copy generator returned an empty draft for '{}'", campaign_name);
            fallback(EMPTY_RESPONSE_COPY, SuggestionSource::EmptyFallback)
        }
        Ok(Ok(text)) if !text.to_lowercase().contains(&placeholder.to_lowercase()) => {
            warn!(
                "Copy generator dropped the {} placeholder for '{}'",
                placeholder, campaign_name
            );
            fallback(FALLBACK_COPY, SuggestionSource::ErrorFallback)
        }
        Ok(Ok(text)) => Suggestion {
            copy: text.trim().to_string(),
            source: SuggestionSource::Generated,
        },
        Ok(Err(e)) => {
            warn!("Copy generator failed for '{}': {}", campaign_name, e);
            fallback(FALLBACK_COPY, SuggestionSource::ErrorFallback)
        }
        Err(_) => {
            warn!(
                "Copy generator timed out after {}s for '{}'",
                timeout.as_secs(),
                campaign_name
            );
            fallback(FALLBACK_COPY, SuggestionSource::ErrorFallback)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` client.
pub struct GeminiCopywriter {
    api_key: String,
    model: String,
    temperature: f32,
    top_p: f32,
    placeholder: String,
    client: Client,
}

impl GeminiCopywriter {
    pub fn new(api_key: String, config: &CopyConfig, placeholder: &str) -> Self {
        Self {
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            placeholder: placeholder.to_string(),
            client: Client::new(),
        }
    }

    fn prompt(&self, campaign_name: &str) -> String {
        format!(
            "Write a short, friendly WhatsApp first-contact message in Brazilian Portuguese for \
             a lead interested in \"{}\". Address the lead with the literal token {} where their \
             name goes. Reply with the message only, no quotes or explanations.",
            campaign_name, self.placeholder
        )
    }
}

#[async_trait]
impl CopySuggester for GeminiCopywriter {
    async fn suggest(&self, campaign_name: &str) -> Result<String> {
        let req = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: self.prompt(campaign_name),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
            },
        };
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        info!("Requesting copy draft for '{}' from {}", campaign_name, self.model);
        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "Gemini API error {}: {}",
                res.status(),
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: GenerateResponse = res.json().await?;
        Ok(parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// Stand-in used when no API key is configured.
pub struct OfflineCopywriter;

#[async_trait]
impl CopySuggester for OfflineCopywriter {
    async fn suggest(&self, _campaign_name: &str) -> Result<String> {
        Err(anyhow!(
            "no Gemini API key configured (run 'leadrelay config set-key gemini_api_key' or set GEMINI_API_KEY)"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl CopySuggester for Fixed {
        async fn suggest(&self, _campaign_name: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl CopySuggester for Slow {
        async fn suggest(&self, _campaign_name: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("Olá [NOME]".to_string())
        }
    }

    const PLACEHOLDER: &str = "[NOME]";

    #[tokio::test]
    async fn generated_copy_is_trimmed_and_kept() {
        let s = suggest_copy(
            &Fixed("  Oi [NOME], tudo bem?\n"),
            "Launch",
            PLACEHOLDER,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(s.copy, "Oi [NOME], tudo bem?");
        assert_eq!(s.source, SuggestionSource::Generated);
    }

    #[tokio::test]
    async fn empty_response_uses_the_empty_template() {
        let s = suggest_copy(&Fixed("   "), "Launch", PLACEHOLDER, Duration::from_secs(1)).await;
        assert_eq!(s.copy, EMPTY_RESPONSE_COPY);
        assert_eq!(s.source, SuggestionSource::EmptyFallback);
    }

    #[tokio::test]
    async fn failure_uses_the_fixed_template() {
        let s = suggest_copy(&OfflineCopywriter, "Launch", PLACEHOLDER, Duration::from_secs(1)).await;
        assert_eq!(s.copy, FALLBACK_COPY);
        assert_eq!(s.source, SuggestionSource::ErrorFallback);
    }

    #[tokio::test]
    async fn draft_without_placeholder_is_replaced() {
        let s = suggest_copy(
            &Fixed("Hello there!"),
            "Launch",
            PLACEHOLDER,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(s.source, SuggestionSource::ErrorFallback);
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let s = suggest_copy(&Slow, "Launch", PLACEHOLDER, Duration::from_millis(50)).await;
        assert_eq!(s.copy, FALLBACK_COPY);
    }

    #[tokio::test]
    async fn fallback_uses_configured_placeholder() {
        let s = suggest_copy(&OfflineCopywriter, "Launch", "{name}", Duration::from_secs(1)).await;
        assert!(s.copy.starts_with("Olá {name},"));
    }

    #[test]
    fn request_uses_camel_case_generation_config() {
        let req = GenerateRequest {
            contents: vec![],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_p: 0.25,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["generationConfig"]["topP"], 0.25);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }
}
