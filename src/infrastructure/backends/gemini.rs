#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendHandle;
use crate::domain::models::BackendName;
use crate::domain::models::Primer;
use crate::domain::models::Speaker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<ContentParts>,
}

impl Content {
    fn new(role: &str, text: &str) -> Content {
        return Content {
            role: role.to_string(),
            parts: vec![ContentParts::Text(text.to_string())],
        };
    }

    fn text(&self) -> String {
        return self
            .parts
            .iter()
            .map(|part| {
                let ContentParts::Text(text) = part;
                return text.as_str();
            })
            .collect::<Vec<&str>>()
            .join("");
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    contents: Vec<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetails {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

/// Google's Gemini generateContent API. The handle's context is the JSON
/// encoded history of contents sent so far, primer included.
pub struct Gemini {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            model: Config::get(ConfigKey::Model),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

impl Gemini {
    fn endpoint(&self, suffix: &str) -> String {
        return format!(
            "{url}/v1beta/{model}{suffix}?key={key}",
            url = self.url,
            model = self.model,
            key = self.token
        );
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let res = reqwest::Client::new()
            .get(self.endpoint(""))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Gemini is not reachable");
                bail!("Gemini is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed with status {status}");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open(&self, primer: &Primer) -> Result<BackendHandle> {
        self.health_check().await?;

        let contents = primer
            .turns()
            .iter()
            .map(|(speaker, text)| {
                if *speaker == Speaker::User {
                    return Content::new("user", text);
                }
                return Content::new("model", text);
            })
            .collect::<Vec<Content>>();

        return Ok(BackendHandle::new(serde_json::to_string(&contents)?));
    }

    #[allow(clippy::implicit_return)]
    async fn exchange(&self, handle: &mut BackendHandle, text: &str) -> Result<String> {
        let mut contents: Vec<Content> = vec![];
        if !handle.context.is_empty() {
            contents = serde_json::from_str(&handle.context)?;
        }
        contents.push(Content::new("user", text));

        let req = CompletionRequest {
            contents: contents.clone(),
        };

        let res = reqwest::Client::new()
            .post(self.endpoint(":generateContent"))
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => err.error.message,
                Err(_) => body,
            };
            tracing::error!(
                status = status.as_u16(),
                detail = %detail,
                "Failed to make completion request to Gemini"
            );
            bail!(
                "Failed to make completion request to Gemini, {}: {detail}",
                status.as_u16()
            );
        }

        let res = res.json::<CompletionResponse>().await?;
        let candidate = match res.candidates.first() {
            Some(candidate) => candidate,
            None => bail!("Gemini returned no candidates"),
        };
        let reply = match &candidate.content {
            Some(content) => content.text(),
            None => {
                bail!(
                    "Gemini returned no content, finish reason {}",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                );
            }
        };

        // Gemini rejects histories with empty turns.
        if reply.trim().is_empty() {
            return Ok(reply);
        }

        contents.push(Content::new("model", &reply));
        handle.context = serde_json::to_string(&contents)?;

        return Ok(reply);
    }
}
