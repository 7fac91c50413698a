//! Article extraction, summary and translation payloads.
//!
//! Article bodies are whatever the extraction service produced, so they stay
//! as `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest raw-content excerpt sent for translation.
/// Summaries are preferred; raw content is only a fallback.
const TRANSLATION_EXCERPT_CHARS: usize = 2000;

/// Response of `POST /api/v1/articles/extract-wiki`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub article_id: i64,
    #[serde(default)]
    pub data: Value,
}

impl ExtractResponse {
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }

    /// Text to translate, preferring the AI summary over raw content
    pub fn translatable_text(&self) -> Option<String> {
        translatable_text(&self.data)
    }
}

/// Response of `GET /api/v1/articles/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleList {
    #[serde(default)]
    pub articles: Vec<Value>,
}

/// Response of `GET /api/v1/articles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEnvelope {
    pub article: Value,
}

impl ArticleEnvelope {
    pub fn translatable_text(&self) -> Option<String> {
        translatable_text(&self.article)
    }
}

/// Response of `POST /api/v1/content/translate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// Pick the text a translation should start from: medium summary, then
/// summary, then an excerpt of the content or full text.
pub fn translatable_text(data: &Value) -> Option<String> {
    let field = |name: &str| {
        data.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    if let Some(summary) = field("ai_summary_medium").or_else(|| field("summary")) {
        return Some(summary.to_string());
    }

    field("content")
        .or_else(|| field("full_text"))
        .map(|text| text.chars().take(TRANSLATION_EXCERPT_CHARS).collect())
}
