//! Request builders for the article and content endpoints.
//!
//! These only shape requests; sending goes through the authenticated
//! pipeline like any other call.

use serde_json::json;

use super::{endpoints, RequestDescriptor};

/// Extract a Wikipedia article and save it to the user's history
pub fn extract_wiki(url: &str) -> RequestDescriptor {
    RequestDescriptor::post(endpoints::EXTRACT_WIKI).with_body(json!({ "url": url }))
}

/// All articles of the current user
pub fn list_articles() -> RequestDescriptor {
    RequestDescriptor::get(endpoints::ARTICLES)
}

pub fn get_article(article_id: i64) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}{}", endpoints::ARTICLES, article_id))
}

pub fn summarize(text: &str) -> RequestDescriptor {
    RequestDescriptor::post(endpoints::SUMMARIZE).with_body(json!({ "text": text }))
}

/// `target_language` is a language name as shown to users, e.g. "Spanish"
pub fn translate(text: &str, target_language: &str) -> RequestDescriptor {
    RequestDescriptor::post(endpoints::TRANSLATE).with_body(json!({
        "text": text,
        "target_language": target_language,
    }))
}
