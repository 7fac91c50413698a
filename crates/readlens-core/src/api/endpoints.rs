//! Paths of the remote endpoints, relative to the configured base URL.

pub const REGISTER: &str = "/api/v1/auth/register";
pub const LOGIN: &str = "/api/v1/auth/login";
pub const REFRESH: &str = "/api/v1/auth/refresh";
pub const ME: &str = "/api/v1/auth/me";
pub const LOGOUT: &str = "/api/v1/auth/logout";

pub const ARTICLES: &str = "/api/v1/articles/";
pub const EXTRACT_WIKI: &str = "/api/v1/articles/extract-wiki";
pub const SUMMARIZE: &str = "/api/v1/content/summarize";
pub const TRANSLATE: &str = "/api/v1/content/translate";

/// Join a base URL and an endpoint path without doubling or dropping the slash
pub fn join(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
