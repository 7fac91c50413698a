use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

/// One outbound call, as handed to the request pipeline.
///
/// `retried` is private and only ever goes from `false` to `true`, through
/// [`RequestDescriptor::into_retry`]. The pipeline refreshes credentials only
/// for descriptors that have not been retried, which bounds every call to a
/// single refresh and a single retry.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// The same request, marked as the one permitted retry.
    pub fn into_retry(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }

    /// Surface a 401 to the caller instead of refreshing credentials.
    pub fn without_refresh(self) -> Self {
        self.into_retry()
    }
}
