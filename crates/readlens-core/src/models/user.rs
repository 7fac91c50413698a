use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity payload returned by `GET /api/v1/auth/me`.
///
/// Kept as raw JSON so whatever the server sends reaches collaborators
/// unmodified. The accessors read the fields the server currently sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Value);

impl UserProfile {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn username(&self) -> Option<&str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    pub fn role(&self) -> Option<&str> {
        self.str_field("role")
    }

    pub fn created_at(&self) -> Option<&str> {
        self.str_field("created_at")
    }

    /// Best name to show for this user
    pub fn display_name(&self) -> String {
        self.username()
            .or_else(|| self.email())
            .map(str::to_string)
            .or_else(|| self.id().map(|id| format!("user #{}", id)))
            .unwrap_or_else(|| "unknown user".to_string())
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}
