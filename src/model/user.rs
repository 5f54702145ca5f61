//! The logged-in user.

use serde::{Deserialize, Serialize};

/// The current user, as returned by `/api/v1/user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// User settings; only the language is read.
    #[serde(default)]
    pub settings: UserSettings,
}

/// The subset of user settings the client reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Preferred UI language (e.g. `"de-DE"`), used for locale-aware sorting.
    #[serde(default)]
    pub language: String,
}

impl User {
    /// Returns the user's language, if one is configured.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        Some(self.settings.language.as_str()).filter(|lang| !lang.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_unknown_settings() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "username": "ada",
            "name": "Ada",
            "settings": {"language": "en", "week_start": 1, "timezone": "UTC"}
        }))
        .unwrap();
        assert_eq!(user.language(), Some("en"));
    }

    #[test]
    fn empty_language_is_none() {
        let user: User = serde_json::from_value(json!({"id": 1, "username": "ada"})).unwrap();
        assert_eq!(user.language(), None);
    }
}
