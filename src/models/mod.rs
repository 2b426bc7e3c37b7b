use serde::{Deserialize, Serialize};

/// Backend identity object.
///
/// The auth service owns this shape; besides `id` and `email` we keep the
/// rest opaque so backend field changes never break deserialization.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct User {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Session returned by the auth code exchange.
///
/// Read-only from the app's point of view; we cache the access token and the
/// user locally for session continuity but never mint or mutate either.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Session {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    pub user: User,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,

    /// Owning identity. The backend's row policy is the enforcement boundary;
    /// this field only feeds the redundant client-side check on feed events.
    pub user_id: String,

    pub created_at: String,
}

/// Insert payload for the bookmarks table. `id` and `created_at` are
/// backend-assigned.
#[derive(Serialize, Clone, Debug)]
pub(crate) struct NewBookmark {
    pub title: String,
    pub url: String,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_contract_deserialize() {
        // Contract: auth token endpoint response.
        let json = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r1",
            "user": {"id": "u-1", "email": "u@example.com", "aud": "authenticated"}
        }"#;
        let parsed: Session = serde_json::from_str(json).expect("session should parse");
        assert_eq!(parsed.access_token, "jwt-token");
        assert_eq!(parsed.user.id, "u-1");
        assert_eq!(parsed.user.email.as_deref(), Some("u@example.com"));
        assert_eq!(parsed.user.extra["aud"], "authenticated");
    }

    #[test]
    fn session_tolerates_missing_optional_fields() {
        let json = r#"{"access_token": "t", "user": {"id": "u-1"}}"#;
        let parsed: Session = serde_json::from_str(json).expect("minimal session should parse");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.user.email.is_none());
    }

    #[test]
    fn new_bookmark_serializes_owner_id() {
        let row = NewBookmark {
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            user_id: "u-1".to_string(),
        };
        let v = serde_json::to_value(row).expect("should serialize");
        assert_eq!(v["title"], "Example");
        assert_eq!(v["url"], "https://example.com");
        assert_eq!(v["user_id"], "u-1");
    }
}
