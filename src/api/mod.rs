use crate::config::EnvConfig;
use crate::models::{Bookmark, NewBookmark, Session, User};
use crate::storage::{TOKEN_KEY, USER_KEY};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Not signed in".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// PKCE verifier: 32 random bytes, base64url without padding.
pub(crate) fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 32];
    // getrandom maps to crypto.getRandomValues under wasm32.
    let _ = getrandom::getrandom(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 challenge derived from the verifier (RFC 7636).
pub(crate) fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn bookmarks_delete_path(id: &str, user_id: &str) -> String {
    // Matched on the (id, owner) pair so a stale or hostile id can never
    // touch another owner's row, whatever the backend policy does.
    format!(
        "/rest/v1/bookmarks?id=eq.{}&user_id=eq.{}",
        urlencoding::encode(id),
        urlencoding::encode(user_id)
    )
}

/// Client for the managed backend: auth endpoints under `/auth/v1`, the
/// row-level-secured bookmarks table under `/rest/v1`.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) access_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &EnvConfig) -> Self {
        Self {
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
            access_token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let config = EnvConfig::new();
        let access_token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self {
            base_url: config.backend_url,
            anon_key: config.anon_key,
            access_token,
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            if let Some(token) = &self.access_token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.access_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn sign_out_local(&mut self) {
        self.access_token = None;
        Self::clear_storage();
    }

    /// OAuth entry point. The provider sends the browser back to
    /// `redirect_to` with an authorization code.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.base_url,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge)
        )
    }

    fn with_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req = req.header("apikey", self.anon_key.clone());
        if let Some(token) = self.access_token() {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        body: Option<&impl serde::Serialize>,
        extra_headers: &[(&str, &str)],
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path_and_query);
        let mut req = self.with_headers(client.request(method, url));

        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        body: Option<&impl serde::Serialize>,
        extra_headers: &[(&str, &str)],
    ) -> ApiResult<T> {
        let res = self.send(method, path_and_query, body, extra_headers).await?;
        res.json().await.map_err(ApiError::parse)
    }

    /// Variant for endpoints that answer 204 or an uninteresting body.
    async fn request_unit(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<()> {
        self.send(method, path_and_query, body, &[]).await.map(|_| ())
    }

    /// One-shot code exchange. A failed exchange is terminal for the request;
    /// the caller redirects to the error page instead of retrying.
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> ApiResult<Session> {
        self.request_api(
            reqwest::Method::POST,
            "/auth/v1/token?grant_type=pkce",
            Some(&serde_json::json!({
                "auth_code": code,
                "code_verifier": code_verifier,
            })),
            &[],
        )
        .await
    }

    /// Resolve the caller's identity. Without a token this fails immediately;
    /// nothing downstream of it may run unauthenticated.
    pub async fn get_user(&self) -> ApiResult<User> {
        if self.access_token.is_none() {
            return Err(ApiError::unauthorized());
        }

        self.request_api(
            reqwest::Method::GET,
            "/auth/v1/user",
            None::<&serde_json::Value>,
            &[],
        )
        .await
    }

    pub async fn list_bookmarks(&self) -> ApiResult<Vec<Bookmark>> {
        let data: serde_json::Value = self
            .request_api(
                reqwest::Method::GET,
                "/rest/v1/bookmarks?select=id,title,url,user_id,created_at&order=created_at.desc",
                None::<&serde_json::Value>,
                &[],
            )
            .await?;
        Ok(Self::parse_bookmark_rows(data))
    }

    pub async fn insert_bookmark(&self, row: &NewBookmark) -> ApiResult<Bookmark> {
        let data: serde_json::Value = self
            .request_api(
                reqwest::Method::POST,
                "/rest/v1/bookmarks",
                Some(row),
                &[("Prefer", "return=representation")],
            )
            .await?;

        // The table endpoint returns the inserted rows as an array.
        data.as_array()
            .and_then(|rows| rows.first())
            .and_then(Self::parse_bookmark_row)
            .ok_or_else(|| ApiError::parse("insert response is missing the created row"))
    }

    pub async fn delete_bookmark(&self, id: &str, user_id: &str) -> ApiResult<()> {
        self.request_unit(
            reqwest::Method::DELETE,
            &bookmarks_delete_path(id, user_id),
            None::<&serde_json::Value>,
        )
        .await
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        self.request_unit(
            reqwest::Method::POST,
            "/auth/v1/logout",
            Some(&serde_json::json!({})),
        )
        .await
    }

    /// Lenient row parser shared by the list endpoint and the change feed.
    /// Ids have been observed as both strings and numbers.
    pub(crate) fn parse_bookmark_row(item: &serde_json::Value) -> Option<Bookmark> {
        let get_s = |k: &str| {
            item.get(k).and_then(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .or_else(|| v.as_i64().map(|n| n.to_string()))
            })
        };

        let id = get_s("id").unwrap_or_default();
        let url = get_s("url").unwrap_or_default();

        if id.trim().is_empty() || url.trim().is_empty() {
            return None;
        }

        Some(Bookmark {
            id,
            title: get_s("title").unwrap_or_default(),
            url,
            user_id: get_s("user_id").unwrap_or_default(),
            created_at: get_s("created_at").unwrap_or_default(),
        })
    }

    pub(crate) fn parse_bookmark_rows(data: serde_json::Value) -> Vec<Bookmark> {
        let list = data.as_array().cloned().unwrap_or_default();

        let mut out: Vec<Bookmark> = Vec::with_capacity(list.len());
        for item in list {
            if let Some(row) = Self::parse_bookmark_row(&item) {
                out.push(row);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ApiClient {
        ApiClient {
            base_url: "http://localhost:54321".to_string(),
            anon_key: "anon".to_string(),
            access_token: None,
        }
    }

    #[test]
    fn code_challenge_matches_rfc_7636_vector() {
        let challenge = code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn code_verifier_is_base64url_and_long_enough() {
        let v = generate_code_verifier();
        assert!(v.len() >= 43);
        assert!(v
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn authorize_url_encodes_query_parameters() {
        let client = test_client();
        let url = client.authorize_url("google", "http://localhost:8080/auth/callback", "ch+al");
        assert!(url.starts_with("http://localhost:54321/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"));
        assert!(url.contains("code_challenge=ch%2Bal"));
        assert!(url.contains("code_challenge_method=s256"));
    }

    #[test]
    fn delete_path_filters_on_id_and_owner() {
        let path = bookmarks_delete_path("b-1", "u 1");
        assert_eq!(path, "/rest/v1/bookmarks?id=eq.b-1&user_id=eq.u%201");
    }

    #[test]
    fn parse_rows_accepts_string_and_numeric_ids() {
        let data = serde_json::json!([
            {"id": "b-1", "title": "One", "url": "https://one.example", "user_id": "u-1", "created_at": "2026-01-01T00:00:00Z"},
            {"id": 42, "title": "Two", "url": "https://two.example", "user_id": "u-1", "created_at": ""}
        ]);
        let rows = ApiClient::parse_bookmark_rows(data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "b-1");
        assert_eq!(rows[1].id, "42");
    }

    #[test]
    fn parse_rows_skips_rows_without_id_or_url() {
        let data = serde_json::json!([
            {"title": "no id", "url": "https://x.example"},
            {"id": "b-2", "title": "no url"},
            {"id": "b-3", "title": "ok", "url": "https://ok.example", "user_id": "u-1"}
        ]);
        let rows = ApiClient::parse_bookmark_rows(data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "b-3");
    }

    #[test]
    fn parse_rows_tolerates_non_array_payload() {
        assert!(ApiClient::parse_bookmark_rows(serde_json::json!({"message": "oops"})).is_empty());
    }

    #[test]
    fn client_tracks_access_token() {
        let mut client = test_client();
        assert!(!client.is_authenticated());

        client.set_access_token("jwt".to_string());
        assert!(client.is_authenticated());
        assert_eq!(client.access_token().as_deref(), Some("jwt"));

        client.access_token = None;
        assert!(client.access_token().is_none());
    }

    #[test]
    fn unauthorized_error_kind() {
        let e = ApiError::unauthorized();
        assert_eq!(e.kind, ApiErrorKind::Unauthorized);
        assert_eq!(e.to_string(), "Not signed in");
    }
}
