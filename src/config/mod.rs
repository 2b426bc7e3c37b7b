use serde::{Deserialize, Serialize};

/// Runtime configuration injected by the host page as `window.ENV`.
///
/// The app ships as a static WASM bundle, so configuration rides on the
/// page rather than on compile-time env vars.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    /// Base URL of the managed backend (auth + REST + realtime).
    pub backend_url: String,

    /// Public API key sent with every request; row access is still decided
    /// per-identity by the backend's row policies.
    pub anon_key: String,

    /// Externally visible host when the app sits behind a reverse proxy.
    /// Used only for post-login redirect construction.
    pub public_host: Option<String>,

    /// Local/development deployments redirect back to the current origin.
    pub is_local: bool,
}

fn env_string(env: &wasm_bindgen::JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(env, &key.into())
        .ok()
        .and_then(|v| v.as_string())
        .filter(|s| !s.trim().is_empty())
}

fn env_flag(env: &wasm_bindgen::JsValue, key: &str) -> Option<bool> {
    let v = js_sys::Reflect::get(env, &key.into()).ok()?;
    if let Some(b) = v.as_bool() {
        return Some(b);
    }
    v.as_string().map(|s| s == "1" || s == "true")
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut cfg = Self {
            backend_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            public_host: None,
            is_local: true,
        };

        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Some(url) = env_string(&env, "BACKEND_URL") {
                        cfg.backend_url = url;
                    }
                    if let Some(key) = env_string(&env, "ANON_KEY") {
                        cfg.anon_key = key;
                    }
                    cfg.public_host = env_string(&env, "PUBLIC_HOST");
                    if let Some(local) = env_flag(&env, "LOCAL") {
                        cfg.is_local = local;
                    }
                }
            }
        }

        cfg
    }

    /// Realtime endpoint derived from the REST base URL.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.backend_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.backend_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.backend_url.clone()
        };

        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base,
            urlencoding::encode(&self.anon_key)
        )
    }

    /// Where to send the browser after a successful code exchange.
    pub fn resolve_redirect_target(&self, origin: &str, next: &str) -> String {
        resolve_redirect_target(
            self.is_local,
            self.public_host.as_deref(),
            origin,
            next,
        )
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Local deployments go back to the current origin. Behind a reverse proxy the
/// origin seen by the app is the internal one, so production prefers the
/// configured external host when present.
pub(crate) fn resolve_redirect_target(
    is_local: bool,
    public_host: Option<&str>,
    origin: &str,
    next: &str,
) -> String {
    if is_local {
        return format!("{origin}{next}");
    }

    match public_host {
        Some(host) if !host.trim().is_empty() => format!("https://{host}{next}"),
        _ => format!("{origin}{next}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_redirect_uses_origin() {
        let target =
            resolve_redirect_target(true, Some("app.example.com"), "http://localhost:8080", "/dashboard");
        assert_eq!(target, "http://localhost:8080/dashboard");
    }

    #[test]
    fn production_redirect_prefers_public_host() {
        let target =
            resolve_redirect_target(false, Some("app.example.com"), "http://10.0.0.5:3000", "/dashboard");
        assert_eq!(target, "https://app.example.com/dashboard");
    }

    #[test]
    fn production_redirect_falls_back_to_origin() {
        let target = resolve_redirect_target(false, None, "https://linkshelf.dev", "/dashboard");
        assert_eq!(target, "https://linkshelf.dev/dashboard");

        let blank = resolve_redirect_target(false, Some("  "), "https://linkshelf.dev", "/");
        assert_eq!(blank, "https://linkshelf.dev/");
    }
}
