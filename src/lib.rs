mod actions;
mod api;
mod app;
mod components;
mod config;
mod models;
mod pages;
mod realtime;
mod state;
mod storage;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(app::App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::ApiClient;
    use crate::models::User;
    use crate::storage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn api_client_storage_roundtrip_token() {
        ApiClient::clear_storage();

        let mut c = ApiClient::load_from_storage();
        assert!(!c.is_authenticated());

        c.set_access_token("t1".to_string());
        c.save_to_storage();

        let c2 = ApiClient::load_from_storage();
        assert_eq!(c2.access_token().as_deref(), Some("t1"));

        ApiClient::clear_storage();
        let c3 = ApiClient::load_from_storage();
        assert!(c3.access_token().is_none());
    }

    #[wasm_bindgen_test]
    fn user_storage_roundtrip() {
        let user = User {
            id: "u-1".to_string(),
            email: Some("u@example.com".to_string()),
            extra: serde_json::json!({}),
        };
        storage::save_user_to_storage(&user);
        let loaded = storage::load_user_from_storage().expect("should load user from localStorage");
        assert_eq!(loaded.id, "u-1");
        assert_eq!(loaded.email.as_deref(), Some("u@example.com"));
    }

    #[wasm_bindgen_test]
    fn pkce_verifier_is_taken_once() {
        storage::save_pkce_verifier("v-1");
        assert_eq!(storage::take_pkce_verifier().as_deref(), Some("v-1"));
        assert!(storage::take_pkce_verifier().is_none());
    }
}
