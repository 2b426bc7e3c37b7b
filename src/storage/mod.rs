use crate::models::User;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "linkshelf_access_token";
pub(crate) const USER_KEY: &str = "linkshelf_user";

/// PKCE verifier parked between the authorize redirect and the callback.
pub(crate) const PKCE_VERIFIER_KEY: &str = "linkshelf_pkce_verifier";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn save_user_to_storage(user: &User) {
    save_json_to_storage(USER_KEY, user);
}

pub(crate) fn load_user_from_storage() -> Option<User> {
    load_json_from_storage(USER_KEY)
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn save_pkce_verifier(verifier: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(PKCE_VERIFIER_KEY, verifier);
    }
}

/// Read and clear the parked verifier. One exchange attempt per login flow;
/// a stale verifier must never survive into the next one.
pub(crate) fn take_pkce_verifier() -> Option<String> {
    let storage = local_storage()?;
    let verifier = storage.get_item(PKCE_VERIFIER_KEY).ok().flatten();
    let _ = storage.remove_item(PKCE_VERIFIER_KEY);
    verifier
}
