pub(crate) mod bookmark_feed;

use crate::api::ApiClient;
use crate::models::{Bookmark, User};
use crate::storage::load_user_from_storage;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<User>>,

    /// Last server snapshot, newest first. The bookmark view layers change
    /// feed events on top of this.
    pub bookmarks: RwSignal<Vec<Bookmark>>,
    pub bookmarks_loading: RwSignal<bool>,
    pub bookmarks_error: RwSignal<Option<String>>,

    /// Revalidation signal: bumped after every mutation; the dashboard
    /// effect tracks it and re-fetches the snapshot.
    pub bookmarks_refresh: RwSignal<u64>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_user = load_user_from_storage();

        Self {
            api_client: RwSignal::new(stored_client),
            current_user: RwSignal::new(stored_user),
            bookmarks: RwSignal::new(vec![]),
            bookmarks_loading: RwSignal::new(false),
            bookmarks_error: RwSignal::new(None),
            bookmarks_refresh: RwSignal::new(0),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
