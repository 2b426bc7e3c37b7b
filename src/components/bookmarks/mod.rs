use crate::actions;
use crate::components::hooks::use_random_id_for;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, Input, Label, Spinner};
use crate::config::EnvConfig;
use crate::models::Bookmark;
use crate::realtime::{ChangeEvent, RealtimeChannel};
use crate::state::bookmark_feed::{apply_delete, apply_insert, filter_bookmarks, is_foreign_event};
use crate::state::AppContext;
use crate::util::{format_created_at, host_of_url};
use leptos::logging;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Client bookmark view: add form, search filter, card grid, live feed.
///
/// No optimistic mutation anywhere; after a write the view waits for the
/// change feed or the revalidated snapshot, which keeps every open tab on the
/// same code path.
#[component]
pub fn BookmarkManager() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let current_user = app_state.0.current_user;
    let bookmarks = app_state.0.bookmarks;
    let refresh = app_state.0.bookmarks_refresh;

    let title: RwSignal<String> = RwSignal::new(String::new());
    let url: RwSignal<String> = RwSignal::new(String::new());
    let search: RwSignal<String> = RwSignal::new(String::new());
    let is_adding: RwSignal<bool> = RwSignal::new(false);

    let revalidate = move || refresh.update(|n| *n = n.wrapping_add(1));

    // Live subscription, one per mounted view. Multiple tabs each hold their
    // own channel; the feed is how they converge.
    let channel: StoredValue<Option<RealtimeChannel>, LocalStorage> = StoredValue::new_local(None);

    Effect::new(move |_| {
        let Some(user) = current_user.get() else {
            return;
        };

        if channel.with_value(|c| c.is_some()) {
            return;
        }

        let owner_id = user.id.clone();
        let join_ref = use_random_id_for("bookmarks");

        let on_event = move |event: ChangeEvent| {
            if is_foreign_event(&event, &owner_id) {
                // The backend's row policy should have filtered this already.
                return;
            }

            match event {
                ChangeEvent::Insert(row) => bookmarks.update(|list| {
                    apply_insert(list, row);
                }),
                ChangeEvent::Delete { id, .. } => bookmarks.update(|list| {
                    apply_delete(list, &id);
                }),
            }
        };

        let status_ref = join_ref.clone();
        let on_state = move |state| {
            logging::log!("bookmarks channel {status_ref}: {state}");
        };

        let config = EnvConfig::new();
        let token = api_client.get_untracked().access_token();
        channel.set_value(RealtimeChannel::subscribe(
            &config, token, join_ref, on_event, on_state,
        ));
    });

    on_cleanup(move || {
        channel.with_value(|c| {
            if let Some(c) = c {
                c.close();
            }
        });
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let title_val = title.get_untracked();
        let url_val = url.get_untracked();
        if title_val.trim().is_empty() || url_val.trim().is_empty() {
            return;
        }

        let client = api_client.get_untracked();
        is_adding.set(true);

        spawn_local(async move {
            match actions::add_bookmark(&client, &title_val, &url_val).await {
                Ok(_) => {
                    title.set(String::new());
                    url.set(String::new());
                    revalidate();
                }
                Err(e) => {
                    // Surfaced nowhere else; the view stays as it was.
                    logging::error!("add bookmark failed: {e}");
                }
            }
            is_adding.set(false);
        });
    };

    let on_delete = Callback::new(move |id: String| {
        let client = api_client.get_untracked();

        spawn_local(async move {
            match actions::delete_bookmark(&client, &id).await {
                Ok(()) => revalidate(),
                Err(e) => logging::error!("delete bookmark failed: {e}"),
            }
        });
    });

    let filtered = move || filter_bookmarks(&bookmarks.get(), &search.get());

    view! {
        <div class="space-y-8">
            <Card class="border-t-4 border-t-primary">
                <form class="flex flex-col gap-4 px-6 md:flex-row md:items-end" on:submit=on_submit>
                    <div class="flex w-full flex-col gap-1.5 md:flex-1">
                        <Label html_for="title" class="text-xs">"Title"</Label>
                        <Input
                            id="title"
                            r#type="text"
                            placeholder="e.g. My Favorite Blog"
                            bind_value=title
                            required=true
                        />
                    </div>

                    <div class="flex w-full flex-col gap-1.5 md:flex-1">
                        <Label html_for="url" class="text-xs">"URL"</Label>
                        // type="url": validity is the input control's job, not the server's.
                        <Input
                            id="url"
                            r#type="url"
                            placeholder="https://example.com"
                            bind_value=url
                            required=true
                        />
                    </div>

                    <Button class="w-full md:w-auto" attr:disabled=move || is_adding.get()>
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || is_adding.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if is_adding.get() { "Adding..." } else { "Add" }}
                        </span>
                    </Button>
                </form>
            </Card>

            <div class="max-w-md">
                <Input
                    r#type="search"
                    placeholder="Search bookmarks..."
                    bind_value=search
                />
            </div>

            <Show
                when=move || !filtered().is_empty()
                fallback=move || view! {
                    <div class="rounded-xl border border-dashed py-12 text-center text-sm text-muted-foreground">
                        {move || if search.get().trim().is_empty() {
                            "No bookmarks yet. Add your first one above."
                        } else {
                            "No bookmarks match your search."
                        }}
                    </div>
                }
            >
                <div class="grid grid-cols-1 gap-6 md:grid-cols-2 lg:grid-cols-3">
                    {move || {
                        filtered()
                            .into_iter()
                            .map(|bookmark| view! { <BookmarkCard bookmark on_delete /> })
                            .collect_view()
                    }}
                </div>
            </Show>
        </div>
    }
}

#[component]
fn BookmarkCard(bookmark: Bookmark, on_delete: Callback<String>) -> impl IntoView {
    let host = host_of_url(&bookmark.url);
    let created = format_created_at(&bookmark.created_at);
    let id = bookmark.id.clone();

    view! {
        <Card class="gap-3 py-5">
            <div class="flex items-start justify-between gap-2 px-5">
                <h3 class="line-clamp-1 text-base font-semibold">{bookmark.title.clone()}</h3>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    class="text-muted-foreground hover:text-destructive"
                    attr:aria-label="Delete bookmark"
                    on:click=move |_| on_delete.run(id.clone())
                >
                    <svg viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" class="size-4">
                        <path d="M3 6h18M8 6V4a1 1 0 0 1 1-1h6a1 1 0 0 1 1 1v2m3 0v14a2 2 0 0 1-2 2H7a2 2 0 0 1-2-2V6" />
                    </svg>
                </Button>
            </div>

            <a
                href=bookmark.url.clone()
                target="_blank"
                rel="noopener noreferrer"
                class="truncate px-5 text-sm text-muted-foreground hover:underline"
            >
                {host}
            </a>

            <div class="mt-2 flex items-center justify-between border-t px-5 pt-3">
                <span class="text-xs text-muted-foreground">{created}</span>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    href=bookmark.url.clone()
                    attr:target="_blank"
                    attr:rel="noopener noreferrer"
                >
                    "Visit"
                </Button>
            </div>
        </Card>
    }
}

#[component]
pub fn SignOutButton() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let current_user = app_state.0.current_user;
    let bookmarks = app_state.0.bookmarks;

    let loading: RwSignal<bool> = RwSignal::new(false);

    let on_click = move |_| {
        let mut client = api_client.get_untracked();
        loading.set(true);

        spawn_local(async move {
            // Best effort: the local session is cleared either way.
            if let Err(e) = client.sign_out().await {
                logging::warn!("backend sign-out failed: {e}");
            }

            client.sign_out_local();
            api_client.set(client);
            current_user.set(None);
            bookmarks.set(vec![]);
            let _ = window().location().set_href("/");
        });
    };

    view! {
        <Button
            variant=ButtonVariant::Secondary
            size=ButtonSize::Sm
            attr:disabled=move || loading.get()
            on:click=on_click
        >
            <span class="inline-flex items-center gap-2">
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner />
                </Show>
                "Sign out"
            </span>
        </Button>
    }
}
