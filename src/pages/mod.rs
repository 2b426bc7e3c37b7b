use crate::api::{code_challenge_s256, generate_code_verifier, ApiErrorKind};
use crate::components::bookmarks::{BookmarkManager, SignOutButton};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Spinner,
};
use crate::config::EnvConfig;
use crate::state::AppContext;
use crate::storage::{save_pkce_verifier, save_user_to_storage, take_pkce_verifier};
use leptos::logging;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;

const OAUTH_PROVIDER: &str = "google";
const DEFAULT_NEXT: &str = "/dashboard";
const AUTH_ERROR_PAGE: &str = "/login?error=auth_code_error";

fn current_origin() -> String {
    window().location().origin().unwrap_or_default()
}

#[component]
pub fn LandingPage() -> impl IntoView {
    view! {
        <div class="flex min-h-screen flex-col bg-background">
            <header class="flex h-16 items-center justify-between border-b px-6">
                <a href="/" class="flex items-center gap-2 text-sm font-semibold text-foreground">
                    <BookmarkGlyph />
                    "Linkshelf"
                </a>
                <nav class="flex items-center gap-2">
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm href="/login">"Sign in"</Button>
                    <Button size=ButtonSize::Sm href="/login">"Get started"</Button>
                </nav>
            </header>

            <main class="flex flex-1 flex-col items-center justify-center px-4 text-center">
                <h1 class="max-w-2xl text-4xl font-bold tracking-tight sm:text-5xl">
                    "Your bookmarks, on every device."
                </h1>
                <p class="mt-4 max-w-xl text-muted-foreground">
                    "Save a link once and watch it appear in every open tab, instantly. Private by default, one account away."
                </p>
                <div class="mt-8 flex gap-3">
                    <Button size=ButtonSize::Lg href="/login">"Start for free"</Button>
                </div>

                <div class="mt-16 grid w-full max-w-4xl grid-cols-1 gap-6 text-left md:grid-cols-3">
                    <Card class="gap-2 px-6">
                        <h3 class="font-semibold">"Instant sync"</h3>
                        <p class="text-sm text-muted-foreground">"Changes push live to every tab and device."</p>
                    </Card>
                    <Card class="gap-2 px-6">
                        <h3 class="font-semibold">"Private"</h3>
                        <p class="text-sm text-muted-foreground">"Rows are scoped to your account by the backend itself."</p>
                    </Card>
                    <Card class="gap-2 px-6">
                        <h3 class="font-semibold">"Fast search"</h3>
                        <p class="text-sm text-muted-foreground">"Filter your collection as you type."</p>
                    </Card>
                </div>
            </main>

            <footer class="border-t px-6 py-6 text-center text-xs text-muted-foreground">
                "Linkshelf — bookmarks that keep up with you."
            </footer>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let loading: RwSignal<bool> = RwSignal::new(false);
    let query = use_query_map();
    let auth_error = move || query.get().get("error").unwrap_or_default() == "auth_code_error";

    let on_login = move |_| {
        loading.set(true);

        // Park the PKCE verifier; the callback page picks it up after the
        // provider round-trip.
        let verifier = generate_code_verifier();
        save_pkce_verifier(&verifier);
        let challenge = code_challenge_s256(&verifier);

        let redirect_to = format!("{}/auth/callback", current_origin());
        let url = api_client
            .get_untracked()
            .authorize_url(OAUTH_PROVIDER, &redirect_to, &challenge);
        let _ = window().location().set_href(&url);
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-md flex-col justify-center px-4 py-12">
                <div class="mb-6">
                    <a href="/" class="flex items-center gap-2 text-sm font-medium text-foreground">
                        <BookmarkGlyph />
                        "Linkshelf"
                    </a>
                    <div class="text-xs text-muted-foreground">"Bookmarks, synchronized."</div>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-xl">"Welcome back"</CardTitle>
                        <CardDescription>
                            "Sign in to access your synchronized bookmarks."
                        </CardDescription>
                    </CardHeader>

                    <CardContent class="flex flex-col gap-4">
                        <Show when=auth_error fallback=|| ().into_view()>
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive">
                                    "Sign-in could not be completed. Please try again."
                                </AlertDescription>
                            </Alert>
                        </Show>

                        <Button
                            class="w-full"
                            attr:disabled=move || loading.get()
                            on:click=on_login
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || loading.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if loading.get() { "Redirecting..." } else { "Continue with Google" }}
                            </span>
                        </Button>

                        <p class="text-xs text-muted-foreground">
                            "By continuing you agree to our Terms of Service and Privacy Policy."
                        </p>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// OAuth redirect handler. The provider sends the browser here with an
/// authorization code; one exchange attempt, then a hard redirect either to
/// the destination or to the login error page. No retry.
#[component]
pub fn AuthCallbackPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let current_user = app_state.0.current_user;

    let query = use_query_map();
    let started: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        if started.get_untracked() {
            return;
        }
        started.set(true);

        let code = query.get_untracked().get("code").unwrap_or_default();
        let next = match query.get_untracked().get("next") {
            Some(n) if !n.trim().is_empty() => n,
            _ => DEFAULT_NEXT.to_string(),
        };

        spawn_local(async move {
            if code.trim().is_empty() {
                let _ = window().location().set_href(AUTH_ERROR_PAGE);
                return;
            }

            let Some(verifier) = take_pkce_verifier() else {
                let _ = window().location().set_href(AUTH_ERROR_PAGE);
                return;
            };

            let mut client = api_client.get_untracked();
            match client.exchange_code_for_session(&code, &verifier).await {
                Ok(session) => {
                    client.set_access_token(session.access_token.clone());
                    client.save_to_storage();
                    save_user_to_storage(&session.user);
                    api_client.set(client);
                    current_user.set(Some(session.user));

                    let target =
                        EnvConfig::new().resolve_redirect_target(&current_origin(), &next);
                    let _ = window().location().set_href(&target);
                }
                Err(e) => {
                    logging::error!("auth code exchange failed: {e}");
                    let _ = window().location().set_href(AUTH_ERROR_PAGE);
                }
            }
        });
    });

    view! {
        <div class="flex min-h-screen items-center justify-center bg-background">
            <div class="flex items-center gap-3 text-sm text-muted-foreground">
                <Spinner />
                "Completing sign-in..."
            </div>
        </div>
    }
}

/// Session gate for protected routes. Without a session the browser is sent
/// to the login page; nothing of the protected content renders.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let is_authenticated = move || api_client.get().is_authenticated();

    Effect::new(move |_| {
        if !is_authenticated() {
            let _ = window().location().set_href("/login");
        }
    });

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=|| ().into_view()>
            {move || children.with_value(|c| c())}
        </Show>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let current_user = app_state.0.current_user;
    let bookmarks = app_state.0.bookmarks;
    let loading = app_state.0.bookmarks_loading;
    let error = app_state.0.bookmarks_error;
    let refresh = app_state.0.bookmarks_refresh;

    let load_snapshot = move || {
        let mut client = api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            // Identity first; the list query is meaningless without it.
            match client.get_user().await {
                Ok(user) => {
                    save_user_to_storage(&user);
                    current_user.set(Some(user));

                    match client.list_bookmarks().await {
                        Ok(rows) => bookmarks.set(rows),
                        Err(e) => {
                            logging::error!("bookmark list failed: {e}");
                            error.set(Some("Could not load your bookmarks.".to_string()));
                        }
                    }
                }
                Err(e) if e.kind == ApiErrorKind::Unauthorized => {
                    client.sign_out_local();
                    api_client.set(client);
                    current_user.set(None);
                    let _ = window().location().set_href("/login");
                }
                Err(e) => {
                    logging::error!("identity lookup failed: {e}");
                    error.set(Some("Could not load your bookmarks.".to_string()));
                }
            }
            loading.set(false);
        });
    };

    // Initial load plus every revalidation bump after a mutation.
    Effect::new(move |_| {
        let _ = refresh.get();
        load_snapshot();
    });

    let signed_in_as = move || {
        current_user
            .get()
            .and_then(|u| u.email)
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-background">
            <nav class="sticky top-0 z-40 border-b bg-background/80 backdrop-blur">
                <div class="mx-auto flex h-16 max-w-6xl items-center justify-between px-4">
                    <div class="flex items-center gap-2">
                        <BookmarkGlyph />
                        <h1 class="text-base font-semibold">"Linkshelf"</h1>
                    </div>

                    <div class="flex items-center gap-4">
                        <div class="hidden flex-col items-end md:flex">
                            <span class="text-[10px] font-semibold uppercase tracking-wider text-muted-foreground">
                                "Signed in as"
                            </span>
                            <span class="text-sm font-medium">{signed_in_as}</span>
                        </div>
                        <SignOutButton />
                    </div>
                </div>
            </nav>

            <main class="mx-auto max-w-6xl px-4 py-10">
                <div class="mb-8">
                    <h2 class="text-2xl font-bold">"Your collection"</h2>
                    <p class="mt-1 text-sm text-muted-foreground">"Manage and sync your favorite links."</p>
                </div>

                <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        error.get().map(|e| view! {
                            <Alert class="mb-6 border-destructive/30">
                                <AlertDescription class="text-destructive">{e}</AlertDescription>
                            </Alert>
                        })
                    }}
                </Show>

                <Show
                    when=move || !loading.get() || !bookmarks.get().is_empty()
                    fallback=|| view! {
                        <div class="flex items-center gap-3 py-12 text-sm text-muted-foreground">
                            <Spinner />
                            "Loading bookmarks..."
                        </div>
                    }
                >
                    <BookmarkManager />
                </Show>
            </main>
        </div>
    }
}

#[component]
fn BookmarkGlyph() -> impl IntoView {
    view! {
        <span class="flex size-8 items-center justify-center rounded-lg bg-primary text-primary-foreground">
            <svg viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" class="size-4">
                <path d="M19 21l-7-4-7 4V5a2 2 0 0 1 2-2h10a2 2 0 0 1 2 2z" />
            </svg>
        </span>
    }
}
