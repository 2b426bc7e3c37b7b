use crate::api::{ApiClient, ApiResult};
use crate::models::{Bookmark, NewBookmark};

/// Mutation actions. Each one resolves the caller's identity first, then
/// performs exactly one backend write; there is no compensating logic. The
/// caller follows a success with `AppState::revalidate_bookmarks`.

pub(crate) async fn add_bookmark(client: &ApiClient, title: &str, url: &str) -> ApiResult<Bookmark> {
    let user = client.get_user().await?;

    client
        .insert_bookmark(&NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            user_id: user.id,
        })
        .await
}

/// Delete is matched on the (id, owner) pair; a client-supplied id alone can
/// never remove another owner's row.
pub(crate) async fn delete_bookmark(client: &ApiClient, id: &str) -> ApiResult<()> {
    let user = client.get_user().await?;
    client.delete_bookmark(id, &user.id).await
}
