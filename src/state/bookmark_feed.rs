use crate::models::Bookmark;
use crate::realtime::ChangeEvent;

/// List logic for the bookmark view, kept free of signals so it can be
/// exercised natively. The list is the union of the last server snapshot and
/// the events received from the change feed.

/// Prepend a row delivered by the feed. Re-delivery of an id already present
/// (the origin tab sees its own write twice: feed + revalidated snapshot) is
/// a no-op.
pub(crate) fn apply_insert(list: &mut Vec<Bookmark>, row: Bookmark) -> bool {
    if list.iter().any(|b| b.id == row.id) {
        return false;
    }
    list.insert(0, row);
    true
}

pub(crate) fn apply_delete(list: &mut Vec<Bookmark>, id: &str) -> bool {
    let before = list.len();
    list.retain(|b| b.id != id);
    list.len() != before
}

/// Redundant owner check on feed events. The backend's row policy already
/// filters foreign rows; delete payloads may omit the owner entirely
/// (replica identity), in which case the event is applied by id alone.
pub(crate) fn is_foreign_event(event: &ChangeEvent, owner_id: &str) -> bool {
    match event {
        ChangeEvent::Insert(row) => !row.user_id.is_empty() && row.user_id != owner_id,
        ChangeEvent::Delete { user_id, .. } => match user_id {
            Some(uid) => !uid.is_empty() && uid != owner_id,
            None => false,
        },
    }
}

/// Case-insensitive substring match over title and URL. Recomputed per
/// keystroke; an empty query returns the full list.
pub(crate) fn filter_bookmarks(list: &[Bookmark], query: &str) -> Vec<Bookmark> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return list.to_vec();
    }

    list.iter()
        .filter(|b| b.title.to_lowercase().contains(&q) || b.url.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, title: &str, url: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            user_id: "u-1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn insert_prepends_new_rows() {
        let mut list = vec![row("b-1", "Old", "https://old.example")];
        assert!(apply_insert(&mut list, row("b-2", "New", "https://new.example")));
        assert_eq!(list[0].id, "b-2");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut list = vec![row("b-1", "One", "https://one.example")];
        assert!(!apply_insert(&mut list, row("b-1", "One", "https://one.example")));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn delete_removes_matching_row_only() {
        let mut list = vec![
            row("b-1", "One", "https://one.example"),
            row("b-2", "Two", "https://two.example"),
        ];
        assert!(apply_delete(&mut list, "b-1"));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "b-2");

        assert!(!apply_delete(&mut list, "b-404"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn foreign_insert_events_are_flagged() {
        let mut other = row("b-9", "Theirs", "https://theirs.example");
        other.user_id = "u-2".to_string();
        assert!(is_foreign_event(&ChangeEvent::Insert(other), "u-1"));

        let mine = row("b-10", "Mine", "https://mine.example");
        assert!(!is_foreign_event(&ChangeEvent::Insert(mine), "u-1"));
    }

    #[test]
    fn delete_events_without_owner_are_not_foreign() {
        let ev = ChangeEvent::Delete {
            id: "b-1".to_string(),
            user_id: None,
        };
        assert!(!is_foreign_event(&ev, "u-1"));

        let ev = ChangeEvent::Delete {
            id: "b-1".to_string(),
            user_id: Some("u-2".to_string()),
        };
        assert!(is_foreign_event(&ev, "u-1"));
    }

    #[test]
    fn filter_is_case_insensitive_over_title_and_url() {
        let list = vec![
            row("b-1", "Rust Blog", "https://blog.rust-lang.org"),
            row("b-2", "News", "https://example.com/daily"),
        ];

        let hits = filter_bookmarks(&list, "RUST");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b-1");

        // URL substring also matches.
        let hits = filter_bookmarks(&list, "DAILY");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b-2");
    }

    #[test]
    fn empty_query_returns_full_list() {
        let list = vec![
            row("b-1", "One", "https://one.example"),
            row("b-2", "Two", "https://two.example"),
        ];
        assert_eq!(filter_bookmarks(&list, "").len(), 2);
        assert_eq!(filter_bookmarks(&list, "   ").len(), 2);
    }

    #[test]
    fn create_then_delete_roundtrip() {
        let mut list: Vec<Bookmark> = vec![];
        let created = row("b-1", "Example", "https://example.com");
        assert!(apply_insert(&mut list, created.clone()));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Example");
        assert_eq!(list[0].url, "https://example.com");

        assert!(apply_delete(&mut list, &created.id));
        assert!(list.is_empty());
    }
}
