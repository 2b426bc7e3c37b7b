use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

const PREFIX: &str = "linkshelf"; // Must NOT contain "/" or "-"

/// Unique id per call site, e.g. for the change-feed join ref so that two
/// tabs of the same user never share a channel instance.
pub(crate) fn use_random_id_for(element: &str) -> String {
    format!("{}_{PREFIX}_{}", element, generate_hash())
}

static COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_hash() -> u64 {
    let mut hasher = DefaultHasher::new();
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    counter.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_call() {
        let a = use_random_id_for("bookmarks");
        let b = use_random_id_for("bookmarks");
        assert_ne!(a, b);
        assert!(a.starts_with("bookmarks_linkshelf_"));
    }
}
