//! Change detection against the persisted listing snapshot.
//!
//! > A fresh parse is compared with the snapshot by listing id. Only ids the
//! > snapshot has never seen are reported. The snapshot is overwritten with
//! > the full parse only when something new was found.
//!
//! The first run against an absent snapshot is a bootstrap: the parse is
//! persisted and nothing is reported.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Listing, ListingId, ListingSnapshot};
use crate::storage::ListingStore;

/// Listings in `current` whose id is absent from `previous`.
///
/// Keeps document order and reports each id once.
pub fn new_listings(previous: &ListingSnapshot, current: &[Listing]) -> Vec<Listing> {
    let mut reported: HashSet<&ListingId> = HashSet::new();
    current
        .iter()
        .filter(|l| !previous.contains(&l.id) && reported.insert(&l.id))
        .cloned()
        .collect()
}

/// Compares fresh parses with the stored snapshot.
pub struct ChangeDetector {
    store: Arc<dyn ListingStore>,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    /// Return the listings not seen before, updating the snapshot if any.
    pub async fn detect(&self, parsed: &[Listing]) -> Result<Vec<Listing>> {
        let Some(snapshot) = self.store.load().await? else {
            self.store.save(parsed).await?;
            log::info!(
                "Snapshot initialized with {} listings, nothing to notify",
                parsed.len()
            );
            return Ok(Vec::new());
        };

        let added = new_listings(&snapshot, parsed);
        if added.is_empty() {
            log::debug!("No new listings ({} known)", snapshot.len());
            return Ok(added);
        }

        self.store.save(parsed).await?;
        log::info!(
            "Diff: {} new listings, snapshot now holds {}",
            added.len(),
            parsed.len()
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::storage::{JsonListingStore, MemoryListingStore};

    fn make_listing(id: &str, title: &str) -> Listing {
        Listing::new(
            title,
            1000,
            format!("https://example.com/ad/{}", id),
            None,
            "Limassol",
        )
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_new_listings_preserves_order() {
        let prev: ListingSnapshot = vec![make_listing("b", "B")].into_iter().collect();
        let curr = vec![
            make_listing("c", "C"),
            make_listing("b", "B"),
            make_listing("a", "A"),
            make_listing("c", "C again"),
        ];

        let added = new_listings(&prev, &curr);
        assert_eq!(
            ids(&added),
            vec!["https://example.com/ad/c", "https://example.com/ad/a"]
        );
        assert_eq!(added[0].title, "C");
    }

    #[test]
    fn test_title_change_is_not_new() {
        let prev: ListingSnapshot = vec![make_listing("001", "Old Title")].into_iter().collect();
        let curr = vec![make_listing("001", "New Title")];
        assert!(new_listings(&prev, &curr).is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_reports_nothing() {
        let store = Arc::new(MemoryListingStore::new());
        let detector = ChangeDetector::new(store.clone());
        let parsed = vec![make_listing("1", "A"), make_listing("2", "B"), make_listing("3", "C")];

        let added = detector.detect(&parsed).await.unwrap();
        assert!(added.is_empty());
        assert_eq!(store.listings().await, Some(parsed));
    }

    #[tokio::test]
    async fn test_bootstrap_with_empty_page() {
        let store = Arc::new(MemoryListingStore::new());
        let detector = ChangeDetector::new(store.clone());

        assert!(detector.detect(&[]).await.unwrap().is_empty());
        assert_eq!(store.listings().await, Some(Vec::new()));

        // Initialized now: everything after this is new
        let added = detector.detect(&[make_listing("1", "A")]).await.unwrap();
        assert_eq!(added.len(), 1);
    }

    #[tokio::test]
    async fn test_additions() {
        let a = make_listing("a", "A");
        let b = make_listing("b", "B");
        let c = make_listing("c", "C");
        let store = Arc::new(MemoryListingStore::with_listings(vec![a.clone(), b.clone()]));
        let detector = ChangeDetector::new(store.clone());

        let current = vec![a, b, c.clone()];
        let added = detector.detect(&current).await.unwrap();
        assert_eq!(added, vec![c]);
        assert_eq!(store.listings().await, Some(current));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_no_changes_leaves_snapshot_untouched() {
        let prev = vec![make_listing("a", "A"), make_listing("b", "B")];
        let store = Arc::new(MemoryListingStore::with_listings(prev.clone()));
        let detector = ChangeDetector::new(store.clone());

        assert!(detector.detect(&prev).await.unwrap().is_empty());
        // Vanished listings alone are not a change either
        assert!(detector.detect(&prev[..1]).await.unwrap().is_empty());
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.listings().await, Some(prev));
    }

    #[tokio::test]
    async fn test_full_overwrite_drops_vanished() {
        let store = Arc::new(MemoryListingStore::with_listings(vec![
            make_listing("a", "A"),
            make_listing("b", "B"),
        ]));
        let detector = ChangeDetector::new(store.clone());

        let current = vec![make_listing("b", "B"), make_listing("c", "C")];
        detector.detect(&current).await.unwrap();
        assert_eq!(store.listings().await, Some(current));
    }

    #[tokio::test]
    async fn test_file_snapshot_bootstrap_then_diff() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ads.json");
        let detector = ChangeDetector::new(Arc::new(JsonListingStore::new(&path)));

        let first: Vec<Listing> = (1..=5).map(|i| make_listing(&i.to_string(), "x")).collect();
        assert!(detector.detect(&first).await.unwrap().is_empty());
        let persisted: Vec<Listing> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(persisted, first);

        let mut second = first.clone();
        second.insert(0, make_listing("6", "y"));
        let added = detector.detect(&second).await.unwrap();
        assert_eq!(ids(&added), vec!["https://example.com/ad/6"]);
    }

    #[tokio::test]
    async fn test_file_not_rewritten_without_changes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ads.json");
        let listings = vec![make_listing("a", "A"), make_listing("b", "B")];

        // Compact JSON: any rewrite by the store would pretty-print it.
        let compact = serde_json::to_vec(&listings).unwrap();
        std::fs::write(&path, &compact).unwrap();

        let detector = ChangeDetector::new(Arc::new(JsonListingStore::new(&path)));
        assert!(detector.detect(&listings).await.unwrap().is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), compact);
    }
}
