//! Listing data structures.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of a listing: its canonical absolute link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A listing parsed from the search result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ListingRecord")]
pub struct Listing {
    /// Identity key, equal to `link`
    pub id: ListingId,

    /// Listing title
    pub title: String,

    /// Price in whole currency units (0 when unknown)
    pub price: i64,

    /// Canonical absolute link
    pub link: String,

    /// When the listing was posted, local wall-clock time
    #[serde(rename = "datetime")]
    pub posted_at: Option<NaiveDateTime>,

    /// Location text
    pub location: String,
}

impl Listing {
    /// Build a listing whose identity is derived from its link.
    pub fn new(
        title: impl Into<String>,
        price: i64,
        link: impl Into<String>,
        posted_at: Option<NaiveDateTime>,
        location: impl Into<String>,
    ) -> Self {
        let link = link.into();
        Self {
            id: ListingId::new(link.clone()),
            title: title.into(),
            price,
            link,
            posted_at,
            location: location.into(),
        }
    }
}

/// On-disk shape of a listing; older snapshot files carry no `id`.
#[derive(Deserialize)]
struct ListingRecord {
    #[serde(default)]
    id: Option<ListingId>,
    title: String,
    #[serde(default)]
    price: i64,
    link: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    datetime: Option<NaiveDateTime>,
    #[serde(default)]
    location: String,
}

/// Accepts naive timestamps and RFC 3339 with an offset (kept as local wall
/// clock). The year-1 zero time and unreadable text decode as `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let parsed = raw
        .parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.naive_local()));

    match parsed {
        Some(t) if t.year() <= 1 => Ok(None),
        Some(t) => Ok(Some(t)),
        None => {
            log::warn!("Unreadable listing datetime '{}', treating as unknown", raw);
            Ok(None)
        }
    }
}

impl From<ListingRecord> for Listing {
    fn from(record: ListingRecord) -> Self {
        let id = record
            .id
            .filter(|id| !id.as_str().is_empty())
            .unwrap_or_else(|| ListingId::new(record.link.clone()));
        Self {
            id,
            title: record.title,
            price: record.price,
            link: record.link,
            posted_at: record.datetime,
            location: record.location,
        }
    }
}

/// Every listing already seen as of the last successful fetch, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ListingSnapshot {
    listings: HashMap<ListingId, Listing>,
}

impl ListingSnapshot {
    pub fn contains(&self, id: &ListingId) -> bool {
        self.listings.contains_key(id)
    }

    pub fn get(&self, id: &ListingId) -> Option<&Listing> {
        self.listings.get(id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl FromIterator<Listing> for ListingSnapshot {
    fn from_iter<I: IntoIterator<Item = Listing>>(iter: I) -> Self {
        Self {
            listings: iter.into_iter().map(|l| (l.id.clone(), l)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_follows_link() {
        let listing = Listing::new("Flat", 900, "https://example.com/a/1", None, "Limassol");
        assert_eq!(listing.id.as_str(), "https://example.com/a/1");
    }

    #[test]
    fn test_legacy_snapshot_records() {
        let json = r#"[
            {"title":"Villa","price":350000,"link":"https://example.com/a/9","datetime":"2024-03-05T18:00:00Z","location":"Paphos"},
            {"title":"Flat","price":900,"link":"https://example.com/a/10","datetime":"2024-03-06T09:15:00+02:00","location":"Limassol"},
            {"title":"Studio","price":0,"link":"https://example.com/a/11","datetime":"0001-01-01T00:00:00Z","location":""}
        ]"#;
        let listings: Vec<Listing> = serde_json::from_str(json).unwrap();

        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].id, ListingId::new("https://example.com/a/9"));
        assert_eq!(listings[0].price, 350000);
        assert_eq!(
            listings[0].posted_at,
            NaiveDateTime::parse_from_str("2024-03-05 18:00:00", "%Y-%m-%d %H:%M:%S").ok()
        );
        // Offset timestamps keep their wall-clock time
        assert_eq!(
            listings[1].posted_at,
            NaiveDateTime::parse_from_str("2024-03-06 09:15:00", "%Y-%m-%d %H:%M:%S").ok()
        );
        assert_eq!(listings[2].posted_at, None);
    }

    #[test]
    fn test_datetime_round_trip_and_unknown() {
        let posted = NaiveDateTime::parse_from_str("2024-03-05 18:00:00", "%Y-%m-%d %H:%M:%S").ok();
        let listing = Listing::new("Flat", 900, "https://example.com/a/1", posted, "Limassol");
        let back: Listing = serde_json::from_str(&serde_json::to_string(&listing).unwrap()).unwrap();
        assert_eq!(back, listing);

        for raw in [r#"null"#, r#""""#, r#""yesterday-ish""#] {
            let json = format!(
                r#"{{"title":"X","price":1,"link":"https://example.com/x","datetime":{raw},"location":""}}"#
            );
            let listing: Listing = serde_json::from_str(&json).unwrap();
            assert_eq!(listing.posted_at, None, "{raw}");
        }

        let missing: Listing =
            serde_json::from_str(r#"{"title":"X","link":"https://example.com/x"}"#).unwrap();
        assert_eq!(missing.posted_at, None);
    }

    #[test]
    fn test_serialized_field_names() {
        let listing = Listing::new("Flat", 900, "https://example.com/a/1", None, "Limassol");
        let value = serde_json::to_value(&listing).unwrap();
        for key in ["id", "title", "price", "link", "datetime", "location"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_snapshot_keys_by_id() {
        let snapshot: ListingSnapshot = vec![
            Listing::new("A", 1, "https://example.com/a", None, ""),
            Listing::new("B", 2, "https://example.com/b", None, ""),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(&ListingId::new("https://example.com/b")));
        assert!(!snapshot.contains(&ListingId::new("https://example.com/c")));
    }
}
