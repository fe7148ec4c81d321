// src/seen.rs
//! Persisted record of every event link observed so far.
//!
//! On disk this is a JSON object `{ url: first_seen }` in insertion order
//! (oldest first). A plain JSON array of URLs is accepted on load and
//! migrated; the next save writes the object form.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tokio::fs;

use crate::error::WatchError;
use crate::extract::canonical_url;
use crate::persist::write_atomic;
use crate::timestamp::{format_rfc1123, parse_timestamp, truncate_to_secs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenEntry {
    pub url: String,
    pub first_seen: DateTime<Utc>,
}

/// Append-ordered set of URLs with their first-seen time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenState {
    entries: Vec<SeenEntry>,
    index: HashMap<String, usize>,
}

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn first_seen(&self, url: &str) -> Option<DateTime<Utc>> {
        self.index.get(url).map(|&i| self.entries[i].first_seen)
    }

    /// Appends `url` unless already known. Returns whether it was new.
    /// An existing entry's timestamp is never touched.
    pub fn insert(&mut self, url: impl Into<String>, first_seen: DateTime<Utc>) -> bool {
        let url = url.into();
        if self.index.contains_key(&url) {
            return false;
        }
        self.index.insert(url.clone(), self.entries.len());
        self.entries.push(SeenEntry {
            url,
            first_seen: truncate_to_secs(first_seen),
        });
        true
    }

    /// Like `insert`, but on a repeat keeps the earlier of the two timestamps.
    fn merge_earliest(&mut self, url: String, first_seen: DateTime<Utc>) {
        match self.index.get(&url) {
            Some(&i) => {
                let e = &mut self.entries[i];
                e.first_seen = e.first_seen.min(truncate_to_secs(first_seen));
            }
            None => {
                self.insert(url, first_seen);
            }
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SeenEntry> + '_ {
        self.entries.iter()
    }

    /// Most recently added first; this is the feed order.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &SeenEntry> + '_ {
        self.entries.iter().rev()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse either schema. `now` stamps URLs coming from the legacy list form.
    /// Keys are re-normalized like extracted links; keys that collapse onto
    /// one URL keep the earliest first-seen time.
    pub fn from_json(s: &str, now: DateTime<Utc>) -> Result<(Self, bool), String> {
        let raw: RawSeen = serde_json::from_str(s).map_err(|e| e.to_string())?;
        match raw {
            RawSeen::Map(OrderedPairs(pairs)) => {
                let mut state = SeenState::new();
                for (url, ts) in pairs {
                    let first_seen = parse_timestamp(&ts)
                        .ok_or_else(|| format!("bad timestamp {ts:?} for {url}"))?;
                    state.merge_earliest(canonical_url(&url), first_seen);
                }
                Ok((state, false))
            }
            RawSeen::List(urls) => {
                let mut state = SeenState::new();
                for url in urls {
                    state.merge_earliest(canonical_url(&url), now);
                }
                Ok((state, true))
            }
        }
    }
}

impl Serialize for SeenState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for e in &self.entries {
            map.serialize_entry(&e.url, &format_rfc1123(e.first_seen))?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeen {
    Map(OrderedPairs),
    List(Vec<String>),
}

/// JSON object read as a list of pairs, keeping document order.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of url to first-seen timestamp")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    pairs.push((k, v));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Load the seen state. A missing file is an empty state; anything
/// unreadable or malformed is fatal.
pub async fn load(path: &Path, now: DateTime<Utc>) -> Result<SeenState, WatchError> {
    let content = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no seen-state yet, starting empty");
            return Ok(SeenState::new());
        }
        Err(e) => {
            return Err(WatchError::PersistedState {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let (state, migrated) =
        SeenState::from_json(&content, now).map_err(|reason| WatchError::PersistedState {
            path: path.to_path_buf(),
            reason,
        })?;
    if migrated {
        tracing::warn!(
            path = %path.display(),
            urls = state.len(),
            "seen-state is a plain url list; migrating with first-seen = now"
        );
    }
    tracing::debug!(path = %path.display(), known = state.len(), "seen-state loaded");
    Ok(state)
}

pub async fn save(path: &Path, state: &SeenState) -> Result<(), WatchError> {
    let json = state
        .to_json_pretty()
        .map_err(|e| WatchError::PersistedState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    write_atomic(path, json.as_bytes()).await
}
