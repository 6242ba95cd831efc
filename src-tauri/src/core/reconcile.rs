//! Pairs registry entries with live sightings.

use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::core::model::{DisplayEntry, RegistryEntry, ScanSighting};

/// Builds the display list: one entry per registry entry, strongest signal
/// first, unmatched entries last in registry order.
///
/// For each registry entry the first rule that any sighting satisfies wins:
/// 1. sighting id equals the entry name
/// 2. advertised name equals the entry name
/// 3. advertised name equals the entry alias
///
/// Comparisons ignore surrounding whitespace, and a blank value never
/// matches anything.
pub fn reconcile(registry: &[RegistryEntry], sightings: &[ScanSighting]) -> Vec<DisplayEntry> {
    let mut display: Vec<DisplayEntry> = registry
        .iter()
        .map(|entry| DisplayEntry::new(entry.clone(), find_sighting(entry, sightings)))
        .collect();

    // Option orders None below Some, so descending puts unmatched last.
    // sort_by is stable, ties keep registry order.
    display.sort_by(|a, b| b.signal_strength.cmp(&a.signal_strength));
    display
}

fn find_sighting<'a>(entry: &RegistryEntry, sightings: &'a [ScanSighting]) -> Option<&'a ScanSighting> {
    sightings
        .iter()
        .find(|s| same_key(&s.id, &entry.name))
        .or_else(|| {
            sightings
                .iter()
                .find(|s| advertised_as(s, &entry.name))
        })
        .or_else(|| {
            sightings
                .iter()
                .find(|s| advertised_as(s, &entry.alias))
        })
}

fn advertised_as(sighting: &ScanSighting, key: &str) -> bool {
    sighting
        .advertised_name
        .as_deref()
        .is_some_and(|name| same_key(name, key))
}

fn same_key(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a == b.trim()
}

#[derive(Debug, Clone)]
struct SeenSighting {
    sighting: ScanSighting,
    seen_at: Instant,
}

/// Accumulated sightings of the current scan session.
///
/// Keeps first-seen order; a newer sighting of the same id replaces the
/// older one in place. Without a TTL entries live until the table is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct SightingTable {
    entries: IndexMap<String, SeenSighting>,
    ttl: Option<Duration>,
}

impl SightingTable {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: IndexMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Upserts a sighting observed at `seen_at`.
    pub fn record(&mut self, sighting: ScanSighting, seen_at: Instant) {
        let key = sighting.id.clone();
        self.entries.insert(key, SeenSighting { sighting, seen_at });
    }

    /// Drops sightings older than the TTL. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, seen| now.saturating_duration_since(seen.seen_at) <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ScanSighting> {
        self.entries.get(id).map(|seen| &seen.sighting)
    }

    /// Current sightings in first-seen order.
    pub fn to_vec(&self) -> Vec<ScanSighting> {
        self.entries
            .values()
            .map(|seen| seen.sighting.clone())
            .collect()
    }
}
