//! Preset catalog and resolution.
//!
//! A preset is an ordered list of segment names keyed by (group, sub),
//! optionally with keywords for auto-detection against a video title.
//! The catalog is loaded once per session and self-heals when empty or
//! malformed instead of failing session start.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The currently selected (group, sub) key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePreset {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub sub: String,
}

/// One preset: split names in order, plus optional detection keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresetEntry {
    pub splits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

// Older exports stored a bare name array instead of an object; both
// forms must keep deserializing.
impl<'de> Deserialize<'de> for PresetEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Names(Vec<String>),
            Full {
                #[serde(default)]
                splits: Vec<String>,
                #[serde(default)]
                keywords: Vec<String>,
            },
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Names(splits) => PresetEntry {
                splits,
                keywords: Vec::new(),
            },
            Repr::Full { splits, keywords } => PresetEntry { splits, keywords },
        })
    }
}

/// The full preset catalog: group -> sub -> entry, plus the active key.
///
/// Map iteration order is the deterministic key order, which is also the
/// scan order for auto-detection (first match wins, no scoring).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetCatalog {
    #[serde(default)]
    pub active: ActivePreset,
    #[serde(default)]
    pub data: BTreeMap<String, BTreeMap<String, PresetEntry>>,
}

impl PresetCatalog {
    /// Built-in catalog used when the stored one is empty or malformed.
    pub fn built_in() -> Self {
        let mut subs = BTreeMap::new();
        subs.insert(
            "Default".to_string(),
            PresetEntry {
                splits: vec![
                    "Segment 1".to_string(),
                    "Segment 2".to_string(),
                    "Segment 3".to_string(),
                ],
                keywords: Vec::new(),
            },
        );
        let mut data = BTreeMap::new();
        data.insert("General".to_string(), subs);
        Self {
            active: ActivePreset {
                group: "General".into(),
                sub: "Default".into(),
            },
            data,
        }
    }

    /// Explicit repair step: replace an empty catalog with the built-in
    /// one, drop groups with no subs, and re-point a dangling active
    /// selection at the first available key. Returns true if anything
    /// changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        let empty_groups: Vec<String> = self
            .data
            .iter()
            .filter(|(_, subs)| subs.is_empty())
            .map(|(g, _)| g.clone())
            .collect();
        for group in empty_groups {
            self.data.remove(&group);
            changed = true;
        }

        if self.data.is_empty() {
            warn!("preset catalog empty; restoring built-in defaults");
            *self = Self::built_in();
            return true;
        }

        if self.lookup(&self.active.group, &self.active.sub).is_none() {
            let first = self
                .data
                .iter()
                .find_map(|(g, subs)| subs.keys().next().map(|s| (g.clone(), s.clone())));
            if let Some((group, sub)) = first {
                warn!(
                    "active preset {}>{} missing; falling back to {group}>{sub}",
                    self.active.group, self.active.sub
                );
                self.active = ActivePreset { group, sub };
                changed = true;
            }
        }
        changed
    }

    pub fn lookup(&self, group: &str, sub: &str) -> Option<&PresetEntry> {
        self.data.get(group)?.get(sub)
    }

    /// Ordered split names for the active selection; empty when the
    /// referenced key no longer exists (every split then falls back to
    /// the auto-naming policy).
    pub fn active_names(&self) -> Vec<String> {
        self.lookup(&self.active.group, &self.active.sub)
            .map(|entry| entry.splits.clone())
            .unwrap_or_default()
    }

    /// Case-insensitive substring scan of every entry's keywords against
    /// a display title, in catalog iteration order. First match wins.
    pub fn detect(&self, title: &str) -> Option<(String, String)> {
        let title = title.to_lowercase();
        for (group, subs) in &self.data {
            for (sub, entry) in subs {
                for keyword in &entry.keywords {
                    if !keyword.is_empty() && title.contains(&keyword.to_lowercase()) {
                        return Some((group.clone(), sub.clone()));
                    }
                }
            }
        }
        None
    }
}

/// Write-back sink for the active selection after a successful
/// auto-detect. The settings surface owns the actual store.
pub trait PresetSink {
    fn persist_active(&mut self, active: &ActivePreset) -> Result<()>;
}

/// Sink that drops writes; for hosts without a settings store.
#[derive(Debug, Default)]
pub struct NullPresetSink;

impl PresetSink for NullPresetSink {
    fn persist_active(&mut self, active: &ActivePreset) -> Result<()> {
        info!(
            "discarding active preset write-back {}>{}",
            active.group, active.sub
        );
        Ok(())
    }
}
