//! Agent Directory (spec §4.F) — a DNS-like public registry of agent
//! capability manifests. Mutations are serialized; reads proceed
//! concurrently, matching the teacher's read-mostly `RwLock` convention
//! for shared state.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::Identification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Active,
    Inactive,
    Deprecated,
}

impl Default for ManifestStatus {
    fn default() -> Self {
        ManifestStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub identification: Identification,
    pub capabilities: HashSet<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub status: ManifestStatus,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Supplied search filters (spec §4.F `getManifests`): all present filters
/// must match (AND semantics).
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter {
    pub capabilities: Option<HashSet<String>>,
    pub organization: Option<String>,
    pub role: Option<String>,
    pub speaker_uri: Option<String>,
    /// Defaults to `active`-only when `None`, per spec §4.F.
    pub status: Option<ManifestStatus>,
}

impl Manifest {
    fn matches(&self, filter: &ManifestFilter) -> bool {
        let wanted_status = filter.status.clone().unwrap_or(ManifestStatus::Active);
        if self.status != wanted_status {
            return false;
        }
        if let Some(capabilities) = &filter.capabilities
            && !capabilities.is_subset(&self.capabilities)
        {
            return false;
        }
        if let Some(organization) = &filter.organization
            && self.identification.organization.as_deref() != Some(organization.as_str())
        {
            return false;
        }
        if let Some(role) = &filter.role
            && self.identification.role.as_deref() != Some(role.as_str())
        {
            return false;
        }
        if let Some(speaker_uri) = &filter.speaker_uri
            && self.identification.speaker_uri != *speaker_uri
        {
            return false;
        }
        true
    }
}

/// The manifest store. `speakerUri` is the primary key (spec §3 "Invariant
/// (directory identity)").
pub struct AgentDirectory {
    manifests: RwLock<HashMap<String, Manifest>>,
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self { manifests: RwLock::new(HashMap::new()) }
    }

    /// Upserts by `speakerUri`, preserving `publishedAt` on update and
    /// refreshing `updatedAt`. Returns the stored record.
    pub fn publish(
        &self,
        identification: Identification,
        capabilities: HashSet<String>,
        metadata: serde_json::Value,
        status: ManifestStatus,
    ) -> Manifest {
        let now = Utc::now();
        let mut manifests = self.manifests.write().unwrap_or_else(|e| e.into_inner());
        let speaker_uri = identification.speaker_uri.clone();

        let published_at = manifests.get(&speaker_uri).map(|m| m.published_at).unwrap_or(now);
        println!("📡 manifest published: speaker={speaker_uri}");

        let manifest = Manifest {
            identification,
            capabilities,
            metadata,
            status,
            published_at,
            updated_at: now,
        };
        manifests.insert(speaker_uri, manifest.clone());
        manifest
    }

    pub fn publish_many(
        &self,
        entries: Vec<(Identification, HashSet<String>, serde_json::Value, ManifestStatus)>,
    ) -> Vec<Manifest> {
        entries
            .into_iter()
            .map(|(id, caps, meta, status)| self.publish(id, caps, meta, status))
            .collect()
    }

    /// Returns manifests matching every supplied filter, in speakerUri order
    /// for deterministic responses.
    pub fn get(&self, filter: &ManifestFilter) -> Vec<Manifest> {
        let manifests = self.manifests.read().unwrap_or_else(|e| e.into_inner());
        let mut matches: Vec<Manifest> =
            manifests.values().filter(|m| m.matches(filter)).cloned().collect();
        matches.sort_by(|a, b| a.identification.speaker_uri.cmp(&b.identification.speaker_uri));
        matches
    }

    /// Removes the record for `speaker_uri`. Returns whether it existed.
    pub fn delete(&self, speaker_uri: &str) -> bool {
        let mut manifests = self.manifests.write().unwrap_or_else(|e| e.into_inner());
        manifests.remove(speaker_uri).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identification(uri: &str) -> Identification {
        Identification { speaker_uri: uri.to_string(), ..Default::default() }
    }

    fn capset(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // Scenario 6 (spec §8): directory capability filter.
    #[test]
    fn scenario_6_capability_superset_filter() {
        let dir = AgentDirectory::new();
        dir.publish(identification("s:m1"), capset(&["translation", "text"]), serde_json::json!({}), ManifestStatus::Active);
        dir.publish(identification("s:m2"), capset(&["text"]), serde_json::json!({}), ManifestStatus::Active);

        let only_translation = dir.get(&ManifestFilter { capabilities: Some(capset(&["translation"])), ..Default::default() });
        assert_eq!(only_translation.len(), 1);
        assert_eq!(only_translation[0].identification.speaker_uri, "s:m1");

        let text = dir.get(&ManifestFilter { capabilities: Some(capset(&["text"])), ..Default::default() });
        assert_eq!(text.len(), 2);

        let impossible = dir.get(&ManifestFilter { capabilities: Some(capset(&["translation", "audio"])), ..Default::default() });
        assert!(impossible.is_empty());
    }

    // Testable property 9: upsert preserves publishedAt, refreshes updatedAt.
    #[test]
    fn upsert_preserves_published_at() {
        let dir = AgentDirectory::new();
        let first = dir.publish(identification("s:a"), capset(&["text"]), serde_json::json!({}), ManifestStatus::Active);
        let second = dir.publish(identification("s:a"), capset(&["text", "audio"]), serde_json::json!({}), ManifestStatus::Active);

        assert_eq!(first.published_at, second.published_at);
        assert!(second.updated_at >= first.updated_at);

        let all = dir.get(&ManifestFilter::default());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].capabilities, capset(&["text", "audio"]));
    }

    #[test]
    fn status_defaults_to_active_only() {
        let dir = AgentDirectory::new();
        dir.publish(identification("s:a"), capset(&[]), serde_json::json!({}), ManifestStatus::Active);
        dir.publish(identification("s:b"), capset(&[]), serde_json::json!({}), ManifestStatus::Deprecated);

        let active_only = dir.get(&ManifestFilter::default());
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].identification.speaker_uri, "s:a");

        let deprecated = dir.get(&ManifestFilter { status: Some(ManifestStatus::Deprecated), ..Default::default() });
        assert_eq!(deprecated.len(), 1);
    }

    #[test]
    fn delete_removes_record() {
        let dir = AgentDirectory::new();
        dir.publish(identification("s:a"), capset(&[]), serde_json::json!({}), ManifestStatus::Active);
        assert!(dir.delete("s:a"));
        assert!(!dir.delete("s:a"));
        assert!(dir.get(&ManifestFilter::default()).is_empty());
    }

    #[test]
    fn organization_and_role_filters_are_exact_match() {
        let dir = AgentDirectory::new();
        let mut id = identification("s:a");
        id.organization = Some("acme".into());
        id.role = Some("translator".into());
        dir.publish(id, capset(&[]), serde_json::json!({}), ManifestStatus::Active);

        let matched = dir.get(&ManifestFilter { organization: Some("acme".into()), ..Default::default() });
        assert_eq!(matched.len(), 1);

        let unmatched = dir.get(&ManifestFilter { organization: Some("other".into()), ..Default::default() });
        assert!(unmatched.is_empty());
    }
}
