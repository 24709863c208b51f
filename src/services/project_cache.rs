use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::models::project::ProjectSummary;

/// Per-user mirror of the project listing. Filled on the first list and kept
/// in step with every write so repeated listings skip the database.
///
/// Every write bumps the user's version, whether or not a listing is cached.
/// A load records the version before querying and [`ProjectCache::fill`]
/// refuses the rows if a write landed in between.
#[derive(Clone, Default)]
pub struct ProjectCache {
    entries: Arc<RwLock<HashMap<Uuid, UserEntry>>>,
}

#[derive(Default)]
struct UserEntry {
    version: u64,
    items: Option<Vec<ProjectSummary>>,
}

fn sort_newest_first(items: &mut [ProjectSummary]) {
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: Uuid) -> Option<Vec<ProjectSummary>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&user_id).and_then(|e| e.items.clone())
    }

    /// Current write version for `user_id`; read it before loading rows.
    pub fn version(&self, user_id: Uuid) -> u64 {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&user_id).map_or(0, |e| e.version)
    }

    /// Installs a freshly loaded listing unless a write happened since
    /// `loaded_at` was read. Returns whether the rows were kept.
    pub fn fill(
        &self,
        user_id: Uuid,
        mut items: Vec<ProjectSummary>,
        loaded_at: u64,
    ) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(user_id).or_default();
        if entry.version != loaded_at {
            return false;
        }
        sort_newest_first(&mut items);
        entry.items = Some(items);
        true
    }

    /// Replaces the row with the same id (or adds it) and re-sorts.
    pub fn upsert(&self, user_id: Uuid, summary: ProjectSummary) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(user_id).or_default();
        entry.version += 1;
        if let Some(items) = entry.items.as_mut() {
            items.retain(|p| p.id != summary.id);
            items.push(summary);
            sort_newest_first(items);
        }
    }

    pub fn remove(&self, user_id: Uuid, project_id: Uuid) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(user_id).or_default();
        entry.version += 1;
        if let Some(items) = entry.items.as_mut() {
            items.retain(|p| p.id != project_id);
        }
    }
}
