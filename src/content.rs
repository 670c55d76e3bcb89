//! Content repository: single source of truth for all translated content.
//!
//! Content rows live in the hosted store's `content` table, one row per
//! (section, key, language). The repository owns the canonical row list and
//! a derived grouped index (section -> key -> language -> item) that is
//! rebuilt wholesale from the list after every successful fetch, never
//! patched incrementally. All reads and writes go through its methods; the
//! HTTP layer holds no independent copy.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::i18n::Language;
use crate::store::StoreClient;

/// Sections every deployment starts with, before any rows exist.
pub const DEFAULT_SECTIONS: [&str; 5] = ["home", "about", "services", "contact", "footer"];

const CONTENT_TABLE: &str = "content";

/// One translated value for one key in one section in one language.
///
/// `id` is absent until the store acknowledges an insert; `updated_at` is
/// set by the store on writes and carried verbatim, never compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub section: String,
    pub key: String,
    pub lang: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The derived index: section -> key -> language code -> item.
pub type GroupedContent = BTreeMap<String, BTreeMap<String, HashMap<String, ContentItem>>>;

/// Row shape for inserts (the store assigns id and updated_at).
#[derive(Debug, Serialize)]
struct NewContentRow<'a> {
    section: &'a str,
    key: &'a str,
    lang: &'a str,
    value: &'a str,
}

/// Minimal patch shape for the bulk-save upsert batch.
#[derive(Debug, Serialize)]
struct ValuePatch<'a> {
    id: &'a str,
    value: &'a str,
}

/// One key of one section viewed in a single language, for the filtered
/// section listing. `value` defaults to the empty string when the language
/// cell is missing.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub key: String,
    pub value: String,
    pub id: Option<String>,
}

/// Build the grouped index from a flat item list.
///
/// The result contains exactly one cell per (section, key, lang) present in
/// the list and no others; a duplicate (section, key, lang) keeps the later
/// row, mirroring plain map insertion.
pub fn group_content(items: &[ContentItem]) -> GroupedContent {
    let mut grouped = GroupedContent::new();
    for item in items {
        grouped
            .entry(item.section.clone())
            .or_default()
            .entry(item.key.clone())
            .or_default()
            .insert(item.lang.clone(), item.clone());
    }
    grouped
}

#[derive(Debug)]
pub struct ContentRepository {
    store: StoreClient,
    content: Vec<ContentItem>,
    grouped: GroupedContent,
    sections: Vec<String>,
}

impl ContentRepository {
    pub fn new(store: StoreClient) -> Self {
        Self {
            store,
            content: Vec::new(),
            grouped: GroupedContent::new(),
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    // ==================== Reads ====================

    pub fn content(&self) -> &[ContentItem] {
        &self.content
    }

    pub fn grouped(&self) -> &GroupedContent {
        &self.grouped
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// All keys of a section viewed in one language, sorted by key.
    pub fn entries_for(&self, section: &str, lang: &str) -> Vec<EntryView> {
        let Some(keys) = self.grouped.get(section) else {
            return Vec::new();
        };
        keys.iter()
            .map(|(key, cells)| match cells.get(lang) {
                Some(item) => EntryView {
                    key: key.clone(),
                    value: item.value.clone(),
                    id: item.id.clone(),
                },
                None => EntryView {
                    key: key.clone(),
                    value: String::new(),
                    id: None,
                },
            })
            .collect()
    }

    /// The per-language items of one entry, one per configured language,
    /// defaulting a missing cell to an unsaved empty-value item.
    fn entry_items(&self, section: &str, key: &str) -> Option<Vec<ContentItem>> {
        let cells = self.grouped.get(section)?.get(key)?;
        let items = Language::ALL
            .iter()
            .map(|lang| {
                cells.get(lang.code()).cloned().unwrap_or_else(|| ContentItem {
                    id: None,
                    section: section.to_string(),
                    key: key.to_string(),
                    lang: lang.code().to_string(),
                    value: String::new(),
                    updated_at: None,
                })
            })
            .collect();
        Some(items)
    }

    // ==================== Operations ====================

    /// Fetch every content row ordered by (section, key), replace the
    /// canonical list and rebuild the derived state. On failure the
    /// previous in-memory state is retained.
    pub async fn fetch_all(&mut self) -> AppResult<()> {
        let rows: Vec<ContentItem> = self.store.select(CONTENT_TABLE, "section.asc,key.asc").await?;
        info!("Fetched {} content rows", rows.len());
        self.content = rows;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.grouped = group_content(&self.content);
        // Sections seen in data are merged in; registered sections persist
        // for the session even with zero rows.
        for section in self.grouped.keys() {
            if !self.sections.contains(section) {
                self.sections.push(section.clone());
            }
        }
    }

    /// Pure in-memory edit of one cell in the grouped index. Does not touch
    /// the store or the canonical list. The (section, key) entry must
    /// already exist; a missing language cell is created as an unsaved item
    /// so a translation can be filled in after the fact.
    pub fn set_local_value(
        &mut self,
        section: &str,
        key: &str,
        lang: &str,
        value: &str,
    ) -> AppResult<()> {
        if Language::from_code(lang).is_none() {
            return Err(AppError::ValidationFailed(format!(
                "unsupported language '{lang}'"
            )));
        }

        let cells = self
            .grouped
            .get_mut(section)
            .and_then(|keys| keys.get_mut(key))
            .ok_or_else(|| {
                AppError::ValidationFailed(format!(
                    "no content entry for section '{section}', key '{key}'"
                ))
            })?;

        cells
            .entry(lang.to_string())
            .and_modify(|item| item.value = value.to_string())
            .or_insert_with(|| ContentItem {
                id: None,
                section: section.to_string(),
                key: key.to_string(),
                lang: lang.to_string(),
                value: value.to_string(),
                updated_at: None,
            });
        Ok(())
    }

    /// Save one entry: for every configured language, update-by-id when the
    /// cell is persisted, insert otherwise. Languages are processed
    /// independently; one failed write neither rolls back nor skips the
    /// others. Refetches afterward to pick up server-assigned ids.
    pub async fn save_entry(&mut self, section: &str, key: &str) -> AppResult<()> {
        let items = self.entry_items(section, key).ok_or_else(|| {
            AppError::ValidationFailed(format!(
                "no content entry for section '{section}', key '{key}'"
            ))
        })?;

        let mut failed_langs = Vec::new();
        for item in &items {
            let result = match &item.id {
                Some(id) => {
                    self.store
                        .update(CONTENT_TABLE, id, &json!({ "value": item.value }))
                        .await
                }
                None => {
                    let row = NewContentRow {
                        section: &item.section,
                        key: &item.key,
                        lang: &item.lang,
                        value: &item.value,
                    };
                    self.store.insert(CONTENT_TABLE, &[row]).await
                }
            };
            if let Err(e) = result {
                warn!("Save failed for {}/{} [{}]: {}", section, key, item.lang, e);
                failed_langs.push(item.lang.clone());
            }
        }

        if let Err(e) = self.fetch_all().await {
            warn!("Refetch after save failed: {}", e);
        }

        if failed_langs.is_empty() {
            info!("Saved entry {}/{}", section, key);
            Ok(())
        } else {
            Err(AppError::StoreUnavailable(format!(
                "save failed for languages: {}",
                failed_langs.join(", ")
            )))
        }
    }

    /// Create a new entry: one row per configured language, inserted in a
    /// single batched request. Validation happens before any store call;
    /// the repository refetches afterward regardless of the insert outcome
    /// to learn the true store state.
    pub async fn add_entry(
        &mut self,
        section: &str,
        key: &str,
        values: &HashMap<String, String>,
    ) -> AppResult<()> {
        let key = key.trim();
        if section.trim().is_empty() || key.is_empty() {
            return Err(AppError::ValidationFailed(
                "section and key must not be empty".to_string(),
            ));
        }
        for lang in Language::codes() {
            match values.get(lang) {
                Some(value) if !value.trim().is_empty() => {}
                _ => {
                    return Err(AppError::ValidationFailed(format!(
                        "missing value for language '{lang}'"
                    )));
                }
            }
        }

        let rows: Vec<NewContentRow<'_>> = Language::codes()
            .iter()
            .map(|lang| NewContentRow {
                section,
                key,
                lang,
                value: &values[*lang],
            })
            .collect();

        let insert_result = self.store.insert(CONTENT_TABLE, &rows).await;
        if let Err(e) = self.fetch_all().await {
            warn!("Refetch after add failed: {}", e);
        }

        insert_result?;
        info!("Added entry {}/{}", section, key);
        Ok(())
    }

    /// Delete every persisted row of an entry across all languages. Rows
    /// without an id are skipped (nothing to delete). Refetches afterward.
    pub async fn delete_entry(&mut self, section: &str, key: &str) -> AppResult<()> {
        let ids: Vec<String> = self
            .content
            .iter()
            .filter(|item| item.section == section && item.key == key)
            .filter_map(|item| item.id.clone())
            .collect();

        for id in &ids {
            self.store.delete(CONTENT_TABLE, id).await?;
        }

        self.fetch_all().await?;
        info!("Deleted entry {}/{} ({} rows)", section, key, ids.len());
        Ok(())
    }

    /// Rename a key in place for every row of an entry. There is no
    /// collision check against an existing key in the same section; a
    /// collision merges the language cells under the target key after the
    /// refetch, so it is logged loudly.
    pub async fn rename_key(&mut self, section: &str, old_key: &str, new_key: &str) -> AppResult<()> {
        let new_key = new_key.trim();
        if new_key.is_empty() {
            return Err(AppError::ValidationFailed(
                "new key must not be empty".to_string(),
            ));
        }
        if self
            .grouped
            .get(section)
            .is_some_and(|keys| keys.contains_key(new_key))
        {
            warn!(
                "Renaming {}/{} onto existing key '{}'; entries will merge",
                section, old_key, new_key
            );
        }

        let ids: Vec<String> = self
            .content
            .iter()
            .filter(|item| item.section == section && item.key == old_key)
            .filter_map(|item| item.id.clone())
            .collect();

        for id in &ids {
            self.store
                .update(CONTENT_TABLE, id, &json!({ "key": new_key }))
                .await?;
        }

        self.fetch_all().await?;
        info!("Renamed {}/{} -> {}", section, old_key, new_key);
        Ok(())
    }

    /// Save every cell of a section: persisted cells go into one batched
    /// upsert, unsaved cells into one batched insert. The two batches are
    /// attempted independently, and the repository refetches regardless of
    /// partial failure so callers always see true store state.
    pub async fn bulk_save(&mut self, section: &str) -> AppResult<()> {
        let mut updates: Vec<(String, String)> = Vec::new();
        let mut inserts: Vec<ContentItem> = Vec::new();

        if let Some(keys) = self.grouped.get(section) {
            for cells in keys.values() {
                for item in cells.values() {
                    match &item.id {
                        Some(id) => updates.push((id.clone(), item.value.clone())),
                        None => inserts.push(item.clone()),
                    }
                }
            }
        }

        let mut failures = Vec::new();

        if !updates.is_empty() {
            let batch: Vec<ValuePatch<'_>> = updates
                .iter()
                .map(|(id, value)| ValuePatch { id, value })
                .collect();
            if let Err(e) = self.store.upsert(CONTENT_TABLE, &batch).await {
                warn!("Bulk update batch failed for '{}': {}", section, e);
                failures.push(e);
            }
        }

        if !inserts.is_empty() {
            let batch: Vec<NewContentRow<'_>> = inserts
                .iter()
                .map(|item| NewContentRow {
                    section: &item.section,
                    key: &item.key,
                    lang: &item.lang,
                    value: &item.value,
                })
                .collect();
            if let Err(e) = self.store.insert(CONTENT_TABLE, &batch).await {
                warn!("Bulk insert batch failed for '{}': {}", section, e);
                failures.push(e);
            }
        }

        if let Err(e) = self.fetch_all().await {
            warn!("Refetch after bulk save failed: {}", e);
        }

        match failures.into_iter().next() {
            None => {
                info!("Bulk-saved section '{}'", section);
                Ok(())
            }
            Some(first) => Err(first),
        }
    }

    /// Register a section name for the session. The section persists in
    /// memory even with zero content rows.
    pub fn add_section(&mut self, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationFailed(
                "section name must not be empty".to_string(),
            ));
        }
        if self.sections.iter().any(|s| s == name) {
            return Err(AppError::ValidationFailed("section already exists".to_string()));
        }
        self.sections.push(name.to_string());
        info!("Registered section '{}'", name);
        Ok(())
    }
}
