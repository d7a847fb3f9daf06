//! Named configuration presets persisted in a key-value store.
//!
//! The collection is stored as a JSON array under `labelPresets` and the
//! current preset name as a plain string under `labelLastPreset`. A preset
//! named "Default" is always present and cannot be deleted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LabelConfig;
use crate::consts::{DEFAULT_PRESET, EXPORT_VERSION, FALLBACK_PRESET_NAME, LAST_PRESET_KEY, PRESETS_KEY};
use crate::error::{LabelError, LabelResult};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub config: LabelConfig,
}

impl Preset {
    pub fn new(name: impl Into<String>, config: LabelConfig) -> Self {
        Preset { name: name.into(), config }
    }

    pub fn default_preset() -> Self {
        Preset::new(DEFAULT_PRESET, LabelConfig::default())
    }
}

/// Presets in insertion order with unique names, plus the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetCollection {
    presets: Vec<Preset>,
    current: String,
}

impl Default for PresetCollection {
    fn default() -> Self {
        PresetCollection {
            presets: vec![Preset::default_preset()],
            current: DEFAULT_PRESET.to_string(),
        }
    }
}

impl PresetCollection {
    /// Build from raw presets: duplicate names keep the first entry, an empty
    /// list becomes `[Default]`, and a missing Default is prepended. The
    /// current preset is `preferred` if present, else the first one.
    fn from_presets(presets: Vec<Preset>, preferred: Option<&str>) -> Self {
        let mut unique: Vec<Preset> = Vec::with_capacity(presets.len() + 1);
        for preset in presets {
            if unique.iter().any(|p| p.name == preset.name) {
                warn!(name = %preset.name, "Dropping duplicate preset");
                continue;
            }
            unique.push(preset);
        }
        if !unique.iter().any(|p| p.name == DEFAULT_PRESET) {
            unique.insert(0, Preset::default_preset());
        }

        let current = preferred
            .filter(|name| unique.iter().any(|p| p.name == *name))
            .unwrap_or(&unique[0].name)
            .to_string();
        PresetCollection { presets: unique, current }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &Preset {
        self.get(&self.current).unwrap_or(&self.presets[0])
    }
}

#[derive(Serialize)]
struct ExportFile<'a> {
    presets: &'a [Preset],
    #[serde(rename = "lastPreset")]
    last_preset: &'a str,
    version: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PresetFile {
    Bare(Vec<Preset>),
    Export {
        presets: Vec<Preset>,
        #[serde(rename = "lastPreset", default)]
        last_preset: Option<String>,
    },
}

/// Preset CRUD over an injected key-value store. Every mutation is written
/// back before returning.
pub struct PresetStore<S: KeyValueStore> {
    store: S,
    presets: PresetCollection,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Load presets from `store`, falling back to a lone Default preset when
    /// storage is empty or unreadable.
    pub fn load(store: S) -> Self {
        let stored = store
            .get(PRESETS_KEY)
            .and_then(|raw| match serde_json::from_str::<Vec<Preset>>(&raw) {
                Ok(presets) => Some(presets),
                Err(e) => {
                    warn!(error = %e, "Stored presets are unreadable, using Default");
                    None
                }
            })
            .unwrap_or_default();
        let last = store.get(LAST_PRESET_KEY);

        let presets = PresetCollection::from_presets(stored, Some(last.as_deref().unwrap_or(DEFAULT_PRESET)));
        info!(count = presets.len(), current = %presets.current_name(), "Loaded presets");
        PresetStore { store, presets }
    }

    pub fn presets(&self) -> &PresetCollection {
        &self.presets
    }

    pub fn current(&self) -> &Preset {
        self.presets.current()
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn write(store: &mut S, presets: &PresetCollection) -> LabelResult<()> {
        let json = serde_json::to_string(&presets.presets)?;
        store.set(PRESETS_KEY, &json)?;
        store.set(LAST_PRESET_KEY, &presets.current)
    }

    /// Write `next` to storage, then adopt it. If either key fails to write,
    /// the previous collection is written back and kept in memory.
    fn commit(&mut self, next: PresetCollection) -> LabelResult<()> {
        if let Err(e) = Self::write(&mut self.store, &next) {
            if let Err(restore) = Self::write(&mut self.store, &self.presets) {
                warn!(error = %restore, "Could not restore stored presets");
            }
            return Err(e);
        }
        self.presets = next;
        Ok(())
    }

    /// Upsert `config` under `name` and make it current. A blank name reuses
    /// the current preset's name.
    pub fn save(&mut self, config: LabelConfig, name: &str) -> LabelResult<&Preset> {
        config.validate()?;

        let mut name = name.trim().to_string();
        if name.is_empty() {
            name = if self.presets.current.is_empty() {
                FALLBACK_PRESET_NAME.to_string()
            } else {
                self.presets.current.clone()
            };
        }

        let mut next = self.presets.clone();
        let preset = Preset::new(name.clone(), config);
        match next.presets.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = preset,
            None => next.presets.push(preset),
        }
        next.current = name;
        self.commit(next)?;

        info!(name = %self.presets.current, "Saved preset");
        Ok(self.presets.current())
    }

    /// Make `name` the current preset.
    pub fn select(&mut self, name: &str) -> LabelResult<&Preset> {
        if !self.presets.contains(name) {
            return Err(LabelError::UnknownPreset(name.to_string()));
        }
        self.store.set(LAST_PRESET_KEY, name)?;
        self.presets.current = name.to_string();
        Ok(self.presets.current())
    }

    /// Remove `name`. Deleting "Default" does nothing. Deleting the current
    /// preset selects Default, else the first remaining preset, else a fresh
    /// Default. Returns the current preset afterwards.
    pub fn delete(&mut self, name: &str) -> LabelResult<&Preset> {
        if name == DEFAULT_PRESET {
            return Ok(self.presets.current());
        }
        if !self.presets.contains(name) {
            return Err(LabelError::UnknownPreset(name.to_string()));
        }

        let mut next = self.presets.clone();
        next.presets.retain(|p| p.name != name);
        if next.presets.is_empty() {
            next.presets.push(Preset::default_preset());
        }
        if next.current == name {
            next.current = next
                .get(DEFAULT_PRESET)
                .unwrap_or(&next.presets[0])
                .name
                .clone();
        }
        self.commit(next)?;

        info!(deleted = name, current = %self.presets.current, "Deleted preset");
        Ok(self.presets.current())
    }

    /// Pretty JSON `{presets, lastPreset, version}`.
    pub fn export(&self) -> LabelResult<String> {
        let file = ExportFile {
            presets: &self.presets.presets,
            last_preset: &self.presets.current,
            version: EXPORT_VERSION,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn export_file(&self, path: impl AsRef<Path>) -> LabelResult<()> {
        fs::write(path.as_ref(), self.export()?)?;
        info!(path = %path.as_ref().display(), "Exported presets");
        Ok(())
    }

    /// Replace the collection with the presets in `blob`, either a bare
    /// array or an export object. Malformed input leaves everything as is.
    pub fn import(&mut self, blob: &str) -> LabelResult<&PresetCollection> {
        let value: serde_json::Value = serde_json::from_str(blob)
            .map_err(|e| LabelError::InvalidPresetFile(format!("not valid JSON: {}", e)))?;
        let (presets, last_preset) = match serde_json::from_value::<PresetFile>(value) {
            Ok(PresetFile::Bare(presets)) => (presets, None),
            Ok(PresetFile::Export { presets, last_preset }) => (presets, last_preset),
            Err(_) => {
                return Err(LabelError::InvalidPresetFile(
                    "expected a preset array or an object with a \"presets\" array".into(),
                ));
            }
        };
        for preset in &presets {
            preset.config.validate().map_err(|e| {
                LabelError::InvalidPresetFile(format!("preset '{}': {}", preset.name, e))
            })?;
        }

        let preferred = last_preset
            .filter(|name| !name.is_empty())
            .or_else(|| self.store.get(LAST_PRESET_KEY))
            .unwrap_or_else(|| DEFAULT_PRESET.to_string());
        let collection = PresetCollection::from_presets(presets, Some(&preferred));

        self.commit(collection)?;
        info!(count = self.presets.len(), current = %self.presets.current, "Imported presets");
        Ok(&self.presets)
    }

    pub fn import_file(&mut self, path: impl AsRef<Path>) -> LabelResult<&PresetCollection> {
        let blob = fs::read_to_string(path.as_ref())?;
        self.import(&blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodeType, Paper, TextPosition};
    use crate::store::MemoryStore;

    fn vials() -> LabelConfig {
        LabelConfig {
            columns: 5,
            margin_h: 7.5,
            paper: Paper::Letter,
            code_type: CodeType::Qrcode,
            text_position: TextPosition::Bottom,
            replicates: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_store_loads_default() {
        let store = PresetStore::load(MemoryStore::new());
        let names: Vec<_> = store.presets().names().collect();
        assert_eq!(names, vec!["Default"]);
        assert_eq!(store.current().config, LabelConfig::default());
    }

    #[test]
    fn test_corrupt_store_loads_default() {
        let mut kv = MemoryStore::new();
        kv.set(PRESETS_KEY, "[{\"name\": 1}").unwrap();
        let store = PresetStore::load(kv);
        assert_eq!(store.presets().len(), 1);
        assert_eq!(store.current().name, "Default");
    }

    #[test]
    fn test_save_roundtrip_through_storage() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "  Vials ").unwrap();

        let reloaded = PresetStore::load(store.into_inner());
        assert_eq!(reloaded.current().name, "Vials");
        assert_eq!(reloaded.current().config, vials());
        let names: Vec<_> = reloaded.presets().names().collect();
        assert_eq!(names, vec!["Default", "Vials"]);
    }

    #[test]
    fn test_save_overwrites_in_place() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        store.save(LabelConfig::default(), "Tubes").unwrap();
        store.save(LabelConfig { columns: 2, ..vials() }, "Vials").unwrap();

        let names: Vec<_> = store.presets().names().collect();
        assert_eq!(names, vec!["Default", "Vials", "Tubes"]);
        assert_eq!(store.presets().get("Vials").unwrap().config.columns, 2);
    }

    #[test]
    fn test_blank_name_reuses_current() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        let saved = store.save(LabelConfig::default(), "   ").unwrap();
        assert_eq!(saved.name, "Vials");
        assert_eq!(store.presets().len(), 2);
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let mut store = PresetStore::load(MemoryStore::new());
        let bad = LabelConfig { replicates: 0, ..Default::default() };
        assert!(store.save(bad, "Bad").is_err());
        assert!(!store.presets().contains("Bad"));
    }

    #[test]
    fn test_default_cannot_be_deleted() {
        let mut store = PresetStore::load(MemoryStore::new());
        let current = store.delete("Default").unwrap();
        assert_eq!(current.name, "Default");
        assert!(store.presets().contains("Default"));
    }

    #[test]
    fn test_delete_current_falls_back_to_default() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        let current = store.delete("Vials").unwrap();
        assert_eq!(current.name, "Default");

        let kv = store.into_inner();
        assert_eq!(kv.get(LAST_PRESET_KEY).as_deref(), Some("Default"));
        assert!(!kv.get(PRESETS_KEY).unwrap().contains("Vials"));
    }

    #[test]
    fn test_delete_falls_back_to_first_without_default() {
        // Default is prepended on load, so build a collection without it directly
        let mut store = PresetStore::load(MemoryStore::new());
        store.presets = PresetCollection {
            presets: vec![Preset::new("A", vials()), Preset::new("B", vials())],
            current: "B".into(),
        };
        assert_eq!(store.delete("B").unwrap().name, "A");

        store.presets = PresetCollection {
            presets: vec![Preset::new("Only", vials())],
            current: "Only".into(),
        };
        let current = store.delete("Only").unwrap();
        assert_eq!(current.name, "Default");
        assert_eq!(current.config, LabelConfig::default());
    }

    #[test]
    fn test_delete_other_keeps_current() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        store.save(vials(), "Tubes").unwrap();
        assert_eq!(store.delete("Vials").unwrap().name, "Tubes");
    }

    #[test]
    fn test_delete_unknown_is_error() {
        let mut store = PresetStore::load(MemoryStore::new());
        assert!(matches!(store.delete("Nope"), Err(LabelError::UnknownPreset(_))));
    }

    #[test]
    fn test_select_records_last_used() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        store.select("Default").unwrap();
        assert!(store.select("Missing").is_err());
        assert_eq!(store.current().name, "Default");
        assert_eq!(store.into_inner().get(LAST_PRESET_KEY).as_deref(), Some("Default"));
    }

    #[test]
    fn test_export_format() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        let json: serde_json::Value = serde_json::from_str(&store.export().unwrap()).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["lastPreset"], "Vials");
        assert_eq!(json["presets"][1]["name"], "Vials");
        assert_eq!(json["presets"][1]["columns"], 5);
        assert_eq!(json["presets"][1]["textPosition"], "bottom");
    }

    #[test]
    fn test_import_bare_array_prepends_default() {
        let mut store = PresetStore::load(MemoryStore::new());
        let blob = serde_json::to_string(&vec![Preset::new("Vials", vials())]).unwrap();
        let presets = store.import(&blob).unwrap();
        let names: Vec<_> = presets.names().collect();
        assert_eq!(names, vec!["Default", "Vials"]);
        assert_eq!(presets.current_name(), "Default");
    }

    #[test]
    fn test_import_export_object_selects_last_preset() {
        let mut source = PresetStore::load(MemoryStore::new());
        source.save(vials(), "Vials").unwrap();
        source.save(LabelConfig::default(), "Tubes").unwrap();
        source.select("Vials").unwrap();
        let blob = source.export().unwrap();

        let mut target = PresetStore::load(MemoryStore::new());
        target.import(&blob).unwrap();
        assert_eq!(target.current().name, "Vials");
        assert_eq!(target.current().config, vials());

        let reloaded = PresetStore::load(target.into_inner());
        assert_eq!(reloaded.presets().len(), 3);
        assert_eq!(reloaded.current().name, "Vials");
    }

    #[test]
    fn test_import_unknown_last_preset_uses_first() {
        let mut store = PresetStore::load(MemoryStore::new());
        let blob = serde_json::json!({
            "presets": [Preset::new("Default", vials()), Preset::new("X", vials())],
            "lastPreset": "Gone"
        });
        store.import(&blob.to_string()).unwrap();
        assert_eq!(store.current().name, "Default");
    }

    #[test]
    fn test_import_malformed_leaves_state_unchanged() {
        let mut store = PresetStore::load(MemoryStore::new());
        store.save(vials(), "Vials").unwrap();
        let before = store.presets().clone();

        for blob in ["not json", "{\"foo\": 1}", "[{\"name\": \"x\"}]", "42"] {
            assert!(matches!(store.import(blob), Err(LabelError::InvalidPresetFile(_))), "{}", blob);
        }
        let bad_columns = serde_json::json!([{ "name": "Z", "columns": 0, "marginH": 1, "marginV": 1,
            "paddingH": 1, "paddingV": 1, "fontSize": 8, "codeSizeMm": 8, "dpi": 100,
            "paper": "A4", "codeType": "qrcode", "textPosition": "top" }]);
        assert!(store.import(&bad_columns.to_string()).is_err());

        assert_eq!(store.presets(), &before);
        let reloaded = PresetStore::load(store.into_inner());
        assert_eq!(reloaded.presets(), &before);
    }

    /// Memory store that refuses writes to one key once armed.
    struct FlakyStore {
        inner: MemoryStore,
        failing_key: Option<&'static str>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> LabelResult<()> {
            if self.failing_key == Some(key) {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set(key, value)
        }
    }

    fn flaky_store_with_vials() -> PresetStore<FlakyStore> {
        let mut store = PresetStore::load(FlakyStore { inner: MemoryStore::new(), failing_key: None });
        store.save(vials(), "Vials").unwrap();
        store.store.failing_key = Some(LAST_PRESET_KEY);
        store
    }

    fn assert_storage_matches(store: PresetStore<FlakyStore>, expected: &PresetCollection) {
        let reloaded = PresetStore::load(store.into_inner().inner);
        assert_eq!(reloaded.presets(), expected);
    }

    #[test]
    fn test_failed_import_write_keeps_storage_unchanged() {
        let mut store = flaky_store_with_vials();
        let before = store.presets().clone();

        let blob = serde_json::to_string(&vec![Preset::new("X", vials())]).unwrap();
        assert!(matches!(store.import(&blob), Err(LabelError::Io(_))));

        assert_eq!(store.presets(), &before);
        let stored = store.store.get(PRESETS_KEY).unwrap();
        assert!(!stored.contains("\"X\""));
        assert_storage_matches(store, &before);
    }

    #[test]
    fn test_failed_save_write_keeps_memory_and_storage_in_sync() {
        let mut store = flaky_store_with_vials();
        let before = store.presets().clone();

        assert!(store.save(LabelConfig::default(), "Tubes").is_err());
        assert_eq!(store.presets(), &before);
        assert!(!store.presets().contains("Tubes"));
        assert_storage_matches(store, &before);
    }

    #[test]
    fn test_failed_delete_write_keeps_preset() {
        let mut store = flaky_store_with_vials();
        let before = store.presets().clone();

        assert!(store.delete("Vials").is_err());
        assert_eq!(store.current().name, "Vials");
        assert_storage_matches(store, &before);
    }

    #[test]
    fn test_failed_select_write_keeps_current() {
        let mut store = flaky_store_with_vials();
        assert!(store.select("Default").is_err());
        assert_eq!(store.current().name, "Vials");
    }
}
