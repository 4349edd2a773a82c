//! JSON model-file backend.
//!
//! Models live either on disk (one pretty-printed `ModelDocument` per file)
//! or in a shared in-memory map. Both share a lock registry: a model file can
//! be held by one session at a time, as the real engine enforces.

use crate::error::{EngineError, EngineResult};
use crate::model::ModelDocument;
use crate::session::{EngineSession, SessionFactory};
use crate::types::{BoundaryTable, ComponentValues, GeometryMap, ParameterMap, RunResult, UnitSystem};
use pn_core::{ComponentKind, SettingKey, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Extension of model files written by this backend.
pub const MODEL_EXTENSION: &str = "pnm";

type MemoryModels = Arc<Mutex<HashMap<PathBuf, ModelDocument>>>;
type LockRegistry = Arc<Mutex<HashSet<PathBuf>>>;

#[derive(Debug, Clone)]
enum Storage {
    Disk,
    Memory(MemoryModels),
}

impl Storage {
    fn load(&self, path: &Path) -> EngineResult<ModelDocument> {
        match self {
            Storage::Disk => {
                let content = fs::read_to_string(path).map_err(|e| EngineError::Open {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                serde_json::from_str(&content).map_err(|source| EngineError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Storage::Memory(models) => models
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(path)
                .cloned()
                .ok_or_else(|| EngineError::Open {
                    path: path.to_path_buf(),
                    reason: "model file does not exist".to_string(),
                }),
        }
    }

    fn store(&self, path: &Path, doc: &ModelDocument) -> EngineResult<()> {
        match self {
            Storage::Disk => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent).map_err(|source| EngineError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                }
                let json = serde_json::to_string_pretty(doc).map_err(|source| EngineError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
                fs::write(path, json).map_err(|e| EngineError::Save {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            Storage::Memory(models) => {
                models
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(path.to_path_buf(), doc.clone());
                Ok(())
            }
        }
    }

    fn remove(&self, path: &Path) -> EngineResult<()> {
        match self {
            Storage::Disk => fs::remove_file(path).map_err(|source| EngineError::Io {
                path: path.to_path_buf(),
                source,
            }),
            Storage::Memory(models) => models
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| EngineError::NotFound {
                    path: path.to_path_buf(),
                    name: path.display().to_string(),
                }),
        }
    }

    fn list(&self, folder: &Path, extension: &str) -> EngineResult<Vec<PathBuf>> {
        let has_ext = |p: &Path| p.extension().is_some_and(|e| e == extension);
        let mut out: Vec<PathBuf> = match self {
            Storage::Disk => {
                let entries = fs::read_dir(folder).map_err(|source| EngineError::Io {
                    path: folder.to_path_buf(),
                    source,
                })?;
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && has_ext(p))
                    .collect()
            }
            Storage::Memory(models) => models
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .filter(|p| p.parent() == Some(folder) && has_ext(p))
                .cloned()
                .collect(),
        };
        out.sort();
        Ok(out)
    }
}

fn lock_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Opens `JsonModelSession`s.
#[derive(Debug, Clone)]
pub struct JsonModelFactory {
    storage: Storage,
    locks: LockRegistry,
}

impl JsonModelFactory {
    /// Models are files on disk.
    pub fn disk() -> Self {
        Self {
            storage: Storage::Disk,
            locks: LockRegistry::default(),
        }
    }

    /// Models live in memory, shared by every clone of the factory.
    pub fn in_memory() -> Self {
        Self {
            storage: Storage::Memory(MemoryModels::default()),
            locks: LockRegistry::default(),
        }
    }

    pub fn load_document(&self, path: &Path) -> EngineResult<ModelDocument> {
        self.storage.load(path)
    }

    pub fn store_document(&self, path: &Path, doc: &ModelDocument) -> EngineResult<()> {
        self.storage.store(path, doc)
    }

    pub fn is_locked(&self, path: &Path) -> bool {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&lock_key(path))
    }

    fn acquire(&self, path: &Path) -> EngineResult<()> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if !locks.insert(lock_key(path)) {
            return Err(EngineError::Locked {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl SessionFactory for JsonModelFactory {
    fn open(&self, path: &Path, units: UnitSystem) -> EngineResult<Box<dyn EngineSession>> {
        self.acquire(path)?;
        let doc = match self.storage.load(path) {
            Ok(doc) => doc,
            Err(e) => {
                release(&self.locks, path);
                return Err(e);
            }
        };
        if doc.units != units {
            tracing::debug!(model = %path.display(), stored = ?doc.units, requested = ?units, "opening in a different unit system");
        }
        Ok(Box::new(JsonModelSession {
            path: path.to_path_buf(),
            units,
            doc,
            conditions: None,
            storage: self.storage.clone(),
            locks: Arc::clone(&self.locks),
            open: true,
        }))
    }

    fn duplicate(&self, src: &Path, dst: &Path) -> EngineResult<()> {
        if self.is_locked(dst) {
            return Err(EngineError::Locked {
                path: dst.to_path_buf(),
            });
        }
        let doc = self.storage.load(src)?;
        self.storage.store(dst, &doc)?;
        tracing::debug!(from = %src.display(), to = %dst.display(), "model duplicated");
        Ok(())
    }

    fn remove(&self, path: &Path) -> EngineResult<()> {
        if self.is_locked(path) {
            return Err(EngineError::Locked {
                path: path.to_path_buf(),
            });
        }
        self.storage.remove(path)?;
        tracing::debug!(model = %path.display(), "model removed");
        Ok(())
    }

    fn list_models(&self, folder: &Path) -> EngineResult<Vec<PathBuf>> {
        self.storage.list(folder, MODEL_EXTENSION)
    }

    fn model_extension(&self) -> &str {
        MODEL_EXTENSION
    }
}

fn release(locks: &LockRegistry, path: &Path) {
    locks
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&lock_key(path));
}

/// A model held open by the JSON backend.
///
/// Boundary conditions are cached on first read and only refreshed by
/// `reset_conditions`, so parameter changes stay invisible to
/// `get_conditions` until the caller resets.
#[derive(Debug)]
pub struct JsonModelSession {
    path: PathBuf,
    units: UnitSystem,
    doc: ModelDocument,
    conditions: Option<BoundaryTable>,
    storage: Storage,
    locks: LockRegistry,
    open: bool,
}

impl JsonModelSession {
    fn ensure_open(&self) -> EngineResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(EngineError::Closed {
                path: self.path.clone(),
            })
        }
    }

    pub fn document(&self) -> &ModelDocument {
        &self.doc
    }
}

impl EngineSession for JsonModelSession {
    fn model_path(&self) -> &Path {
        &self.path
    }

    fn units(&self) -> UnitSystem {
        self.units
    }

    fn get_values(
        &self,
        kind: Option<ComponentKind>,
        parameters: Option<&[String]>,
    ) -> EngineResult<ParameterMap> {
        self.ensure_open()?;
        self.doc.values(&self.path, kind, parameters)
    }

    fn set_values(&mut self, values: &ParameterMap) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.set_values(&self.path, values)
    }

    fn get_geometry(&self, flowlines: Option<&[String]>) -> EngineResult<GeometryMap> {
        self.ensure_open()?;
        self.doc.geometry_of(&self.path, flowlines)
    }

    fn set_geometry(&mut self, geometry: &GeometryMap) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.set_geometry(&self.path, geometry)
    }

    fn find(&self, kind: ComponentKind, name: &str) -> EngineResult<bool> {
        self.ensure_open()?;
        Ok(self.doc.kind_of(name) == Some(kind))
    }

    fn add(
        &mut self,
        kind: ComponentKind,
        name: &str,
        parameters: Option<&ComponentValues>,
    ) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.add_component(&self.path, kind, name, parameters)
    }

    fn connect(&mut self, from: &str, to: &str) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.connect(&self.path, from, to)
    }

    fn validate(&self) -> EngineResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.doc.validate())
    }

    fn run(
        &mut self,
        system_variables: &[String],
        profile_variables: &[String],
    ) -> EngineResult<RunResult> {
        self.ensure_open()?;
        self.doc.run(&self.path, system_variables, profile_variables)
    }

    fn get_conditions(&mut self) -> EngineResult<BoundaryTable> {
        self.ensure_open()?;
        let table = self
            .conditions
            .get_or_insert_with(|| self.doc.boundary_table());
        Ok(table.clone())
    }

    fn set_conditions(&mut self, boundaries: &BoundaryTable) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.apply_boundaries(&self.path, boundaries)?;
        self.conditions = Some(self.doc.boundary_table());
        Ok(())
    }

    fn reset_conditions(&mut self) -> EngineResult<bool> {
        self.ensure_open()?;
        self.conditions = None;
        Ok(true)
    }

    fn set_setting(&mut self, key: SettingKey, value: &Value) -> EngineResult<()> {
        self.ensure_open()?;
        self.doc.set_setting(key, value);
        Ok(())
    }

    fn save(&mut self, path: Option<&Path>) -> EngineResult<PathBuf> {
        self.ensure_open()?;
        let target = path.map_or_else(|| self.path.clone(), Path::to_path_buf);
        if lock_key(&target) != lock_key(&self.path) {
            let held = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&lock_key(&target));
            if held {
                return Err(EngineError::Locked { path: target });
            }
        }
        self.doc.units = self.units;
        self.storage.store(&target, &self.doc)?;
        tracing::debug!(model = %target.display(), "model saved");
        Ok(target)
    }

    fn close(&mut self) -> EngineResult<()> {
        if self.open {
            self.open = false;
            release(&self.locks, &self.path);
        }
        Ok(())
    }
}

impl Drop for JsonModelSession {
    fn drop(&mut self) {
        if self.open {
            release(&self.locks, &self.path);
        }
    }
}
