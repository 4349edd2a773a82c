//! Engine session contract.

use crate::error::EngineResult;
use crate::types::{BoundaryTable, ComponentValues, GeometryMap, ParameterMap, RunResult, UnitSystem};
use pn_core::{ComponentKind, SettingKey, Value};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// An open model in the simulation engine.
///
/// All calls are synchronous and may block for a long time (`run` in
/// particular); never drive a session from an interactive thread.
pub trait EngineSession: Send {
    fn model_path(&self) -> &Path;

    fn units(&self) -> UnitSystem;

    /// Current values per component, for one kind or for every kind.
    ///
    /// `parameters` restricts the returned parameter names. A kind the model
    /// has no context for yields `EngineError::UnsupportedContext`.
    fn get_values(
        &self,
        kind: Option<ComponentKind>,
        parameters: Option<&[String]>,
    ) -> EngineResult<ParameterMap>;

    fn set_values(&mut self, values: &ParameterMap) -> EngineResult<()>;

    /// Profiles of the named flowlines, or of every flowline that has one.
    fn get_geometry(&self, flowlines: Option<&[String]>) -> EngineResult<GeometryMap>;

    fn set_geometry(&mut self, geometry: &GeometryMap) -> EngineResult<()>;

    fn find(&self, kind: ComponentKind, name: &str) -> EngineResult<bool>;

    fn add(
        &mut self,
        kind: ComponentKind,
        name: &str,
        parameters: Option<&ComponentValues>,
    ) -> EngineResult<()>;

    fn connect(&mut self, from: &str, to: &str) -> EngineResult<()>;

    /// Model validation messages; empty when the model may run.
    fn validate(&self) -> EngineResult<Vec<String>>;

    fn run(
        &mut self,
        system_variables: &[String],
        profile_variables: &[String],
    ) -> EngineResult<RunResult>;

    /// Boundary conditions as last observed by the engine.
    ///
    /// Parameter and setting changes are only visible here after
    /// `reset_conditions`.
    fn get_conditions(&mut self) -> EngineResult<BoundaryTable>;

    fn set_conditions(&mut self, boundaries: &BoundaryTable) -> EngineResult<()>;

    fn reset_conditions(&mut self) -> EngineResult<bool>;

    /// Assign a global simulation setting.
    fn set_setting(&mut self, key: SettingKey, value: &Value) -> EngineResult<()>;

    /// Save in place (`None`) or as a new file. Returns the path written.
    fn save(&mut self, path: Option<&Path>) -> EngineResult<PathBuf>;

    /// Release the model. Safe to call more than once.
    fn close(&mut self) -> EngineResult<()>;
}

/// Opens engine sessions on model files.
pub trait SessionFactory: Send + Sync {
    fn open(&self, path: &Path, units: UnitSystem) -> EngineResult<Box<dyn EngineSession>>;

    /// Copy a model file without opening a session on it.
    fn duplicate(&self, src: &Path, dst: &Path) -> EngineResult<()>;

    /// Delete a model file no session holds.
    fn remove(&self, path: &Path) -> EngineResult<()>;

    /// Model files directly inside `folder`, sorted by path.
    fn list_models(&self, folder: &Path) -> EngineResult<Vec<PathBuf>>;

    /// File extension of model files, without the dot.
    fn model_extension(&self) -> &str;
}

/// Owns a session and closes it when dropped.
///
/// Every case opens its session through a guard so the model handle is
/// released on every exit path.
pub struct SessionGuard {
    session: Box<dyn EngineSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn EngineSession>) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn open(factory: &dyn SessionFactory, path: &Path, units: UnitSystem) -> EngineResult<Self> {
        let session = factory.open(path, units)?;
        tracing::debug!(model = %path.display(), ?units, "session opened");
        Ok(Self::new(session))
    }

    /// Close explicitly and surface the error, if any.
    pub fn close(mut self) -> EngineResult<()> {
        self.closed = true;
        self.session.close()
    }
}

impl Deref for SessionGuard {
    type Target = dyn EngineSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let path = self.session.model_path().to_path_buf();
        match self.session.close() {
            Ok(()) => tracing::debug!(model = %path.display(), "session closed on drop"),
            Err(e) => tracing::warn!(model = %path.display(), error = %e, "failed to close session"),
        }
    }
}
