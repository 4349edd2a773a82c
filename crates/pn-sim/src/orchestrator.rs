//! Case execution against the engine.
//!
//! Every mutating flow opens its own session through a `SessionGuard`, so the
//! model handle is released on every exit path, and saves to a new file
//! instead of the template.

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::global::GlobalConditions;
use crate::manifest::MatrixReport;
use crate::reshape::{reshape_nodes, reshape_profiles};
use crate::stage::{CaseOutcome, CaseRecord, CaseStage};
use pn_cases::{ActivationMask, CaseKey, CaseMatrix, CasePlan, ResolvedCases};
use pn_core::{ComponentKind, Table, Value, params};
use pn_engine::{
    BoundaryTable, ComponentValues, EngineSession, GeometryMap, ParameterMap, RunResult,
    SessionFactory, SessionGuard,
};
use pn_tables::{CellRef, TabularDataSource};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Result sheets start one row down, leaving row 1 for a title.
pub const RESULTS_ANCHOR: CellRef = CellRef::A2;

/// Progress of a case matrix.
#[derive(Debug, Clone)]
pub enum MatrixEvent {
    Started { total: usize, workers: usize },
    CaseFinished { record: CaseRecord, done: usize, total: usize },
    Finished { succeeded: usize, failed: usize, cancelled: usize },
}

/// What `copy_flowline_data` touched.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub updated: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseMode {
    /// Full case: validate, run, write results, save the variant.
    Run,
    /// Only author and save the variant.
    Build,
}

pub struct SimulationOrchestrator<'a> {
    factory: &'a dyn SessionFactory,
    results: &'a dyn TabularDataSource,
    config: SimulationConfig,
    global: GlobalConditions,
}

impl<'a> SimulationOrchestrator<'a> {
    /// Conversion tables are checked here so a bad unit fails before any run.
    pub fn new(
        factory: &'a dyn SessionFactory,
        results: &'a dyn TabularDataSource,
        config: SimulationConfig,
    ) -> SimResult<Self> {
        config.node_conversions.validate()?;
        config.profile_conversions.validate()?;
        Ok(Self {
            factory,
            results,
            config,
            global: GlobalConditions::default(),
        })
    }

    pub fn with_global_conditions(mut self, global: GlobalConditions) -> Self {
        self.global = global;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Path of the variant `base` is saved to for `key`.
    pub fn variant_path(&self, base: &Path, key: &CaseKey) -> PathBuf {
        self.config.models_dir.join(key.model_file_name(&file_name(base)))
    }

    /// Drive one case from open to close.
    pub fn run_case(&self, base: &Path, plan: &CasePlan) -> CaseOutcome {
        self.execute(base, base, plan, CaseMode::Run)
    }

    /// Author and save a case's model variant without running it.
    pub fn build_case_model(&self, base: &Path, plan: &CasePlan) -> CaseOutcome {
        self.execute(base, base, plan, CaseMode::Build)
    }

    /// Run a case on a private copy of the template, for pooled execution.
    fn run_staged(&self, base: &Path, plan: &CasePlan) -> CaseOutcome {
        let variant = self.variant_path(base, &plan.key);
        if let Err(e) = self.factory.duplicate(base, &variant) {
            return finish(plan.key.clone(), CaseStage::Pending, Err(e.into()));
        }
        let outcome = self.execute(base, &variant, plan, CaseMode::Run);
        if outcome.error.is_some() {
            // only saved cases leave a variant behind
            if let Err(e) = self.factory.remove(&variant) {
                tracing::warn!(case = %plan.key, model = %variant.display(), error = %e, "staged copy not removed");
            }
        }
        outcome
    }

    fn execute(&self, base: &Path, open: &Path, plan: &CasePlan, mode: CaseMode) -> CaseOutcome {
        let mut stage = CaseStage::Pending;
        let result = self.drive(base, open, plan, mode, &mut stage);
        finish(plan.key.clone(), stage, result)
    }

    fn drive(
        &self,
        base: &Path,
        open: &Path,
        plan: &CasePlan,
        mode: CaseMode,
        stage: &mut CaseStage,
    ) -> SimResult<PathBuf> {
        let label = plan.key.label();
        let mut session = SessionGuard::open(self.factory, open, self.config.units)?;
        *stage = CaseStage::Opened;

        let initial = session.get_conditions()?;
        *stage = CaseStage::BoundaryConditionsFetched;
        tracing::debug!(case = %label, nodes = initial.node_names().count(), "boundary conditions fetched");

        self.global.apply(&mut *session)?;
        *stage = CaseStage::GlobalConditionsApplied;

        apply_plan(&mut *session, plan)?;
        *stage = CaseStage::CaseParametersApplied;

        let boundaries = match &plan.activation {
            Some(mask) => self.apply_activation(&mut *session, mask)?,
            None => session.get_conditions()?,
        };
        *stage = CaseStage::FlowMasksApplied;

        if mode == CaseMode::Run {
            self.run_and_write(&mut *session, &boundaries, &label, stage)?;
        }

        let target = self.variant_path(base, &plan.key);
        let saved = session.save(Some(&target))?;
        *stage = CaseStage::SavedAs;

        session.close()?;
        *stage = CaseStage::Closed;
        tracing::info!(case = %label, model = %saved.display(), "case complete");
        Ok(saved)
    }

    fn run_and_write(
        &self,
        session: &mut dyn EngineSession,
        boundaries: &BoundaryTable,
        label: &str,
        stage: &mut CaseStage,
    ) -> SimResult<()> {
        validate(session)?;
        *stage = CaseStage::Validated;

        let result = session.run(&self.config.system_variables, &self.config.profile_variables)?;
        if result.is_empty() {
            return Err(SimError::EmptyResults {
                path: session.model_path().to_path_buf(),
            });
        }
        *stage = CaseStage::Run;

        let (nodes, profiles) = self.reshape(&result, boundaries)?;
        *stage = CaseStage::ResultsReshaped;

        self.write_results(label, &nodes, &profiles)?;
        *stage = CaseStage::Written;
        Ok(())
    }

    /// Check the sink set, push the mask, then write the flows into the
    /// boundary table read-modify-write. Returns the refreshed table.
    fn apply_activation(
        &self,
        session: &mut dyn EngineSession,
        mask: &ActivationMask,
    ) -> SimResult<BoundaryTable> {
        let current = session.get_conditions()?;
        let model: BTreeSet<&str> = [ComponentKind::Sink, ComponentKind::Well]
            .into_iter()
            .flat_map(|kind| current.nodes_of_kind(kind))
            .collect();
        let profile: BTreeSet<&str> = mask.sinks().collect();
        if model != profile {
            return Err(SimError::SinkMismatch {
                path: session.model_path().to_path_buf(),
                missing_in_model: profile.difference(&model).map(|s| s.to_string()).collect(),
                missing_in_profile: model.difference(&profile).map(|s| s.to_string()).collect(),
            });
        }

        let mut overrides = mask.overrides();
        if !self.config.deactivate_low_flow {
            for values in overrides.values_mut() {
                values.remove(params::IS_ACTIVE);
            }
        }
        session.set_values(&overrides)?;
        session.reset_conditions()?;

        let mut boundaries = session.get_conditions()?;
        mask.write_flows(&mut boundaries);
        session.set_conditions(&boundaries)?;
        session.reset_conditions()?;

        let inactive = if self.config.deactivate_low_flow {
            mask.inactive()
        } else {
            Vec::new()
        };
        tracing::info!(case = %mask.case, sinks = mask.len(), inactive = ?inactive, "sink flows set");
        Ok(session.get_conditions()?)
    }

    fn reshape(&self, result: &RunResult, boundaries: &BoundaryTable) -> SimResult<(Table, Table)> {
        let mut nodes = reshape_nodes(result, boundaries);
        self.config.node_conversions.apply(&mut nodes)?;
        let mut profiles = reshape_profiles(result);
        self.config.profile_conversions.apply(&mut profiles)?;
        Ok((nodes, profiles))
    }

    fn write_results(&self, label: &str, nodes: &Table, profiles: &Table) -> SimResult<()> {
        let node_path = self.config.node_results_path();
        let sheet = self
            .results
            .write_sheet(nodes, &node_path, label, RESULTS_ANCHOR, true)?;
        self.results.write_sheet(
            profiles,
            &self.config.profile_results_path(),
            label,
            RESULTS_ANCHOR,
            true,
        )?;
        tracing::info!(case = %label, sheet = %sheet, nodes = nodes.len().saturating_sub(1), "results written");
        Ok(())
    }

    /// Run an already-built variant and save it in place.
    ///
    /// With low-flow deactivation on, sinks whose live flow (per their flow
    /// rate type) is at or below the threshold are switched off first.
    pub fn run_existing(&self, model: &Path) -> CaseOutcome {
        let key = CaseKey::single(file_stem(model));
        let mut stage = CaseStage::Pending;
        let result = self.drive_existing(model, &key, &mut stage);
        finish(key, stage, result)
    }

    fn drive_existing(&self, model: &Path, key: &CaseKey, stage: &mut CaseStage) -> SimResult<PathBuf> {
        let mut session = SessionGuard::open(self.factory, model, self.config.units)?;
        *stage = CaseStage::Opened;

        let mut boundaries = session.get_conditions()?;
        *stage = CaseStage::BoundaryConditionsFetched;

        if self.config.deactivate_low_flow {
            boundaries = self.deactivate_low_flow(&mut *session, boundaries)?;
        }
        *stage = CaseStage::FlowMasksApplied;

        self.run_and_write(&mut *session, &boundaries, &key.label(), stage)?;

        let saved = session.save(None)?;
        *stage = CaseStage::SavedAs;
        session.close()?;
        *stage = CaseStage::Closed;
        Ok(saved)
    }

    fn deactivate_low_flow(
        &self,
        session: &mut dyn EngineSession,
        boundaries: BoundaryTable,
    ) -> SimResult<BoundaryTable> {
        let threshold = self.config.minimum_flow_rate;
        let mut update = ParameterMap::new();
        for kind in [ComponentKind::Sink, ComponentKind::Well] {
            for node in boundaries.nodes_of_kind(kind) {
                let Some(rate_type) = boundaries.get(node, params::FLOW_RATE_TYPE).and_then(Value::label) else {
                    continue;
                };
                let flow = boundaries.get(node, &rate_type).and_then(Value::as_f64).unwrap_or(0.0);
                if flow <= threshold {
                    update.insert(
                        node.to_string(),
                        ComponentValues::from([(params::IS_ACTIVE.to_string(), Value::Bool(false))]),
                    );
                }
            }
        }
        if update.is_empty() {
            return Ok(boundaries);
        }
        tracing::info!(model = %session.model_path().display(), sinks = ?update.keys().collect::<Vec<_>>(), "low-flow sinks deactivated");
        session.set_values(&update)?;
        session.reset_conditions()?;
        Ok(session.get_conditions()?)
    }

    /// Re-apply each variant's condition to the variants already in `folder`.
    ///
    /// Variants are recognised by their file name, derived from `base`. The
    /// template itself and unrelated files are left alone.
    pub fn update_existing_models(
        &self,
        folder: &Path,
        base: &Path,
        matrix: &CaseMatrix,
    ) -> SimResult<Vec<CaseOutcome>> {
        let template = file_name(base);
        let mut outcomes = Vec::new();
        for model in self.factory.list_models(folder)? {
            let name = file_name(&model);
            if name == template {
                continue;
            }
            let Some(key) = CaseKey::from_model_file_name(&name, &template) else {
                tracing::debug!(model = %model.display(), "not a variant of the template, skipped");
                continue;
            };
            let mut stage = CaseStage::Pending;
            let result = matrix
                .plan(&key)
                .map_err(SimError::from)
                .and_then(|plan| self.update_model(&model, &plan, &mut stage));
            outcomes.push(finish(key, stage, result));
        }
        Ok(outcomes)
    }

    fn update_model(&self, model: &Path, plan: &CasePlan, stage: &mut CaseStage) -> SimResult<PathBuf> {
        let mut session = SessionGuard::open(self.factory, model, self.config.units)?;
        *stage = CaseStage::Opened;
        apply_plan(&mut *session, plan)?;
        *stage = CaseStage::CaseParametersApplied;
        let saved = session.save(None)?;
        *stage = CaseStage::SavedAs;
        session.close()?;
        *stage = CaseStage::Closed;
        Ok(saved)
    }

    /// Copy flowline values and detailed geometry from `source` into every
    /// other model in `folder`.
    ///
    /// The source is only read, never saved. A model that fails is logged
    /// and the rest continue.
    pub fn copy_flowline_data(&self, source: &Path, folder: &Path) -> SimResult<CopyReport> {
        let (values, geometry) = {
            let session = SessionGuard::open(self.factory, source, self.config.units)?;
            let values = session.get_values(Some(ComponentKind::Flowline), None)?;
            let detailed: Vec<String> = values
                .iter()
                .filter(|(_, v)| v.get(params::DETAILED_MODEL).and_then(Value::as_bool) == Some(true))
                .map(|(name, _)| name.clone())
                .collect();
            let geometry = if detailed.is_empty() {
                GeometryMap::new()
            } else {
                session.get_geometry(Some(&detailed))?
            };
            session.close()?;
            (values, geometry)
        };
        tracing::info!(source = %source.display(), flowlines = values.len(), detailed = geometry.len(), "flowline data read");

        let mut report = CopyReport::default();
        for model in self.factory.list_models(folder)? {
            if same_path(&model, source) {
                continue;
            }
            match self.copy_into(&model, &values, &geometry) {
                Ok(()) => report.updated.push(model),
                Err(e) => {
                    tracing::error!(model = %model.display(), error = %e, "flowline data not copied");
                    report.failed.push((model, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    fn copy_into(&self, model: &Path, values: &ParameterMap, geometry: &GeometryMap) -> SimResult<()> {
        let mut session = SessionGuard::open(self.factory, model, self.config.units)?;
        let present = session.get_values(Some(ComponentKind::Flowline), None)?;

        let update: ParameterMap = values
            .iter()
            .filter(|(name, _)| present.contains_key(*name))
            .map(|(name, v)| (name.clone(), v.clone()))
            .collect();
        let missing: Vec<&str> = values
            .keys()
            .filter(|name| !present.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            tracing::warn!(model = %model.display(), flowlines = ?missing, "flowlines not in model, skipped");
        }
        if !update.is_empty() {
            session.set_values(&update)?;
        }

        let profiles: GeometryMap = geometry
            .iter()
            .filter(|(name, _)| present.contains_key(*name))
            .map(|(name, points)| (name.clone(), points.clone()))
            .collect();
        if !profiles.is_empty() {
            session.set_geometry(&profiles)?;
        }

        session.save(None)?;
        session.close()?;
        tracing::info!(model = %model.display(), flowlines = update.len(), "flowline data copied");
        Ok(())
    }

    /// Run every plan and persist the run manifest.
    ///
    /// Sequential when `workers <= 1`; otherwise a bounded pool where each
    /// case works on its own copy of the template. `cancel` is checked before
    /// each case opens a session. Failed cases are logged and the rest run.
    /// Cases that never resolved to a plan are recorded as failed at
    /// `Pending` ahead of the rest.
    pub fn run_matrix(
        &self,
        base: &Path,
        cases: ResolvedCases,
        cancel: &AtomicBool,
        on_event: Option<&(dyn Fn(&MatrixEvent) + Sync)>,
    ) -> SimResult<MatrixReport> {
        let ResolvedCases { plans, unresolved } = cases;
        let total = plans.len() + unresolved.len();
        let workers = self.config.workers.max(1);
        let emit = |event: MatrixEvent| {
            if let Some(cb) = on_event {
                cb(&event);
            }
        };
        emit(MatrixEvent::Started { total, workers });
        tracing::info!(base = %base.display(), cases = total, workers, "case matrix started");

        let done = AtomicUsize::new(0);
        let report_one = |outcome: &CaseOutcome| {
            let done = done.fetch_add(1, Ordering::SeqCst) + 1;
            emit(MatrixEvent::CaseFinished {
                record: outcome.record(),
                done,
                total,
            });
        };

        let mut outcomes: Vec<CaseOutcome> = unresolved
            .into_iter()
            .map(|(key, error)| {
                let outcome = finish(key, CaseStage::Pending, Err(error.into()));
                report_one(&outcome);
                outcome
            })
            .collect();

        let run_one = |plan: &CasePlan| -> CaseOutcome {
            let outcome = if cancel.load(Ordering::SeqCst) {
                tracing::warn!(case = %plan.key, "case cancelled before start");
                CaseOutcome {
                    key: plan.key.clone(),
                    stage: CaseStage::Pending,
                    model: None,
                    error: Some(SimError::Cancelled {
                        case: plan.key.label(),
                    }),
                }
            } else if workers > 1 {
                self.run_staged(base, plan)
            } else {
                self.run_case(base, plan)
            };
            report_one(&outcome);
            outcome
        };

        let ran: Vec<CaseOutcome> = if workers <= 1 {
            plans.iter().map(&run_one).collect()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| SimError::ThreadPool {
                    reason: e.to_string(),
                })?;
            pool.install(|| plans.par_iter().map(&run_one).collect())
        };
        outcomes.extend(ran);

        let records = outcomes.iter().map(CaseOutcome::record).collect();
        let report = MatrixReport::from_records(base, workers, records);
        report.write(&self.config.manifest_path())?;
        emit(MatrixEvent::Finished {
            succeeded: report.succeeded,
            failed: report.failed,
            cancelled: report.cancelled,
        });
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            "case matrix finished"
        );
        Ok(report)
    }
}

/// Settings first, then component overrides, then a reset so the next read
/// sees them.
fn apply_plan(session: &mut dyn EngineSession, plan: &CasePlan) -> SimResult<()> {
    for (key, value) in &plan.settings {
        session.set_setting(*key, value)?;
    }
    if !plan.overrides.is_empty() {
        session.set_values(&plan.overrides)?;
    }
    session.reset_conditions()?;
    tracing::debug!(case = %plan.key, settings = plan.settings.len(), components = plan.overrides.len(), "case parameters set");
    Ok(())
}

fn validate(session: &dyn EngineSession) -> SimResult<()> {
    let errors = session.validate()?;
    if errors.is_empty() {
        return Ok(());
    }
    Err(SimError::ValidationFailed {
        path: session.model_path().to_path_buf(),
        errors,
    })
}

fn finish(key: CaseKey, stage: CaseStage, result: SimResult<PathBuf>) -> CaseOutcome {
    match result {
        Ok(model) => CaseOutcome {
            key,
            stage,
            model: Some(model),
            error: None,
        },
        Err(error) => {
            tracing::error!(case = %key, stage = %stage, error = %error, "case failed");
            CaseOutcome {
                key,
                stage,
                model: None,
                error: Some(error),
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    matches!(
        (std::path::absolute(a), std::path::absolute(b)),
        (Ok(x), Ok(y)) if x == y
    )
}
