//! Pipeline stages as single calls, shared by the CLI and the worker.

use crate::config::{MatrixLayout, ProjectConfig};
use crate::error::AppResult;
use pn_cases::{CaseMatrix, ConditionTable, ParameterTable, SinkProfile};
use pn_engine::{SessionFactory, SessionGuard};
use pn_populate::{
    BulkImportReport, ComponentTable, GeometryReport, ImportMode, ImportReport, ParameterPopulator,
};
use pn_sim::{
    CaseOutcome, CaseStage, CopyReport, MatrixEvent, MatrixReport, SimulationConfig, SimulationOrchestrator,
};
use pn_summary::{ResultsSummarizer, SummaryReport};
use pn_tables::{SheetRef, TableError, TabularDataSource};
use pn_topology::{BuildReport, TopologyBuilder};
use std::fmt;
use std::path::Path;
use std::sync::atomic::AtomicBool;

/// What a populate run did, per mode.
#[derive(Debug, Clone, PartialEq)]
pub enum PopulateOutcome {
    Imported(ImportReport),
    Geometry(GeometryReport),
    Exported(Vec<String>),
    BulkImported(BulkImportReport),
}

impl fmt::Display for PopulateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulateOutcome::Imported(r) => write!(
                f,
                "{} components updated, {} values set, {} unknown names",
                r.components_updated,
                r.values_set,
                r.unknown_names.len()
            ),
            PopulateOutcome::Geometry(r) => write!(
                f,
                "{} flowline profiles imported, {} failed",
                r.imported.len(),
                r.failed.len()
            ),
            PopulateOutcome::Exported(sheets) => write!(f, "{} sheets exported", sheets.len()),
            PopulateOutcome::BulkImported(r) => write!(
                f,
                "{} kinds imported, {} failed",
                r.imported.len(),
                r.failed.len()
            ),
        }
    }
}

/// A project plus the two external collaborators it runs against.
#[derive(Clone, Copy)]
pub struct PipelineContext<'a> {
    pub config: &'a ProjectConfig,
    pub factory: &'a dyn SessionFactory,
    pub source: &'a dyn TabularDataSource,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        config: &'a ProjectConfig,
        factory: &'a dyn SessionFactory,
        source: &'a dyn TabularDataSource,
    ) -> Self {
        Self {
            config,
            factory,
            source,
        }
    }

    /// Orchestrator settings, opened in the project's unit system.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            units: self.config.engine.units,
            ..self.config.simulation.settings.clone()
        }
    }

    fn base_model(&self) -> &'a Path {
        &self.config.simulation.base_model
    }

    fn workbook(&self) -> &'a Path {
        &self.config.workbook.path
    }

    /// Author the topology sheet into the base model and save it.
    ///
    /// The model is saved even when some sections fail; the failure is then
    /// returned as `TopologyError::PartialBuild`.
    pub fn build_topology(&self) -> AppResult<BuildReport> {
        let sheet = &self.config.topology.sheet;
        let origin = SheetRef::new(self.workbook(), sheet.as_str());
        let table = self
            .source
            .read_sheet(self.workbook(), sheet)
            .map_err(TableError::logged)?;

        let mut session = SessionGuard::open(self.factory, self.base_model(), self.config.engine.units)?;
        let report = TopologyBuilder::new(self.config.topology.layout.clone())
            .build_from_table(&mut *session, &table, &origin)?;
        session.save(None)?;
        session.close()?;
        tracing::info!(
            model = %self.base_model().display(),
            created = report.components_created,
            connected = report.connections_made,
            failed = report.failed.len(),
            "topology built"
        );
        Ok(report.into_result()?)
    }

    /// Run the configured populate mode against the base model.
    pub fn populate(&self) -> AppResult<PopulateOutcome> {
        let settings = &self.config.populate;
        let populator = ParameterPopulator::new(self.source);
        let mut session = SessionGuard::open(self.factory, self.base_model(), self.config.engine.units)?;

        let outcome = match settings.mode {
            ImportMode::SimpleImport => {
                let table = ComponentTable::load(self.source, self.workbook(), &settings.component_sheet)?;
                PopulateOutcome::Imported(populator.simple_import(&mut *session, &table))
            }
            ImportMode::GeometryImport => {
                let geometry = populator.load_geometry_table(self.workbook(), &settings.geometry_sheet)?;
                PopulateOutcome::Geometry(populator.import_geometry(&mut *session, &geometry))
            }
            ImportMode::Export => PopulateOutcome::Exported(populator.export_to_workbook(
                &*session,
                &settings.export_kinds,
                &settings.export_path,
            )?),
            ImportMode::BulkImport => PopulateOutcome::BulkImported(
                populator.bulk_import_values(&mut *session, &settings.export_path)?,
            ),
        };

        if settings.mode != ImportMode::Export {
            session.save(None)?;
        }
        session.close()?;
        tracing::info!(mode = %settings.mode, result = %outcome, "populate finished");
        Ok(outcome)
    }

    /// Case matrix from the input workbook, in the configured layout.
    pub fn case_matrix(&self) -> AppResult<CaseMatrix> {
        let cases = &self.config.cases;
        let book = self.workbook();
        let load_profile = || SinkProfile::load(self.source, book, &cases.profile_sheet);

        let matrix = match cases.mode {
            MatrixLayout::Cross => {
                let profile = load_profile()?;
                let conditions = ConditionTable::load(self.source, book, &cases.conditions_sheet)?;
                CaseMatrix::cross(profile, conditions)
            }
            MatrixLayout::SingleAxis => {
                let parameters = ParameterTable::load(self.source, book, &cases.parameters_sheet)?;
                let matrix = CaseMatrix::single_axis(parameters);
                if cases.single_axis_profile {
                    matrix.with_profile(load_profile()?)
                } else {
                    matrix
                }
            }
        };
        Ok(matrix
            .with_threshold(self.config.simulation.settings.minimum_flow_rate)
            .with_flow_parameter(cases.flow_parameter.as_str()))
    }

    pub fn orchestrator(&self) -> AppResult<SimulationOrchestrator<'a>> {
        Ok(
            SimulationOrchestrator::new(self.factory, self.source, self.simulation_config())?
                .with_global_conditions(self.config.global_conditions.clone()),
        )
    }

    /// Run every case of the matrix and write the run manifest.
    pub fn run_cases(
        &self,
        cancel: &AtomicBool,
        on_event: Option<&(dyn Fn(&MatrixEvent) + Sync)>,
    ) -> AppResult<MatrixReport> {
        let cases = self.case_matrix()?.plans();
        let report = self
            .orchestrator()?
            .run_matrix(self.base_model(), cases, cancel, on_event)?;
        Ok(report)
    }

    /// Author and save every case's model variant without running.
    ///
    /// Cases that do not resolve come back as failed at `Pending`.
    pub fn build_models(&self) -> AppResult<Vec<CaseOutcome>> {
        let cases = self.case_matrix()?.plans();
        let orchestrator = self.orchestrator()?;
        let unresolved = cases.unresolved.into_iter().map(|(key, error)| CaseOutcome {
            key,
            stage: CaseStage::Pending,
            model: None,
            error: Some(error.into()),
        });
        let built = cases
            .plans
            .iter()
            .map(|plan| orchestrator.build_case_model(self.base_model(), plan));
        Ok(unresolved.chain(built).collect())
    }

    /// Run every model in `folder` as it stands, except the template.
    pub fn run_existing_models(&self, folder: &Path) -> AppResult<Vec<CaseOutcome>> {
        let orchestrator = self.orchestrator()?;
        let template = self.base_model().file_name();
        Ok(self
            .factory
            .list_models(folder)?
            .into_iter()
            .filter(|model| model.file_name() != template)
            .map(|model| orchestrator.run_existing(&model))
            .collect())
    }

    /// Re-apply each variant's condition to the variants in the models folder.
    pub fn update_models(&self) -> AppResult<Vec<CaseOutcome>> {
        let matrix = self.case_matrix()?;
        let folder = &self.config.simulation.settings.models_dir;
        Ok(self
            .orchestrator()?
            .update_existing_models(folder, self.base_model(), &matrix)?)
    }

    /// Copy flowline data from `source_model` to every model in the models folder.
    pub fn copy_flowlines(&self, source_model: &Path) -> AppResult<CopyReport> {
        let folder = &self.config.simulation.settings.models_dir;
        Ok(self.orchestrator()?.copy_flowline_data(source_model, folder)?)
    }

    /// Summarize the result workbooks the matrix wrote.
    pub fn summarize(&self) -> AppResult<SummaryReport> {
        let sim = &self.config.simulation.settings;
        let summarizer = ResultsSummarizer::new(self.source, self.config.summary.clone());
        Ok(summarizer.summarize(&sim.node_results_path(), &sim.profile_results_path())?)
    }
}
