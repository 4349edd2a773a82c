use pn_app::*;
use pn_core::{Table, Value, params};
use pn_engine::{JsonModelFactory, RunResult, SessionFactory};
use pn_populate::ImportMode;
use pn_summary::NODE_SUMMARY_SHEET;
use pn_tables::{MemoryWorkbookStore, TabularDataSource};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const BASE: &str = "base.pnm";
const BOOK: &str = "inputs.json";

fn values(pairs: &[(&str, Value)]) -> pn_engine::ComponentValues {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn inputs() -> MemoryWorkbookStore {
    let store = MemoryWorkbookStore::new();
    store.insert_table(
        BOOK,
        "Component Names",
        &Table::from_rows(
            ["Main", "Main Type", "Branch", "Branch Type"],
            vec![
                vec!["Src".into(), "Source".into(), "FL1".into(), "Flowline".into()],
                vec!["FL1".into(), "Flowline".into(), "S2".into(), "Sink".into()],
                vec!["S1".into(), "Sink".into(), Value::Empty, Value::Empty],
            ],
        ),
    );
    store.insert_table(
        BOOK,
        "Components",
        &Table::from_rows(
            ["Name", "Component", "Pressure", "Temperature", "LiquidFlowRate", "FlowRateType"],
            vec![
                vec!["Src".into(), "Source".into(), 30.0.into(), 40.0.into(), Value::Empty, Value::Empty],
                vec!["S1".into(), "Sink".into(), Value::Empty, Value::Empty, 100.0.into(), "LiquidFlowRate".into()],
                vec!["S2".into(), "Sink".into(), Value::Empty, Value::Empty, 50.0.into(), "LiquidFlowRate".into()],
            ],
        ),
    );
    store.insert_table(
        BOOK,
        "Sink Profile",
        &Table::from_rows(
            ["Sinks", "A", "B"],
            vec![
                vec!["S1".into(), 120.0.into(), 80.0.into()],
                vec!["S2".into(), 40.0.into(), 0.0.into()],
            ],
        ),
    );
    store.insert_table(
        BOOK,
        "Conditions",
        &Table::from_rows(
            ["Conditions", "Component Name", "Component Type", "Parameter", "Value"],
            vec![vec!["Hot".into(), "Src".into(), "Source".into(), "Temperature".into(), 60.0.into()]],
        ),
    );
    store
}

fn recorded() -> RunResult {
    let mut result = RunResult::default();
    result.node.insert("Unit".into(), values(&[("Pressure", "bara".into())]));
    result.node.insert("Src".into(), values(&[("Pressure", 30.0.into())]));
    result.node.insert("S1".into(), values(&[("Pressure", 21.0.into())]));
    result.node.insert("S2".into(), values(&[("Pressure", 19.0.into())]));
    result.profile.insert(
        "B1".into(),
        Table::from_rows(
            ["BranchEquipment", "Pressure"],
            vec![
                vec!["Src".into(), 30.0.into()],
                vec!["FL1".into(), 25.0.into()],
                vec!["S1".into(), 21.0.into()],
            ],
        ),
    );
    result.profile_units.insert("Pressure".into(), "bara".into());
    result
}

fn project(results_dir: &Path) -> ProjectConfig {
    let mut config = ProjectConfig::default();
    config.workbook.path = PathBuf::from(BOOK);
    config.simulation.base_model = PathBuf::from(BASE);
    config.simulation.settings.models_dir = PathBuf::from("variants");
    config.simulation.settings.results_dir = results_dir.to_path_buf();
    config.simulation.settings.system_variables = vec![params::PRESSURE.to_string()];
    config.simulation.settings.profile_variables = vec![params::PRESSURE.to_string()];
    config.summary.profile_parameters = vec![params::PRESSURE.to_string()];
    config
}

/// Topology and parameters authored from the workbook, then results recorded.
fn prepared_model(factory: &JsonModelFactory, store: &MemoryWorkbookStore, config: &ProjectConfig) {
    factory
        .store_document(Path::new(BASE), &pn_engine::ModelDocument::new())
        .unwrap();
    let ctx = PipelineContext::new(config, factory, store);
    ctx.build_topology().unwrap();
    ctx.populate().unwrap();

    let doc = factory.load_document(Path::new(BASE)).unwrap().with_results(recorded());
    factory.store_document(Path::new(BASE), &doc).unwrap();
}

#[test]
fn topology_and_populate_author_the_base_model() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::in_memory();
    let store = inputs();
    let config = project(dir.path());
    factory
        .store_document(Path::new(BASE), &pn_engine::ModelDocument::new())
        .unwrap();
    let ctx = PipelineContext::new(&config, &factory, &store);

    let built = ctx.build_topology().unwrap();
    assert_eq!(built.components_created, 4);
    assert_eq!(built.connections_made, 3);

    match ctx.populate().unwrap() {
        PopulateOutcome::Imported(report) => {
            assert_eq!(report.components_updated, 3);
            assert!(report.unknown_names.is_empty());
        }
        other => panic!("expected a simple import, got {other:?}"),
    }

    let doc = factory.load_document(Path::new(BASE)).unwrap();
    assert!(doc.is_connected("FL1", "S2"));
    assert_eq!(doc.components["Src"].parameters[params::TEMPERATURE], Value::from(40.0));
    assert_eq!(doc.components["S2"].parameters[params::LIQUID_FLOW_RATE], Value::from(50.0));
    assert!(!factory.is_locked(Path::new(BASE)));
}

#[test]
fn export_mode_leaves_the_model_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::in_memory();
    let store = inputs();
    let mut config = project(dir.path());
    prepared_model(&factory, &store, &config);
    let before = factory.load_document(Path::new(BASE)).unwrap();

    config.populate.mode = ImportMode::Export;
    config.populate.export_kinds = vec![pn_core::ComponentKind::Sink];
    let ctx = PipelineContext::new(&config, &factory, &store);
    let PopulateOutcome::Exported(sheets) = ctx.populate().unwrap() else {
        panic!("expected an export");
    };
    assert_eq!(sheets, ["Sink"]);
    assert!(store.exists(&config.populate.export_path));
    assert_eq!(factory.load_document(Path::new(BASE)).unwrap(), before);
}

#[test]
fn cases_run_and_summarize_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::in_memory();
    let store = inputs();
    let config = project(dir.path());
    prepared_model(&factory, &store, &config);
    let ctx = PipelineContext::new(&config, &factory, &store);

    let cancel = AtomicBool::new(false);
    let report = ctx.run_cases(&cancel, None).unwrap();
    assert_eq!((report.total, report.succeeded), (2, 2));
    assert!(dir.path().join(pn_sim::MANIFEST_FILE).exists());
    assert_eq!(factory.list_models(Path::new("variants")).unwrap().len(), 2);

    // case B switches S2 off, so only S1 reports
    let node_path = config.simulation.settings.node_results_path();
    let b = store.read_sheet(&node_path, "B_Hot").unwrap();
    assert_eq!(b.len(), 3);

    let summary = ctx.summarize().unwrap();
    assert_eq!(summary.node_rows, 4);
    assert_eq!(summary.profile_sheets, ["Pressure"]);
    assert_eq!(summary.pump_rows, 0);

    let nodes = store.read_sheet(&node_path, NODE_SUMMARY_SHEET).unwrap();
    let minimum_a = (0..nodes.len())
        .find(|&r| {
            nodes.cell(r, "Case") == Some(&Value::from("A_Hot"))
                && nodes.cell(r, "Min/Max") == Some(&Value::from("Minimum"))
        })
        .unwrap();
    assert_eq!(nodes.cell(minimum_a, "Node"), Some(&Value::from("S2")));
    assert_eq!(nodes.cell(minimum_a, "Value"), Some(&Value::from(19.0)));
}

#[test]
fn existing_variants_rerun_without_the_template() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::in_memory();
    let store = inputs();
    let config = project(dir.path());
    prepared_model(&factory, &store, &config);
    let ctx = PipelineContext::new(&config, &factory, &store);

    let built = ctx.build_models().unwrap();
    assert!(built.iter().all(|o| o.is_success()));

    let outcomes = ctx.run_existing_models(Path::new("variants")).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));

    let updated = ctx.update_models().unwrap();
    assert_eq!(updated.len(), 2);
}

#[test]
fn worker_reports_progress_and_completion() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::in_memory();
    let store = inputs();
    let config = project(dir.path());
    prepared_model(&factory, &store, &config);

    let factory: Arc<dyn SessionFactory> = Arc::new(factory);
    let store: Arc<dyn TabularDataSource> = Arc::new(store);
    let worker = PipelineWorker::start(PipelineJob::RunCases, config, factory, store);

    let mut messages = Vec::new();
    while let Ok(message) = worker.progress_rx.recv() {
        messages.push(message);
    }
    let progress = messages
        .iter()
        .filter(|m| matches!(m, WorkerMessage::Progress { .. }))
        .count();
    assert_eq!(progress, 2);
    assert!(matches!(
        messages.last(),
        Some(WorkerMessage::Complete { summary }) if summary.contains("2 succeeded")
    ));
}

#[test]
fn worker_surfaces_stage_errors() {
    let dir = tempfile::tempdir().unwrap();
    let factory: Arc<dyn SessionFactory> = Arc::new(JsonModelFactory::in_memory());
    let store: Arc<dyn TabularDataSource> = Arc::new(inputs());

    let worker = PipelineWorker::start(PipelineJob::Summarize, project(dir.path()), factory, store);
    let err = worker.wait().unwrap_err();
    assert!(matches!(err, AppError::Worker(ref m) if m.contains("Node_Results.json")));
}
