use pn_core::{ComponentKind, Table, Value, params};
use pn_engine::*;
use pn_populate::*;
use pn_tables::{MemoryWorkbookStore, TableError, TabularDataSource};
use std::path::Path;

const MODEL: &str = "models/base.pnm";
const BOOK: &str = "inputs.json";

fn model() -> ModelDocument {
    ModelDocument::new()
        .with_component(ComponentKind::Source, "Src", &[(params::PRESSURE, Value::from(30.0))])
        .with_component(ComponentKind::Flowline, "FL1", &[(params::INNER_DIAMETER, Value::from(0.1))])
        .with_component(ComponentKind::Flowline, "FL2", &[])
        .with_component(ComponentKind::Pump, "P1", &[(params::SPEED, Value::from(2000.0))])
        .with_component(
            ComponentKind::Sink,
            "S1",
            &[(params::LIQUID_FLOW_RATE, Value::from(80.0))],
        )
}

fn setup() -> (JsonModelFactory, MemoryWorkbookStore) {
    let factory = JsonModelFactory::in_memory();
    factory.store_document(Path::new(MODEL), &model()).unwrap();
    (factory, MemoryWorkbookStore::new())
}

#[test]
fn simple_import_pushes_only_known_names_and_parameters() {
    let (factory, store) = setup();
    store.insert_table(
        BOOK,
        "Isometric",
        &Table::from_rows(
            ["Name", "Component", "InnerDiameter", "Roughness", "Speed"],
            vec![
                vec!["FL1".into(), "Flowline".into(), 0.25.into(), Value::Empty, Value::Empty],
                vec!["FL9".into(), "Flowline".into(), 0.3.into(), Value::Empty, Value::Empty],
                vec!["P1".into(), "Pump".into(), 9.0.into(), Value::Empty, 3600.0.into()],
                vec!["Z1".into(), "Hovercraft".into(), 1.0.into(), Value::Empty, Value::Empty],
            ],
        ),
    );

    let populator = ParameterPopulator::new(&store);
    let table = ComponentTable::load(&store, Path::new(BOOK), "Isometric").unwrap();
    let mut session = SessionGuard::open(&factory, Path::new(MODEL), UnitSystem::Metric).unwrap();
    let report = populator.simple_import(&mut *session, &table);
    session.save(None).unwrap();
    session.close().unwrap();

    assert_eq!(report.components_updated, 2);
    assert_eq!(report.values_set, 2);
    assert_eq!(report.unknown_names, vec!["FL9".to_string()]);
    assert!(report.failed_kinds.is_empty());

    let doc = factory.load_document(Path::new(MODEL)).unwrap();
    assert_eq!(doc.components["FL1"].parameters[params::INNER_DIAMETER], Value::from(0.25));
    assert_eq!(doc.components["P1"].parameters[params::SPEED], Value::from(3600.0));
    assert!(!doc.components["P1"].parameters.contains_key(params::INNER_DIAMETER));
}

#[test]
fn missing_sheet_is_an_input_error() {
    let (_, store) = setup();
    store.insert_table(BOOK, "Other", &Table::new(["Name"]));
    assert!(matches!(
        ComponentTable::load(&store, Path::new(BOOK), "Isometric"),
        Err(TableError::SheetNotFound { .. })
    ));
}

#[test]
fn export_then_bulk_import_changes_nothing() {
    let (factory, store) = setup();
    let populator = ParameterPopulator::new(&store);
    let out = Path::new("export.json");

    let mut session = SessionGuard::open(&factory, Path::new(MODEL), UnitSystem::Metric).unwrap();
    let sheets = populator
        .export_to_workbook(&*session, &ComponentKind::ALL, out)
        .unwrap();
    assert_eq!(sheets, vec!["Source", "Sink", "Flowline", "Pump"]);
    assert_eq!(store.sheet_names(out).unwrap().len(), 4);

    let before = factory.load_document(Path::new(MODEL)).unwrap();
    let report = populator.bulk_import_values(&mut *session, out).unwrap();
    assert_eq!(report.imported.len(), 4);
    assert!(report.failed.is_empty());
    session.save(None).unwrap();
    session.close().unwrap();

    assert_eq!(factory.load_document(Path::new(MODEL)).unwrap(), before);
}

#[test]
fn bulk_import_applies_edited_cells() {
    let (factory, store) = setup();
    let populator = ParameterPopulator::new(&store);
    let out = Path::new("export.json");

    let mut session = SessionGuard::open(&factory, Path::new(MODEL), UnitSystem::Metric).unwrap();
    populator
        .export_to_workbook(&*session, &[ComponentKind::Flowline], out)
        .unwrap();
    let mut sheet = store.read_sheet(out, "Flowline").unwrap();
    sheet.set_cell(1, params::ROUGHNESS, Value::from(4.5e-5));
    store
        .write_sheet(&sheet, out, "Flowline", pn_tables::CellRef::A1, true)
        .unwrap();

    populator.bulk_import_values(&mut *session, out).unwrap();
    let values = session.get_values(Some(ComponentKind::Flowline), None).unwrap();
    assert_eq!(values["FL2"][params::ROUGHNESS], Value::from(4.5e-5));
    assert_eq!(values["FL1"][params::INNER_DIAMETER], Value::from(0.1));
}

#[test]
fn geometry_import_switches_to_detailed_and_sets_profiles() {
    let (factory, store) = setup();
    store.insert_table(
        BOOK,
        "Geometry",
        &Table::from_rows(
            ["Name", "HorizontalDistance", "MeasuredDistance", "Elevation"],
            vec![
                vec!["FL1".into(), 0.0.into(), 0.0.into(), 12.0.into()],
                vec![Value::Empty, 800.0.into(), 805.0.into(), 3.0.into()],
                vec![Value::Empty, 1500.0.into(), Value::Empty, 5.0.into()],
                vec!["FL2".into(), 0.0.into(), 0.0.into(), 1.0.into()],
            ],
        ),
    );
    let populator = ParameterPopulator::new(&store);
    let geometry = populator
        .load_geometry_table(Path::new(BOOK), "Geometry")
        .unwrap();
    // FL2 has a single station
    assert_eq!(geometry.keys().collect::<Vec<_>>(), vec!["FL1"]);
    assert_eq!(geometry["FL1"].len(), 3);
    assert_eq!(geometry["FL1"][2].measured_distance, 1500.0);

    let mut session = SessionGuard::open(&factory, Path::new(MODEL), UnitSystem::Metric).unwrap();
    let report = populator.import_geometry(&mut *session, &geometry);
    assert_eq!(report.imported, vec!["FL1".to_string()]);
    assert!(session.validate().unwrap().is_empty());
    let values = session.get_values(Some(ComponentKind::Flowline), None).unwrap();
    assert_eq!(values["FL1"][params::DETAILED_MODEL], Value::Bool(true));
    assert_eq!(session.get_geometry(None).unwrap()["FL1"].len(), 3);
}

#[test]
fn geometry_sheet_requires_name_and_elevation() {
    let (_, store) = setup();
    store.insert_table(BOOK, "Geometry", &Table::new(["Name", "HorizontalDistance"]));
    let err = ParameterPopulator::new(&store)
        .load_geometry_table(Path::new(BOOK), "Geometry")
        .unwrap_err();
    assert!(matches!(err, TableError::MissingColumns { ref columns, .. } if columns == &["Elevation"]));
}
