use pn_core::{ComponentKind, Table, Value, params};
use pn_engine::*;
use pn_tables::SheetRef;
use pn_topology::*;
use std::path::Path;

fn component_table() -> Table {
    Table::from_rows(
        ["Main", "Main Type", "Branch", "Branch Type"],
        vec![
            vec!["Src".into(), "Source".into(), "J-B".into(), "Junction".into()],
            vec!["FL1".into(), "Flowline".into(), "FL-B1".into(), "Flowline".into()],
            vec!["FL2".into(), "Flowline".into(), "FL-B2".into(), "Flowline".into()],
            vec!["S1".into(), "Sink".into(), "P1".into(), "Choke".into()],
        ],
    )
}

fn open(factory: &JsonModelFactory, doc: ModelDocument) -> SessionGuard {
    let path = Path::new("net.pnm");
    factory.store_document(path, &doc).unwrap();
    SessionGuard::open(factory, path, UnitSystem::Metric).unwrap()
}

#[test]
fn builds_connected_network_with_junctions() {
    let factory = JsonModelFactory::in_memory();
    let mut session = open(&factory, ModelDocument::new());
    let origin = SheetRef::new("inputs.json", "Component Name");

    let report = TopologyBuilder::default()
        .build_from_table(&mut *session, &component_table(), &origin)
        .unwrap()
        .into_result()
        .unwrap();

    // Main: Src FL1 LJ(0_1) FL2 S1 ; Branch: J-B FL-B1 LJ(1_1) FL-B2 P1
    assert_eq!(report.components_created, 10);
    assert_eq!(report.connections_made, 8);
    assert!(session.find(ComponentKind::Junction, "LJ(0_1)").unwrap());
    assert!(session.find(ComponentKind::Junction, "LJ(1_1)").unwrap());

    session.save(None).unwrap();
    session.close().unwrap();
    let doc = factory.load_document(Path::new("net.pnm")).unwrap();
    assert!(doc.is_connected("FL1", "LJ(0_1)"));
    assert!(doc.is_connected("LJ(0_1)", "FL2"));
    assert!(!doc.is_connected("FL1", "FL2"));

    // flowlines carry no coordinates, other components sit on the grid
    assert!(!doc.components["FL1"].parameters.contains_key(params::X));
    assert_eq!(doc.components["Src"].parameters[params::X], Value::from(4000.0));
    assert_eq!(doc.components["J-B"].parameters[params::Y], Value::from(100.0));
}

#[test]
fn rebuild_tolerates_existing_components_and_connections() {
    let factory = JsonModelFactory::in_memory();
    let mut session = open(&factory, ModelDocument::new());
    let origin = SheetRef::new("inputs.json", "Component Name");
    let builder = TopologyBuilder::default();

    builder
        .build_from_table(&mut *session, &component_table(), &origin)
        .unwrap();
    let second = builder
        .build_from_table(&mut *session, &component_table(), &origin)
        .unwrap();
    assert_eq!(second.components_created, 0);
    assert_eq!(second.components_existing, 10);
    assert_eq!(second.connections_existing, 8);
    assert!(second.is_complete());
}

#[test]
fn unresolved_endpoint_fails_only_its_section() {
    let factory = JsonModelFactory::in_memory();
    // P1 already exists as a pump, so the branch's choke P1 cannot be found
    let existing = ModelDocument::new().with_component(ComponentKind::Pump, "P1", &[]);
    let mut session = open(&factory, existing);
    let origin = SheetRef::new("inputs.json", "Component Name");

    let report = TopologyBuilder::default()
        .build_from_table(&mut *session, &component_table(), &origin)
        .unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].section, 1);
    assert_eq!(report.components_existing, 1);
    assert_eq!(report.connections_made, 4 + 3);

    match report.into_result() {
        Err(TopologyError::PartialBuild { failed, total }) => {
            assert_eq!(total, 2);
            assert!(failed[0].message.contains("P1"));
        }
        other => panic!("expected partial build, got {other:?}"),
    }
}
