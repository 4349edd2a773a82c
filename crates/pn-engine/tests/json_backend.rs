use pn_core::{ComponentKind, SettingKey, Value, params};
use pn_engine::*;
use std::path::Path;

fn network() -> ModelDocument {
    ModelDocument::new()
        .with_component(ComponentKind::Source, "Src", &[(params::PRESSURE, Value::from(40.0))])
        .with_component(ComponentKind::Junction, "J1", &[])
        .with_component(
            ComponentKind::Sink,
            "S1",
            &[
                (params::FLOW_RATE_TYPE, Value::from(params::LIQUID_FLOW_RATE)),
                (params::LIQUID_FLOW_RATE, Value::from(120.0)),
            ],
        )
        .with_connection("Src", "J1")
        .with_connection("J1", "S1")
}

#[test]
fn second_open_of_same_model_is_refused() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("models/base.pnm");
    factory.store_document(path, &network()).unwrap();

    let first = factory.open(path, UnitSystem::Metric).unwrap();
    assert!(matches!(
        factory.open(path, UnitSystem::Metric),
        Err(EngineError::Locked { .. })
    ));
    drop(first);
    assert!(factory.open(path, UnitSystem::Metric).is_ok());
}

#[test]
fn guard_releases_model_when_case_fails() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("models/base.pnm");
    factory.store_document(path, &network()).unwrap();

    let failing = || -> EngineResult<()> {
        let mut session = SessionGuard::open(&factory, path, UnitSystem::Metric)?;
        session.connect("Src", "Missing")?;
        Ok(())
    };
    assert!(matches!(failing(), Err(EngineError::NotFound { .. })));
    assert!(!factory.is_locked(path));
}

#[test]
fn closed_session_rejects_calls() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("m.pnm");
    factory.store_document(path, &network()).unwrap();
    let mut session = factory.open(path, UnitSystem::Field).unwrap();
    session.close().unwrap();
    session.close().unwrap();
    assert!(matches!(session.validate(), Err(EngineError::Closed { .. })));
}

#[test]
fn conditions_are_stale_until_reset() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("m.pnm");
    factory.store_document(path, &network()).unwrap();
    let mut session = SessionGuard::open(&factory, path, UnitSystem::Metric).unwrap();

    let before = session.get_conditions().unwrap();
    assert_eq!(before.get("Src", params::PRESSURE), Some(&Value::from(40.0)));

    let mut update = ParameterMap::new();
    update.insert(
        "Src".to_string(),
        ComponentValues::from([(params::PRESSURE.to_string(), Value::from(55.0))]),
    );
    session.set_values(&update).unwrap();
    assert_eq!(
        session.get_conditions().unwrap().get("Src", params::PRESSURE),
        Some(&Value::from(40.0))
    );

    assert!(session.reset_conditions().unwrap());
    assert_eq!(
        session.get_conditions().unwrap().get("Src", params::PRESSURE),
        Some(&Value::from(55.0))
    );
}

#[test]
fn save_as_on_disk_and_list_models() {
    let dir = tempfile::tempdir().unwrap();
    let factory = JsonModelFactory::disk();
    let base = dir.path().join("base.pnm");
    factory.store_document(&base, &network()).unwrap();

    let mut session = SessionGuard::open(&factory, &base, UnitSystem::Metric).unwrap();
    session
        .set_setting(SettingKey::AmbientTemperature, &Value::from(12.0))
        .unwrap();
    let variant = dir.path().join("A_X_base.pnm");
    let written = session.save(Some(&variant)).unwrap();
    assert_eq!(written, variant);
    session.close().unwrap();

    let doc = factory.load_document(&variant).unwrap();
    assert_eq!(doc.settings["ambient_temperature"], Value::from(12.0));
    // template untouched
    assert!(factory.load_document(&base).unwrap().settings.is_empty());

    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
    let listed = factory.list_models(dir.path()).unwrap();
    assert_eq!(listed, vec![variant, base]);
}

#[test]
fn duplicate_refuses_a_held_destination() {
    let factory = JsonModelFactory::in_memory();
    let src = Path::new("w/base.pnm");
    let dst = Path::new("w/copy.pnm");
    factory.store_document(src, &network()).unwrap();
    factory.store_document(dst, &ModelDocument::new()).unwrap();

    let held = factory.open(dst, UnitSystem::Metric).unwrap();
    assert!(matches!(
        factory.duplicate(src, dst),
        Err(EngineError::Locked { .. })
    ));
    drop(held);
    factory.duplicate(src, dst).unwrap();
    assert_eq!(factory.load_document(dst).unwrap(), network());
}

#[test]
fn run_filters_to_requested_variables() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("m.pnm");
    let mut result = RunResult::default();
    result.node.insert(
        params::UNIT_ROW.to_string(),
        ComponentValues::from([
            (params::PRESSURE.to_string(), Value::from("bara")),
            (params::TEMPERATURE.to_string(), Value::from("degC")),
        ]),
    );
    result.node.insert(
        "S1".to_string(),
        ComponentValues::from([
            (params::PRESSURE.to_string(), Value::from(12.0)),
            (params::TEMPERATURE.to_string(), Value::from(40.0)),
        ]),
    );
    factory
        .store_document(path, &network().with_results(result))
        .unwrap();

    let mut session = SessionGuard::open(&factory, path, UnitSystem::Metric).unwrap();
    let out = session.run(&[params::PRESSURE.to_string()], &[]).unwrap();
    assert_eq!(out.node["S1"].len(), 1);
    assert_eq!(out.node[params::UNIT_ROW][params::PRESSURE], Value::from("bara"));
}

#[test]
fn remove_refuses_held_models_and_deletes_free_ones() {
    let factory = JsonModelFactory::in_memory();
    let path = Path::new("variants/A_X_base.pnm");
    factory.store_document(path, &network()).unwrap();

    let session = factory.open(path, UnitSystem::Metric).unwrap();
    assert!(matches!(factory.remove(path), Err(EngineError::Locked { .. })));
    drop(session);

    factory.remove(path).unwrap();
    assert!(factory.list_models(Path::new("variants")).unwrap().is_empty());
    assert!(matches!(factory.remove(path), Err(EngineError::NotFound { .. })));
}
