use pn_core::{Table, Value};
use pn_summary::*;
use pn_tables::{CellRef, MemoryWorkbookStore, TabularDataSource};
use std::path::Path;

const NODES: &str = "results/Node_Results.json";
const PROFILES: &str = "results/Profile_Results.json";

fn node_sheet(sinks: &[(&str, f64)]) -> Table {
    let mut rows = vec![vec!["Unit".into(), Value::Empty, "bara".into()]];
    rows.push(vec!["Src".into(), "Source".into(), 90.0.into()]);
    rows.extend(sinks.iter().map(|(n, p)| vec![(*n).into(), "Sink".into(), (*p).into()]));
    Table::from_rows(["Node", "Type", "Pressure"], rows)
}

fn profile_sheet(suction: f64, discharge: f64, velocity: &[f64]) -> Table {
    let mut rows = vec![vec!["Unit".into(), Value::Empty, "bara".into(), "m/s".into()]];
    rows.push(vec!["B1".into(), "StrainerA".into(), suction.into(), velocity[0].into()]);
    rows.push(vec!["B1".into(), "PumpA".into(), discharge.into(), velocity[1].into()]);
    Table::from_rows(["Branch", "BranchEquipment", "Pressure", "MeanVelocityFluid"], rows)
}

fn store() -> MemoryWorkbookStore {
    let store = MemoryWorkbookStore::new();
    let write = |table: &Table, path: &str, sheet: &str| {
        store
            .write_sheet(table, Path::new(path), sheet, CellRef::A2, true)
            .unwrap();
    };
    write(&node_sheet(&[("S1", 10.0), ("S2", 3.0), ("S3", 7.0)]), NODES, "2030-EO_Summer");
    write(&node_sheet(&[("S1", 12.0), ("S2", 2.0), ("S3", 8.0)]), NODES, "2040-LO_Summer");
    write(&profile_sheet(5.0, 75.0, &[1.5, 2.5]), PROFILES, "2030-EO_Summer");
    write(&profile_sheet(4.0, 70.0, &[1.0, 3.0]), PROFILES, "2040-LO_Summer");
    store
}

fn config() -> SummaryConfig {
    SummaryConfig {
        profile_parameters: vec!["MeanVelocityFluid".into()],
        pumps: vec![PumpLabels {
            name: "P-101".into(),
            suction: "StrainerA".into(),
            discharge: "PumpA".into(),
        }],
        ..Default::default()
    }
}

fn texts(table: &Table, column: &str) -> Vec<String> {
    table
        .column(column)
        .unwrap()
        .into_iter()
        .map(|v| v.label().unwrap_or_default())
        .collect()
}

#[test]
fn node_summary_takes_sink_extremes_per_case() {
    let store = store();
    let summarizer = ResultsSummarizer::new(&store, config());
    let table = summarizer.node_summary(Path::new(NODES)).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(texts(&table, "Node"), ["S2", "S1", "S2", "S1"]);
    assert_eq!(texts(&table, "Min/Max"), ["Minimum", "Maximum", "Minimum", "Maximum"]);
    assert_eq!(
        texts(&table, "Operation"),
        ["Early Operation", "Early Operation", "Late Operation", "Late Operation"]
    );
    assert_eq!(table.cell(0, "Value"), Some(&Value::from(3.0)));
}

#[test]
fn summarize_writes_every_sheet() {
    let store = store();
    let summarizer = ResultsSummarizer::new(&store, config());
    let report = summarizer.summarize(Path::new(NODES), Path::new(PROFILES)).unwrap();

    assert_eq!(report.node_rows, 4);
    assert_eq!(report.profile_sheets, ["MeanVelocityFluid"]);
    assert_eq!(report.pump_rows, 2);

    let pumps = store.read_sheet(Path::new(PROFILES), PUMP_SHEET).unwrap();
    assert_eq!(texts(&pumps, "Case"), ["2030-EO_Summer", "2040-LO_Summer"]);
    assert_eq!(pumps.cell(0, "Pump Head"), Some(&Value::from(70.0)));
    assert_eq!(pumps.cell(1, "Pump Head"), Some(&Value::from(66.0)));

    let velocity = store.read_sheet(Path::new(PROFILES), "MeanVelocityFluid").unwrap();
    assert_eq!(velocity.columns()[1], "MeanVelocityFluid");
    assert_eq!(velocity.cell(0, "MeanVelocityFluid"), Some(&Value::from(1.0)));

    // A second run skips its own output sheets.
    let again = summarizer.summarize(Path::new(NODES), Path::new(PROFILES)).unwrap();
    assert_eq!(again, report);
}

#[test]
fn a_missing_pump_label_aborts_the_summary() {
    let store = store();
    store
        .write_sheet(
            &Table::from_rows(
                ["Branch", "BranchEquipment", "Pressure", "MeanVelocityFluid"],
                vec![vec!["B1".into(), "StrainerA".into(), 5.0.into(), 1.0.into()]],
            ),
            Path::new(PROFILES),
            "2050-LO_Winter",
            CellRef::A2,
            true,
        )
        .unwrap();
    let summarizer = ResultsSummarizer::new(&store, config());

    let err = summarizer
        .summarize(Path::new(NODES), Path::new(PROFILES))
        .unwrap_err();
    assert!(matches!(
        err,
        SummaryError::MissingLabel { ref case, ref label } if case == "2050-LO_Winter" && label == "PumpA"
    ));
    assert!(!store.sheet_names(Path::new(NODES)).unwrap().contains(&NODE_SUMMARY_SHEET.to_string()));
}

#[test]
fn missing_workbook_is_reported() {
    let store = store();
    let summarizer = ResultsSummarizer::new(&store, config());
    let err = summarizer
        .summarize(Path::new("results/absent.json"), Path::new(PROFILES))
        .unwrap_err();
    assert!(matches!(err, SummaryError::MissingFile { .. }));
}
