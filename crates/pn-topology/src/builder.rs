//! Author sections into an engine session.

use crate::error::{TopologyError, TopologyResult};
use crate::layout::Layout;
use crate::section::{Section, sections_from_table};
use pn_core::{ComponentKind, Table, Value, params};
use pn_engine::{ComponentValues, EngineError, EngineSession};
use pn_tables::SheetRef;

/// A section that could not be connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailure {
    pub section: usize,
    pub message: String,
}

/// Outcome of a build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub sections: usize,
    pub components_created: usize,
    pub components_existing: usize,
    pub connections_made: usize,
    pub connections_existing: usize,
    pub failed: Vec<SectionFailure>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn a partial build into `TopologyError::PartialBuild`.
    pub fn into_result(self) -> TopologyResult<BuildReport> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(TopologyError::PartialBuild {
                total: self.sections,
                failed: self.failed,
            })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    layout: Layout,
}

impl TopologyBuilder {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Read sections from `table`, insert junctions and build them.
    pub fn build_from_table(
        &self,
        session: &mut dyn EngineSession,
        table: &Table,
        origin: &SheetRef,
    ) -> TopologyResult<BuildReport> {
        let sections: Vec<Section> = sections_from_table(table, origin)?
            .into_iter()
            .map(Section::with_junctions)
            .collect();
        self.build(session, &sections)
    }

    /// Create every component, then connect each section in order.
    ///
    /// Existing components and connections are tolerated with a warning. A
    /// connection whose endpoint is missing fails its section only; the
    /// report lists such sections. Any other engine rejection aborts the build.
    pub fn build(
        &self,
        session: &mut dyn EngineSession,
        sections: &[Section],
    ) -> TopologyResult<BuildReport> {
        let mut report = BuildReport {
            sections: sections.len(),
            ..BuildReport::default()
        };

        for (order, section) in sections.iter().enumerate() {
            for (position, row) in section.rows.iter().enumerate() {
                let coordinates = (row.kind != ComponentKind::Flowline).then(|| {
                    let (x, y) = self.layout.place(order, section.index, position);
                    ComponentValues::from([
                        (params::X.to_string(), Value::from(x)),
                        (params::Y.to_string(), Value::from(y)),
                    ])
                });
                match session.add(row.kind, &row.name, coordinates.as_ref()) {
                    Ok(()) => report.components_created += 1,
                    Err(e) if e.is_already_exists() => {
                        tracing::warn!(component = %row.name, "component already exists in the model");
                        report.components_existing += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        for section in sections {
            match self.connect_section(session, section, &mut report) {
                Ok(()) => {}
                Err(e @ TopologyError::UnresolvedEndpoint { .. }) => {
                    tracing::error!(section = section.index, error = %e, "section not connected");
                    report.failed.push(SectionFailure {
                        section: section.index,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            sections = report.sections,
            created = report.components_created,
            connections = report.connections_made,
            failed = report.failed.len(),
            "topology built"
        );
        Ok(report)
    }

    fn connect_section(
        &self,
        session: &mut dyn EngineSession,
        section: &Section,
        report: &mut BuildReport,
    ) -> TopologyResult<()> {
        for pair in section.rows.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let unresolved = |missing: &str| TopologyError::UnresolvedEndpoint {
                section: section.index,
                from: from.name.clone(),
                to: to.name.clone(),
                missing: missing.to_string(),
            };
            for end in [from, to] {
                if !session.find(end.kind, &end.name)? {
                    return Err(unresolved(&end.name));
                }
            }
            match session.connect(&from.name, &to.name) {
                Ok(()) => report.connections_made += 1,
                Err(e) if e.is_already_connected() => {
                    tracing::warn!(from = %from.name, to = %to.name, "connection already exists");
                    report.connections_existing += 1;
                }
                Err(EngineError::NotFound { name, .. }) => return Err(unresolved(&name)),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
