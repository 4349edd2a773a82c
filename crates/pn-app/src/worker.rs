//! Background execution of one pipeline job with progress messages.

use crate::config::ProjectConfig;
use crate::error::{AppError, AppResult};
use crate::workflow::PipelineContext;
use pn_engine::SessionFactory;
use pn_sim::{CaseOutcome, MatrixEvent};
use pn_tables::TabularDataSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineJob {
    BuildTopology,
    Populate,
    RunCases,
    BuildModels,
    RunExisting { folder: PathBuf },
    UpdateModels,
    CopyFlowlines { source: PathBuf },
    Summarize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Progress { case: String, done: usize, total: usize },
    Complete { summary: String },
    Error { message: String },
}

pub struct PipelineWorker {
    pub progress_rx: Receiver<WorkerMessage>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    pub fn start(
        job: PipelineJob,
        config: ProjectConfig,
        factory: Arc<dyn SessionFactory>,
        source: Arc<dyn TabularDataSource>,
    ) -> Self {
        let (tx, rx) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let handle = thread::spawn(move || {
            let ctx = PipelineContext::new(&config, factory.as_ref(), source.as_ref());
            let message = match Self::run_job(&ctx, &job, &flag, &tx) {
                Ok(summary) => WorkerMessage::Complete { summary },
                Err(e) => {
                    tracing::error!(job = ?job, error = %e, "pipeline job failed");
                    WorkerMessage::Error {
                        message: e.to_string(),
                    }
                }
            };
            let _ = tx.send(message);
        });

        Self {
            progress_rx: rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Ask a running case matrix to stop before its next case.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Next message, if one is waiting.
    pub fn try_message(&self) -> Option<WorkerMessage> {
        match self.progress_rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the job ends and return its terminal message.
    ///
    /// Progress messages received on the way are dropped.
    pub fn wait(mut self) -> AppResult<String> {
        let mut terminal = None;
        for message in self.progress_rx.iter() {
            match message {
                WorkerMessage::Progress { .. } => {}
                other => terminal = Some(other),
            }
        }
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| AppError::Worker("worker thread panicked".to_string()))?;
        }
        match terminal {
            Some(WorkerMessage::Complete { summary }) => Ok(summary),
            Some(WorkerMessage::Error { message }) => Err(AppError::Worker(message)),
            _ => Err(AppError::Worker("worker ended without a result".to_string())),
        }
    }

    fn run_job(
        ctx: &PipelineContext<'_>,
        job: &PipelineJob,
        cancel: &AtomicBool,
        tx: &Sender<WorkerMessage>,
    ) -> AppResult<String> {
        let summary = match job {
            PipelineJob::BuildTopology => {
                let report = ctx.build_topology()?;
                format!(
                    "{} sections built, {} components created",
                    report.sections, report.components_created
                )
            }
            PipelineJob::Populate => ctx.populate()?.to_string(),
            PipelineJob::RunCases => {
                let progress = |event: &MatrixEvent| {
                    if let MatrixEvent::CaseFinished { record, done, total } = event {
                        let _ = tx.send(WorkerMessage::Progress {
                            case: record.case.clone(),
                            done: *done,
                            total: *total,
                        });
                    }
                };
                let report = ctx.run_cases(cancel, Some(&progress))?;
                format!(
                    "{} cases: {} succeeded, {} failed, {} cancelled",
                    report.total, report.succeeded, report.failed, report.cancelled
                )
            }
            PipelineJob::BuildModels => outcome_summary("models built", &ctx.build_models()?),
            PipelineJob::RunExisting { folder } => {
                outcome_summary("models run", &ctx.run_existing_models(folder)?)
            }
            PipelineJob::UpdateModels => outcome_summary("models updated", &ctx.update_models()?),
            PipelineJob::CopyFlowlines { source } => {
                let report = ctx.copy_flowlines(source)?;
                format!(
                    "flowline data copied to {} models, {} failed",
                    report.updated.len(),
                    report.failed.len()
                )
            }
            PipelineJob::Summarize => {
                let report = ctx.summarize()?;
                format!(
                    "{} node rows, {} profile sheets, {} pump rows",
                    report.node_rows,
                    report.profile_sheets.len(),
                    report.pump_rows
                )
            }
        };
        Ok(summary)
    }
}

fn outcome_summary(what: &str, outcomes: &[CaseOutcome]) -> String {
    let ok = outcomes.iter().filter(|o| o.is_success()).count();
    format!("{ok} of {} {what}", outcomes.len())
}
