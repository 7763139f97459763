//! The upload → preview → select → export pipeline.
//!
//! [`PipelineController`] owns everything the screen shows: the chosen file, the
//! parsed rows, the current [`crate::dataset::PreviewDataset`] and the
//! [`crate::selection::SelectionStore`]. It moves through [`PipelineState`] one
//! command at a time:
//!
//! ```text
//! Idle ─choose_file─▶ FileChosen ─preview─▶ Uploading ─▶ Parsed ─▶ Previewing ─▶ Previewed
//!                                                                                 │
//!                               ◀──────── export (non-destructive) ───── Exporting┤
//!                               Idle ◀─── handoff (one-way exit) ─────  HandingOff┘
//! any state ─discard─▶ Discarding ─▶ Idle
//! ```
//!
//! # Two ways to drive it
//!
//! Event loops that own their own I/O use the ticket API: `begin_*` validates the
//! command and returns a job, the caller performs the service call, and
//! `complete_*` applies the outcome. Each job remembers the generation it was issued
//! under, so a response that arrives after [`PipelineController::discard`] is
//! dropped instead of resurrecting old rows.
//!
//! ```no_run
//! use sms_format::pipeline::PipelineController;
//! use sms_format::service::{ChosenFile, LocalBackend, FileDownloadSink};
//! use sms_format::session::Session;
//!
//! # async fn run() -> sms_format::error::Result<()> {
//! let backend = LocalBackend::default();
//! let mut controller = PipelineController::new(Session::anonymous());
//! controller.choose_file(ChosenFile::new("marks.csv"))?;
//! controller.run_preview(&backend).await?;
//! controller.apply_range("20-50")?;
//! let saved = controller.export(&backend, &FileDownloadSink::new("out")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The async drivers ([`PipelineController::run_preview`], [`PipelineController::export`],
//! [`PipelineController::handoff`]) run both halves against a [`crate::service::Backend`].

pub mod controller;
pub mod export;
pub mod state;

pub use controller::{ExportJob, HandoffJob, PipelineController, TransformJob, UploadJob};
pub use export::{AssembledRows, RowSource, assemble_rows};
pub use state::PipelineState;
