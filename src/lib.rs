//! # SMS Format: result messages from mark sheets
//!
//! Turns an uploaded mark sheet into one SMS-ready `Result` message per student,
//! lets the operator choose which rows to keep, and exports them as a workbook or
//! hands them to the messaging screen.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sms_format::pipeline::PipelineController;
//! use sms_format::service::{ChosenFile, FileDownloadSink, LocalBackend};
//! use sms_format::session::Session;
//!
//! # async fn example() -> sms_format::error::Result<()> {
//! let backend = LocalBackend::default();
//! let mut controller = PipelineController::new(Session::anonymous());
//!
//! controller.choose_file(ChosenFile::new("physics.csv"))?;
//! let rows = controller.run_preview(&backend).await?;
//! println!("{rows} messages ready");
//!
//! // Rows 20 to 50, as the operator counts them
//! controller.apply_range("20-50")?;
//! println!("{}", controller.selection().summary());
//!
//! let saved = controller.export(&backend, &FileDownloadSink::new("out")).await?;
//! println!("Saved {}", saved.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: the state machine driving upload, preview, export and handoff
//! - [`selection`]: row range parsing and the selected row set
//! - [`dataset`]: parsed rows, preview rows and template types
//! - [`template`]: local rendering of result messages
//! - [`service`]: backends (HTTP and local) and output sinks
//! - [`session`]: the bearer credential and its keyring storage
//! - [`error`]: error types and handling utilities
//! - [`config`], [`logging`], [`utils`]: application plumbing

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod selection;
pub mod service;
pub mod session;
pub mod template;
pub mod utils;
