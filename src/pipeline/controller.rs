//! The pipeline controller.

use std::path::PathBuf;

use super::export::{AssembledRows, RowSource, assemble_rows};
use super::state::PipelineState;
use crate::dataset::{ParsedRow, PreviewDataset, PreviewRow, Record, TemplateType};
use crate::error::{Result, SmsFormatError};
use crate::selection::SelectionStore;
use crate::service::{
    Backend, ChosenFile, DownloadSink, FALLBACK_FILE_NAME, HandoffPayload, HandoffSink,
};
use crate::session::Session;

/// An upload the caller has to perform.
#[derive(Debug)]
pub struct UploadJob {
    generation: u64,
    resume: PipelineState,
    file: ChosenFile,
}

impl UploadJob {
    pub fn file(&self) -> &ChosenFile {
        &self.file
    }
}

/// A transform of the freshly uploaded rows.
#[derive(Debug)]
pub struct TransformJob {
    generation: u64,
    template: TemplateType,
}

impl TransformJob {
    pub fn template(&self) -> TemplateType {
        self.template
    }
}

/// An export of the assembled rows.
#[derive(Debug)]
pub struct ExportJob {
    generation: u64,
    resume: PipelineState,
    template: TemplateType,
    file: Option<ChosenFile>,
    rows: AssembledRows,
}

impl ExportJob {
    pub fn template(&self) -> TemplateType {
        self.template
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows.rows
    }

    pub fn source(&self) -> RowSource {
        self.rows.source
    }

    /// Name the exported bytes are saved under.
    pub fn download_name(&self, extension: Option<&str>) -> String {
        match &self.file {
            Some(file) => file.download_name(extension),
            None => ChosenFile::new(FALLBACK_FILE_NAME).download_name(extension),
        }
    }
}

/// A handoff of the assembled rows.
#[derive(Debug)]
pub struct HandoffJob {
    generation: u64,
    resume: PipelineState,
    source: RowSource,
    payload: HandoffPayload,
}

impl HandoffJob {
    pub fn payload(&self) -> &HandoffPayload {
        &self.payload
    }

    pub fn source(&self) -> RowSource {
        self.source
    }
}

/// Owns the pipeline data and drives it through [`PipelineState`].
///
/// Only one collaborator call can be outstanding: every `begin_*` and
/// [`PipelineController::choose_file`] fail with [`SmsFormatError::Busy`] while one
/// is.
#[derive(Debug)]
pub struct PipelineController {
    session: Session,
    template: TemplateType,
    select_all_on_preview: bool,
    state: PipelineState,
    generation: u64,
    file: Option<ChosenFile>,
    parsed: Vec<ParsedRow>,
    preview: Option<PreviewDataset>,
    selection: SelectionStore,
}

impl PipelineController {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            template: TemplateType::default(),
            select_all_on_preview: true,
            state: PipelineState::Idle,
            generation: 0,
            file: None,
            parsed: Vec::new(),
            preview: None,
            selection: SelectionStore::default(),
        }
    }

    pub fn with_template(mut self, template: TemplateType) -> Self {
        self.template = template;
        self
    }

    /// Whether a new preview starts with every row selected.
    pub fn select_all_on_preview(mut self, select_all: bool) -> Self {
        self.select_all_on_preview = select_all;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn template(&self) -> TemplateType {
        self.template
    }

    pub fn file(&self) -> Option<&ChosenFile> {
        self.file.as_ref()
    }

    pub fn parsed_rows(&self) -> &[ParsedRow] {
        &self.parsed
    }

    pub fn preview(&self) -> Option<&PreviewDataset> {
        self.preview.as_ref()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn transition(&mut self, target: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(SmsFormatError::Other(format!(
                "invalid pipeline transition {} -> {target}",
                self.state
            )));
        }
        tracing::debug!(from = %self.state, to = %target, "Pipeline transition");
        self.state = target;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state.is_busy() {
            return Err(SmsFormatError::Busy(self.state));
        }
        Ok(())
    }

    /// Accept the result of the job issued under `generation`, at most once.
    fn claim(&mut self, generation: u64, stage: &str) -> bool {
        if generation == self.generation {
            self.generation += 1;
            return true;
        }
        tracing::debug!(
            stage,
            job = generation,
            current = self.generation,
            "Ignoring result of a superseded request"
        );
        false
    }

    /// Return to `resume` after a collaborator failure, dropping the credential on a 401.
    fn fail(&mut self, error: SmsFormatError, resume: PipelineState) -> SmsFormatError {
        if matches!(error, SmsFormatError::AuthExpired) {
            self.session.invalidate();
        }
        tracing::error!(state = %self.state, resume = %resume, "Pipeline call failed: {error}");
        if let Err(e) = self.transition(resume) {
            tracing::error!("{e}");
        }
        error
    }

    fn clear_data(&mut self) {
        self.file = None;
        self.parsed.clear();
        self.preview = None;
        self.selection = SelectionStore::default();
    }

    /// Pick the spreadsheet for the next preview.
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::Busy`] while a call is outstanding.
    pub fn choose_file(&mut self, file: ChosenFile) -> Result<()> {
        self.ensure_idle()?;
        tracing::info!(file = file.name(), "File chosen");
        if matches!(self.state, PipelineState::Idle | PipelineState::FileChosen) {
            self.transition(PipelineState::FileChosen)?;
        }
        self.file = Some(file);
        Ok(())
    }

    /// Template for the next preview. The current preview keeps its own.
    pub fn set_template(&mut self, template: TemplateType) {
        if template != self.template {
            tracing::info!(%template, "Template changed");
        }
        self.template = template;
    }

    pub fn toggle(&mut self, index: usize) -> bool {
        self.selection.toggle(index)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Replace the selection with the rows named by `expr`.
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::NoPreview`] without a preview, or
    /// [`SmsFormatError::Validation`] for a malformed expression. The selection is
    /// unchanged on error.
    pub fn apply_range(&mut self, expr: &str) -> Result<()> {
        if self.preview.is_none() {
            return Err(SmsFormatError::NoPreview);
        }
        self.selection.apply_range(expr)?;
        tracing::info!(expr, selected = self.selection.count(), "Range applied");
        Ok(())
    }

    /// Start a preview: the chosen file has to be uploaded first.
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::Busy`] or [`SmsFormatError::NoFileSelected`]; the
    /// state is unchanged in both cases.
    pub fn begin_preview(&mut self) -> Result<UploadJob> {
        self.ensure_idle()?;
        let file = self.file.clone().ok_or(SmsFormatError::NoFileSelected)?;
        let resume = self.state;
        self.transition(PipelineState::Uploading)?;
        self.generation += 1;
        Ok(UploadJob {
            generation: self.generation,
            resume,
            file,
        })
    }

    /// Apply an upload result. On success returns the transform to run next.
    ///
    /// `Ok(None)` means the job was superseded and nothing changed.
    ///
    /// # Errors
    ///
    /// Returns the upload error after restoring the state held before the request,
    /// or [`SmsFormatError::NoDataToPreview`] when the sheet has no rows.
    pub fn complete_upload(
        &mut self,
        job: UploadJob,
        outcome: Result<Vec<ParsedRow>>,
    ) -> Result<Option<TransformJob>> {
        if !self.claim(job.generation, "upload") {
            return Ok(None);
        }
        let rows = match outcome {
            Ok(rows) => rows,
            Err(e) => return Err(self.fail(e, job.resume)),
        };

        tracing::info!(file = job.file.name(), rows = rows.len(), "Upload complete");
        self.transition(PipelineState::Parsed)?;
        self.parsed = rows;
        if self.parsed.is_empty() {
            return Err(SmsFormatError::NoDataToPreview);
        }

        self.transition(PipelineState::Previewing)?;
        Ok(Some(TransformJob {
            generation: self.generation,
            template: self.template,
        }))
    }

    /// Apply a transform result. Returns whether it was applied.
    ///
    /// # Errors
    ///
    /// Returns the transform error, or [`SmsFormatError::Transform`] when the preview
    /// does not have one row per uploaded row. The previous preview is kept and the
    /// pipeline returns to [`PipelineState::Parsed`].
    pub fn complete_transform(
        &mut self,
        job: TransformJob,
        outcome: Result<Vec<PreviewRow>>,
    ) -> Result<bool> {
        if !self.claim(job.generation, "transform") {
            return Ok(false);
        }
        let rows = match outcome {
            Ok(rows) if rows.len() == self.parsed.len() => rows,
            Ok(rows) => {
                let error = SmsFormatError::Transform(format!(
                    "preview has {} rows for {} uploaded rows",
                    rows.len(),
                    self.parsed.len()
                ));
                return Err(self.fail(error, PipelineState::Parsed));
            }
            Err(e) => return Err(self.fail(e, PipelineState::Parsed)),
        };

        self.transition(PipelineState::Previewed)?;
        let dataset = PreviewDataset::new(job.template, rows);
        self.selection
            .reseed(dataset.len(), self.select_all_on_preview);
        tracing::info!(
            template = %job.template,
            rows = dataset.len(),
            selected = self.selection.count(),
            "Preview ready"
        );
        self.preview = Some(dataset);
        Ok(true)
    }

    /// Template the current rows are exported with.
    fn export_template(&self) -> TemplateType {
        self.preview
            .as_ref()
            .map_or(self.template, PreviewDataset::template)
    }

    fn assemble(&self) -> Result<AssembledRows> {
        assemble_rows(self.preview.as_ref(), &self.selection, &self.parsed)
    }

    /// Start an export of the selected rows (see [`assemble_rows`] for precedence).
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::Busy`] or [`SmsFormatError::NoDataToExport`]
    /// without changing state.
    pub fn begin_export(&mut self) -> Result<ExportJob> {
        self.ensure_idle()?;
        let rows = self.assemble()?;
        let resume = self.state;
        self.transition(PipelineState::Exporting)?;
        self.generation += 1;
        tracing::info!(rows = rows.len(), source = rows.source.as_str(), "Exporting");
        Ok(ExportJob {
            generation: self.generation,
            resume,
            template: self.export_template(),
            file: self.file.clone(),
            rows,
        })
    }

    /// Finish an export. The pipeline returns to where it was either way.
    ///
    /// `Ok(None)` means the job was superseded.
    ///
    /// # Errors
    ///
    /// Returns the export error.
    pub fn complete_export<T>(&mut self, job: ExportJob, outcome: Result<T>) -> Result<Option<T>> {
        if !self.claim(job.generation, "export") {
            return Ok(None);
        }
        match outcome {
            Ok(value) => {
                self.transition(job.resume)?;
                Ok(Some(value))
            }
            Err(e) => Err(self.fail(e, job.resume)),
        }
    }

    /// Start handing the selected rows to the messaging screen.
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::Busy`] or [`SmsFormatError::NoDataToExport`]
    /// without changing state.
    pub fn begin_handoff(&mut self) -> Result<HandoffJob> {
        self.ensure_idle()?;
        let rows = self.assemble()?;
        let resume = self.state;
        self.transition(PipelineState::HandingOff)?;
        self.generation += 1;
        Ok(HandoffJob {
            generation: self.generation,
            resume,
            source: rows.source,
            payload: HandoffPayload { data: rows.rows },
        })
    }

    /// Finish a handoff. Success leaves the pipeline empty and idle.
    ///
    /// # Errors
    ///
    /// Returns the handoff error after restoring the previous state.
    pub fn complete_handoff(&mut self, job: HandoffJob, outcome: Result<()>) -> Result<bool> {
        if !self.claim(job.generation, "handoff") {
            return Ok(false);
        }
        if let Err(e) = outcome {
            return Err(self.fail(e, job.resume));
        }
        tracing::info!(
            rows = job.payload.data.len(),
            source = job.source.as_str(),
            "Rows handed off"
        );
        self.transition(PipelineState::Idle)?;
        self.clear_data();
        Ok(true)
    }

    /// Drop the file, rows, preview and selection and return to
    /// [`PipelineState::Idle`]. Results of outstanding calls are ignored afterwards.
    /// The template is kept.
    pub fn discard(&mut self) {
        let from = self.state;
        self.state = PipelineState::Discarding;
        self.generation += 1;
        self.clear_data();
        self.state = PipelineState::Idle;
        tracing::info!(from = %from, "Pipeline discarded");
    }

    pub fn reset(&mut self) {
        self.discard();
    }

    /// Upload the chosen file and transform it. Returns the number of preview rows.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error.
    pub async fn run_preview<B: Backend>(&mut self, backend: &B) -> Result<usize> {
        let upload = self.begin_preview()?;
        let uploaded = backend.upload(&self.session, upload.file()).await;
        let Some(transform) = self.complete_upload(upload, uploaded)? else {
            return Ok(0);
        };
        let previewed = backend
            .transform(&self.session, transform.template(), &self.parsed)
            .await;
        self.complete_transform(transform, previewed)?;
        Ok(self.preview.as_ref().map_or(0, PreviewDataset::len))
    }

    /// Export the assembled rows and store them through `sink`.
    ///
    /// # Errors
    ///
    /// Returns the backend or sink error; the pipeline state is unchanged afterwards.
    pub async fn export<B: Backend, D: DownloadSink>(
        &mut self,
        backend: &B,
        sink: &D,
    ) -> Result<PathBuf> {
        let job = self.begin_export()?;
        let outcome = match backend
            .export(&self.session, job.template(), job.rows())
            .await
        {
            Ok(bytes) => sink.save(&job.download_name(backend.export_extension()), &bytes),
            Err(e) => Err(e),
        };
        self.complete_export(job, outcome)?
            .ok_or_else(|| SmsFormatError::Other("export superseded by a reset".to_owned()))
    }

    /// Hand the assembled rows to `sink`. Returns how many rows were sent.
    ///
    /// # Errors
    ///
    /// Returns the sink error; the pipeline keeps its data in that case.
    pub fn handoff<H: HandoffSink>(&mut self, sink: &H) -> Result<usize> {
        let job = self.begin_handoff()?;
        let rows = job.payload().data.len();
        let outcome = sink.deliver(job.payload());
        self.complete_handoff(job, outcome)?;
        Ok(rows)
    }
}
