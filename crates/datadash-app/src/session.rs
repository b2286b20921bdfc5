// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::{
    AnalysisResult, ChatMessage, ContextSnapshot, Dataset, PageSizes, Projection, RequestId,
    TodoList, ViewMode, ViewState, build_context,
};

pub const NO_DATA_MESSAGE: &str = "No data available to analyze.";
pub const NO_ANALYSIS_MESSAGE: &str = "Run an analysis before asking follow-up questions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Analysis,
    Chat,
}

#[derive(Debug, Clone, PartialEq)]
enum PendingCall {
    Analysis(RequestId),
    Chat {
        id: RequestId,
        previous: Vec<ChatMessage>,
    },
}

impl PendingCall {
    const fn id(&self) -> RequestId {
        match self {
            Self::Analysis(id) | Self::Chat { id, .. } => *id,
        }
    }
}

/// Everything one loaded file carries: the data, how it is being viewed,
/// the analysis conversation about it and the user's action items.
///
/// At most one analysis or chat call is outstanding. Completions are matched
/// by [`RequestId`]; anything carrying an id other than the pending one is
/// dropped, which is how a reset abandons an in-flight call.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    view: ViewState,
    default_mode: ViewMode,
    analysis: Option<AnalysisResult>,
    transcript: Vec<ChatMessage>,
    todos: TodoList,
    error: Option<String>,
    pending: Option<PendingCall>,
    last_request: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PageSizes::default(), ViewMode::Table)
    }
}

impl Session {
    pub fn new(page_sizes: PageSizes, default_mode: ViewMode) -> Self {
        Self {
            dataset: Dataset::default(),
            view: ViewState::new(page_sizes, default_mode),
            default_mode,
            analysis: None,
            transcript: Vec::new(),
            todos: TodoList::new(),
            error: None,
            pending: None,
            last_request: 0,
        }
    }

    pub fn load_dataset(&mut self, dataset: Dataset) {
        self.reset();
        info!(
            file = %dataset.file_name,
            rows = dataset.row_count(),
            columns = dataset.headers.len(),
            "dataset loaded"
        );
        self.dataset = dataset;
    }

    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(request = %pending.id(), "abandoning in-flight request");
        }
        self.dataset = Dataset::default();
        self.view.reset();
        self.view.set_view_mode(self.default_mode);
        self.analysis = None;
        self.transcript.clear();
        self.todos = TodoList::new();
        self.error = None;
    }

    /// Records a failure that is not tied to a request, such as a file that
    /// would not decode. Leaves the session empty.
    pub fn fail_load(&mut self, message: impl Into<String>) {
        self.reset();
        self.error = Some(message.into());
    }

    pub fn begin_analysis(&mut self) -> Result<RequestId> {
        if self.dataset.is_empty() {
            bail!(NO_DATA_MESSAGE);
        }
        self.ensure_idle()?;

        self.analysis = None;
        self.transcript.clear();
        self.todos.clear();
        self.error = None;

        let id = self.next_request();
        self.pending = Some(PendingCall::Analysis(id));
        debug!(request = %id, "analysis started");
        Ok(id)
    }

    /// Returns whether the completion was accepted.
    pub fn finish_analysis(
        &mut self,
        id: RequestId,
        outcome: Result<AnalysisResult, String>,
    ) -> bool {
        if !matches!(self.pending, Some(PendingCall::Analysis(pending)) if pending == id) {
            debug!(request = %id, "dropping stale analysis completion");
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(analysis) => self.analysis = Some(analysis),
            Err(message) => self.error = Some(message),
        }
        true
    }

    /// Appends the question to the transcript right away. Blank text yields
    /// `Ok(None)` and changes nothing.
    pub fn begin_chat(&mut self, text: &str) -> Result<Option<RequestId>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.analysis.is_none() {
            bail!(NO_ANALYSIS_MESSAGE);
        }
        self.ensure_idle()?;

        let previous = self.transcript.clone();
        self.transcript.push(ChatMessage::user(text));
        self.error = None;

        let id = self.next_request();
        self.pending = Some(PendingCall::Chat { id, previous });
        debug!(request = %id, turns = self.transcript.len(), "chat started");
        Ok(Some(id))
    }

    /// On failure the transcript goes back to what it was before the
    /// question was appended.
    pub fn finish_chat(&mut self, id: RequestId, outcome: Result<String, String>) -> bool {
        let previous = match self.pending.take() {
            Some(PendingCall::Chat {
                id: pending,
                previous,
            }) if pending == id => previous,
            other => {
                self.pending = other;
                debug!(request = %id, "dropping stale chat completion");
                return false;
            }
        };

        match outcome {
            Ok(reply) => self.transcript.push(ChatMessage::model(reply)),
            Err(message) => {
                self.transcript = previous;
                self.error = Some(message);
            }
        }
        true
    }

    pub fn request_sort(&mut self, column: &str) {
        self.view.request_sort(column);
    }

    pub fn request_filter(&mut self, text: impl Into<String>) {
        self.view.request_filter(text);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view.set_view_mode(mode);
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.view.go_to_page(page, &self.dataset)
    }

    pub fn next_page(&mut self) -> bool {
        self.view.next_page(&self.dataset)
    }

    pub fn prev_page(&mut self) -> bool {
        self.view.prev_page(&self.dataset)
    }

    pub fn project(&self) -> Projection<'_> {
        self.view.project(&self.dataset)
    }

    pub fn context(&self) -> ContextSnapshot {
        build_context(&self.dataset, &self.view, self.analysis.as_ref())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn has_data(&self) -> bool {
        !self.dataset.is_empty()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn todos(&self) -> &TodoList {
        &self.todos
    }

    pub fn todos_mut(&mut self) -> &mut TodoList {
        &mut self.todos
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> Option<PendingKind> {
        self.pending.as_ref().map(|pending| match pending {
            PendingCall::Analysis(_) => PendingKind::Analysis,
            PendingCall::Chat { .. } => PendingKind::Chat,
        })
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.pending() {
            Some(PendingKind::Analysis) => bail!("An analysis is already running; wait for it to finish."),
            Some(PendingKind::Chat) => bail!("A chat reply is still pending; wait for it to finish."),
            None => Ok(()),
        }
    }

    fn next_request(&mut self) -> RequestId {
        self.last_request += 1;
        RequestId::new(self.last_request)
    }
}
