//! The form coordinator.
//!
//! [`EmailFormApp`] owns the page and every manager. Page events come in
//! through [`EmailFormApp::dispatch`]; a submit starts the request on the
//! tokio runtime and its settlement comes back over a channel, to be applied
//! by [`EmailFormApp::settle`]. Settlements from superseded requests are
//! dropped so a stale response never overwrites a newer one.

use tokio::sync::mpsc;

use crate::ClassificationResult;
use crate::api::{ApiError, ApiManager, RequestId};
use crate::files::FileManager;
use crate::form::FormData;
use crate::page::{ElementId, EventKind, EventOutcome, ListenerHandle, Page, PageEvent, Target};
use crate::theme::ThemeManager;
use crate::ui::UiManager;

pub const CONNECTION_ERROR_MESSAGE: &str =
    "Erro de conexão. Verifique sua internet e tente novamente.";
pub const CANCELLED_MESSAGE: &str = "Requisição cancelada.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting(RequestId),
}

/// What a finished submission put on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Classified(ClassificationResult),
    /// The user-facing message shown in the error view.
    Failed(String),
}

#[derive(Debug)]
struct Settlement {
    id: RequestId,
    result: Result<ClassificationResult, ApiError>,
}

/// The message shown to the user for a failed request.
pub fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => CONNECTION_ERROR_MESSAGE.to_string(),
        ApiError::Cancelled => CANCELLED_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

pub struct EmailFormApp {
    page: Page,
    theme: ThemeManager,
    files: FileManager,
    api: ApiManager,
    ui: UiManager,
    state: SubmitState,
    listeners: Vec<ListenerHandle>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
}

impl EmailFormApp {
    /// Bind the managers to `page`. Call [`EmailFormApp::init`] to start
    /// listening.
    pub fn new(page: Page, theme: ThemeManager, api: ApiManager) -> Self {
        let files = FileManager::new(&page);
        let ui = UiManager::new(&page);
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();

        Self {
            page,
            theme,
            files,
            api,
            ui,
            state: SubmitState::Idle,
            listeners: Vec::new(),
            settled_tx,
            settled_rx,
        }
    }

    /// Apply the theme and register every listener the form needs.
    pub fn init(&mut self) {
        self.listeners.extend(self.theme.init(&mut self.page));
        self.listeners.extend(self.files.attach(&mut self.page));
        self.listeners.extend(
            [
                (Target::Element(ElementId::EmailForm), EventKind::Submit),
                (Target::Window, EventKind::ColorSchemeChange),
                (Target::Window, EventKind::Unload),
            ]
            .into_iter()
            .filter_map(|(target, kind)| self.page.listen(target, kind)),
        );
        tracing::debug!(listeners = self.listeners.len(), "form initialised");
    }

    /// Deliver a page event. Events nobody listens for are ignored.
    pub fn dispatch(&mut self, event: PageEvent) -> EventOutcome {
        let (target, kind) = event.route();
        if !self.page.is_listening(target, kind) {
            return EventOutcome::ignored();
        }

        match event {
            PageEvent::Submit(form) => {
                self.handle_submit(form);
                EventOutcome::prevented()
            }
            PageEvent::Click(ElementId::ThemeToggle) => {
                self.theme.toggle(&mut self.page);
                EventOutcome::handled()
            }
            PageEvent::Click(origin) => {
                self.files.area_clicked(&mut self.page, origin);
                EventOutcome::handled()
            }
            PageEvent::DragEnter | PageEvent::DragOver => self.files.drag_over(&mut self.page),
            PageEvent::DragLeave => self.files.drag_left(&mut self.page),
            PageEvent::Drop(files) => self.files.dropped(&mut self.page, files),
            PageEvent::FilesSelected(files) => {
                self.files.input_changed(&mut self.page, files);
                EventOutcome::handled()
            }
            PageEvent::ColorSchemeChanged { prefers_dark } => {
                self.theme.system_changed(&mut self.page, prefers_dark);
                EventOutcome::handled()
            }
            PageEvent::Unload => {
                self.destroy();
                EventOutcome::handled()
            }
        }
    }

    /// Start a submission unless one is already running.
    fn handle_submit(&mut self, form: FormData) {
        if let SubmitState::Submitting(current) = self.state {
            tracing::debug!(request = %current, "submission in progress, ignoring submit");
            return;
        }
        self.start(form);
    }

    /// Start a submission even if one is running, superseding it.
    ///
    /// The superseded request is cancelled and its settlement discarded.
    pub fn resubmit(&mut self, form: FormData) {
        self.start(form);
    }

    fn start(&mut self, form: FormData) {
        self.ui.show_loading(&mut self.page, true);
        self.ui.clear_result(&mut self.page);

        let form = self.prepare_form_data(form);
        let pending = self.api.process_form(form);
        let id = pending.id();
        self.state = SubmitState::Submitting(id);
        tracing::info!(request = %id, endpoint = self.api.endpoint(), "submitting email");

        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = pending.await;
            // Fails only once the app has been dropped.
            let _ = tx.send(Settlement { id, result });
        });
    }

    /// The submitted fields, with `file` replaced by the tracked file.
    fn prepare_form_data(&self, mut form: FormData) -> FormData {
        if let Some(file) = self.files.file() {
            form.set_file(file.clone());
        }
        form
    }

    /// Wait for the running submission to settle and apply it to the page.
    ///
    /// Returns `None` straight away when nothing is running.
    pub async fn settle(&mut self) -> Option<SubmitOutcome> {
        while let SubmitState::Submitting(_) = self.state {
            let settlement = self.settled_rx.recv().await?;
            if let Some(outcome) = self.apply(settlement) {
                return Some(outcome);
            }
        }
        None
    }

    fn apply(&mut self, settlement: Settlement) -> Option<SubmitOutcome> {
        let Settlement { id, result } = settlement;
        if self.state != SubmitState::Submitting(id) {
            tracing::debug!(request = %id, "dropping stale settlement");
            return None;
        }

        let outcome = match result {
            Ok(result) => {
                self.ui.display_result(&mut self.page, &result);
                SubmitOutcome::Classified(result)
            }
            Err(err) => {
                match &err {
                    ApiError::Cancelled => tracing::debug!(request = %id, "request cancelled"),
                    _ => tracing::warn!(request = %id, error = %err, "classification failed"),
                }
                let message = user_message(&err);
                self.ui.display_error(&mut self.page, &message);
                SubmitOutcome::Failed(message)
            }
        };

        self.ui.show_loading(&mut self.page, false);
        self.state = SubmitState::Idle;
        Some(outcome)
    }

    /// Abort the in-flight request and drop every listener.
    pub fn destroy(&mut self) {
        self.api.abort();
        for handle in self.listeners.drain(..) {
            handle.dispose(&mut self.page);
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, SubmitState::Submitting(_))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn theme(&self) -> &ThemeManager {
        &self.theme
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    pub fn api(&self) -> &ApiManager {
        &self.api
    }
}
