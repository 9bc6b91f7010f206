use crate::SelectedFile;
use crate::page::{Display, ElementId, EventKind, EventOutcome, ListenerHandle, Page, Target};
use crate::utils::format_file_size;

/// Class marking the upload area while something is dragged over it.
pub const DRAGOVER_CLASS: &str = "dragover";

/// Single-file selection through the file input or the drop area.
///
/// Only active when the input, the preview and the upload area all exist.
#[derive(Debug, Default)]
pub struct FileManager {
    bound: bool,
    current: Option<SelectedFile>,
}

impl FileManager {
    pub fn new(page: &Page) -> Self {
        Self {
            bound: page.has(ElementId::FileInput)
                && page.has(ElementId::FilePreview)
                && page.has(ElementId::FileUploadArea),
            current: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Register the upload-area and input listeners.
    pub fn attach(&self, page: &mut Page) -> Vec<ListenerHandle> {
        if !self.bound {
            return Vec::new();
        }

        let area = Target::Element(ElementId::FileUploadArea);
        [
            (area, EventKind::Click),
            (area, EventKind::DragEnter),
            (area, EventKind::DragOver),
            (area, EventKind::DragLeave),
            (area, EventKind::Drop),
            (Target::Element(ElementId::FileInput), EventKind::Change),
        ]
        .into_iter()
        .filter_map(|(target, kind)| page.listen(target, kind))
        .collect()
    }

    /// A click reached the upload area. Opens the picker unless the click
    /// came from the input itself. Returns whether the picker was requested.
    pub fn area_clicked(&mut self, page: &mut Page, origin: ElementId) -> bool {
        if !self.bound || origin == ElementId::FileInput {
            return false;
        }
        match page.element_mut(ElementId::FileInput) {
            Some(input) => {
                input.activate();
                true
            }
            None => false,
        }
    }

    /// Drag entered or moved over the upload area.
    pub fn drag_over(&self, page: &mut Page) -> EventOutcome {
        if let Some(area) = page.element_mut(ElementId::FileUploadArea) {
            area.add_class(DRAGOVER_CLASS);
        }
        EventOutcome::contained()
    }

    pub fn drag_left(&self, page: &mut Page) -> EventOutcome {
        if let Some(area) = page.element_mut(ElementId::FileUploadArea) {
            area.remove_class(DRAGOVER_CLASS);
        }
        EventOutcome::contained()
    }

    /// Files were dropped on the upload area. An empty payload only clears
    /// the drag marking.
    pub fn dropped(&mut self, page: &mut Page, files: Vec<SelectedFile>) -> EventOutcome {
        let outcome = self.drag_left(page);
        if !files.is_empty() {
            if let Some(input) = page.element_mut(ElementId::FileInput) {
                input.set_files(files);
            }
            self.update_preview(page);
        }
        outcome
    }

    /// The input's selection changed through the native picker.
    pub fn input_changed(&mut self, page: &mut Page, files: Vec<SelectedFile>) {
        if let Some(input) = page.element_mut(ElementId::FileInput) {
            input.set_files(files);
        }
        self.update_preview(page);
    }

    /// Track the input's first file and show or hide the preview for it.
    pub fn update_preview(&mut self, page: &mut Page) {
        self.current = page
            .element(ElementId::FileInput)
            .and_then(|input| input.files().first().cloned());

        let Some(preview) = page.element_mut(ElementId::FilePreview) else {
            return;
        };
        match &self.current {
            Some(file) => {
                preview.set_text(format!(
                    "Arquivo: {} ({})",
                    file.name(),
                    format_file_size(file.size())
                ));
                preview.set_display(Display::InlineBlock);
            }
            None => preview.set_display(Display::None),
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.current.as_ref()
    }
}
