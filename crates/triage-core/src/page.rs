//! Headless model of the form page.
//!
//! The coordinator's only contract with the markup is a fixed set of element
//! ids. [`Page`] holds the observable state of those elements (visibility,
//! text, inner HTML, classes, selected files) plus the document-root
//! attributes, and a table of listener registrations. Events reach the
//! coordinator as [`PageEvent`] values and are only handled when a listener
//! for their target is registered.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::form::FormData;
use crate::utils::escape_html;
use crate::SelectedFile;

/// Element ids the coordinator binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    EmailForm,
    Result,
    Loading,
    ThemeToggle,
    FileInput,
    FilePreview,
    FileUploadArea,
}

impl ElementId {
    pub const ALL: [ElementId; 7] = [
        ElementId::EmailForm,
        ElementId::Result,
        ElementId::Loading,
        ElementId::ThemeToggle,
        ElementId::FileInput,
        ElementId::FilePreview,
        ElementId::FileUploadArea,
    ];

    /// The `id` attribute of the element in the markup.
    pub fn dom_id(self) -> &'static str {
        match self {
            ElementId::EmailForm => "emailForm",
            ElementId::Result => "result",
            ElementId::Loading => "loading",
            ElementId::ThemeToggle => "theme-toggle",
            ElementId::FileInput => "file",
            ElementId::FilePreview => "filePreview",
            ElementId::FileUploadArea => "fileUploadArea",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_id())
    }
}

impl FromStr for ElementId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementId::ALL
            .into_iter()
            .find(|id| id.dom_id() == s)
            .ok_or_else(|| format!("unknown element id: {s}"))
    }
}

/// CSS `display` value of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// No inline style; the stylesheet decides.
    #[default]
    Unset,
    None,
    Block,
    InlineBlock,
}

impl Display {
    pub fn css(self) -> &'static str {
        match self {
            Display::Unset => "",
            Display::None => "none",
            Display::Block => "block",
            Display::InlineBlock => "inline-block",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    text: String,
    inner_html: String,
    display: Display,
    classes: BTreeSet<String>,
    files: Vec<SelectedFile>,
    activations: usize,
}

impl Element {
    /// Text last written through [`Element::set_text`].
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.inner_html = escape_html(&self.text);
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Replace the markup. Tracked text is cleared.
    pub fn set_inner_html(&mut self, html: impl Into<String>) {
        self.inner_html = html.into();
        self.text.clear();
    }

    pub fn display(&self) -> Display {
        self.display
    }

    pub fn set_display(&mut self, display: Display) {
        self.display = display;
    }

    pub fn is_hidden(&self) -> bool {
        self.display == Display::None
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Files held by a file input.
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn set_files(&mut self, files: Vec<SelectedFile>) {
        self.files = files;
    }

    /// Programmatic `click()`; on a file input this opens the native picker.
    pub fn activate(&mut self) {
        self.activations += 1;
    }

    pub fn activations(&self) -> usize {
        self.activations
    }
}

/// What a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Element(ElementId),
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    Change,
    Submit,
    ColorSchemeChange,
    Unload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A registered listener. Dispose it to unregister.
#[must_use = "dropping the handle leaves the listener registered"]
#[derive(Debug, PartialEq, Eq)]
pub struct ListenerHandle {
    id: ListenerId,
    target: Target,
    kind: EventKind,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Unregister the listener. Returns false if it was already gone.
    pub fn dispose(self, page: &mut Page) -> bool {
        page.listeners.remove(&self.id).is_some()
    }
}

/// An event raised by the page.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The form was submitted with these field values.
    Submit(FormData),
    /// A click that originated on the given element.
    Click(ElementId),
    DragEnter,
    DragOver,
    DragLeave,
    /// Files dropped on the upload area; may be empty.
    Drop(Vec<SelectedFile>),
    /// The user picked files through the native picker (empty when cleared).
    FilesSelected(Vec<SelectedFile>),
    /// The OS `prefers-color-scheme` setting changed.
    ColorSchemeChanged { prefers_dark: bool },
    Unload,
}

impl PageEvent {
    /// The listener target and event kind this event is delivered to.
    pub fn route(&self) -> (Target, EventKind) {
        match self {
            PageEvent::Submit(_) => (Target::Element(ElementId::EmailForm), EventKind::Submit),
            // Clicks on the file input bubble up to the upload area.
            PageEvent::Click(ElementId::FileInput) => (
                Target::Element(ElementId::FileUploadArea),
                EventKind::Click,
            ),
            PageEvent::Click(origin) => (Target::Element(*origin), EventKind::Click),
            PageEvent::DragEnter => (
                Target::Element(ElementId::FileUploadArea),
                EventKind::DragEnter,
            ),
            PageEvent::DragOver => (
                Target::Element(ElementId::FileUploadArea),
                EventKind::DragOver,
            ),
            PageEvent::DragLeave => (
                Target::Element(ElementId::FileUploadArea),
                EventKind::DragLeave,
            ),
            PageEvent::Drop(_) => (Target::Element(ElementId::FileUploadArea), EventKind::Drop),
            PageEvent::FilesSelected(_) => {
                (Target::Element(ElementId::FileInput), EventKind::Change)
            }
            PageEvent::ColorSchemeChanged { .. } => (Target::Window, EventKind::ColorSchemeChange),
            PageEvent::Unload => (Target::Window, EventKind::Unload),
        }
    }
}

/// How an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    pub handled: bool,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl EventOutcome {
    /// No listener was registered for the event.
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    /// Handled, with the browser default suppressed.
    pub fn prevented() -> Self {
        Self {
            handled: true,
            default_prevented: true,
            propagation_stopped: false,
        }
    }

    /// Handled, with both the default and further propagation suppressed.
    pub fn contained() -> Self {
        Self {
            handled: true,
            default_prevented: true,
            propagation_stopped: true,
        }
    }
}

/// The page the form lives in.
#[derive(Debug, Default)]
pub struct Page {
    elements: BTreeMap<ElementId, Element>,
    root_attributes: BTreeMap<String, String>,
    listeners: BTreeMap<ListenerId, (Target, EventKind)>,
    next_listener: u64,
}

impl Page {
    /// An empty page with no bound elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// A page containing only the given elements.
    pub fn with_elements(ids: impl IntoIterator<Item = ElementId>) -> Self {
        let mut page = Self::new();
        for id in ids {
            page.elements.insert(id, Element::default());
        }
        page
    }

    /// A page with every element the form expects.
    pub fn standard() -> Self {
        Self::with_elements(ElementId::ALL)
    }

    pub fn has(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn root_attribute(&self, name: &str) -> Option<&str> {
        self.root_attributes.get(name).map(String::as_str)
    }

    pub fn set_root_attribute(&mut self, name: &str, value: &str) {
        self.root_attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Register a listener. Returns `None` when the target element is absent.
    pub fn listen(&mut self, target: Target, kind: EventKind) -> Option<ListenerHandle> {
        if let Target::Element(id) = target {
            if !self.has(id) {
                return None;
            }
        }
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, (target, kind));
        Some(ListenerHandle { id, target, kind })
    }

    pub fn is_listening(&self, target: Target, kind: EventKind) -> bool {
        self.listeners
            .values()
            .any(|&(t, k)| t == target && k == kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
