use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::page::{ElementId, EventKind, ListenerHandle, Page, Target};
use crate::preferences::PreferenceStore;

/// Root attribute the stylesheet keys its palette on.
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon shown on the toggle: what clicking it switches to.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Dark => "☀️",
            Theme::Light => "🌙",
        }
    }

    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other} (expected light or dark)")),
        }
    }
}

/// Source of the operating system's colour-scheme preference.
pub trait SystemScheme {
    /// `Some(true)` when the OS asks for a dark scheme, `None` if unknown.
    fn prefers_dark(&self) -> Option<bool>;
}

/// Reads the `COLORFGBG` convention (`"<fg>;<bg>"`) set by many terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorFgBg;

impl ColorFgBg {
    fn parse(value: &str) -> Option<bool> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(matches!(background, 0..=6 | 8))
    }
}

impl SystemScheme for ColorFgBg {
    fn prefers_dark(&self) -> Option<bool> {
        std::env::var("COLORFGBG").ok().as_deref().and_then(Self::parse)
    }
}

/// A fixed answer, for tests and for callers that already know.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedScheme(pub Option<bool>);

impl SystemScheme for FixedScheme {
    fn prefers_dark(&self) -> Option<bool> {
        self.0
    }
}

/// Tracks the light/dark preference and applies it to the page.
pub struct ThemeManager {
    current: Theme,
    explicit: bool,
    toggle_bound: bool,
    store: Box<dyn PreferenceStore>,
}

impl ThemeManager {
    /// Resolve the starting theme: persisted choice, then the OS preference,
    /// then `fallback`.
    pub fn new(
        store: Box<dyn PreferenceStore>,
        system: &dyn SystemScheme,
        fallback: Theme,
    ) -> Self {
        let persisted = store.load_theme();
        let current = persisted
            .or_else(|| system.prefers_dark().map(Theme::from_prefers_dark))
            .unwrap_or(fallback);

        Self {
            current,
            explicit: persisted.is_some(),
            toggle_bound: false,
            store,
        }
    }

    /// Bind to the page: apply the current theme and listen for toggle clicks.
    pub fn init(&mut self, page: &mut Page) -> Option<ListenerHandle> {
        self.toggle_bound = page.has(ElementId::ThemeToggle);
        self.set_theme(page, self.current);
        page.listen(Target::Element(ElementId::ThemeToggle), EventKind::Click)
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Whether the current theme came from the user rather than the OS.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn is_toggle_bound(&self) -> bool {
        self.toggle_bound
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub fn set_theme(&mut self, page: &mut Page, theme: Theme) {
        self.current = theme;
        page.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        if let Some(toggle) = page.element_mut(ElementId::ThemeToggle) {
            toggle.set_text(theme.toggle_icon());
        }
    }

    /// Apply a user choice and persist it.
    pub fn choose(&mut self, page: &mut Page, theme: Theme) {
        self.set_theme(page, theme);
        self.explicit = true;
        if let Err(e) = self.store.save_theme(theme) {
            tracing::warn!(theme = %theme, error = %e, "failed to persist theme preference");
        }
    }

    pub fn toggle(&mut self, page: &mut Page) -> Theme {
        let next = self.current.toggled();
        self.choose(page, next);
        next
    }

    /// React to an OS colour-scheme change. Returns whether it was applied.
    ///
    /// Only applies while a toggle is bound and the user has not picked a
    /// theme themselves.
    pub fn system_changed(&mut self, page: &mut Page, prefers_dark: bool) -> bool {
        if !self.toggle_bound {
            return false;
        }
        if self.explicit {
            tracing::debug!(
                theme = %self.current,
                prefers_dark,
                "keeping explicit theme over OS change"
            );
            return false;
        }
        self.set_theme(page, Theme::from_prefers_dark(prefers_dark));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryStore;

    fn manager(store: MemoryStore, os: Option<bool>) -> ThemeManager {
        ThemeManager::new(Box::new(store), &FixedScheme(os), Theme::Light)
    }

    #[test]
    fn persisted_choice_wins_over_os() {
        let tm = manager(MemoryStore::with_theme(Theme::Light), Some(true));
        assert_eq!(tm.current(), Theme::Light);
        assert!(tm.is_explicit());
    }

    #[test]
    fn os_preference_used_when_nothing_persisted() {
        assert_eq!(manager(MemoryStore::new(), Some(true)).current(), Theme::Dark);
        assert_eq!(manager(MemoryStore::new(), Some(false)).current(), Theme::Light);
    }

    #[test]
    fn fallback_when_nothing_known() {
        let tm = ThemeManager::new(Box::new(MemoryStore::new()), &FixedScheme(None), Theme::Dark);
        assert_eq!(tm.current(), Theme::Dark);
        assert!(!tm.is_explicit());
        assert_eq!(manager(MemoryStore::new(), None).current(), Theme::Light);
    }

    #[test]
    fn init_applies_theme_and_icon() {
        let mut page = Page::standard();
        let mut tm = manager(MemoryStore::new(), Some(true));
        let handle = tm.init(&mut page);

        assert!(handle.is_some());
        assert_eq!(page.root_attribute(THEME_ATTRIBUTE), Some("dark"));
        assert_eq!(page.element(ElementId::ThemeToggle).unwrap().text(), "☀️");
    }

    #[test]
    fn set_theme_is_idempotent() {
        let mut page = Page::standard();
        let mut tm = manager(MemoryStore::new(), None);
        let _ = tm.init(&mut page);

        tm.set_theme(&mut page, Theme::Dark);
        tm.set_theme(&mut page, Theme::Dark);
        assert_eq!(tm.current(), Theme::Dark);
        assert_eq!(page.root_attribute(THEME_ATTRIBUTE), Some("dark"));
        assert_eq!(page.element(ElementId::ThemeToggle).unwrap().text(), "☀️");
        // Not a user choice, so nothing persisted.
        assert_eq!(tm.store().load_theme(), None);
    }

    #[test]
    fn toggling_twice_restores_theme_and_persisted_value() {
        let mut page = Page::standard();
        let mut tm = manager(MemoryStore::with_theme(Theme::Light), None);
        let _ = tm.init(&mut page);

        assert_eq!(tm.toggle(&mut page), Theme::Dark);
        assert_eq!(tm.store().load_theme(), Some(Theme::Dark));
        assert_eq!(page.element(ElementId::ThemeToggle).unwrap().text(), "☀️");

        assert_eq!(tm.toggle(&mut page), Theme::Light);
        assert_eq!(tm.store().load_theme(), Some(Theme::Light));
        assert_eq!(page.root_attribute(THEME_ATTRIBUTE), Some("light"));
        assert_eq!(page.element(ElementId::ThemeToggle).unwrap().text(), "🌙");
    }

    #[test]
    fn os_change_applies_without_explicit_choice() {
        let mut page = Page::standard();
        let mut tm = manager(MemoryStore::new(), Some(false));
        let _ = tm.init(&mut page);

        assert!(tm.system_changed(&mut page, true));
        assert_eq!(tm.current(), Theme::Dark);
        assert_eq!(page.root_attribute(THEME_ATTRIBUTE), Some("dark"));
    }

    #[test]
    fn os_change_does_not_override_explicit_choice() {
        let mut page = Page::standard();
        let mut tm = manager(MemoryStore::new(), Some(false));
        let _ = tm.init(&mut page);
        tm.choose(&mut page, Theme::Dark);

        assert!(!tm.system_changed(&mut page, false));
        assert_eq!(tm.current(), Theme::Dark);
    }

    #[test]
    fn os_change_ignored_without_toggle() {
        let mut page = Page::with_elements([ElementId::EmailForm]);
        let mut tm = manager(MemoryStore::new(), Some(false));
        assert!(tm.init(&mut page).is_none());

        assert!(!tm.system_changed(&mut page, true));
        assert_eq!(page.root_attribute(THEME_ATTRIBUTE), Some("light"));
    }

    #[test]
    fn colorfgbg_background_decides() {
        assert_eq!(ColorFgBg::parse("15;0"), Some(true));
        assert_eq!(ColorFgBg::parse("0;15"), Some(false));
        assert_eq!(ColorFgBg::parse("15;default;8"), Some(true));
        assert_eq!(ColorFgBg::parse("garbage"), None);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" light ".parse::<Theme>(), Ok(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
    }
}
