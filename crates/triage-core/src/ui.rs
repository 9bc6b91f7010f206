//! Rendering of the loading indicator, results and errors.

use crate::ClassificationResult;
use crate::page::{Display, ElementId, Page};
use crate::utils::{capitalize, escape_html};

/// Writes into the `result` and `loading` elements. Each operation is a
/// no-op when its element is missing from the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiManager {
    result_bound: bool,
    loading_bound: bool,
}

impl UiManager {
    pub fn new(page: &Page) -> Self {
        Self {
            result_bound: page.has(ElementId::Result),
            loading_bound: page.has(ElementId::Loading),
        }
    }

    pub fn show_loading(&self, page: &mut Page, visible: bool) {
        if !self.loading_bound {
            return;
        }
        if let Some(loading) = page.element_mut(ElementId::Loading) {
            loading.set_display(if visible { Display::Block } else { Display::None });
        }
    }

    pub fn clear_result(&self, page: &mut Page) {
        self.write_result(page, String::new(), Display::None);
    }

    pub fn display_result(&self, page: &mut Page, result: &ClassificationResult) {
        self.write_result(page, render_result(result), Display::Block);
    }

    pub fn display_error(&self, page: &mut Page, message: &str) {
        self.write_result(page, render_error(message), Display::Block);
    }

    fn write_result(&self, page: &mut Page, html: String, display: Display) {
        if !self.result_bound {
            return;
        }
        if let Some(region) = page.element_mut(ElementId::Result) {
            region.set_inner_html(html);
            region.set_display(display);
        }
    }
}

/// Markup for a classification result.
pub fn render_result(result: &ClassificationResult) -> String {
    let (badge_class, icon) = if result.is_productive() {
        ("success", "✅")
    } else {
        ("warning", "💡")
    };

    let mut out = String::with_capacity(512);
    out.push_str("<div class=\"result-container\">\n");

    out.push_str("  <div class=\"result-section\">\n");
    out.push_str("    <h3>Classificação</h3>\n");
    out.push_str(&format!(
        "    <span class=\"badge {}\"><span class=\"cat-icon\" aria-hidden=\"true\">{}</span> {}</span>\n",
        badge_class,
        icon,
        escape_html(&capitalize(&result.category))
    ));
    out.push_str("  </div>\n");

    out.push_str("  <div class=\"result-section\">\n");
    out.push_str("    <h3>Resposta Gerada</h3>\n");
    out.push_str(&format!(
        "    <div class=\"response-text\">{}</div>\n",
        escape_html(&result.response)
    ));
    out.push_str("  </div>\n");

    if let Some(preview) = result.preview() {
        out.push_str("  <div class=\"result-section\">\n");
        out.push_str("    <h3>Texto Processado (prévia)</h3>\n");
        out.push_str(&format!(
            "    <div class=\"processed-text\">{}</div>\n",
            escape_html(preview)
        ));
        out.push_str("  </div>\n");
    }

    out.push_str("</div>\n");
    out
}

/// Markup for a failed submission, with troubleshooting hints.
pub fn render_error(message: &str) -> String {
    let mut out = String::with_capacity(512);
    out.push_str("<div class=\"error-container\">\n");
    out.push_str("  <h3>Erro</h3>\n");
    out.push_str(&format!(
        "  <p class=\"error-message\">{}</p>\n",
        escape_html(message)
    ));
    out.push_str(
        r#"  <div class="error-help">
    <p>Verifique se:</p>
    <ul>
      <li>O arquivo está no formato correto (PDF ou TXT)</li>
      <li>O texto não está vazio</li>
      <li>O servidor está funcionando corretamente</li>
    </ul>
  </div>
"#,
    );
    out.push_str("</div>\n");
    out
}
