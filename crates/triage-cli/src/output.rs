use std::io::Write;

use owo_colors::OwoColorize;
use triage_core::utils::capitalize;
use triage_core::{ClassificationResult, Theme};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a classification the way the result view lays it out.
pub fn print_result(
    w: &mut dyn Write,
    result: &ClassificationResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let label = capitalize(&result.category);
    if result.is_productive() {
        if color.enabled() {
            writeln!(w, "Classificação: ✅ {}", label.green().bold())?;
        } else {
            writeln!(w, "Classificação: ✅ {}", label)?;
        }
    } else if color.enabled() {
        writeln!(w, "Classificação: 💡 {}", label.yellow().bold())?;
    } else {
        writeln!(w, "Classificação: 💡 {}", label)?;
    }
    writeln!(w)?;

    print_heading(w, "Resposta Gerada", color)?;
    print_indented(w, &result.response)?;

    if let Some(preview) = result.preview() {
        writeln!(w)?;
        print_heading(w, "Texto Processado (prévia)", color)?;
        if color.enabled() {
            print_indented(w, &preview.dimmed().to_string())?;
        } else {
            print_indented(w, preview)?;
        }
    }
    Ok(())
}

/// Print a failed submission with the same hints as the error view.
pub fn print_error(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Erro:".red().bold(), message)?;
    } else {
        writeln!(w, "Erro: {}", message)?;
    }
    writeln!(w)?;
    writeln!(w, "Verifique se:")?;
    writeln!(w, "  - O arquivo está no formato correto (PDF ou TXT)")?;
    writeln!(w, "  - O texto não está vazio")?;
    writeln!(w, "  - O servidor está funcionando corretamente")?;
    Ok(())
}

pub fn print_theme(
    w: &mut dyn Write,
    theme: Theme,
    explicit: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let source = if explicit { "saved" } else { "default" };
    if color.enabled() {
        writeln!(w, "{} {} ({})", theme.toggle_icon(), theme.bold(), source.dimmed())
    } else {
        writeln!(w, "{} {} ({})", theme.toggle_icon(), theme, source)
    }
}

fn print_heading(w: &mut dyn Write, heading: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", heading.bold())
    } else {
        writeln!(w, "{}", heading)
    }
}

fn print_indented(w: &mut dyn Write, text: &str) -> std::io::Result<()> {
    for line in text.lines() {
        writeln!(w, "  {}", line)?;
    }
    Ok(())
}
