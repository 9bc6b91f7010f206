use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use triage_core::config::load_config;
use triage_core::{
    ApiManager, ColorFgBg, ElementId, EmailFormApp, FileStore, FormData, MemoryStore, Page,
    PageEvent, PreferenceStore, SelectedFile, Settings, SubmitOutcome, Theme, ThemeManager,
};

mod output;

use output::ColorMode;

/// Email triage - classify an email as productive or not and get a suggested reply
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Classification endpoint URL (overrides config and TRIAGE_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit an email for classification
    Submit {
        /// Email body to classify
        #[arg(long)]
        text: Option<String>,

        /// PDF or TXT file with the email
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print the rendered result markup instead of a summary
        #[arg(long)]
        html: bool,
    },

    /// Show or change the persisted theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ThemeAction {
    /// Print the theme the form would start with
    Show,
    /// Switch between light and dark
    Toggle,
    /// Pick a theme explicitly
    Set {
        /// light or dark
        theme: Theme,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Resolve configuration: CLI flags > env vars > config files > defaults
    let mut settings = Settings::resolve(&load_config());
    if let Some(endpoint) = cli.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(secs) = cli.timeout {
        settings.timeout = Duration::from_secs(secs);
    }
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Submit { text, file, html } => submit(&settings, text, file, html, color).await,
        Command::Theme { action } => theme(&settings, action.unwrap_or(ThemeAction::Show), color),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn preference_store() -> Box<dyn PreferenceStore> {
    match FileStore::default_location() {
        Some(store) => Box::new(store),
        None => {
            tracing::warn!("no data directory available, theme changes will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

fn theme_manager(settings: &Settings) -> ThemeManager {
    ThemeManager::new(preference_store(), &ColorFgBg, settings.fallback_theme)
}

async fn submit(
    settings: &Settings,
    text: Option<String>,
    file: Option<PathBuf>,
    html: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let has_text = text.as_deref().is_some_and(|t| !t.trim().is_empty());
    if !has_text && file.is_none() {
        anyhow::bail!("Nothing to classify: pass --text or --file");
    }

    let selected = match &file {
        Some(path) => Some(
            SelectedFile::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let api = ApiManager::new(&settings.endpoint).with_timeout(settings.timeout);
    let mut app = EmailFormApp::new(Page::standard(), theme_manager(settings), api);
    app.init();

    if let Some(selected) = selected {
        app.dispatch(PageEvent::FilesSelected(vec![selected]));
    }
    app.dispatch(PageEvent::Submit(FormData::with_text(text.unwrap_or_default())));

    let outcome = tokio::select! {
        outcome = app.settle() => outcome,
        _ = tokio::signal::ctrl_c() => {
            app.dispatch(PageEvent::Unload);
            app.settle().await
        }
    };
    let outcome = outcome.context("Submission never settled")?;

    let mut stdout = std::io::stdout().lock();
    if html {
        let markup = app
            .page()
            .element(ElementId::Result)
            .map(|region| region.inner_html())
            .unwrap_or_default();
        write!(stdout, "{}", markup)?;
    }

    match outcome {
        SubmitOutcome::Classified(result) => {
            if !html {
                output::print_result(&mut stdout, &result, color)?;
            }
            Ok(())
        }
        SubmitOutcome::Failed(message) => {
            if !html {
                output::print_error(&mut stdout, &message, color)?;
            }
            stdout.flush()?;
            std::process::exit(1);
        }
    }
}

fn theme(settings: &Settings, action: ThemeAction, color: ColorMode) -> anyhow::Result<()> {
    let mut manager = theme_manager(settings);
    let mut page = Page::standard();
    let _ = manager.init(&mut page);

    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            manager.toggle(&mut page);
        }
        ThemeAction::Set { theme } => manager.choose(&mut page, theme),
    }

    let mut stdout = std::io::stdout().lock();
    output::print_theme(&mut stdout, manager.current(), manager.is_explicit(), color)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "triage",
            "submit",
            "--text",
            "Bom dia",
            "--endpoint",
            "http://localhost:8000/process",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:8000/process"));
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Command::Submit { text: Some(ref t), file: None, html: false } if t == "Bom dia"
        ));
    }

    #[test]
    fn theme_set_parses_theme_names() {
        let cli = Cli::try_parse_from(["triage", "theme", "set", "dark"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Theme {
                action: Some(ThemeAction::Set { theme: Theme::Dark })
            }
        ));

        assert!(Cli::try_parse_from(["triage", "theme", "set", "sepia"]).is_err());
    }

    #[test]
    fn theme_defaults_to_show() {
        let cli = Cli::try_parse_from(["triage", "theme"]).unwrap();
        assert!(matches!(cli.command, Command::Theme { action: None }));
    }
}
