use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

const FILE_SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable byte count, e.g. `1536` -> `"1.50 KB"`.
///
/// Sizes beyond the gigabyte range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut threshold: u64 = 1024;
    while exponent + 1 < FILE_SIZE_UNITS.len() && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }

    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{:.2} {}", scaled, FILE_SIZE_UNITS[exponent])
}

/// Uppercase the first character and leave the rest untouched.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Encode text for insertion into HTML markup.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A function wrapper that only runs after calls stop arriving for `wait`.
///
/// Each [`Debounced::call`] replaces the pending invocation, so the wrapped
/// function sees the arguments of the last call only. Requires a tokio
/// runtime.
pub struct Debounced<A> {
    func: Arc<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Wrap `func` so that bursts of calls collapse into one, `wait` after the last.
pub fn debounce<A, F>(func: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        func: Arc::new(func),
        wait,
        pending: Mutex::new(None),
    }
}

impl<A: Send + 'static> Debounced<A> {
    pub fn call(&self, args: A) {
        let func = Arc::clone(&self.func);
        let wait = self.wait;
        let task = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            func(args);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending invocation, if any. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}
