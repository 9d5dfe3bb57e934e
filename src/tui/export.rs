use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Shorten a path for the notification line, keeping its start.
pub fn display_path(path: &str) -> String {
    const MAX: usize = 60;
    if path.chars().count() > MAX {
        let head: String = path.chars().take(MAX - 3).collect();
        format!("{head}...")
    } else {
        path.to_string()
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// Each clipboard instance is kept alive for a while so clipboard managers on Linux
/// get a chance to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to clipboard. Returns as soon as the copy is queued.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paths_are_kept() {
        assert_eq!(display_path("/tmp/sites_export.txt"), "/tmp/sites_export.txt");
    }

    #[test]
    fn long_paths_are_truncated() {
        let long = format!("/home/user/{}/terms_export.txt", "d".repeat(80));
        let shown = display_path(&long);
        assert_eq!(shown.chars().count(), 60);
        assert!(shown.ends_with("..."));
    }
}
