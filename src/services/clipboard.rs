//! Clipboard operations.

use anyhow::{Context, Result};

/// Put an answer on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("could not copy to clipboard")?;
    Ok(())
}
