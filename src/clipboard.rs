//! System clipboard access
//!
//! Shells out to the platform's clipboard tool rather than linking a GUI
//! toolkit: `pbpaste`/`pbcopy` on macOS, `wl-paste`/`wl-copy` under Wayland,
//! `xclip` under X11, PowerShell on Windows. The [`Clipboard`] trait is the
//! seam; watch mode and the run command only ever see the trait.

use std::io::Write as _;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard tool '{tool}' not available: {source}")]
    Unavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard tool '{tool}' exited with {status}")]
    CommandFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("clipboard io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read/write access to a clipboard-shaped thing.
pub trait Clipboard: Send {
    fn read(&self) -> Result<String, ClipboardError>;
    fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

/// A clipboard command pair for one platform.
struct Backend {
    paste: (&'static str, &'static [&'static str]),
    copy: (&'static str, &'static [&'static str]),
}

#[cfg(target_os = "macos")]
fn backend() -> Backend {
    Backend {
        paste: ("pbpaste", &[]),
        copy: ("pbcopy", &[]),
    }
}

#[cfg(target_os = "windows")]
fn backend() -> Backend {
    Backend {
        paste: ("powershell", &["-NoProfile", "-Command", "Get-Clipboard"]),
        copy: (
            "powershell",
            &["-NoProfile", "-Command", "$input | Set-Clipboard"],
        ),
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn backend() -> Backend {
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        Backend {
            paste: ("wl-paste", &["--no-newline"]),
            copy: ("wl-copy", &[]),
        }
    } else {
        Backend {
            paste: ("xclip", &["-selection", "clipboard", "-o"]),
            copy: ("xclip", &["-selection", "clipboard"]),
        }
    }
}

/// The real clipboard, via external commands.
pub struct SystemClipboard {
    backend: Backend,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { backend: backend() }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        let (tool, args) = self.backend.paste;
        let output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|source| ClipboardError::Unavailable { tool, source })?;
        if !output.status.success() {
            // An empty X11 clipboard makes xclip exit non-zero; treat the
            // selection as empty instead of failing the poll.
            if tool == "xclip" {
                return Ok(String::new());
            }
            return Err(ClipboardError::CommandFailed {
                tool,
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let (tool, args) = self.backend.copy;
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Unavailable { tool, source })?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(text.as_bytes())?;
        }
        drop(child.stdin.take());
        let status = child.wait()?;
        if !status.success() {
            return Err(ClipboardError::CommandFailed { tool, status });
        }
        Ok(())
    }
}

/// In-memory clipboard for tests and dry runs.
#[derive(Default)]
pub struct MemClipboard {
    content: Mutex<String>,
}

impl MemClipboard {
    pub fn with(text: &str) -> Self {
        Self {
            content: Mutex::new(text.to_string()),
        }
    }
}

impl Clipboard for MemClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        Ok(self
            .content
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        if let Ok(mut c) = self.content.lock() {
            *c = text.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_clipboard_round_trips() {
        let clip = MemClipboard::default();
        assert_eq!(clip.read().unwrap(), "");
        clip.write("payload").unwrap();
        assert_eq!(clip.read().unwrap(), "payload");
    }

    #[test]
    fn mem_clipboard_seeds_content() {
        let clip = MemClipboard::with("seed");
        assert_eq!(clip.read().unwrap(), "seed");
    }
}
