//! Terminal and headless implementations of the user-facing collaborators.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::{Clipboard, HostError, Prompter, Severity};

/// Prompter for interactive CLI use: alerts go to the terminal, confirmation
/// is read from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn alert(&self, message: &str, severity: Severity, _duration: Duration) {
        match severity {
            Severity::Info => println!("{}", message),
            Severity::Warning => println!("warning: {}", message),
            Severity::Error => eprintln!("error: {}", message),
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        println!("{}", message);
        print!("Continue? [y/N] ");
        let _ = std::io::Write::flush(&mut std::io::stdout());

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }

    async fn popup(&self, title: &str, url: &str, args: &Value) {
        println!("{} ({})", title, url);
        match serde_json::to_string_pretty(args) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", args),
        }
    }
}

/// Prompter with a fixed confirmation answer, for callers that collected the
/// user's decision up front (HTTP requests, `--yes`).
#[derive(Debug, Clone, Copy)]
pub struct PresetAnswer(pub bool);

#[async_trait]
impl Prompter for PresetAnswer {
    async fn alert(&self, message: &str, severity: Severity, _duration: Duration) {
        tracing::info!(severity = severity.as_str(), "{}", message);
    }

    async fn confirm(&self, message: &str) -> bool {
        tracing::debug!(answer = self.0, "Confirmation: {}", message);
        self.0
    }

    async fn popup(&self, title: &str, url: &str, _args: &Value) {
        tracing::debug!("Popup '{}' at {} not shown", title, url);
    }
}

/// Clipboard that shells out to the first available platform tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

const CLIPBOARD_COMMANDS: &[&[&str]] = &[
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["pbcopy"],
    &["clip.exe"],
];

impl SystemClipboard {
    async fn copy_with(program: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program[0])
            .args(&program[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }
        Ok(child.wait().await?.success())
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<(), HostError> {
        for program in CLIPBOARD_COMMANDS {
            match Self::copy_with(program, text).await {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::debug!("{} exited with failure", program[0]),
                Err(e) => tracing::debug!("{} unavailable: {}", program[0], e),
            }
        }
        Err(HostError::Unavailable("no clipboard tool found".to_string()))
    }
}

/// Clipboard for headless deployments. Every copy fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
    async fn copy(&self, _text: &str) -> Result<(), HostError> {
        Err(HostError::Unavailable("clipboard not available".to_string()))
    }
}
