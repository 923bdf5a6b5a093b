use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::bet_slip::BetSlip;
use crate::config;

const SLIP_FILE: &str = "slip.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Clipboard(&'static str),
    File(PathBuf),
}

impl CopyOutcome {
    pub fn describe(&self) -> String {
        match self {
            CopyOutcome::Clipboard(tool) => format!("copied to clipboard via {tool}"),
            CopyOutcome::File(path) => format!("written to {}", path.display()),
        }
    }
}

/// Copies the slip summary to the system clipboard, or writes it to
/// `slip.txt` in the cache directory when no clipboard tool is available.
pub fn copy_slip(slip: &BetSlip) -> Result<CopyOutcome> {
    if slip.is_empty() {
        bail!("bet slip is empty");
    }
    let text = slip.summary_text();
    for (tool, args) in clipboard_tools() {
        match pipe_to(tool, args, &text) {
            Ok(()) => return Ok(CopyOutcome::Clipboard(tool)),
            Err(err) => debug!(tool, error = %err, "clipboard tool unavailable"),
        }
    }
    let dir = config::cache_dir().unwrap_or_else(std::env::temp_dir);
    let path = write_slip_file(&dir, &text)?;
    Ok(CopyOutcome::File(path))
}

fn clipboard_tools() -> &'static [(&'static str, &'static [&'static str])] {
    #[cfg(target_os = "macos")]
    {
        &[("pbcopy", &[])]
    }
    #[cfg(target_os = "windows")]
    {
        &[("clip", &[])]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ]
    }
}

fn pipe_to(tool: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {tool}"))?;
    if let Some(mut stdin) = child.stdin.take()
        && let Err(err) = stdin.write_all(text.as_bytes())
    {
        drop(stdin);
        let _ = child.kill();
        let _ = child.wait();
        return Err(err).with_context(|| format!("failed to write to {tool}"));
    }
    let status = child.wait()?;
    if !status.success() {
        bail!("{tool} exited with {status}");
    }
    Ok(())
}

pub fn write_slip_file(dir: &Path, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(SLIP_FILE);
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bet_slip::BetSelection;
    use crate::state::Confidence;

    #[test]
    fn empty_slip_is_rejected() {
        assert!(copy_slip(&BetSlip::default()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn tool_that_ignores_stdin_is_reaped() {
        let text = "x".repeat(1 << 20);
        let err = pipe_to("true", &[], &text).unwrap_err();
        assert!(format!("{err:#}").contains("failed to write to true"));
    }

    #[test]
    fn slip_file_holds_summary() {
        let mut slip = BetSlip::default();
        slip.toggle(BetSelection::new("A vs B", "1X2", "Home", Confidence::High, None));
        let dir = std::env::temp_dir().join(format!("statimatch-slip-{}", std::process::id()));
        let path = write_slip_file(&dir, &slip.summary_text()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A vs B\n1X2: Home (High)");
        let _ = fs::remove_dir_all(dir);
    }
}
