//! Environment readiness check: is there a browser we can drive?

use crate::cli::output::{self, Styled};
use crate::config::DEFAULT_OUTPUT_DIR;
use crate::renderer::chromium::{find_chromium, CHROMIUM_PATH_ENV};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub async fn run() -> Result<()> {
    let chromium = find_chromium();
    let version = chromium.as_deref().and_then(chromium_version);
    let output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium_path": chromium.as_ref().map(|p| p.display().to_string()),
            "chromium_version": version,
            "output_dir": output_dir.display().to_string(),
            "ready": chromium.is_some(),
        }));
        return Ok(());
    }

    let s = Styled::new();
    output::print_header(&s);
    output::print_section(&s, "System");
    output::print_check(
        s.ok_sym(),
        "OS:",
        &format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    );
    let dir_state = if output_dir.is_dir() {
        "exists"
    } else {
        "created on first export"
    };
    output::print_check(s.ok_sym(), "Output dir:", &format!("{} ({dir_state})", output_dir.display()));
    eprintln!();

    output::print_section(&s, "Browser");
    match &chromium {
        Some(path) => {
            let ver = version.as_deref().unwrap_or("unknown version");
            output::print_check(s.ok_sym(), "Chromium:", &format!("{ver} at {}", path.display()));
            Ok(())
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install google-chrome or chromium,");
            output::print_detail(&format!("or set {CHROMIUM_PATH_ENV}=/path/to/chrome"));
            output::print_detail("Recorded pages still work: salesrank scrape --replay <dir>");
            bail!("no Chromium executable found")
        }
    }
}

/// `chrome --version` with the vendor prefix stripped.
fn chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Some(strip_vendor(&raw))
}

fn strip_vendor(raw: &str) -> String {
    raw.replace("Google Chrome ", "").replace("Chromium ", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_vendor() {
        assert_eq!(strip_vendor("Google Chrome 120.0.6099.109"), "120.0.6099.109");
        assert_eq!(strip_vendor("Chromium 119.0.6045.159 snap"), "119.0.6045.159 snap");
    }

    #[test]
    fn test_version_of_missing_binary() {
        assert_eq!(chromium_version(Path::new("/nonexistent/chrome")), None);
    }
}
