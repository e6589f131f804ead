use crate::errors::{Error, Result};
use std::process::Command;

/// Dry-run check of the composed sshd configuration, including any fragment
/// we just dropped in. Never applies anything.
pub fn validate() -> Result<()> {
    let out = Command::new("sshd")
        .arg("-t")
        .output()
        .map_err(|e| Error::Validation(format!("failed to run sshd -t: {e}")))?;
    if !out.status.success() {
        return Err(Error::Validation(stderr_excerpt(
            &out.stderr,
            "sshd -t rejected the composed configuration",
        )));
    }
    Ok(())
}

/// Restarts the enforcing service so the on-disk policy takes effect.
pub fn apply() -> Result<()> {
    let out = Command::new("systemctl")
        .args(["restart", "sshd"])
        .output()
        .map_err(|e| Error::Reload(format!("failed to run systemctl: {e}")))?;
    if !out.status.success() {
        return Err(Error::Reload(stderr_excerpt(
            &out.stderr,
            "systemctl restart sshd failed",
        )));
    }
    Ok(())
}

/// An unvalidated policy is never applied.
pub fn validate_and_apply() -> Result<()> {
    validate()?;
    apply()
}

fn stderr_excerpt(stderr: &[u8], fallback: &str) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
