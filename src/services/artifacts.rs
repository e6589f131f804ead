use crate::domain::models::{OverrideRequest, ToggleState};
use crate::errors::{Error, Result};
use std::io;
use std::path::Path;

/// Parks the factor-state file at its suffixed path. Fails if the file is
/// missing (nothing to disable) or the suffixed path already exists (stale
/// prior state that must not be clobbered).
pub fn apply_factor_override(req: &OverrideRequest) -> Result<()> {
    let disabled = req.factor_disabled_path();
    if !req.factor_file.exists() {
        return Err(toggle_err(
            "rename factor-state file",
            &req.factor_file,
            io::Error::new(io::ErrorKind::NotFound, "factor-state file not found"),
        ));
    }
    if disabled.exists() {
        return Err(toggle_err(
            "rename factor-state file",
            &disabled,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "an override is already in place",
            ),
        ));
    }
    std::fs::rename(&req.factor_file, &disabled)
        .map_err(|e| toggle_err("rename factor-state file", &req.factor_file, e))
}

/// Renames the factor-state file back to its original path. Fails if the
/// suffixed file is absent (the account was not disabled).
pub fn revert_factor_override(req: &OverrideRequest) -> Result<()> {
    let disabled = req.factor_disabled_path();
    if !disabled.exists() {
        return Err(toggle_err(
            "restore factor-state file",
            &disabled,
            io::Error::new(io::ErrorKind::NotFound, "no factor override present"),
        ));
    }
    std::fs::rename(&disabled, &req.factor_file)
        .map_err(|e| toggle_err("restore factor-state file", &disabled, e))
}

pub fn write_policy_fragment(req: &OverrideRequest) -> Result<()> {
    let content = render_policy_fragment(&req.account, &req.address);
    std::fs::write(&req.fragment_path, content)
        .map_err(|e| toggle_err("write policy fragment", &req.fragment_path, e))
}

pub fn remove_policy_fragment(req: &OverrideRequest) -> Result<()> {
    if !req.fragment_path.exists() {
        return Err(toggle_err(
            "remove policy fragment",
            &req.fragment_path,
            io::Error::new(io::ErrorKind::NotFound, "no policy fragment present"),
        ));
    }
    std::fs::remove_file(&req.fragment_path)
        .map_err(|e| toggle_err("remove policy fragment", &req.fragment_path, e))
}

/// The fixed fragment consumed by sshd's include-directory mechanism: scoped
/// to exactly one account and one source address or range.
pub fn render_policy_fragment(account: &str, address: &str) -> String {
    format!(
        "Match User {account} Address {address}\n    PasswordAuthentication yes\n    AuthenticationMethods password\n"
    )
}

pub fn toggle_state(req: &OverrideRequest) -> ToggleState {
    match (
        req.factor_disabled_path().exists(),
        req.fragment_path.exists(),
    ) {
        (true, true) => ToggleState::Disabled,
        (false, false) => ToggleState::Enabled,
        _ => ToggleState::Inconsistent,
    }
}

pub fn is_disabled(req: &OverrideRequest) -> bool {
    toggle_state(req) == ToggleState::Disabled
}

fn toggle_err(op: &'static str, path: &Path, source: io::Error) -> Error {
    Error::Toggle {
        op,
        path: path.to_path_buf(),
        source,
    }
}
