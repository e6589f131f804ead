use crate::domain::constants::{
    DEFAULT_ACTIVITY_LOG, DEFAULT_WINDOW_SECS, FRAGMENT_PREFIX, SSHD_CONFIG_DIR,
};
use crate::domain::models::{OverrideRequest, ToggleMode};
use crate::errors::{Error, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Builds the immutable request a toggle invocation runs against. Explicit
/// options win; the ambient invoking-account and source-address variables are
/// consulted only when an option is absent.
pub fn resolve_request(
    mode: ToggleMode,
    account: Option<&str>,
    address: Option<&str>,
    window_secs: Option<u64>,
    factor_file: Option<&Path>,
    fragment_path: Option<&Path>,
    activity_log: Option<&Path>,
) -> Result<OverrideRequest> {
    let account = match account {
        Some(a) => a.to_string(),
        None => env_account().ok_or_else(|| {
            Error::Prerequisite(
                "account could not be resolved from the environment; pass one explicitly"
                    .to_string(),
            )
        })?,
    };
    validate_account(&account)?;

    let raw_address = address.map(str::to_string).or_else(env_address);
    let address = if mode == ToggleMode::Disable {
        let raw = raw_address.ok_or_else(|| {
            Error::Prerequisite(
                "source address could not be resolved from the environment; pass --address"
                    .to_string(),
            )
        })?;
        normalize_address(&raw)?
    } else {
        // the restore path never reads the address
        raw_address
            .as_deref()
            .and_then(|raw| normalize_address(raw).ok())
            .unwrap_or_else(|| "-".to_string())
    };

    let window_secs = window_secs.unwrap_or(DEFAULT_WINDOW_SECS);
    if window_secs == 0 {
        return Err(Error::InvalidRequest(
            "wait window must be at least one second".to_string(),
        ));
    }

    Ok(OverrideRequest {
        factor_file: factor_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_factor_file(&account)),
        fragment_path: fragment_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_fragment_path(&account)),
        activity_log: activity_log
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACTIVITY_LOG)),
        account,
        address,
        window_secs,
        mode,
    })
}

pub fn default_factor_file(account: &str) -> PathBuf {
    PathBuf::from(format!("/home/{account}/.google_authenticator"))
}

pub fn default_fragment_path(account: &str) -> PathBuf {
    Path::new(SSHD_CONFIG_DIR).join(format!("{FRAGMENT_PREFIX}{account}.conf"))
}

/// Accepts a bare address or address/prefix and returns the canonical
/// `ip/prefix` form (bare addresses become host-length). The account and
/// address both end up inside the policy fragment, so anything that does not
/// parse cleanly is rejected before any artifact is touched.
pub fn normalize_address(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidRequest("empty source address".to_string()));
    }
    match raw.split_once('/') {
        Some((ip, prefix)) => {
            let ip: IpAddr = ip
                .parse()
                .map_err(|_| bad_address(raw, "not a valid IP address"))?;
            let bits: u8 = prefix
                .parse()
                .map_err(|_| bad_address(raw, "prefix length is not a number"))?;
            if bits > max_prefix(&ip) {
                return Err(bad_address(raw, "prefix length out of range"));
            }
            Ok(format!("{ip}/{bits}"))
        }
        None => {
            let ip: IpAddr = raw
                .parse()
                .map_err(|_| bad_address(raw, "not a valid IP address"))?;
            Ok(format!("{ip}/{}", max_prefix(&ip)))
        }
    }
}

fn validate_account(account: &str) -> Result<()> {
    let well_formed = !account.is_empty()
        && account.len() <= 32
        && !account.starts_with('-')
        && account
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "account name {account:?} is not a valid user name"
        )))
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    if ip.is_ipv4() {
        32
    } else {
        128
    }
}

fn bad_address(raw: &str, reason: &str) -> Error {
    Error::InvalidRequest(format!("source address {raw:?}: {reason}"))
}

fn env_account() -> Option<String> {
    ["SUDO_USER", "USER"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

fn env_address() -> Option<String> {
    ["SSH_CLIENT", "SSH_CONNECTION"].iter().find_map(|var| {
        std::env::var(var)
            .ok()
            .and_then(|v| v.split_whitespace().next().map(str::to_string))
    })
}
