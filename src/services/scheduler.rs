use crate::domain::constants::FAILSAFE_MARGIN_MINUTES;
use crate::domain::models::{FailsafeJob, OverrideRequest};
use crate::errors::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Registers the one-shot failsafe job with at(1), which survives both this
/// process and a reboot. The scheduled command is our own restore entry point
/// with every path made explicit, so the fired job needs no ambient context.
/// Returns the typed handle needed to cancel the job later.
pub fn schedule(req: &OverrideRequest) -> Result<FailsafeJob> {
    let command = restore_command(req)?;
    let delay = failsafe_delay_minutes(req.window_secs);

    let mut child = Command::new("at")
        .args(["now", "+", &delay.to_string(), "minutes"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Scheduling(format!("failed to run at: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(command.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .map_err(|e| Error::Scheduling(format!("failed to hand command to at: {e}")))?;
    }

    let out = child
        .wait_with_output()
        .map_err(|e| Error::Scheduling(format!("failed to collect at output: {e}")))?;
    if !out.status.success() {
        return Err(Error::Scheduling(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }

    // at reports the job line on stderr; some implementations use stdout.
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let (id, fire_at) = parse_job_line(&stderr)
        .or_else(|| parse_job_line(&stdout))
        .ok_or_else(|| {
            Error::Scheduling(format!(
                "could not parse job id from at output: {}",
                stderr.trim()
            ))
        })?;

    Ok(FailsafeJob {
        id,
        fire_at,
        command,
    })
}

/// Deregisters a previously scheduled job. Failure here is non-fatal for
/// callers: a job firing against an already-restored account exits through
/// the restore entry point's not-disabled check.
pub fn cancel(job: &FailsafeJob) -> Result<()> {
    cancel_id(job.id)
}

pub fn cancel_id(id: u32) -> Result<()> {
    let out = Command::new("atrm")
        .arg(id.to_string())
        .output()
        .map_err(|e| Error::Scheduling(format!("failed to run atrm: {e}")))?;
    if !out.status.success() {
        return Err(Error::Scheduling(format!(
            "atrm {id} failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// at is minute-granular; round the window up and add margin so the normal
/// restore path always finishes (and cancels) before the failsafe fires.
pub fn failsafe_delay_minutes(window_secs: u64) -> u64 {
    window_secs.div_ceil(60) + FAILSAFE_MARGIN_MINUTES
}

pub fn restore_command(req: &OverrideRequest) -> Result<String> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::Scheduling(format!("cannot locate own executable: {e}")))?;
    Ok(format!(
        "{} restore {} --factor-file {} --fragment {}",
        sh_quote(&exe.to_string_lossy()),
        sh_quote(&req.account),
        sh_quote(&req.factor_file.to_string_lossy()),
        sh_quote(&req.fragment_path.to_string_lossy()),
    ))
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn parse_job_line(output: &str) -> Option<(u32, String)> {
    output.lines().find_map(|line| {
        let rest = line.strip_prefix("job ")?;
        let (id, fire_at) = rest.split_once(" at ")?;
        Some((id.trim().parse().ok()?, fire_at.trim().to_string()))
    })
}
