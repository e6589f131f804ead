use crate::cli::{Cli, Commands};
use crate::domain::models::{OverrideRequest, RestoreReport, StepReport, ToggleMode};
use crate::errors::{Error, Result};
use crate::services::audit::audit;
use crate::services::output::print_one;
use crate::services::{artifacts, notify, reloader, resolve, scheduler};

/// Best-effort restore saga: every sub-step runs regardless of earlier
/// failures, because leaving any one artifact disabled is worse than an
/// incomplete rollback reported to the operator.
pub fn run_restore_saga(req: &OverrideRequest) -> RestoreReport {
    let steps = vec![
        step("revert_factor_override", artifacts::revert_factor_override(req)),
        step("remove_policy_fragment", artifacts::remove_policy_fragment(req)),
        step("reload_policy", reloader::validate_and_apply()),
    ];
    let confirmed_enabled = !artifacts::is_disabled(req);
    let report = RestoreReport {
        steps,
        confirmed_enabled,
    };
    audit(
        "restore_attempted",
        serde_json::json!({
            "account": req.account,
            "confirmed_enabled": report.confirmed_enabled,
            "failed_steps": report.failed_steps()
        }),
    );
    report
}

fn step(name: &str, result: Result<()>) -> StepReport {
    match result {
        Ok(()) => StepReport {
            step: name.to_string(),
            status: "ok".to_string(),
            error: None,
        },
        Err(err) => StepReport {
            step: name.to_string(),
            status: "failed".to_string(),
            error: Some(err.to_string()),
        },
    }
}

/// Standalone restore entry point, used both by operators and by the fired
/// failsafe job. An account that is not disabled fails fast with no changes,
/// which is what makes a late-firing job harmless.
pub fn handle_restore(cli: &Cli) -> anyhow::Result<()> {
    let Commands::Restore {
        account,
        factor_file,
        fragment,
        failsafe_job,
    } = &cli.command
    else {
        unreachable!("dispatched on Commands::Restore")
    };

    let req = resolve::resolve_request(
        ToggleMode::Restore,
        account.as_deref(),
        None,
        None,
        factor_file.as_deref(),
        fragment.as_deref(),
        None,
    )?;

    if !artifacts::is_disabled(&req) {
        return Err(Error::NotDisabled(req.account.clone()).into());
    }

    let report = run_restore_saga(&req);
    if report.fully_restored() {
        notify::broadcast(&req.account, "second factor restored");
    } else {
        notify::broadcast(
            &req.account,
            "second factor restoration incomplete; verify your connectivity manually before closing this session",
        );
    }

    if let Some(job_id) = failsafe_job {
        match scheduler::cancel_id(*job_id) {
            Ok(()) => audit("failsafe_cancelled", serde_json::json!({"job": job_id})),
            Err(err) => {
                audit(
                    "failsafe_cancel_failed",
                    serde_json::json!({"job": job_id, "error": err.to_string()}),
                );
                eprintln!("warning: could not cancel failsafe job {job_id}: {err}");
            }
        }
    }

    if !report.fully_restored() {
        let failed = report.failed_steps().join(", ");
        let detail = if failed.is_empty() {
            req.account.clone()
        } else {
            format!("{} (failed: {failed})", req.account)
        };
        return Err(Error::RestoreIncomplete(detail).into());
    }

    print_one(cli.json, report, |_| {
        format!("second factor restored for {}", req.account)
    })?;
    Ok(())
}
