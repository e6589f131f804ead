use crate::cli::{Cli, Commands};
use crate::commands::restore::run_restore_saga;
use crate::domain::models::{DisableReport, ResolvedPlan, ToggleMode, WatchdogOutcome};
use crate::errors::Error;
use crate::services::audit::audit;
use crate::services::output::print_one;
use crate::services::{artifacts, notify, reloader, resolve, scheduler, watchdog};

/// The disable saga: failsafe first, then the two artifacts, then activation,
/// then the watchdog wait and the unconditional restore. Disable-path errors
/// are fail-fast with compensation of whatever already succeeded.
pub fn handle_disable(cli: &Cli) -> anyhow::Result<()> {
    let Commands::Disable {
        account,
        address,
        window,
        factor_file,
        fragment,
        activity_log,
        dry_run,
    } = &cli.command
    else {
        unreachable!("dispatched on Commands::Disable")
    };

    let req = resolve::resolve_request(
        ToggleMode::Disable,
        account.as_deref(),
        address.as_deref(),
        *window,
        factor_file.as_deref(),
        fragment.as_deref(),
        activity_log.as_deref(),
    )?;

    if *dry_run {
        let plan = ResolvedPlan {
            account: req.account.clone(),
            address: req.address.clone(),
            factor_file: req.factor_file.clone(),
            fragment_path: req.fragment_path.clone(),
            activity_log: req.activity_log.clone(),
            window_secs: req.window_secs,
            failsafe_delay_minutes: scheduler::failsafe_delay_minutes(req.window_secs),
            restore_command: scheduler::restore_command(&req)?,
        };
        print_one(cli.json, plan, |p| {
            format!(
                "would disable the second factor for {} (from {}) for {}s\nfailsafe restore in {} minutes via: {}",
                p.account, p.address, p.window_secs, p.failsafe_delay_minutes, p.restore_command
            )
        })?;
        return Ok(());
    }

    // Safety net before anything else: without it, a crash of this process
    // would leave the account permanently exempted.
    let job = scheduler::schedule(&req)?;
    audit(
        "failsafe_scheduled",
        serde_json::json!({"account": req.account, "job": job.id, "fire_at": job.fire_at}),
    );
    watchdog::install_interrupt_flag();

    // From here on a failure leaves the job registered; it fires later and
    // exits through the restore entry point's not-disabled check.
    artifacts::apply_factor_override(&req)?;

    if let Err(err) = artifacts::write_policy_fragment(&req) {
        let reverted = artifacts::revert_factor_override(&req);
        audit(
            "disable_compensated",
            serde_json::json!({
                "account": req.account,
                "cause": err.to_string(),
                "factor_reverted": reverted.is_ok()
            }),
        );
        return Err(err.into());
    }

    if let Err(err) = reloader::validate_and_apply() {
        let reverted = artifacts::revert_factor_override(&req);
        let removed = artifacts::remove_policy_fragment(&req);
        audit(
            "disable_compensated",
            serde_json::json!({
                "account": req.account,
                "cause": err.to_string(),
                "factor_reverted": reverted.is_ok(),
                "fragment_removed": removed.is_ok()
            }),
        );
        return Err(err.into());
    }

    anyhow::ensure!(
        artifacts::is_disabled(&req),
        "override did not take effect for {}",
        req.account
    );
    audit(
        "disabled",
        serde_json::json!({
            "account": req.account,
            "address": req.address,
            "window_secs": req.window_secs
        }),
    );
    notify::broadcast(
        &req.account,
        &format!(
            "second factor disabled for logins from {} for the next {}s; it will be restored automatically",
            req.address, req.window_secs
        ),
    );
    if !cli.json {
        println!(
            "second factor disabled for {}; waiting up to {}s for a connection",
            req.account, req.window_secs
        );
    }

    let outcome = watchdog::wait(&req);
    audit(
        "watchdog_outcome",
        serde_json::json!({"account": req.account, "outcome": outcome}),
    );

    // Restoration runs for every outcome; only the reported trigger differs.
    let restore = run_restore_saga(&req);
    if restore.fully_restored() {
        notify::broadcast(&req.account, "second factor restored");
    } else {
        notify::broadcast(
            &req.account,
            "second factor restoration incomplete; verify your connectivity manually before closing this session",
        );
    }

    let failsafe_cancelled = match scheduler::cancel(&job) {
        Ok(()) => {
            audit("failsafe_cancelled", serde_json::json!({"job": job.id}));
            true
        }
        Err(err) => {
            audit(
                "failsafe_cancel_failed",
                serde_json::json!({"job": job.id, "error": err.to_string()}),
            );
            eprintln!("warning: could not cancel failsafe job {}: {err}", job.id);
            false
        }
    };

    if !restore.fully_restored() {
        let failed = restore.failed_steps().join(", ");
        let detail = if failed.is_empty() {
            req.account.clone()
        } else {
            format!("{} (failed: {failed})", req.account)
        };
        return Err(Error::RestoreIncomplete(detail).into());
    }

    let report = DisableReport {
        account: req.account.clone(),
        outcome,
        failsafe_job: job.id,
        failsafe_cancelled,
        restore,
    };
    print_one(cli.json, report, |r| {
        let trigger = match r.outcome {
            WatchdogOutcome::Connected => "connection observed",
            WatchdogOutcome::TimedOut => "window expired",
            WatchdogOutcome::Aborted => "interrupted",
        };
        format!("second factor restored for {} ({trigger})", r.account)
    })?;
    Ok(())
}
