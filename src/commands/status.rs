use crate::cli::{Cli, Commands};
use crate::domain::models::{StatusReport, ToggleMode};
use crate::services::output::print_one;
use crate::services::{artifacts, resolve};

pub fn handle_status(cli: &Cli) -> anyhow::Result<()> {
    let Commands::Status {
        account,
        factor_file,
        fragment,
    } = &cli.command
    else {
        unreachable!("dispatched on Commands::Status")
    };

    // status resolves like restore: no source address involved
    let req = resolve::resolve_request(
        ToggleMode::Restore,
        account.as_deref(),
        None,
        None,
        factor_file.as_deref(),
        fragment.as_deref(),
        None,
    )?;

    let report = StatusReport {
        account: req.account.clone(),
        state: artifacts::toggle_state(&req),
        factor_override_present: req.factor_disabled_path().exists(),
        policy_fragment_present: req.fragment_path.exists(),
    };
    print_one(cli.json, report, |s| format!("{}\t{}", s.account, s.state))
}
