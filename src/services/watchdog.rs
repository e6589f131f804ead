use crate::domain::constants::POLL_INTERVAL_SECS;
use crate::domain::models::{OverrideRequest, WatchdogOutcome};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Replaces the default SIGINT action with one that only sets a flag. The
/// flag is consulted at the watchdog's poll boundary and nowhere else; a
/// signal arriving mid-saga lets the process run to that checkpoint.
pub fn install_interrupt_flag() {
    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe {
        let _ = signal::sigaction(Signal::SIGINT, &action);
    }
}

/// Blocks until one of the three exit conditions fires, checked once per
/// tick in priority order: a connection record for the monitored account
/// appended after the pre-loop snapshot, the wait window elapsing, or an
/// interrupt. Terminal echo stays off for the whole wait.
pub fn wait(req: &OverrideRequest) -> WatchdogOutcome {
    let _echo = EchoGuard::engage();
    let baseline = line_count(&req.activity_log);
    let window = Duration::from_secs(req.window_secs);
    let started = Instant::now();
    loop {
        std::thread::sleep(Duration::from_secs(POLL_INTERVAL_SECS));
        if has_new_connection(&req.activity_log, baseline, &req.account) {
            return WatchdogOutcome::Connected;
        }
        if started.elapsed() >= window {
            return WatchdogOutcome::TimedOut;
        }
        if INTERRUPTED.load(Ordering::SeqCst) {
            return WatchdogOutcome::Aborted;
        }
    }
}

/// Matches the two record shapes sshd emits when the monitored account opens
/// a new session. Delimiters after the account name keep `ali` from matching
/// `alice`.
pub fn is_connection_record(line: &str, account: &str) -> bool {
    if !line.contains("sshd") {
        return false;
    }
    let accepted = format!("Accepted password for {account} from");
    let opened_pam = format!("session opened for user {account}(");
    let opened_by = format!("session opened for user {account} by");
    line.contains(&accepted) || line.contains(&opened_pam) || line.contains(&opened_by)
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

fn has_new_connection(path: &Path, baseline: usize, account: &str) -> bool {
    std::fs::read_to_string(path)
        .map(|s| {
            s.lines()
                .skip(baseline)
                .any(|line| is_connection_record(line, account))
        })
        .unwrap_or(false)
}

/// Suppresses terminal echo while alive and restores the saved settings on
/// drop, whichever branch ends the wait. A non-tty stdin leaves echo alone.
struct EchoGuard {
    saved: Termios,
}

impl EchoGuard {
    fn engage() -> Option<Self> {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return None;
        }
        let saved = termios::tcgetattr(&stdin).ok()?;
        let mut silenced = saved.clone();
        silenced.local_flags.remove(LocalFlags::ECHO);
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &silenced).ok()?;
        Some(Self { saved })
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(&std::io::stdin(), SetArg::TCSANOW, &self.saved);
    }
}
