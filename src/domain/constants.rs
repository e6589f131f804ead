/// Appended to the factor-state file name while the override is active.
/// Presence of the suffixed file is one of the two disabled-state observables.
pub const FACTOR_DISABLED_SUFFIX: &str = ".disabled";

/// Drop-in directory consumed by the enforcing service's include mechanism.
pub const SSHD_CONFIG_DIR: &str = "/etc/ssh/sshd_config.d";

/// Policy fragments are named `<prefix><account>.conf` so a fragment maps to
/// exactly one account and can be removed without touching anything else.
pub const FRAGMENT_PREFIX: &str = "70-breakglass-";

pub const DEFAULT_ACTIVITY_LOG: &str = "/var/log/auth.log";

pub const DEFAULT_WINDOW_SECS: u64 = 300;

pub const POLL_INTERVAL_SECS: u64 = 1;

/// Extra whole minutes added to the failsafe delay beyond the wait window,
/// so the normal restore path always finishes (and cancels the job) first.
pub const FAILSAFE_MARGIN_MINUTES: u64 = 2;
