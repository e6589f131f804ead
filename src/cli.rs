use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "breakglass",
    version,
    about = "Temporarily lift the SSH second factor for one account, with a scheduled failsafe restore"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Disable {
        account: Option<String>,
        #[arg(long, help = "Source address or CIDR allowed to use password logins")]
        address: Option<String>,
        #[arg(long, help = "Seconds to wait for a connection before restoring")]
        window: Option<u64>,
        #[arg(
            long,
            value_name = "PATH",
            help = "Factor-state file (default: /home/<account>/.google_authenticator)"
        )]
        factor_file: Option<PathBuf>,
        #[arg(
            long,
            value_name = "PATH",
            help = "Policy fragment (default: /etc/ssh/sshd_config.d/70-breakglass-<account>.conf)"
        )]
        fragment: Option<PathBuf>,
        #[arg(
            long,
            value_name = "PATH",
            help = "Auth log watched for the account's next connection"
        )]
        activity_log: Option<PathBuf>,
        #[arg(
            long,
            default_value_t = false,
            help = "Resolve and print the plan without touching anything"
        )]
        dry_run: bool,
    },
    Restore {
        account: Option<String>,
        #[arg(long, value_name = "PATH")]
        factor_file: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        fragment: Option<PathBuf>,
        #[arg(long, help = "Failsafe job id to deregister once restoration is done")]
        failsafe_job: Option<u32>,
    },
    Status {
        account: Option<String>,
        #[arg(long, value_name = "PATH")]
        factor_file: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        fragment: Option<PathBuf>,
    },
}
