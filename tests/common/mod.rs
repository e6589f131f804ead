use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated environment for one test: a private HOME, artifact paths inside
/// the tempdir, and stub `at`/`atrm`/`sshd`/`systemctl`/`write` executables
/// fronted on PATH that record every invocation into a spool directory.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub spool: PathBuf,
    pub factor_file: PathBuf,
    pub fragment: PathBuf,
    pub activity_log: PathBuf,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        let spool = tmp.path().join("spool");
        fs::create_dir_all(&spool).expect("create spool dir");
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).expect("create stub bin dir");
        let dropin = tmp.path().join("sshd_config.d");
        fs::create_dir_all(&dropin).expect("create drop-in dir");

        let factor_file = home.join(".google_authenticator");
        fs::write(&factor_file, "SECRETKEY123\n\" RATE_LIMIT 3 30\n").expect("seed factor file");
        let fragment = dropin.join("70-breakglass-alice.conf");
        let activity_log = tmp.path().join("auth.log");
        fs::write(&activity_log, "").expect("seed activity log");

        for tool in ["at", "atrm", "sshd", "systemctl", "write"] {
            install_stub(&bin, &spool, tool);
        }

        Self {
            _tmp: tmp,
            home,
            spool,
            factor_file,
            fragment,
            activity_log,
            bin,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("breakglass");
        let path = format!(
            "{}:{}",
            self.bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        cmd.env("HOME", &self.home)
            .env("PATH", path)
            .env_remove("SSH_CLIENT")
            .env_remove("SSH_CONNECTION")
            .env_remove("SUDO_USER");
        cmd
    }

    pub fn run_json<I, S>(&self, args: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_err<I, S>(&self, args: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json error output")
    }

    pub fn disable_args(&self, window_secs: u64) -> Vec<String> {
        vec![
            "disable".to_string(),
            "alice".to_string(),
            "--address".to_string(),
            "10.0.0.5/32".to_string(),
            "--window".to_string(),
            window_secs.to_string(),
            "--factor-file".to_string(),
            path_str(&self.factor_file),
            "--fragment".to_string(),
            path_str(&self.fragment),
            "--activity-log".to_string(),
            path_str(&self.activity_log),
        ]
    }

    pub fn restore_args(&self) -> Vec<String> {
        vec![
            "restore".to_string(),
            "alice".to_string(),
            "--factor-file".to_string(),
            path_str(&self.factor_file),
            "--fragment".to_string(),
            path_str(&self.fragment),
        ]
    }

    pub fn status_args(&self) -> Vec<String> {
        vec![
            "status".to_string(),
            "alice".to_string(),
            "--factor-file".to_string(),
            path_str(&self.factor_file),
            "--fragment".to_string(),
            path_str(&self.fragment),
        ]
    }

    /// Marks a stub tool so its next invocations exit non-zero.
    pub fn fail_tool(&self, tool: &str) {
        fs::write(self.spool.join(format!("{tool}.fail")), "").expect("set failure marker");
    }

    /// One recorded line per invocation, arguments joined by spaces.
    pub fn tool_calls(&self, tool: &str) -> Vec<String> {
        fs::read_to_string(self.spool.join(format!("{tool}.args")))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn tool_stdin(&self, tool: &str) -> String {
        fs::read_to_string(self.spool.join(format!("{tool}.stdin"))).unwrap_or_default()
    }

    pub fn factor_disabled_path(&self) -> PathBuf {
        let mut os = self.factor_file.clone().into_os_string();
        os.push(".disabled");
        PathBuf::from(os)
    }

    /// Puts the environment into the disabled state by hand: factor file
    /// parked at its suffixed path and the policy fragment in place.
    pub fn make_disabled(&self) {
        fs::rename(&self.factor_file, self.factor_disabled_path()).expect("park factor file");
        fs::write(
            &self.fragment,
            "Match User alice Address 10.0.0.5/32\n    PasswordAuthentication yes\n    AuthenticationMethods password\n",
        )
        .expect("write fragment");
    }

    pub fn append_activity(&self, line: &str) {
        let mut content = fs::read_to_string(&self.activity_log).unwrap_or_default();
        content.push_str(line);
        content.push('\n');
        fs::write(&self.activity_log, content).expect("append activity record");
    }
}

fn path_str(p: &Path) -> String {
    p.to_str().expect("utf8 path").to_string()
}

fn install_stub(bin: &Path, spool: &Path, tool: &str) {
    let spool = spool.display();
    let script = match tool {
        "at" => format!(
            "#!/bin/sh\necho \"$@\" >> '{spool}/at.args'\ncat >> '{spool}/at.stdin'\nif [ -e '{spool}/at.fail' ]; then\n  echo 'at: cannot schedule' >&2\n  exit 1\nfi\necho 'job 42 at Sat Aug  8 12:00:00 2026' >&2\nexit 0\n"
        ),
        "atrm" => format!(
            "#!/bin/sh\necho \"$@\" >> '{spool}/atrm.args'\nif [ -e '{spool}/atrm.fail' ]; then\n  echo 'atrm: cannot remove' >&2\n  exit 1\nfi\nexit 0\n"
        ),
        "sshd" => format!(
            "#!/bin/sh\necho \"$@\" >> '{spool}/sshd.args'\nif [ -e '{spool}/sshd.fail' ]; then\n  echo '/etc/ssh/sshd_config line 3: Bad configuration option' >&2\n  exit 1\nfi\nexit 0\n"
        ),
        "systemctl" => format!(
            "#!/bin/sh\necho \"$@\" >> '{spool}/systemctl.args'\nif [ -e '{spool}/systemctl.fail' ]; then\n  echo 'Job for sshd.service failed' >&2\n  exit 1\nfi\nexit 0\n"
        ),
        "write" => format!(
            "#!/bin/sh\necho \"$@\" >> '{spool}/write.args'\ncat >> '{spool}/write.stdin'\nexit 0\n"
        ),
        other => panic!("no stub defined for {other}"),
    };
    let path = bin.join(tool);
    fs::write(&path, script).expect("write stub script");
    let mut perms = fs::metadata(&path).expect("stub metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("mark stub executable");
}
