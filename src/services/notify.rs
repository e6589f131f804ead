use std::io::Write;
use std::process::{Command, Stdio};

/// Best-effort message to the account's active sessions via write(1). The
/// channel is advisory; no failure here is ever surfaced to the caller.
pub fn broadcast(account: &str, message: &str) {
    let child = Command::new("write")
        .arg(account)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = child else {
        return;
    };
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(message.as_bytes());
        let _ = stdin.write_all(b"\n");
    }
    let _ = child.wait();
}
