//! Helpers for tests that spawn real process trees

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::ProcessGroup;

pub(crate) fn alive(pid: u32) -> bool {
    if unsafe { libc::kill(pid as libc::pid_t, 0) } != 0 {
        return false;
    }
    // Orphaned zombies may never be reaped inside containers
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .map(|state| state != 'Z' && state != 'X')
            .unwrap_or(true),
        Err(_) => true,
    }
}

/// Spawn a shell that forks a grandchild and records its pid
pub(crate) fn spawn_tree(pid_file: &Path) -> ProcessGroup {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(format!("sleep 30 & echo $! > {}; wait", pid_file.display()))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    ProcessGroup::spawn(cmd).unwrap()
}

pub(crate) async fn read_pid(pid_file: &Path) -> u32 {
    for _ in 0..50 {
        if let Ok(content) = std::fs::read_to_string(pid_file) {
            if let Ok(pid) = content.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("grandchild pid was never written");
}

pub(crate) async fn wait_gone(pid: u32) -> bool {
    for _ in 0..50 {
        if !alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
