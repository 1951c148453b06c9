//! Process-group ownership for dependency servers
//!
//! A dependency server is spawned as the leader of a new process group so
//! that the server and any children it forks (auto-reloaders, workers) can
//! be killed together. The group is released by [`ServerHandle::terminate`]
//! or, failing that, when the handle is dropped.

use std::io;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::common::Result;

use super::ServerHandle;

/// An owned process group with a spawned leader
pub struct ProcessGroup {
    child: Child,
    pgid: Option<u32>,
    released: bool,
}

impl ProcessGroup {
    /// Spawn `command` as the leader of a new process group
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn()?;
        let pgid = child.id();
        tracing::debug!(pgid = ?pgid, "Spawned process group");

        Ok(Self {
            child,
            pgid,
            released: false,
        })
    }

    /// Send SIGKILL to every process in the group
    #[cfg(unix)]
    fn kill_group(&mut self) -> io::Result<()> {
        let Some(pgid) = self.pgid else {
            return Ok(());
        };

        let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            // Group already gone
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn kill_group(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

#[async_trait]
impl ServerHandle for ProcessGroup {
    fn id(&self) -> Option<u32> {
        self.pgid
    }

    async fn terminate(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }

        // Drop retries the kill unless it went through
        self.kill_group()?;
        self.released = true;

        // Reap the leader so it does not linger as a zombie
        let status = self.child.wait().await?;
        tracing::debug!(pgid = ?self.pgid, ?status, "Process group terminated");
        Ok(())
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        // Best-effort since we can't await in drop
        if !self.released {
            if let Err(e) = self.kill_group() {
                tracing::warn!(pgid = ?self.pgid, "Failed to kill process group on drop: {}", e);
            }
        }
    }
}
