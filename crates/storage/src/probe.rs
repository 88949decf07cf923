// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness checks

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Answers whether a PID recorded in a state file still belongs to a live process.
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Signal-0 probe against the real process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }
        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            // Exists but owned by another user
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::ProcessProbe;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Probe with an explicit set of live PIDs.
    #[derive(Debug, Clone, Default)]
    pub struct FakeProbe {
        alive: Arc<Mutex<HashSet<u32>>>,
    }

    impl FakeProbe {
        pub fn with_alive(pids: &[u32]) -> Self {
            let probe = Self::default();
            for pid in pids {
                probe.set_alive(*pid);
            }
            probe
        }

        pub fn set_alive(&self, pid: u32) {
            self.alive.lock().insert(pid);
        }

        pub fn set_dead(&self, pid: u32) {
            self.alive.lock().remove(&pid);
        }
    }

    impl ProcessProbe for FakeProbe {
        fn is_alive(&self, pid: u32) -> bool {
            self.alive.lock().contains(&pid)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProbe;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_alive() {
        assert!(SystemProbe.is_alive(std::process::id()));
    }

    #[test]
    fn pid_zero_is_never_alive() {
        assert!(!SystemProbe.is_alive(0));
    }

    #[test]
    fn fake_probe_tracks_set() {
        let probe = FakeProbe::with_alive(&[7]);
        assert!(probe.is_alive(7));
        probe.set_dead(7);
        assert!(!probe.is_alive(7));
    }
}
