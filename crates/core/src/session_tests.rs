// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use SessionState::*;

#[yare::parameterized(
    start_sync        = { NotStarted, Syncing },
    sync_to_build     = { Syncing, Building },
    sync_to_run       = { Syncing, Running },
    build_to_run      = { Building, Running },
    run_resyncs       = { Running, Syncing },
    failed_retries    = { Failed, Syncing },
    build_fails       = { Building, Failed },
    run_fails         = { Running, Failed },
    stop_from_running = { Running, Stopping },
    stop_from_failed  = { Failed, Stopping },
    stopping_done     = { Stopping, Stopped },
    kill_from_build   = { Building, Stopped },
    kill_not_started  = { NotStarted, Stopped },
)]
fn allowed(from: SessionState, to: SessionState) {
    assert!(from.can_transition_to(to), "{from} -> {to} should be allowed");
}

#[yare::parameterized(
    back_to_start      = { Running, NotStarted },
    skip_sync          = { NotStarted, Running },
    build_backwards    = { Building, Syncing },
    stopped_is_final   = { Stopped, Syncing },
    stopped_no_restop  = { Stopped, Stopping },
    stopping_no_resume = { Stopping, Running },
    failed_to_running  = { Failed, Running },
)]
fn rejected(from: SessionState, to: SessionState) {
    assert!(!from.can_transition_to(to), "{from} -> {to} should be rejected");
}

#[test]
fn transition_mutates_on_success() {
    let mut state = NotStarted;
    state.transition(Syncing).unwrap();
    state.transition(Building).unwrap();
    state.transition(Running).unwrap();
    assert_eq!(state, Running);
}

#[test]
fn transition_error_reports_both_ends() {
    let mut state = Stopped;
    let err = state.transition(Running).unwrap_err();
    assert_eq!(err, InvalidTransition { from: Stopped, to: Running });
    assert_eq!(err.to_string(), "invalid session transition: stopped -> running");
    assert_eq!(state, Stopped);
}

#[test]
fn busy_and_terminal_flags() {
    assert!(Syncing.is_busy());
    assert!(Building.is_busy());
    assert!(!Running.is_busy());
    assert!(Stopped.is_terminal());
    assert!(!Failed.is_terminal());
}

#[test]
fn serde_uses_snake_case() {
    assert_eq!(serde_json::to_string(&NotStarted).unwrap(), "\"not_started\"");
}
