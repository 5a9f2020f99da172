//! Process supervisor tests against `/bin/sh` stand-ins for the simulator.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gnb_core::{CoreEndpoint, SiteConfig, WorkloadSettings};
use gnb_render::{ConfigDocument, Renderer};
use gnb_workload::{ApplyOutcome, ObservedState, ProcessSupervisor, Supervisor, SupervisorError};
use tempfile::TempDir;

fn fake_simulator(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("nr-gnb");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings(dir: &TempDir, binary: PathBuf) -> WorkloadSettings {
    WorkloadSettings {
        binary,
        config_dir: dir.path().join("etc"),
        config_file: "gnb.yaml".to_string(),
        startup_grace_ms: 100,
        stop_timeout_ms: 2_000,
    }
}

fn document(port: u16) -> ConfigDocument {
    Renderer::new("127.0.0.1")
        .render(&SiteConfig::default(), &CoreEndpoint::new("amf", port))
        .unwrap()
}

#[tokio::test]
async fn apply_writes_config_and_starts_process() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "exec sleep 30");
    let settings = settings(&dir, binary);
    let config_path = settings.config_path();
    let mut supervisor = ProcessSupervisor::new(settings);

    let doc = document(38412);
    let outcome = supervisor.apply(&doc).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Started);
    assert_eq!(supervisor.status(), ObservedState::Running);
    assert!(supervisor.pid().is_some());
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), doc.content());

    supervisor.stop().await.unwrap();
    assert_eq!(supervisor.status(), ObservedState::Stopped);
}

#[tokio::test]
async fn apply_is_idempotent_and_restarts_on_change() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "exec sleep 30");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    supervisor.apply(&document(38412)).await.unwrap();
    let first_pid = supervisor.pid();

    assert_eq!(supervisor.apply(&document(38412)).await.unwrap(), ApplyOutcome::Unchanged);
    assert_eq!(supervisor.pid(), first_pid);

    assert_eq!(supervisor.apply(&document(38413)).await.unwrap(), ApplyOutcome::Restarted);
    assert_ne!(supervisor.pid(), first_pid);

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn exit_during_startup_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "exit 3");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    let err = supervisor.apply(&document(38412)).await.unwrap_err();

    assert!(matches!(err, SupervisorError::ExitedDuringStartup { .. }), "{err}");
    assert!(matches!(supervisor.status(), ObservedState::Failed(_)));
}

#[tokio::test]
async fn missing_binary_fails_to_spawn() {
    let dir = TempDir::new().unwrap();
    let mut supervisor =
        ProcessSupervisor::new(settings(&dir, dir.path().join("does-not-exist")));

    let err = supervisor.apply(&document(38412)).await.unwrap_err();

    assert!(matches!(err, SupervisorError::SpawnFailed { .. }), "{err}");
}

#[tokio::test]
async fn status_notices_a_crash() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "sleep 1\nexit 1");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    supervisor.apply(&document(38412)).await.unwrap();
    assert_eq!(supervisor.status(), ObservedState::Running);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(matches!(supervisor.status(), ObservedState::Failed(_)));

    // A crashed process is started again, even with the same document.
    assert_eq!(supervisor.apply(&document(38412)).await.unwrap(), ApplyOutcome::Started);
    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn stop_without_process_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let mut supervisor = ProcessSupervisor::new(settings(&dir, PathBuf::from("/bin/true")));
    supervisor.stop().await.unwrap();
    assert_eq!(supervisor.status(), ObservedState::NotStarted);
}

#[tokio::test]
async fn stop_asks_the_simulator_to_exit_first() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(
        dir.path(),
        "trap 'echo bye > \"$0.terminated\"; kill $!; exit 0' TERM\nsleep 30 &\nwait",
    );
    let marker = binary.with_extension("terminated");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    supervisor.apply(&document(38412)).await.unwrap();
    supervisor.stop().await.unwrap();

    assert_eq!(supervisor.status(), ObservedState::Stopped);
    assert_eq!(std::fs::read_to_string(marker).unwrap().trim(), "bye");
}

#[tokio::test]
async fn stop_kills_a_simulator_that_ignores_terminate() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "trap '' TERM\nexec sleep 30");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    supervisor.apply(&document(38412)).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), supervisor.stop())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(supervisor.status(), ObservedState::Stopped);
    assert!(supervisor.pid().is_none());
}

#[tokio::test]
async fn apply_cut_short_during_startup_is_abandoned() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "exec sleep 30");
    let mut settings = settings(&dir, binary);
    settings.startup_grace_ms = 500;
    let mut supervisor = ProcessSupervisor::new(settings);

    let doc = document(38412);
    let cut_short = tokio::time::timeout(Duration::from_millis(100), supervisor.apply(&doc)).await;
    assert!(cut_short.is_err());
    assert_eq!(supervisor.status(), ObservedState::Starting);

    supervisor.abandon("supervisor call timed out after 100ms");
    assert!(supervisor.pid().is_none());
    assert!(matches!(supervisor.status(), ObservedState::Failed(_)));

    // Nothing is remembered as applied, so the same document starts afresh.
    assert_eq!(supervisor.apply(&doc).await.unwrap(), ApplyOutcome::Started);
    assert_eq!(supervisor.status(), ObservedState::Running);
    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn stop_cut_short_leaves_no_stale_state() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "trap '' TERM\nexec sleep 30");
    let mut supervisor = ProcessSupervisor::new(settings(&dir, binary));

    let doc = document(38412);
    supervisor.apply(&doc).await.unwrap();
    let cut_short = tokio::time::timeout(Duration::from_millis(200), supervisor.stop()).await;
    assert!(cut_short.is_err());

    assert_eq!(supervisor.status(), ObservedState::Stopped);
    assert!(supervisor.pid().is_none());
    assert_eq!(supervisor.apply(&doc).await.unwrap(), ApplyOutcome::Started);
    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn restart_keeps_the_old_document_until_the_old_process_stops() {
    let dir = TempDir::new().unwrap();
    let binary = fake_simulator(dir.path(), "trap '' TERM\nexec sleep 30");
    let settings = settings(&dir, binary);
    let config_path = settings.config_path();
    let mut supervisor = ProcessSupervisor::new(settings);

    supervisor.apply(&document(38412)).await.unwrap();
    // Cut short while the old process is still given time to exit.
    let cut_short =
        tokio::time::timeout(Duration::from_millis(200), supervisor.apply(&document(38413))).await;
    assert!(cut_short.is_err());
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), document(38412).content());

    assert_eq!(supervisor.apply(&document(38413)).await.unwrap(), ApplyOutcome::Started);
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), document(38413).content());
    supervisor.stop().await.unwrap();
}
