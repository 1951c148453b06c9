//! End-to-end runs against real subprocesses
//!
//! A shell script stands in for the management command. Its `runserver`
//! forks a child and waits; a small in-test HTTP responder answers readiness checks
//! once the server has started, so readiness, test dispatch and process
//! group teardown all run for real.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use deptest::commands::RunArgs;
use deptest::process::ManageBackend;
use deptest::testing::HttpCheck;
use deptest::{cli, Config, Orchestrator};

const MANAGE_SCRIPT: &str = r#"#!/bin/sh
echo "$*" >> "__LOG__"
case "$1" in
  runserver)
    echo $$ > server.pid
    sleep 30 &
    echo $! > child.pid
    wait
    ;;
  test)
    case "$2" in
      *fail*) exit 1 ;;
      *) exit 0 ;;
    esac
    ;;
esac
exit 0
"#;

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
    config_path: PathBuf,
    log: PathBuf,
    port: u16,
}

impl Workspace {
    /// Lay out two projects, a manage script and a config file
    fn new(listener: &TcpListener) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let log = root.join("calls.log");
        let port = listener.local_addr().unwrap().port();

        fs::create_dir_all(root.join("authsvc")).unwrap();
        fs::create_dir_all(root.join("core")).unwrap();

        let script = root.join("manage.sh");
        fs::write(
            &script,
            MANAGE_SCRIPT.replace("__LOG__", &log.display().to_string()),
        )
        .unwrap();

        let config = format!(
            r#"
runner:
  interpreter: sh
  manage: {script}
  test_args: []
readiness:
  host: 127.0.0.1
  interval_ms: 50
  max_attempts: 100
projects:
  authsvc:
    dir: authsvc
    port: {port}
    reset: [accounts]
    fixtures: [users]
  core:
    dir: core
    deps: [authsvc]
    tests:
      default:
        - [core.tests.login, core.tests.fail_case]
"#,
            script = script.display(),
            port = port,
        );
        let config_path = root.join("deptest.yaml");
        fs::write(&config_path, config).unwrap();

        Self {
            _dir: dir,
            root,
            config_path,
            log,
            port,
        }
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn pid(&self, name: &str) -> u32 {
        fs::read_to_string(self.root.join("authsvc").join(name))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }
}

/// Answer HTTP once the fake server has written its child pid
fn spawn_responder(listener: TcpListener, ready_marker: PathBuf) {
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            if !ready_marker.exists() {
                continue;
            }
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    });
}

fn alive(pid: u32) -> bool {
    if unsafe { libc::kill(pid as libc::pid_t, 0) } != 0 {
        return false;
    }
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .map(|state| state != 'Z' && state != 'X')
            .unwrap_or(true),
        Err(_) => true,
    }
}

async fn wait_gone(pid: u32) -> bool {
    for _ in 0..100 {
        if !alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn workspace() -> Workspace {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws = Workspace::new(&listener);
    spawn_responder(listener, ws.root.join("authsvc").join("child.pid"));
    ws
}

fn assert_marker(path: &Path) {
    assert!(path.exists(), "{} was never written", path.display());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_run_against_real_processes() {
    let ws = workspace().await;
    let config = Config::load(&ws.config_path).unwrap();
    let backend = ManageBackend::new(config.runner.clone());
    let check = HttpCheck::new(&config.readiness).unwrap();

    let summary = Orchestrator::new(&config, &backend, &check)
        .run("core", None)
        .await
        .unwrap();

    assert_eq!(summary.outcomes.get("core.tests.login"), Some(0));
    assert_eq!(summary.outcomes.get("core.tests.fail_case"), Some(1));
    assert!(summary.failed);

    assert_eq!(
        ws.calls(),
        vec![
            "reset accounts --noinput".to_string(),
            "loaddata users".to_string(),
            format!("runserver {} --noreload", ws.port),
            "test core.tests.login".to_string(),
            "test core.tests.fail_case".to_string(),
        ]
    );

    assert_marker(&ws.root.join("authsvc").join("server.pid"));
    let server = ws.pid("server.pid");
    let child = ws.pid("child.pid");
    assert!(wait_gone(server).await, "server leader survived teardown");
    assert!(wait_gone(child).await, "server child survived teardown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_dispatch_exit_codes() {
    let ws = workspace().await;

    let code = cli::dispatch(RunArgs {
        configfile: ws.config_path.clone(),
        project_to_test: "core".to_string(),
        profile: None,
        dependency_stdout: false,
        check_coverage: false,
    })
    .await
    .unwrap();
    assert_eq!(code, 1);

    let err = cli::dispatch(RunArgs {
        configfile: ws.config_path.clone(),
        project_to_test: "billingsvc".to_string(),
        profile: None,
        dependency_stdout: false,
        check_coverage: false,
    })
    .await
    .unwrap_err();
    assert!(err.is_configuration());
}
