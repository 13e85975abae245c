use portscope::{
    utils::{parse_pid, parse_port_input, validate_port},
    Config, Error, PortService,
};

#[tokio::test]
async fn test_check_port_rejects_invalid_input() {
    let service = PortService::default();

    for input in ["0", "65536", "not-a-port", ""] {
        let result = service.check_port(input).await;
        assert!(!result.is_occupied, "input {input:?}");
        assert!(result.processes.is_empty());
        assert!(result.error.unwrap().contains("Invalid port"));
    }
}

#[tokio::test]
async fn test_check_unused_port() {
    // High port number likely to be free. Hosts without lsof report an error
    // instead, which must still come back as a value rather than a panic.
    let result = PortService::default().check_port("65432").await;

    assert_eq!(result.is_occupied, !result.processes.is_empty());
    if result.error.is_some() {
        assert!(!result.is_occupied);
    }
}

#[tokio::test]
async fn test_kill_process_invalid_pid() {
    let service = PortService::default();

    for pid in ["abc", "", "12.34", "not_a_number"] {
        let err = service.kill_process(pid).await.unwrap_err();
        assert!(err.contains("Invalid PID format"), "{err}");

        let err = service.graceful_kill_process(pid).await.unwrap_err();
        assert!(err.contains("Invalid PID format"), "{err}");
    }
}

#[tokio::test]
async fn test_get_process_detail_invalid_pid() {
    let err = PortService::default()
        .get_process_detail("abc", None)
        .await
        .unwrap_err();
    assert!(err.contains("Invalid PID format"));
}

#[test]
fn test_validation_functions() {
    assert!(validate_port(80).is_ok());
    assert!(validate_port(0).is_err());
    assert!(validate_port(65536).is_err());

    assert_eq!(parse_port_input("8080").unwrap(), 8080);
    assert!(parse_port_input("http").is_err());

    assert_eq!(parse_pid("42").unwrap(), 42);
    assert!(parse_pid("0").is_err());
}

#[test]
fn test_error_types() {
    let error = Error::InvalidPort("test".to_string());
    assert!(error.to_string().contains("Invalid port"));

    let error = Error::ProcessNotFound(1234);
    assert!(error.to_string().contains("1234"));
    assert!(error.to_string().contains("not found"));

    let error = Error::IoFailure("lsof command failed".to_string());
    assert!(error.to_string().contains("system tools"));
}

#[cfg(unix)]
mod fake_lsof {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for lsof.
    fn script(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("lsof");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn service(program: PathBuf, timeout: Duration) -> PortService {
        let config = Config::new()
            .with_lsof_program(program.to_string_lossy())
            .with_query_timeout(timeout);
        PortService::new(&config)
    }

    #[tokio::test]
    async fn test_duplicate_rows_from_lsof() {
        let dir = TempDir::new().unwrap();
        let lsof = script(
            &dir,
            "printf 'COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\\n\
node 1234 dev 19u IPv4 0x1 0t0 TCP *:3000 (LISTEN)\\n\
node 1234 dev 20u IPv6 0x2 0t0 TCP *:3000 (LISTEN)\\n'",
        );

        let result = service(lsof, Duration::from_secs(5)).check_port("3000").await;

        assert_eq!(result.error, None);
        assert!(result.is_occupied);
        assert_eq!(result.processes.len(), 1);
        assert_eq!(result.processes[0].pid, 1234);
        assert_eq!(result.processes[0].process_name, "node");
        assert_eq!(result.processes[0].port, 3000);
    }

    #[tokio::test]
    async fn test_no_match_is_free() {
        let dir = TempDir::new().unwrap();
        let lsof = script(&dir, "exit 1");

        let result = service(lsof, Duration::from_secs(5)).check_port("3000").await;

        assert!(!result.is_occupied);
        assert!(result.processes.is_empty());
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_tool_failure_sets_error() {
        let dir = TempDir::new().unwrap();
        let lsof = script(&dir, "echo 'lsof: broken' >&2\nexit 2");

        let result = service(lsof, Duration::from_secs(5)).check_port("3000").await;

        assert!(!result.is_occupied);
        assert!(result.error.unwrap().contains("Query failed"));
    }

    #[tokio::test]
    async fn test_slow_tool_times_out() {
        let dir = TempDir::new().unwrap();
        let lsof = script(&dir, "sleep 5");

        let result = service(lsof, Duration::from_millis(100))
            .check_port("3000")
            .await;

        assert!(!result.is_occupied);
        assert!(result.error.unwrap().contains("did not finish within"));
    }

    #[tokio::test]
    async fn test_unreadable_output_is_free() {
        let dir = TempDir::new().unwrap();
        let lsof = script(&dir, "echo 'garbage without any columns'");

        let result = service(lsof, Duration::from_secs(5)).check_port("3000").await;

        assert!(!result.is_occupied);
        assert_eq!(result.error, None);
    }
}

#[cfg(unix)]
mod signals {
    use portscope::{Config, TerminationMode, TerminationOutcome, Terminator};
    use std::process::{Child, Command};
    use std::time::Duration;

    fn terminator() -> Terminator {
        Terminator::new(&Config::new().with_verify_delay(Duration::from_millis(300)))
    }

    fn spawn(script: &str) -> Child {
        Command::new("sh").args(["-c", script]).spawn().unwrap()
    }

    #[tokio::test]
    async fn test_forceful_kill_of_child() {
        let mut child = spawn("exec sleep 30");

        let outcome = terminator()
            .terminate(child.id(), TerminationMode::Forceful)
            .await;

        assert_eq!(outcome, TerminationOutcome::Terminated);
        let _ = child.wait();
    }

    #[tokio::test]
    async fn test_graceful_kill_of_child() {
        let mut child = spawn("exec sleep 30");

        let outcome = terminator()
            .terminate(child.id(), TerminationMode::Graceful)
            .await;

        assert_eq!(outcome, TerminationOutcome::Terminated);
        let _ = child.wait();
    }

    #[tokio::test]
    async fn test_graceful_kill_ignored_then_forced() {
        let mut child = spawn("trap '' TERM; while :; do sleep 1; done");
        // Give the shell time to install its trap
        tokio::time::sleep(Duration::from_millis(200)).await;

        let terminator = terminator();
        let outcome = terminator
            .terminate(child.id(), TerminationMode::Graceful)
            .await;
        match outcome {
            TerminationOutcome::Failed(reason) => assert!(reason.contains("still running")),
            other => panic!("expected the process to survive, got {other:?}"),
        }

        let outcome = terminator
            .terminate(child.id(), TerminationMode::Forceful)
            .await;
        assert_eq!(outcome, TerminationOutcome::Terminated);
        let _ = child.wait();
    }

    #[tokio::test]
    async fn test_missing_process_already_exited() {
        let mut child = spawn("exit 0");
        let pid = child.id();
        child.wait().unwrap();

        let outcome = terminator()
            .terminate(pid, TerminationMode::Forceful)
            .await;

        assert_eq!(outcome, TerminationOutcome::AlreadyExited);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_detail_of_current_process() {
    let result = PortService::default()
        .get_process_detail(&std::process::id().to_string(), Some(8080))
        .await;

    match result {
        Ok(detail) => {
            assert_eq!(detail.pid, std::process::id());
            assert_eq!(detail.port, Some(8080));
            assert!(detail.user.is_some());
        }
        // ps may be missing in minimal containers
        Err(e) => assert!(e.contains("Query failed"), "{e}"),
    }
}
