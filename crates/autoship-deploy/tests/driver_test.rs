use std::sync::{Arc, Mutex};

use autoship_core::{ImageReference, MemoryLog, ProxyConfig, RunConfig};
use autoship_deploy::builder::{BuildError, ImageBuilder, locate_build_file};
use autoship_deploy::command::CommandError;
use autoship_deploy::container::{ContainerRunner, RemoteTarget, RunTarget, run_command};
use autoship_deploy::executor::CommandExecutor;
use autoship_deploy::proxy::{ProxyDriver, ProxyError, ProxyStep, render_config};
use mockall::mock;
use tempfile::TempDir;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
        async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), CommandError>;
    }
}

fn is(program: &str, expected: &str) -> bool {
    program == expected
}

fn failed(program: &str, code: i32) -> CommandError {
    CommandError::Failed {
        program: program.to_owned(),
        args: vec![],
        code: Some(code),
        stderr: "boom".to_owned(),
    }
}

// ── Image Builder ──

#[tokio::test]
async fn build_uses_dockerfile_directory_as_context() {
    let tmp = TempDir::new().unwrap();
    let app_dir = tmp.path().join("app");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("Dockerfile"), "FROM node").unwrap();

    let dockerfile = app_dir.join("Dockerfile").to_str().unwrap().to_owned();
    let context = app_dir.to_str().unwrap().to_owned();

    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .withf(move |program, args| {
            is(program, "docker")
                && args.to_vec()
                    == vec![
                        "build".to_owned(),
                        "-t".to_owned(),
                        "web:v1".to_owned(),
                        "-f".to_owned(),
                        dockerfile.clone(),
                        context.clone(),
                    ]
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let log = MemoryLog::new();
    let builder = ImageBuilder::with_executor(mock);
    let used = builder
        .build(tmp.path(), &ImageReference::new("web", "v1"), &log)
        .await
        .unwrap();

    assert_eq!(used, app_dir.join("Dockerfile"));
    assert!(log.contains("built web:v1"));
}

#[tokio::test]
async fn build_failure_reports_exit_code() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM node").unwrap();

    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .returning(|_, _| Err(failed("docker", 2)));

    let builder = ImageBuilder::with_executor(mock);
    let result = builder
        .build(tmp.path(), &ImageReference::new("web", "v1"), &MemoryLog::new())
        .await;

    assert!(matches!(
        result,
        Err(BuildError::BuildFailed {
            exit_code: Some(2),
            ..
        })
    ));
}

#[tokio::test]
async fn build_without_dockerfile_never_runs_docker() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("package.json"), "{}").unwrap();

    let mock = MockExecutor::new();
    let builder = ImageBuilder::with_executor(mock);
    let result = builder
        .build(tmp.path(), &ImageReference::new("web", "v1"), &MemoryLog::new())
        .await;

    assert!(matches!(result, Err(BuildError::BuildFileNotFound(_))));
}

#[test]
fn locate_build_file_matches_any_case_suffix() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("deploy")).unwrap();
    std::fs::write(tmp.path().join("deploy/web.DOCKERFILE"), "FROM node").unwrap();

    let found = locate_build_file(tmp.path()).unwrap();
    assert_eq!(found, tmp.path().join("deploy/web.DOCKERFILE"));
}

#[test]
fn locate_build_file_ignores_similar_names() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile.dev"), "FROM node").unwrap();
    std::fs::write(tmp.path().join(".dockerignore"), "node_modules").unwrap();

    assert!(matches!(
        locate_build_file(tmp.path()),
        Err(BuildError::BuildFileNotFound(_))
    ));
}

// ── Container Runner ──

#[test]
fn local_run_publishes_port_8000() {
    let command = run_command(
        &ImageReference::new("web", "v1"),
        &RunTarget::Local,
        &RunConfig::default(),
    );

    assert_eq!(command.program, "docker");
    assert_eq!(command.args, vec!["run", "-d", "-p", "8000:8000", "web:v1"]);
}

#[test]
fn remote_run_with_password_uses_sshpass() {
    let target = RunTarget::Remote(RemoteTarget {
        host: "10.0.0.5".to_owned(),
        user: "deploy".to_owned(),
        password: Some("s3cret".to_owned()),
    });

    let command = run_command(
        &ImageReference::new("web", "v1"),
        &target,
        &RunConfig::default(),
    );

    assert_eq!(command.program, "sshpass");
    assert_eq!(
        command.args,
        vec![
            "-p",
            "s3cret",
            "ssh",
            "-o",
            "StrictHostKeyChecking=no",
            "deploy@10.0.0.5",
            "docker run -d -p 8000:8000 web:v1",
        ]
    );
}

#[test]
fn remote_run_without_password_uses_plain_ssh() {
    let target = RunTarget::Remote(RemoteTarget {
        host: "example.com".to_owned(),
        user: "ops".to_owned(),
        password: Some(String::new()),
    });

    let command = run_command(
        &ImageReference::new("web", "v1"),
        &target,
        &RunConfig::default(),
    );

    assert_eq!(command.program, "ssh");
    assert_eq!(
        command.args,
        vec!["ops@example.com", "docker run -d -p 8000:8000 web:v1"]
    );
}

#[test]
fn remote_target_debug_masks_password() {
    let target = RemoteTarget {
        host: "h".to_owned(),
        user: "u".to_owned(),
        password: Some("s3cret".to_owned()),
    };

    let debug = format!("{target:?}");
    assert!(!debug.contains("s3cret"));
}

#[tokio::test]
async fn run_returns_container_id() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|program, args| is(program, "docker") && args.contains(&"8000:8000".to_owned()))
        .times(1)
        .returning(|_, _| Ok("abc123\n".to_owned()));

    let log = MemoryLog::new();
    let runner = ContainerRunner::with_executor(mock);
    let id = runner
        .run(
            &ImageReference::new("web", "v1"),
            &RunTarget::Local,
            &RunConfig::default(),
            &log,
        )
        .await
        .unwrap();

    assert_eq!(id, "abc123");
    assert!(log.contains("container abc123 started on local"));
}

#[tokio::test]
async fn run_failure_is_returned_to_caller() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_, _| Err(failed("docker", 125)));

    let log = MemoryLog::new();
    let runner = ContainerRunner::with_executor(mock);
    let result = runner
        .run(
            &ImageReference::new("web", "v1"),
            &RunTarget::Local,
            &RunConfig::default(),
            &log,
        )
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.target, "local");
    assert_eq!(err.source.exit_code(), Some(125));
    assert!(log.contains("failed to start web:v1"));
}

// ── Proxy Driver ──

fn recording_mock(fail_on: Option<&'static str>) -> (MockExecutor, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(move |program, args| {
        let line = format!("{program} {}", args.join(" "));
        recorded.lock().unwrap().push(line);
        match fail_on {
            Some(cmd) if args.first().map(String::as_str) == Some(cmd) => Err(failed(program, 1)),
            _ => Ok(String::new()),
        }
    });
    (mock, calls)
}

#[test]
fn proxy_config_forwards_to_upstream() {
    let config = render_config(&ProxyConfig::default());

    assert!(config.contains("listen 80;"));
    assert!(config.contains("proxy_pass http://localhost:4000;"));
    assert!(config.contains("proxy_set_header Host $host;"));
}

#[tokio::test]
async fn proxy_copies_links_and_reloads_in_order() {
    let tmp = TempDir::new().unwrap();
    let (mock, calls) = recording_mock(None);

    let driver = ProxyDriver::with_executor(mock);
    let install = driver
        .deploy("demo", tmp.path(), &ProxyConfig::default(), &MemoryLog::new())
        .await
        .unwrap();

    let local = tmp.path().join("demo.conf");
    assert_eq!(install.local_config, local);
    assert!(local.exists());
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            format!(
                "sudo cp {} /etc/nginx/sites-available/demo.conf",
                local.display()
            ),
            "sudo ln -sf /etc/nginx/sites-available/demo.conf /etc/nginx/sites-enabled/demo.conf"
                .to_owned(),
            "sudo nginx -s reload".to_owned(),
        ]
    );
}

#[tokio::test]
async fn proxy_link_failure_removes_copied_config() {
    let tmp = TempDir::new().unwrap();
    let (mock, calls) = recording_mock(Some("ln"));

    let log = MemoryLog::new();
    let driver = ProxyDriver::with_executor(mock);
    let result = driver
        .deploy("demo", tmp.path(), &ProxyConfig::default(), &log)
        .await;

    assert!(matches!(
        result,
        Err(ProxyError::StepFailed {
            step: ProxyStep::Link,
            ..
        })
    ));
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], "sudo rm -f /etc/nginx/sites-available/demo.conf");
    assert!(!calls.iter().any(|c| c.contains("reload")));
    assert!(log.contains("rolled back copy to sites-available"));
}

#[tokio::test]
async fn proxy_reload_failure_undoes_link_then_copy() {
    let tmp = TempDir::new().unwrap();
    let (mock, calls) = recording_mock(Some("nginx"));

    let driver = ProxyDriver::with_executor(mock);
    let result = driver
        .deploy("demo", tmp.path(), &ProxyConfig::default(), &MemoryLog::new())
        .await;

    assert!(matches!(
        result,
        Err(ProxyError::StepFailed {
            step: ProxyStep::Reload,
            ..
        })
    ));
    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[3..],
        [
            "sudo rm -f /etc/nginx/sites-enabled/demo.conf".to_owned(),
            "sudo rm -f /etc/nginx/sites-available/demo.conf".to_owned(),
        ]
    );
}
