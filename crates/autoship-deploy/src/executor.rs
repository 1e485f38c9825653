use crate::command::CommandError;

/// Abstraction over external command execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// Arguments are always passed as a vector; no local shell is involved.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, CommandError>;

    /// Execute a command, echoing stdout and stderr line by line as they arrive.
    async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), CommandError>;
}

/// Real executor backed by `tokio::process`.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        use std::process::Stdio;

        tracing::debug!(program, ?args, "exec");
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidUtf8 {
                program: program.to_owned(),
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(CommandError::Failed {
                program: program.to_owned(),
                args: args.to_vec(),
                code: output.status.code(),
                stderr,
            })
        }
    }

    async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), CommandError> {
        use std::process::Stdio;
        use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

        async fn echo_lines<R: AsyncRead + Unpin>(reader: R, to_stderr: bool) {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if to_stderr => eprintln!("{line}"),
                    Ok(Some(line)) => println!("{line}"),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stopped reading command output");
                        break;
                    }
                }
            }
        }

        tracing::debug!(program, ?args, "exec (streaming)");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        let stdout_task = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(echo_lines(stdout, false)));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(echo_lines(stderr, true)));

        let status = child.wait().await.map_err(|e| CommandError::Wait {
            program: program.to_owned(),
            source: e,
        })?;

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "output reader task failed");
            }
        }

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                program: program.to_owned(),
                args: args.to_vec(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}
