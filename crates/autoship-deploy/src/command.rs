#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("`{program}` not found or could not be started")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` failed with {}: {args:?}\n{stderr}", describe_code(*code))]
    Failed {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{program}` output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Exit code of a command that ran to completion and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

pub(crate) fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_owned(),
    }
}
