use crate::error::Result;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// 외부 프로그램 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// 종료 코드 (시그널로 종료되면 None)
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub struct CommandRunner;

impl CommandRunner {
    /// argv를 실행하고 stdin으로 `input`을 전달
    ///
    /// 종료 코드는 에러로 바꾸지 않고 그대로 돌려줍니다. 호출자가 취소/에러를 구분합니다.
    pub async fn run(argv: &[String], input: Option<&str>) -> Result<ProcessOutput> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
        })?;
        debug!("running {}", program);

        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(text.as_bytes()).await?;
            // stdin을 닫아야 dmenu 등이 입력 끝을 인식합니다
            drop(stdin);
        }

        let output = child.wait_with_output().await?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// `sh -c`로 셸 명령 실행
    pub async fn shell(command: &str, input: Option<&str>) -> Result<ProcessOutput> {
        let argv = ["sh".to_string(), "-c".to_string(), command.to_string()];
        Self::run(&argv, input).await
    }
}

/// 공백으로 구분된 명령 문자열을 argv로 분리
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout_and_stdin() {
        let argv = split_command("cat");
        let output = CommandRunner::run(&argv, Some("hello\n")).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "hello\n");
    }

    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let output = CommandRunner::shell("echo oops >&2; exit 3", None).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_empty_command() {
        assert!(CommandRunner::run(&[], None).await.is_err());
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("quasiauto  -title"), vec!["quasiauto", "-title"]);
        assert!(split_command("   ").is_empty());
    }
}
