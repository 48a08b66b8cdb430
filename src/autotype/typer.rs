use crate::config::Configuration;
use crate::error::{KpMenuError, Result};
use crate::executor::{split_command, CommandRunner};
use async_trait::async_trait;

/// 키 입력 재생기
#[async_trait]
pub trait Typer: Send + Sync {
    /// 현재 활성 창 제목
    async fn active_window(&self, config: &Configuration) -> Result<String>;

    /// 시퀀스와 필드 값을 타이퍼에 전달 (부수 효과만)
    async fn execute(
        &self,
        config: &Configuration,
        sequence: &str,
        fields: &[(String, String)],
    ) -> Result<()>;
}

/// 타이퍼 stdin 형식: 첫 줄은 시퀀스, 이후 `KEY\tVALUE` 줄
pub fn render_input(sequence: &str, fields: &[(String, String)]) -> String {
    let mut input = String::with_capacity(sequence.len() + 1);
    input.push_str(sequence);
    input.push('\n');
    for (key, value) in fields {
        input.push_str(key);
        input.push('\t');
        input.push_str(value);
        input.push('\n');
    }
    input
}

/// 외부 실행 파일 기반 타이퍼 (기본: quasiauto)
pub struct CommandTyper;

impl CommandTyper {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommandTyper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Typer for CommandTyper {
    async fn active_window(&self, config: &Configuration) -> Result<String> {
        let command = &config.executable.custom_autotype_window_id;
        if command.trim().is_empty() {
            return Err(KpMenuError::Autotype(
                "customAutotypeWindowID is not set".to_string(),
            ));
        }

        let output = CommandRunner::shell(command, None)
            .await
            .map_err(|e| KpMenuError::Autotype(e.to_string()))?;
        if !output.success() {
            return Err(KpMenuError::Autotype(format!(
                "window identifier exited with {:?}: {}",
                output.code,
                output.stderr.trim()
            )));
        }
        Ok(output.stdout.trim_end_matches('\n').to_string())
    }

    async fn execute(
        &self,
        config: &Configuration,
        sequence: &str,
        fields: &[(String, String)],
    ) -> Result<()> {
        let command = split_command(&config.executable.custom_autotype_typer);
        if command.is_empty() {
            return Err(KpMenuError::Autotype("customAutotypeTyper is not set".to_string()));
        }

        let output = CommandRunner::run(&command, Some(&render_input(sequence, fields)))
            .await
            .map_err(|e| KpMenuError::Autotype(e.to_string()))?;
        if !output.success() {
            return Err(KpMenuError::Autotype(format!(
                "typer exited with {:?}: {}",
                output.code,
                output.stderr.trim()
            )));
        }
        Ok(())
    }
}
