use crate::config::{Configuration, CLIPBOARD_CUSTOM, CLIPBOARD_WL, CLIPBOARD_XSEL};
use crate::error::{KpMenuError, Result};
use crate::executor::{split_command, CommandRunner};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// 클립보드 관리자
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, config: &Configuration, text: &str) -> Result<()>;

    /// `delay` 후 클립보드가 여전히 `text`면 비우기 (기다리지 않음)
    fn schedule_clear(&self, config: &Configuration, text: &str, delay: Duration);

    /// 예약된 모든 비우기 작업이 끝날 때까지 대기
    async fn wait(&self);
}

/// 클립보드 도구별 명령줄
#[derive(Debug, Clone, PartialEq)]
struct ClipboardCommands {
    copy: Vec<String>,
    paste: Vec<String>,
    clean: Vec<String>,
}

impl ClipboardCommands {
    fn from_config(config: &Configuration) -> Result<Self> {
        let owned = |argv: &[&str]| argv.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match config.general.clipboard_tool.as_str() {
            CLIPBOARD_XSEL => Ok(Self {
                copy: owned(&["xsel", "-b", "-i"]),
                paste: owned(&["xsel", "-b", "-o"]),
                clean: owned(&["xsel", "-b", "-c"]),
            }),
            CLIPBOARD_WL => Ok(Self {
                copy: owned(&["wl-copy"]),
                paste: owned(&["wl-paste", "-n"]),
                clean: owned(&["wl-copy", "--clear"]),
            }),
            CLIPBOARD_CUSTOM => Ok(Self {
                copy: split_command(&config.executable.custom_clipboard_copy),
                paste: split_command(&config.executable.custom_clipboard_paste),
                clean: split_command(&config.executable.custom_clipboard_clean),
            }),
            other => Err(KpMenuError::Clipboard(format!("unknown clipboard tool: {}", other))),
        }
    }
}

/// 외부 명령 기반 클립보드
#[derive(Default)]
pub struct CommandClipboard {
    pending: Mutex<JoinSet<()>>,
}

impl CommandClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 클립보드 내용이 아직 `text`일 때만 비우기
async fn clear_if_unchanged(commands: ClipboardCommands, text: String) -> Result<bool> {
    let current = CommandRunner::run(&commands.paste, None).await?;
    if current.stdout.trim_end_matches('\n') != text {
        return Ok(false);
    }
    let output = CommandRunner::run(&commands.clean, None).await?;
    if !output.success() {
        return Err(KpMenuError::Clipboard(output.stderr.trim().to_string()));
    }
    Ok(true)
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn copy(&self, config: &Configuration, text: &str) -> Result<()> {
        let commands = ClipboardCommands::from_config(config)?;
        let output = CommandRunner::run(&commands.copy, Some(text))
            .await
            .map_err(|e| KpMenuError::Clipboard(e.to_string()))?;
        if !output.success() {
            return Err(KpMenuError::Clipboard(format!(
                "{:?} exited with {:?}: {}",
                commands.copy,
                output.code,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    fn schedule_clear(&self, config: &Configuration, text: &str, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let commands = match ClipboardCommands::from_config(config) {
            Ok(commands) => commands,
            Err(e) => {
                warn!("clipboard will not be cleaned: {}", e);
                return;
            }
        };
        let text = text.to_string();

        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.spawn(async move {
            tokio::time::sleep(delay).await;
            match clear_if_unchanged(commands, text).await {
                Ok(true) => info!("clipboard cleaned"),
                Ok(false) => info!("clipboard changed, not cleaning"),
                Err(e) => warn!("failed to clean clipboard: {}", e),
            }
        });
    }

    async fn wait(&self) {
        let mut pending = {
            let mut guard = match self.pending.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *guard)
        };
        while pending.join_next().await.is_some() {}
    }
}
