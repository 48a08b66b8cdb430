use crate::config::{Configuration, PROMPT_CUSTOM, PROMPT_DMENU, PROMPT_ROFI, PROMPT_WOFI};
use crate::error::{KpMenuError, Result};
use crate::executor::{split_command, CommandRunner, ProcessOutput};
use async_trait::async_trait;

/// 프롬프트 종류 (라벨, 추가 인자, 사용자 정의 실행 파일이 종류별로 다름)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Password,
    Menu,
    Entry,
    Field,
    /// autotype 후보 선택
    Choose,
}

impl PromptKind {
    pub fn label<'a>(&self, config: &'a Configuration) -> &'a str {
        match self {
            PromptKind::Password => &config.style.text_password,
            PromptKind::Menu => &config.style.text_menu,
            PromptKind::Entry | PromptKind::Choose => &config.style.text_entry,
            PromptKind::Field => &config.style.text_field,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PromptKind::Password)
    }

    pub fn extra_args(&self, config: &Configuration) -> Vec<String> {
        let raw = match self {
            PromptKind::Password => &config.style.args_password,
            PromptKind::Menu => &config.style.args_menu,
            PromptKind::Entry => &config.style.args_entry,
            PromptKind::Field => &config.style.args_field,
            PromptKind::Choose => return Vec::new(),
        };
        split_command(raw)
    }

    fn custom_executable<'a>(&self, config: &'a Configuration) -> &'a str {
        match self {
            PromptKind::Password => &config.executable.custom_prompt_password,
            PromptKind::Menu => &config.executable.custom_prompt_menu,
            PromptKind::Entry => &config.executable.custom_prompt_entries,
            PromptKind::Field | PromptKind::Choose => &config.executable.custom_prompt_fields,
        }
    }
}

/// 선택 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(String),
    /// rofi 사용자 정의 키 (1..=5)와 그때 선택된 항목
    CustomKey(u8, String),
    Cancelled,
}

impl Selection {
    /// 사용자 정의 키도 일반 선택으로 취급할 때 사용
    pub fn into_text(self) -> Option<String> {
        match self {
            Selection::Chosen(text) | Selection::CustomKey(_, text) => Some(text),
            Selection::Cancelled => None,
        }
    }
}

/// 외부 선택 프로그램
#[async_trait]
pub trait Picker: Send + Sync {
    /// `items`가 None이면 자유 입력 (비밀번호 등)
    async fn prompt(
        &self,
        config: &Configuration,
        kind: PromptKind,
        items: Option<&[String]>,
    ) -> Result<Selection>;
}

/// dmenu / rofi / wofi / 사용자 정의 명령으로 프롬프트 실행
pub struct CommandPicker;

impl CommandPicker {
    pub fn new() -> Self {
        Self
    }

    /// 프롬프트 명령줄 구성
    pub fn command(config: &Configuration, kind: PromptKind) -> Result<Vec<String>> {
        let label = kind.label(config).to_string();
        let secret = kind.is_secret();

        let mut command: Vec<String> = match config.general.menu.as_str() {
            PROMPT_ROFI => {
                let mut cmd = vec![
                    "rofi".to_string(),
                    "-i".to_string(),
                    "-dmenu".to_string(),
                    "-p".to_string(),
                    label,
                ];
                if kind == PromptKind::Choose {
                    cmd.push("-mesg".to_string());
                    cmd.push(
                        "Alt-1: type user, Alt-2: type passwd, Alt-3: type TOTP, Alt-4: type passwd&RET, Alt-5: type URL"
                            .to_string(),
                    );
                }
                if secret {
                    cmd.push("-password".to_string());
                }
                cmd
            }
            PROMPT_WOFI => {
                let mut cmd = vec![
                    "wofi".to_string(),
                    "-i".to_string(),
                    "-d".to_string(),
                    "-p".to_string(),
                    label,
                ];
                if secret {
                    cmd.push("--password".to_string());
                }
                cmd
            }
            PROMPT_DMENU => {
                let mut cmd = vec!["dmenu".to_string(), "-i".to_string(), "-p".to_string(), label];
                if secret {
                    let bg = config.style.password_background.clone();
                    cmd.extend(["-nb".to_string(), bg.clone(), "-nf".to_string(), bg]);
                }
                cmd
            }
            PROMPT_CUSTOM => split_command(kind.custom_executable(config)),
            other => {
                return Err(KpMenuError::Prompt(format!("invalid menu option: {}", other)));
            }
        };

        if command.is_empty() {
            return Err(KpMenuError::Prompt("the custom prompt command is empty".to_string()));
        }

        command.extend(kind.extra_args(config));
        Ok(command)
    }
}

impl Default for CommandPicker {
    fn default() -> Self {
        Self::new()
    }
}

/// 종료 상태로 선택 결과 판별
///
/// stderr 출력이 있으면 에러, 10~14는 rofi 사용자 정의 키, 나머지는 취소입니다.
pub fn interpret(command: &[String], output: ProcessOutput) -> Result<Selection> {
    let text = output.stdout.trim_end_matches('\n').to_string();
    if output.success() {
        return Ok(Selection::Chosen(text));
    }

    if !output.stderr.trim().is_empty() {
        return Err(KpMenuError::Prompt(format!(
            "the command {:?} returned {:?}: {}",
            command,
            output.code,
            output.stderr.trim()
        )));
    }

    match output.code {
        Some(code @ 10..=14) => Ok(Selection::CustomKey((code - 9) as u8, text)),
        _ => Ok(Selection::Cancelled),
    }
}

#[async_trait]
impl Picker for CommandPicker {
    async fn prompt(
        &self,
        config: &Configuration,
        kind: PromptKind,
        items: Option<&[String]>,
    ) -> Result<Selection> {
        let command = Self::command(config, kind)?;
        let input = items.map(|items| {
            items.iter().fold(String::new(), |mut acc, item| {
                acc.push_str(item);
                acc.push('\n');
                acc
            })
        });

        let output = CommandRunner::run(&command, input.as_deref())
            .await
            .map_err(|e| KpMenuError::Prompt(format!("{:?}: {}", command, e)))?;
        interpret(&command, output)
    }
}
