pub mod flags;
pub mod loader;

pub use loader::ConfigLoader;

use crate::error::{KpMenuError, Result};
use std::time::Duration;
use tracing::warn;

/// 프롬프트 도구
pub const PROMPT_DMENU: &str = "dmenu";
pub const PROMPT_ROFI: &str = "rofi";
pub const PROMPT_WOFI: &str = "wofi";
pub const PROMPT_CUSTOM: &str = "custom";

/// 클립보드 도구
pub const CLIPBOARD_XSEL: &str = "xsel";
pub const CLIPBOARD_WL: &str = "wl-clipboard";
pub const CLIPBOARD_CUSTOM: &str = "custom";

/// Autotype 기본 실행 파일
pub const AUTOTYPE_WINDOW_ID: &str = "quasiauto -title";
pub const AUTOTYPE_TYPER: &str = "quasiauto";

/// kpmenu 전체 설정
///
/// 설정 파일(~/.config/kpmenu/config.toml)을 먼저 적용하고, 명령줄 옵션으로 덮어씁니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub general: General,
    pub executable: Executable,
    pub style: Style,
    pub database: DatabaseSettings,
    pub flags: Flags,
}

/// 일반 설정
#[derive(Debug, Clone, PartialEq)]
pub struct General {
    /// 사용할 메뉴 (dmenu, rofi, wofi, custom)
    pub menu: String,
    /// 사용할 클립보드 도구 (xsel, wl-clipboard, custom)
    pub clipboard_tool: String,
    /// 클립보드를 비우기까지의 시간 (0 = 비우지 않음)
    pub clipboard_timeout: Duration,
    /// 데이터베이스 캐시 비활성화
    pub no_cache: bool,
    /// 첫 검증 시점부터만 캐시 유지 (사용해도 연장되지 않음)
    pub cache_one_time: bool,
    /// 캐시 유효 시간
    pub cache_timeout: Duration,
    pub no_otp: bool,
    pub disable_autotype: bool,
    /// 매치가 하나여도 항상 확인
    pub autotype_confirm: bool,
    /// 활성 창 제목 대신 사용자가 엔트리를 선택
    pub autotype_no_auto: bool,
    /// 모든 엔트리에 적용할 autotype 시퀀스
    pub autotype_sequence: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executable {
    pub custom_prompt_password: String,
    pub custom_prompt_menu: String,
    pub custom_prompt_entries: String,
    pub custom_prompt_fields: String,
    pub custom_clipboard_copy: String,
    pub custom_clipboard_paste: String,
    pub custom_clipboard_clean: String,
    pub custom_autotype_window_id: String,
    pub custom_autotype_typer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub password_background: String,
    pub text_password: String,
    pub text_menu: String,
    pub text_entry: String,
    pub text_field: String,
    pub format_entry: String,
    pub args_password: String,
    pub args_menu: String,
    pub args_entry: String,
    pub args_field: String,
}

/// 데이터베이스 설정
///
/// `database`, `key_file`, `password` 세 값이 캐시 재사용 여부를 결정합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub database: String,
    pub key_file: String,
    pub password: String,
    pub field_order: String,
    pub fill_other_fields: bool,
    pub fill_blacklist: String,
}

/// 설정 파일에 들어가지 않는 실행 플래그
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    /// 상주 모드 (캐시 만료/치명적 결과를 무시)
    pub daemon: bool,
    pub autotype: bool,
    pub quit: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            general: General {
                menu: PROMPT_DMENU.to_string(),
                clipboard_tool: CLIPBOARD_XSEL.to_string(),
                clipboard_timeout: Duration::from_secs(15),
                no_cache: false,
                cache_one_time: false,
                cache_timeout: Duration::from_secs(60),
                no_otp: false,
                disable_autotype: false,
                autotype_confirm: false,
                autotype_no_auto: false,
                autotype_sequence: String::new(),
            },
            executable: Executable {
                custom_prompt_password: String::new(),
                custom_prompt_menu: String::new(),
                custom_prompt_entries: String::new(),
                custom_prompt_fields: String::new(),
                custom_clipboard_copy: String::new(),
                custom_clipboard_paste: String::new(),
                custom_clipboard_clean: String::new(),
                custom_autotype_window_id: AUTOTYPE_WINDOW_ID.to_string(),
                custom_autotype_typer: AUTOTYPE_TYPER.to_string(),
            },
            style: Style {
                password_background: "black".to_string(),
                text_password: "Password".to_string(),
                text_menu: "Select".to_string(),
                text_entry: "Entry".to_string(),
                text_field: "Field".to_string(),
                format_entry: "{Title} - {UserName}".to_string(),
                args_password: String::new(),
                args_menu: String::new(),
                args_entry: String::new(),
                args_field: String::new(),
            },
            database: DatabaseSettings {
                database: String::new(),
                key_file: String::new(),
                password: String::new(),
                field_order: "Password UserName URL".to_string(),
                fill_other_fields: true,
                fill_blacklist: String::new(),
            },
            flags: Flags::default(),
        }
    }
}

impl Configuration {
    /// 실행 전 설정 검증
    ///
    /// rofi/wofi가 설치되어 있지 않으면 dmenu로 대체합니다.
    pub fn validate(&mut self) -> Result<()> {
        if self.database.database.is_empty() {
            return Err(KpMenuError::Config(
                "you must select a database with -d or via config".to_string(),
            ));
        }

        match self.general.menu.as_str() {
            PROMPT_ROFI | PROMPT_WOFI => {
                if which::which(&self.general.menu).is_err() {
                    warn!("{} not found, using dmenu", self.general.menu);
                    self.general.menu = PROMPT_DMENU.to_string();
                }
            }
            PROMPT_DMENU | PROMPT_CUSTOM => {}
            other => {
                return Err(KpMenuError::Config(format!("invalid menu option: {}", other)));
            }
        }

        if self.general.menu == PROMPT_DMENU && which::which("dmenu").is_err() {
            return Err(KpMenuError::Config("dmenu not found".to_string()));
        }

        match self.general.clipboard_tool.as_str() {
            CLIPBOARD_XSEL => {
                if which::which("xsel").is_err() {
                    return Err(KpMenuError::Config("xsel not found".to_string()));
                }
            }
            CLIPBOARD_WL => {
                if which::which("wl-copy").is_err() {
                    return Err(KpMenuError::Config("wl-clipboard not found".to_string()));
                }
            }
            CLIPBOARD_CUSTOM => {
                let exe = &self.executable;
                for (name, value) in [
                    ("customClipboardCopy", &exe.custom_clipboard_copy),
                    ("customClipboardPaste", &exe.custom_clipboard_paste),
                    ("customClipboardClean", &exe.custom_clipboard_clean),
                ] {
                    if value.is_empty() {
                        return Err(KpMenuError::Config(format!(
                            "when clipboardTool is set to custom, {} must be set",
                            name
                        )));
                    }
                }
            }
            other => {
                return Err(KpMenuError::Config(format!("invalid clipboard tool: {}", other)));
            }
        }

        Ok(())
    }
}

/// 기간 문자열 파싱: "500ms", "15s", "2m", "1h" 또는 초 단위 정수
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| KpMenuError::Config(format!("invalid duration: {:?}", raw)))?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 3600)),
        _ => Err(KpMenuError::Config(format!("invalid duration unit: {:?}", raw))),
    }
}
