//! 호출 한 번의 처리 흐름
//!
//! ```text
//! Start → OpenVault → Autotype (종료, 치명적 아님)
//!                   → OpenMenu → Show   → EntrySelection (종료)
//!                              → Reload → OpenVault → OpenMenu
//!                              → Exit   (종료, 치명적)
//! ```

pub mod entries;

use crate::autotype::{self, Typer};
use crate::clipboard::Clipboard;
use crate::daemon::session::Session;
use crate::error::{KpMenuError, Result};
use crate::otp;
use crate::ui::{Picker, PromptKind, Selection};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// 메인 메뉴 항목
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Show,
    Reload,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 3] = [MenuChoice::Show, MenuChoice::Reload, MenuChoice::Exit];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Show => "Show entries",
            MenuChoice::Reload => "Reload database",
            MenuChoice::Exit => "Exit",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.label() == label)
    }
}

/// Pipeline 실행 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// 데몬을 종료해야 하는지 (상주 모드에서는 무시됨)
    pub fatal: bool,
    /// 응답을 보낸 뒤 다음 호출을 위해 데이터베이스를 다시 열어야 하는지
    pub reopen_after_reply: bool,
}

/// 호출별 비즈니스 로직 (외부 도구 묶음)
pub struct Pipeline {
    picker: Arc<dyn Picker>,
    clipboard: Arc<dyn Clipboard>,
    typer: Arc<dyn Typer>,
}

impl Pipeline {
    pub fn new(picker: Arc<dyn Picker>, clipboard: Arc<dyn Clipboard>, typer: Arc<dyn Typer>) -> Self {
        Self {
            picker,
            clipboard,
            typer,
        }
    }

    /// 종료 전에 클립보드 비우기를 기다릴 때 사용
    pub fn clipboard(&self) -> &Arc<dyn Clipboard> {
        &self.clipboard
    }

    /// 캐시를 검증하고 한 번 실행
    ///
    /// 사용자에게 보여줄 텍스트(있다면)는 `out`에 씁니다.
    pub async fn run(&self, session: &mut Session, out: &mut String) -> Report {
        let status = session.validate_cache(Instant::now());
        debug!("cache status: {:?} (reusable: {})", status, status.is_reusable());

        let mut report = Report::default();
        if let Err(e) = self.execute(session, out, &mut report).await {
            report.fatal = e.is_fatal();
            match e {
                KpMenuError::Cancelled => debug!("cancelled by user"),
                e if report.fatal => error!("{}", e),
                e => warn!("{}", e),
            }
        }
        report
    }

    async fn execute(&self, session: &mut Session, out: &mut String, report: &mut Report) -> Result<()> {
        if session.config.flags.quit {
            return Err(KpMenuError::QuitRequested);
        }

        if !session.loaded {
            self.open_vault(session).await?;
        } else if session.resident {
            report.reopen_after_reply = true;
        }

        let config = &session.config;
        if config.flags.autotype && !config.general.disable_autotype {
            if let Err(e) = autotype::run(
                config,
                &session.entries,
                self.picker.as_ref(),
                self.typer.as_ref(),
                out,
            )
            .await
            {
                warn!("autotype: {}", e);
            }
            return Ok(());
        }

        self.open_menu(session).await
    }

    /// 비밀번호를 얻어 데이터베이스 복호화
    ///
    /// 이미 로드되어 있으면 기존 자격 증명으로 다시 엽니다.
    pub async fn open_vault(&self, session: &mut Session) -> Result<()> {
        if !session.loaded {
            let password = if session.config.database.password.is_empty() {
                self.prompt_password(session).await?
            } else {
                session.config.database.password.clone()
            };
            session
                .vault
                .derive_credentials(&session.config.database, &password)?;
        }

        let entries = session.vault.open(&session.config.database)?;
        info!("database opened with {} entries", entries.len());
        session.mark_loaded(entries, Instant::now());
        Ok(())
    }

    async fn prompt_password(&self, session: &Session) -> Result<String> {
        let selection = self
            .picker
            .prompt(&session.config, PromptKind::Password, None)
            .await
            .map_err(|e| KpMenuError::PasswordPrompt(e.to_string()))?;
        match selection {
            Selection::Chosen(password) | Selection::CustomKey(_, password) => Ok(password),
            Selection::Cancelled => Err(KpMenuError::PasswordCancelled),
        }
    }

    /// 상주 모드: 응답 후 다음 호출을 위해 다시 열기 (실패하면 다음 호출에서 재시도)
    pub async fn reopen(&self, session: &mut Session) {
        if let Err(e) = self.open_vault(session).await {
            warn!("failed to reopen database: {}", e);
            session.invalidate();
        }
    }

    async fn open_menu(&self, session: &mut Session) -> Result<()> {
        let items: Vec<String> = MenuChoice::ALL
            .iter()
            .map(|choice| choice.label().to_string())
            .collect();

        loop {
            let selected = self
                .picker
                .prompt(&session.config, PromptKind::Menu, Some(&items))
                .await?
                .into_text()
                .ok_or(KpMenuError::Cancelled)?;

            match MenuChoice::from_label(&selected) {
                Some(MenuChoice::Show) => return self.entry_selection(session).await,
                Some(MenuChoice::Reload) => {
                    info!("reloading database");
                    self.open_vault(session).await?;
                }
                Some(MenuChoice::Exit) => {
                    session.invalidate();
                    return Err(KpMenuError::ExitRequested);
                }
                None => return Err(KpMenuError::SelectionNotFound("menu item")),
            }
        }
    }

    async fn entry_selection(&self, session: &Session) -> Result<()> {
        let config = &session.config;
        let picker = self.picker.as_ref();

        let entry = entries::select_entry(config, &session.entries, picker).await?;
        let value = entries::select_field(config, entry, picker, otp::now_seconds()).await?;

        self.clipboard.copy(config, &value).await?;
        self.clipboard
            .schedule_clear(config, &value, config.general.clipboard_timeout);
        Ok(())
    }
}
