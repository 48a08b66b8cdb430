//! 테스트용 가짜 외부 도구

use crate::autotype::Typer;
use crate::clipboard::Clipboard;
use crate::config::{Configuration, DatabaseSettings};
use crate::error::{KpMenuError, Result};
use crate::ui::{Picker, PromptKind, Selection};
use crate::vault::{Entry, Vault};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 미리 정한 순서대로 선택하는 picker (다 쓰면 취소)
#[derive(Default)]
pub struct FakePicker {
    script: Mutex<VecDeque<Selection>>,
    calls: Mutex<Vec<(PromptKind, Option<Vec<String>>)>>,
}

impl FakePicker {
    pub fn new(selections: Vec<Selection>) -> Self {
        Self {
            script: Mutex::new(selections.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<PromptKind> {
        self.calls.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    /// 목록이 주어진 프롬프트의 항목들
    pub fn items(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, items)| items.clone())
            .collect()
    }
}

#[async_trait]
impl Picker for FakePicker {
    async fn prompt(
        &self,
        _config: &Configuration,
        kind: PromptKind,
        items: Option<&[String]>,
    ) -> Result<Selection> {
        self.calls
            .lock()
            .unwrap()
            .push((kind, items.map(<[String]>::to_vec)));
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Selection::Cancelled))
    }
}

/// 고정된 창 제목을 돌려주고 입력 내용을 기록하는 타이퍼
pub struct FakeTyper {
    window: String,
    typed: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeTyper {
    pub fn with_window(window: &str) -> Self {
        Self {
            window: window.to_string(),
            typed: Mutex::new(Vec::new()),
        }
    }

    pub fn typed(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.typed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Typer for FakeTyper {
    async fn active_window(&self, _config: &Configuration) -> Result<String> {
        Ok(self.window.clone())
    }

    async fn execute(
        &self,
        _config: &Configuration,
        sequence: &str,
        fields: &[(String, String)],
    ) -> Result<()> {
        self.typed
            .lock()
            .unwrap()
            .push((sequence.to_string(), fields.to_vec()));
        Ok(())
    }
}

/// `FakeVault` 호출 기록 (세션에 넘긴 뒤에도 확인 가능)
#[derive(Default)]
pub struct VaultProbe {
    derives: AtomicUsize,
    opens: AtomicUsize,
    failing: AtomicBool,
    passwords: Mutex<Vec<String>>,
}

impl VaultProbe {
    pub fn derives(&self) -> usize {
        self.derives.load(Ordering::SeqCst)
    }

    /// 성공한 복호화 횟수
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn passwords(&self) -> Vec<String> {
        self.passwords.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

pub struct FakeVault {
    entries: Vec<Entry>,
    probe: Arc<VaultProbe>,
}

impl FakeVault {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            probe: Arc::new(VaultProbe::default()),
        }
    }

    pub fn probe(&self) -> Arc<VaultProbe> {
        Arc::clone(&self.probe)
    }
}

impl Vault for FakeVault {
    fn derive_credentials(&mut self, _settings: &DatabaseSettings, password: &str) -> Result<()> {
        self.probe.derives.fetch_add(1, Ordering::SeqCst);
        self.probe.passwords.lock().unwrap().push(password.to_string());
        Ok(())
    }

    fn open(&mut self, settings: &DatabaseSettings) -> Result<Vec<Entry>> {
        if self.probe.failing.load(Ordering::SeqCst) {
            return Err(KpMenuError::Vault(format!("{}: invalid credentials", settings.database)));
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

/// 복사와 예약된 비우기를 기록하는 클립보드
#[derive(Default)]
pub struct FakeClipboard {
    copies: Mutex<Vec<String>>,
    clears: Mutex<Vec<(String, Duration)>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().unwrap().clone()
    }

    pub fn clears(&self) -> Vec<(String, Duration)> {
        self.clears.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn copy(&self, _config: &Configuration, text: &str) -> Result<()> {
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn schedule_clear(&self, _config: &Configuration, text: &str, delay: Duration) {
        self.clears.lock().unwrap().push((text.to_string(), delay));
    }

    async fn wait(&self) {}
}
