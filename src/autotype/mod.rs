//! Autotype: 엔트리를 고르고 시퀀스에 필요한 필드 값을 타이퍼에 전달
//!
//! 엔트리 선택 규칙 (우선순위 순):
//! 1. `--autotypeusersel`이면 사용자가 직접 엔트리 선택
//! 2. 활성 창 제목이 창 연결 패턴(glob 또는 `//정규식//`)에 매치
//! 3. 활성 창 제목이 엔트리 제목을 포함
//!
//! 매치가 정확히 하나이고 `--autotypealwaysconfirm`이 아니면 바로 사용하고,
//! 그 외에는 모든 후보를 보여줍니다 (매치된 후보가 먼저).

pub mod sequence;
pub mod typer;

pub use typer::{CommandTyper, Typer};

use crate::config::Configuration;
use crate::error::{KpMenuError, Result};
use crate::menu::entries;
use crate::otp;
use crate::ui::{Picker, PromptKind, Selection};
use crate::vault::Entry;
use regex::Regex;
use sequence::DEFAULT_SEQUENCE;
use tracing::{debug, info};

/// 이 타이퍼 이름이면 키 입력 대신 응답으로 출력
pub const ECHO_TYPER: &str = "echo";

/// rofi 사용자 정의 키 1~5에 대응하는 시퀀스
const CUSTOM_KEY_SEQUENCES: [&str; 5] = [
    "{USERNAME}",
    "{PASSWORD}",
    "{TOTP}",
    "{PASSWORD}{ENTER}",
    "{URL}",
];

/// 선택된 엔트리와 시퀀스
struct Choice<'a> {
    entry: &'a Entry,
    sequence: String,
    /// 사용자 정의 키로 고른 시퀀스는 설정의 시퀀스로 덮어쓰지 않음
    explicit: bool,
}

/// 창 제목 매칭 후보
struct Candidate<'a> {
    entry: &'a Entry,
    sequence: String,
}

/// 창 연결 패턴을 정규식으로 변환
fn window_pattern(window: &str) -> String {
    if let Some(inner) = window.strip_prefix("//") {
        return inner.strip_suffix("//").unwrap_or(inner).to_string();
    }
    regex::escape(window).replace(r"\*", ".*")
}

fn entry_sequence(entry: &Entry) -> String {
    if !entry.default_sequence.is_empty() {
        return entry.default_sequence.clone();
    }
    entry
        .associations
        .iter()
        .map(|a| a.sequence.clone())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// 창 제목에 대해 모든 엔트리 평가: (매치, 비매치)
fn candidates<'a>(entries: &'a [Entry], window: &str) -> (Vec<Candidate<'a>>, Vec<Candidate<'a>>) {
    let mut matches = Vec::new();
    let mut unmatches = Vec::new();

    for entry in entries {
        let default = if entry.default_sequence.is_empty() {
            DEFAULT_SEQUENCE.to_string()
        } else {
            entry.default_sequence.clone()
        };

        let mut patterns: Vec<(String, String)> = entry
            .associations
            .iter()
            .filter(|a| !a.window.is_empty())
            .map(|a| {
                let sequence = if a.sequence.is_empty() {
                    default.clone()
                } else {
                    a.sequence.clone()
                };
                (window_pattern(&a.window), sequence)
            })
            .collect();
        if !entry.title().is_empty() {
            patterns.push((format!(".*{}.*", regex::escape(entry.title())), default.clone()));
        }

        for (pattern, sequence) in patterns {
            let Ok(re) = Regex::new(&pattern) else {
                debug!("skipping invalid window pattern {:?}", pattern);
                continue;
            };
            let candidate = Candidate { entry, sequence };
            if re.is_match(window) {
                matches.push(candidate);
            } else {
                unmatches.push(candidate);
            }
        }
    }

    (matches, unmatches)
}

fn candidate_label(candidate: &Candidate<'_>) -> String {
    format!(
        "{:<25} {:<25} {:<30}",
        candidate.entry.title(),
        candidate.entry.get("UserName"),
        candidate.sequence
    )
}

async fn identify<'a>(
    config: &Configuration,
    entries: &'a [Entry],
    window: &str,
    picker: &dyn Picker,
) -> Result<Choice<'a>> {
    let (mut matches, unmatches) = candidates(entries, window);
    info!("autotype: {} entries match window {:?}", matches.len(), window);

    if matches.len() == 1 && !config.general.autotype_confirm {
        let only = matches.remove(0);
        return Ok(Choice {
            entry: only.entry,
            sequence: only.sequence,
            explicit: false,
        });
    }

    matches.extend(unmatches);
    let items: Vec<String> = matches.iter().map(candidate_label).collect();
    let selection = picker.prompt(config, PromptKind::Choose, Some(&items)).await?;

    let (text, custom) = match selection {
        Selection::Cancelled => return Err(KpMenuError::Cancelled),
        Selection::Chosen(text) => (text, None),
        Selection::CustomKey(key, text) => (text, Some(key)),
    };
    let index = items
        .iter()
        .position(|item| *item == text)
        .ok_or(KpMenuError::SelectionNotFound("entry"))?;
    let chosen = matches.swap_remove(index);

    Ok(match custom.and_then(|key| {
        usize::from(key)
            .checked_sub(1)
            .and_then(|i| CUSTOM_KEY_SEQUENCES.get(i))
    }) {
        Some(sequence) => Choice {
            entry: chosen.entry,
            sequence: sequence.to_string(),
            explicit: true,
        },
        None => Choice {
            entry: chosen.entry,
            sequence: chosen.sequence,
            explicit: false,
        },
    })
}

/// 시퀀스에 필요한 (필드, 값) 목록
///
/// `{TOTP}`는 OTP가 꺼져 있어도 시퀀스 순서를 지키기 위해 "000000"을 넣습니다.
pub fn resolve_fields(
    config: &Configuration,
    entry: &Entry,
    sequence: &str,
    now: u64,
) -> Result<Vec<(String, String)>> {
    self::sequence::fields(sequence)
        .into_iter()
        .map(|field| {
            let value = if field == "TOTP" {
                if config.general.no_otp {
                    "000000".to_string()
                } else {
                    otp::compute(entry, now)?
                }
            } else {
                entry
                    .get_ignore_case(self::sequence::attribute_name(&field))
                    .to_string()
            };
            Ok((field, value))
        })
        .collect()
}

/// Autotype 실행
pub async fn run(
    config: &Configuration,
    entries: &[Entry],
    picker: &dyn Picker,
    typer: &dyn Typer,
    out: &mut String,
) -> Result<()> {
    let choice = if config.general.autotype_no_auto {
        let entry = entries::select_entry(config, entries, picker).await?;
        Choice {
            entry,
            sequence: entry_sequence(entry),
            explicit: false,
        }
    } else {
        let window = typer.active_window(config).await?;
        identify(config, entries, &window, picker).await?
    };

    let mut sequence = choice.sequence;
    if !choice.explicit && !config.general.autotype_sequence.is_empty() {
        sequence = config.general.autotype_sequence.clone();
    }
    if sequence.is_empty() {
        sequence = DEFAULT_SEQUENCE.to_string();
    }

    let fields = resolve_fields(config, choice.entry, &sequence, otp::now_seconds())?;
    if config.executable.custom_autotype_typer == ECHO_TYPER {
        out.push_str(&self::typer::render_input(&sequence, &fields));
        return Ok(());
    }
    typer.execute(config, &sequence, &fields).await
}
