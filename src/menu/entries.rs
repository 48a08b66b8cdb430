//! 엔트리 / 필드 선택 프롬프트

use crate::config::Configuration;
use crate::error::{KpMenuError, Result};
use crate::otp;
use crate::ui::{Picker, PromptKind, Selection};
use crate::vault::Entry;
use once_cell::sync::Lazy;
use regex::Regex;

/// OTP 코드를 만드는 가상의 필드
pub const GENERATE_OTP: &str = "Generate OTP";

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[a-zA-Z]+\}").unwrap());

/// 엔트리 제목 템플릿 치환 (`{Title} - {UserName}`)
///
/// 없는 속성은 빈 문자열로 치환합니다.
pub fn format_title(template: &str, entry: &Entry) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let placeholder = &caps[0];
            entry.get(&placeholder[1..placeholder.len() - 1]).to_string()
        })
        .into_owned()
}

pub fn entry_titles(config: &Configuration, entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format_title(&config.style.format_entry, entry))
        .collect()
}

/// 엔트리 하나 선택 (제목이 같으면 첫 번째)
pub async fn select_entry<'a>(
    config: &Configuration,
    entries: &'a [Entry],
    picker: &dyn Picker,
) -> Result<&'a Entry> {
    let titles = entry_titles(config, entries);
    let selected = picker
        .prompt(config, PromptKind::Entry, Some(&titles))
        .await?
        .into_text()
        .ok_or(KpMenuError::Cancelled)?;

    titles
        .iter()
        .position(|title| *title == selected)
        .map(|index| &entries[index])
        .ok_or(KpMenuError::SelectionNotFound("entry"))
}

/// 필드 선택지와 OTP 항목 추가 여부
///
/// `fieldOrder`에 있는 필드가 먼저 오고, `fillOtherFields`면 블랙리스트에 없는
/// 나머지 속성이 엔트리 순서대로 뒤따릅니다. 값이 빈 필드는 제외합니다.
pub fn field_choices(config: &Configuration, entry: &Entry) -> (Vec<String>, bool) {
    let otp_enabled = !config.general.no_otp;
    let mut fields: Vec<String> = Vec::new();
    for name in config.database.field_order.split(' ') {
        if name.is_empty() || entry.get(name).is_empty() || fields.iter().any(|f| f == name) {
            continue;
        }
        fields.push(name.to_string());
    }

    if config.database.fill_other_fields {
        let blacklist: Vec<&str> = config.database.fill_blacklist.split(' ').collect();
        for (key, value) in &entry.attributes {
            if otp_enabled && is_otp_attribute(key) {
                continue;
            }
            if value.is_empty() || fields.contains(key) || blacklist.contains(&key.as_str()) {
                continue;
            }
            fields.push(key.clone());
        }
    }

    (fields, otp_enabled && entry.has_otp())
}

fn is_otp_attribute(key: &str) -> bool {
    key == crate::vault::OTP || key == crate::vault::TOTP_SEED
}

/// 필드 하나를 선택해 값 반환 (`Generate OTP`면 현재 코드)
pub async fn select_field(
    config: &Configuration,
    entry: &Entry,
    picker: &dyn Picker,
    now: u64,
) -> Result<String> {
    let (mut items, has_otp) = field_choices(config, entry);
    let field_count = items.len();
    if has_otp {
        items.push(GENERATE_OTP.to_string());
    }

    let selected = match picker.prompt(config, PromptKind::Field, Some(&items)).await? {
        Selection::Chosen(text) | Selection::CustomKey(_, text) => text,
        Selection::Cancelled => return Err(KpMenuError::Cancelled),
    };

    if has_otp && selected == GENERATE_OTP {
        return otp::compute(entry, now);
    }
    if !items[..field_count].contains(&selected) {
        return Err(KpMenuError::SelectionNotFound("field"));
    }

    let value = entry.get(&selected);
    if value.is_empty() {
        return Err(KpMenuError::SelectionNotFound("field"));
    }
    Ok(value.to_string())
}
