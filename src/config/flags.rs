//! 설정 키 ↔ 필드 매핑 테이블
//!
//! 설정 파일의 키와 명령줄 옵션의 이름은 같습니다 (camelCase).
//! 두 입력 모두 이 테이블을 거쳐 `Configuration`에 적용됩니다.

use super::{parse_duration, Configuration};
use crate::error::{KpMenuError, Result};

type Apply = fn(&mut Configuration, &str) -> Result<()>;

/// 설정 항목 하나: 플래그 이름과 적용 함수
pub struct FlagSpec {
    pub name: &'static str,
    pub apply: Apply,
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(KpMenuError::Config(format!("invalid boolean: {:?}", raw))),
    }
}

macro_rules! string_flag {
    ($name:literal, $($field:ident).+) => {
        FlagSpec {
            name: $name,
            apply: |c, v| {
                c.$($field).+ = v.to_string();
                Ok(())
            },
        }
    };
}

macro_rules! bool_flag {
    ($name:literal, $($field:ident).+) => {
        FlagSpec {
            name: $name,
            apply: |c, v| {
                c.$($field).+ = parse_bool(v)?;
                Ok(())
            },
        }
    };
}

macro_rules! duration_flag {
    ($name:literal, $($field:ident).+) => {
        FlagSpec {
            name: $name,
            apply: |c, v| {
                c.$($field).+ = parse_duration(v)?;
                Ok(())
            },
        }
    };
}

pub static FLAGS: &[FlagSpec] = &[
    // General
    string_flag!("menu", general.menu),
    string_flag!("clipboardTool", general.clipboard_tool),
    duration_flag!("clipboardTimeout", general.clipboard_timeout),
    bool_flag!("nocache", general.no_cache),
    bool_flag!("cacheOneTime", general.cache_one_time),
    duration_flag!("cacheTimeout", general.cache_timeout),
    bool_flag!("nootp", general.no_otp),
    bool_flag!("noautotype", general.disable_autotype),
    bool_flag!("autotypealwaysconfirm", general.autotype_confirm),
    bool_flag!("autotypeusersel", general.autotype_no_auto),
    string_flag!("autotypeSequence", general.autotype_sequence),
    // Executable
    string_flag!("customPromptPassword", executable.custom_prompt_password),
    string_flag!("customPromptMenu", executable.custom_prompt_menu),
    string_flag!("customPromptEntries", executable.custom_prompt_entries),
    string_flag!("customPromptFields", executable.custom_prompt_fields),
    string_flag!("customClipboardCopy", executable.custom_clipboard_copy),
    string_flag!("customClipboardPaste", executable.custom_clipboard_paste),
    string_flag!("customClipboardClean", executable.custom_clipboard_clean),
    string_flag!("customAutotypeWindowID", executable.custom_autotype_window_id),
    string_flag!("customAutotypeTyper", executable.custom_autotype_typer),
    // Style
    string_flag!("passwordBackground", style.password_background),
    string_flag!("textPassword", style.text_password),
    string_flag!("textMenu", style.text_menu),
    string_flag!("textEntry", style.text_entry),
    string_flag!("textField", style.text_field),
    string_flag!("formatEntry", style.format_entry),
    string_flag!("argsPassword", style.args_password),
    string_flag!("argsMenu", style.args_menu),
    string_flag!("argsEntry", style.args_entry),
    string_flag!("argsField", style.args_field),
    // Database
    string_flag!("database", database.database),
    string_flag!("keyfile", database.key_file),
    string_flag!("password", database.password),
    string_flag!("fieldOrder", database.field_order),
    bool_flag!("fillOtherFields", database.fill_other_fields),
    string_flag!("fillBlacklist", database.fill_blacklist),
];

/// 이름으로 테이블 항목 조회
pub fn lookup(name: &str) -> Option<&'static FlagSpec> {
    FLAGS.iter().find(|flag| flag.name == name)
}

/// 값 하나를 설정에 적용
pub fn apply(config: &mut Configuration, name: &str, value: &str) -> Result<()> {
    let flag = lookup(name)
        .ok_or_else(|| KpMenuError::Config(format!("unknown option: {}", name)))?;
    (flag.apply)(config, value).map_err(|e| match e {
        KpMenuError::Config(message) => KpMenuError::Config(format!("{}: {}", name, message)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn test_flag_names_are_unique() {
        let names: HashSet<_> = FLAGS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), FLAGS.len());
    }

    #[test]
    fn test_apply_string_flag() {
        let mut config = Configuration::default();
        apply(&mut config, "database", "/home/me/vault.kdbx").unwrap();
        apply(&mut config, "formatEntry", "{Title}").unwrap();
        assert_eq!(config.database.database, "/home/me/vault.kdbx");
        assert_eq!(config.style.format_entry, "{Title}");
    }

    #[test]
    fn test_apply_bool_flag() {
        let mut config = Configuration::default();
        apply(&mut config, "fillOtherFields", "false").unwrap();
        apply(&mut config, "nocache", "true").unwrap();
        assert!(!config.database.fill_other_fields);
        assert!(config.general.no_cache);
        assert!(apply(&mut config, "nootp", "maybe").is_err());
    }

    #[test]
    fn test_apply_duration_flag() {
        let mut config = Configuration::default();
        apply(&mut config, "cacheTimeout", "5m").unwrap();
        apply(&mut config, "clipboardTimeout", "0").unwrap();
        assert_eq!(config.general.cache_timeout, Duration::from_secs(300));
        assert_eq!(config.general.clipboard_timeout, Duration::ZERO);
    }

    #[test]
    fn test_unknown_flag() {
        let mut config = Configuration::default();
        let err = apply(&mut config, "colour", "red").unwrap_err();
        assert!(err.to_string().contains("unknown option"));
    }
}
