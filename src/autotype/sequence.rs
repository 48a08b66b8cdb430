//! KeePass autotype 시퀀스 토큰화
//!
//! `{USERNAME}{TAB}{PASSWORD}{ENTER}` 같은 시퀀스를 필드/키워드/명령/원문으로 나눕니다.
//! 실제 키 입력은 타이퍼가 담당하고, 여기서는 어떤 필드 값이 필요한지만 결정합니다.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_SEQUENCE: &str = "{USERNAME}{TAB}{PASSWORD}{ENTER}";

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// 특수 키 (값 치환 없이 타이퍼가 처리)
const KEYWORDS: &[&str] = &[
    "TAB", "ENTER", "SPACE", "BACKSPACE", "BS", "BKSP", "BREAK", "CAPSLOCK", "CLEAR", "DEL",
    "DELETE", "DOWN", "END", "ESC", "HELP", "HOME", "INS", "INSERT", "LEFT", "NUMLOCK", "PGDN",
    "PGUP", "PRTSC", "RIGHT", "SCROLLLOCK", "UP", "WIN", "LWIN", "RWIN", "APPS", "ADD",
    "SUBTRACT", "MULTIPLY", "DIVIDE", "PLUS", "PERCENT", "CARET", "TILDE", "LEFTPAREN",
    "RIGHTPAREN", "LEFTBRACE", "RIGHTBRACE", "AT", "CLEARFIELD",
];

/// 인자를 받는 명령
const COMMANDS: &[&str] = &["DELAY", "VKEY", "APPACTIVATE", "BEEP"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 엔트리 값으로 치환될 필드 (USERNAME, PASSWORD, TOTP, S:Custom ...)
    Field(String),
    Keyword(String),
    Command { name: String, args: Vec<String> },
    Raw(String),
}

fn is_keyword(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    KEYWORDS.contains(&upper.as_str())
        || upper
            .strip_prefix('F')
            .and_then(|n| n.parse::<u8>().ok())
            .is_some_and(|n| (1..=16).contains(&n))
}

fn has_custom_prefix(name: &str) -> bool {
    name.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("S:"))
}

/// 시퀀스 문자열 토큰화
pub fn parse(sequence: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TOKEN_REGEX.captures_iter(sequence) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Raw(sequence[last..whole.start()].to_string()));
        }
        last = whole.end();

        let inner = caps[1].trim();
        let mut words = inner.split_whitespace();
        let head = words.next().unwrap_or_default();
        let upper = head.to_ascii_uppercase();

        if COMMANDS.contains(&upper.as_str()) {
            tokens.push(Token::Command {
                name: upper,
                args: words.map(str::to_string).collect(),
            });
        } else if is_keyword(inner) {
            tokens.push(Token::Keyword(inner.to_ascii_uppercase()));
        } else if has_custom_prefix(inner) {
            // 사용자 정의 필드는 대소문자를 유지
            tokens.push(Token::Field(inner.to_string()));
        } else {
            tokens.push(Token::Field(inner.to_ascii_uppercase()));
        }
    }

    if last < sequence.len() {
        tokens.push(Token::Raw(sequence[last..].to_string()));
    }
    tokens
}

/// 시퀀스에 등장하는 필드 (중복 제거, 등장 순서 유지)
pub fn fields(sequence: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for token in parse(sequence) {
        if let Token::Field(name) = token {
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
    }
    fields
}

/// 필드 토큰에 해당하는 엔트리 속성 이름
pub fn attribute_name(field: &str) -> &str {
    if has_custom_prefix(field) {
        return &field[2..];
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_sequence() {
        let tokens = parse(DEFAULT_SEQUENCE);
        assert_eq!(
            tokens,
            vec![
                Token::Field("USERNAME".to_string()),
                Token::Keyword("TAB".to_string()),
                Token::Field("PASSWORD".to_string()),
                Token::Keyword("ENTER".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_commands_and_raw_text() {
        let tokens = parse("hello{DELAY 100}{f5}^v{S:Pin}");
        assert_eq!(
            tokens,
            vec![
                Token::Raw("hello".to_string()),
                Token::Command {
                    name: "DELAY".to_string(),
                    args: vec!["100".to_string()],
                },
                Token::Keyword("F5".to_string()),
                Token::Raw("^v".to_string()),
                Token::Field("S:Pin".to_string()),
            ]
        );
    }

    #[test]
    fn test_fields_deduplicated() {
        assert_eq!(
            fields("{username}{TAB}{PASSWORD}{TAB}{TOTP}{ENTER}{USERNAME}"),
            vec!["USERNAME", "PASSWORD", "TOTP"]
        );
    }

    #[test]
    fn test_attribute_name() {
        assert_eq!(attribute_name("S:Pin"), "Pin");
        assert_eq!(attribute_name("USERNAME"), "USERNAME");
    }
}
