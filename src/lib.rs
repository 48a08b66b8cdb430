//! kpmenu: dmenu/rofi/wofi로 KeePass 데이터베이스의 필드를 꺼내는 도구
//!
//! 복호화된 데이터베이스는 캐시 시간 동안 데몬 프로세스에 남아 있으므로,
//! 매 호출마다 마스터 비밀번호를 다시 입력하지 않아도 됩니다.

pub mod autotype;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod executor;
pub mod menu;
pub mod otp;
pub mod ui;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{KpMenuError, Result};
