use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpMenuError {
    #[error("Failed to open database: {0}")]
    Vault(String),

    #[error("Failed to get password from prompt: {0}")]
    PasswordPrompt(String),

    #[error("User cancelled password prompt")]
    PasswordCancelled,

    #[error("Exit requested from menu")]
    ExitRequested,

    #[error("Quit requested by client")]
    QuitRequested,

    #[error("Failed to use clipboard manager: {0}")]
    Clipboard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User cancelled")]
    Cancelled,

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Selected {0} not found")]
    SelectionNotFound(&'static str),

    #[error("Failed to create OTP: {0}")]
    Otp(String),

    #[error("Autotype failed: {0}")]
    Autotype(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timed out waiting for daemon")]
    Timeout,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl KpMenuError {
    /// 데몬을 종료시켜야 하는 에러인지 여부
    ///
    /// 취소/선택 실패 같은 사용자 수준의 결과는 응답만 비운 채 데몬을 유지합니다.
    pub fn is_fatal(&self) -> bool {
        match self {
            KpMenuError::Vault(_)
            | KpMenuError::PasswordPrompt(_)
            | KpMenuError::PasswordCancelled
            | KpMenuError::ExitRequested
            | KpMenuError::QuitRequested
            | KpMenuError::Clipboard(_)
            | KpMenuError::Config(_) => true,

            KpMenuError::Cancelled
            | KpMenuError::Prompt(_)
            | KpMenuError::SelectionNotFound(_)
            | KpMenuError::Otp(_)
            | KpMenuError::Autotype(_) => false,

            KpMenuError::Protocol(_)
            | KpMenuError::Timeout
            | KpMenuError::IoError(_)
            | KpMenuError::JsonError(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, KpMenuError>;
