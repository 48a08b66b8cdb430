use crate::error::Result;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// 클라이언트 호출 하나: 원래 명령줄 인자 전체 (프로그램 이름 제외)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub arguments: Vec<String>,
}

/// 클라이언트가 그대로 출력할 텍스트 (비어 있을 수 있음)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub output: String,
}

impl Request {
    pub fn new(arguments: Vec<String>) -> Self {
        Self { arguments }
    }

    /// JSON으로 직렬화
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// JSON에서 역직렬화
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Response {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// JSON으로 직렬화
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// JSON에서 역직렬화
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// JSON 한 줄 쓰기 (개행으로 메시지 구분)
pub async fn write_line<W>(writer: &mut W, json: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
