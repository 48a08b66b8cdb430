use crate::config::ConfigLoader;
use crate::daemon::protocol::{write_line, Request, Response};
use crate::daemon::session::Session;
use crate::error::{KpMenuError, Result};
use crate::menu::Pipeline;
use futures::future::{self, Either};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{error, info, warn};

/// 요청 디코딩 제한 시간 (Pipeline 실행 시간은 포함하지 않음)
pub const DECODE_TIMEOUT: Duration = Duration::from_secs(3);

/// 연결 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// 요청을 받아 Pipeline을 실행함
    Served { fatal: bool },
    /// 제한 시간 안에 요청이 오지 않아 빈 응답을 보냄
    TimedOut,
}

/// 연결별 요청 처리기
pub struct RequestHandler {
    loader: ConfigLoader,
    decode_timeout: Duration,
}

/// 요청 한 줄 읽기
///
/// 한 바이트도 받지 못하고 닫히면 None. 줄바꿈 없이 닫힌 부분 입력은 그대로 디코드합니다.
async fn decode_request(reader: OwnedReadHalf) -> Result<Option<Request>> {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(Request::from_json(line.trim_end())?))
}

async fn reply(writer: &mut OwnedWriteHalf, output: String) {
    let result = match Response::new(output).to_json() {
        Ok(json) => write_line(writer, &json).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        warn!("failed to send response: {}", e);
    }
}

impl RequestHandler {
    pub fn new(loader: ConfigLoader) -> Self {
        Self {
            loader,
            decode_timeout: DECODE_TIMEOUT,
        }
    }

    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    /// 연결 하나를 끝까지 처리
    ///
    /// 받아들인 모든 연결은 정확히 한 번 응답을 받습니다. 디코딩 에러만 `Err`로 전파되어
    /// 수신 루프를 끝냅니다.
    pub async fn handle(
        &self,
        stream: TcpStream,
        session: &mut Session,
        pipeline: &Pipeline,
    ) -> Result<Handled> {
        let (reader, mut writer) = stream.into_split();

        // 디코딩은 별도 태스크에서: 제한 시간이 먼저 끝나면 결과는 버려지고 세션에 닿지 않음
        let decode = tokio::spawn(decode_request(reader));
        let deadline = Box::pin(tokio::time::sleep(self.decode_timeout));

        let request = match future::select(decode, deadline).await {
            Either::Left((Ok(Ok(Some(request))), _)) => request,
            Either::Left((Ok(Ok(None)), deadline)) => {
                // 보낸 것이 없음: 제한 시간까지 기다린 뒤 빈 응답
                deadline.await;
                reply(&mut writer, String::new()).await;
                info!("received request is timed out");
                return Ok(Handled::TimedOut);
            }
            Either::Left((Ok(Err(e)), _)) => {
                reply(&mut writer, String::new()).await;
                return Err(e);
            }
            Either::Left((Err(e), _)) => {
                reply(&mut writer, String::new()).await;
                return Err(KpMenuError::Protocol(format!("decoder task failed: {}", e)));
            }
            Either::Right(((), _abandoned)) => {
                reply(&mut writer, String::new()).await;
                info!("received request is timed out");
                return Ok(Handled::TimedOut);
            }
        };

        info!("received a client call with args {:?}", request.arguments);
        let mut output = String::new();
        let fatal = match self.loader.load(&request.arguments) {
            Ok(config) => {
                session.install(config);
                let report = pipeline.run(session, &mut output).await;
                reply(&mut writer, output).await;
                if report.reopen_after_reply {
                    pipeline.reopen(session).await;
                }
                report.fatal
            }
            Err(e) => {
                error!("loading client config: {}", e);
                reply(&mut writer, output).await;
                true
            }
        };

        Ok(Handled::Served { fatal })
    }
}
