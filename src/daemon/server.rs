use crate::daemon::handler::{Handled, RequestHandler};
use crate::daemon::registry::PortRegistry;
use crate::daemon::session::Session;
use crate::error::Result;
use crate::menu::Pipeline;
use std::net::Ipv4Addr;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{debug, info};

/// 데몬이 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// 캐시 없이 한 번만 실행함 (리스너 없음)
    Direct { fatal: bool },
    /// 캐시 창 안에 연결이 없었음
    CacheExpired,
    /// 호출 결과가 치명적이었음 (Exit, 복호화 실패 등)
    Fatal,
}

/// 데몬 서버
///
/// 세션과 리스너를 단독으로 소유하고 연결을 하나씩 끝까지 처리합니다.
pub struct DaemonServer {
    session: Session,
    pipeline: Pipeline,
    handler: RequestHandler,
    registry: PortRegistry,
}

impl DaemonServer {
    pub fn new(
        session: Session,
        pipeline: Pipeline,
        handler: RequestHandler,
        registry: PortRegistry,
    ) -> Self {
        Self {
            session,
            pipeline,
            handler,
            registry,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// 캐시를 쓰지 않는 비상주 실행인지
    fn is_direct(&self) -> bool {
        self.session.config.general.no_cache && !self.session.resident
    }

    /// Pipeline을 한 번 실행하고 출력은 표준 출력으로
    async fn run_locally(&mut self) -> bool {
        let mut output = String::new();
        let report = self.pipeline.run(&mut self.session, &mut output).await;
        if !output.is_empty() {
            print!("{}", output);
        }
        report.fatal
    }

    /// 데몬 시작
    ///
    /// 수신 대기 중의 accept 에러만 `Err`로 돌려줍니다.
    pub async fn run(&mut self) -> Result<Termination> {
        if self.is_direct() {
            debug!("cache disabled, running once");
            let fatal = self.run_locally().await;
            return Ok(Termination::Direct { fatal });
        }

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let port = listener.local_addr()?.port();
        self.registry.publish(port)?;
        info!("listening on 127.0.0.1:{}", port);

        // 첫 호출자(이 프로세스)는 왕복 없이 바로 응답
        if !self.session.resident && self.run_locally().await {
            return Ok(Termination::Fatal);
        }

        self.listen(&listener).await
    }

    /// 수신 루프
    pub async fn listen(&mut self, listener: &TcpListener) -> Result<Termination> {
        loop {
            let accepted = match self.session.cache_deadline(Instant::now()) {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, listener.accept()).await {
                        Ok(accepted) => accepted,
                        Err(_) => {
                            info!("cache timed out");
                            return Ok(Termination::CacheExpired);
                        }
                    }
                }
                None => listener.accept().await,
            };
            let (stream, addr) = accepted?;
            debug!("accepted connection from {}", addr);

            let handled = self
                .handler
                .handle(stream, &mut self.session, &self.pipeline)
                .await?;
            if handled == (Handled::Served { fatal: true }) && !self.session.resident {
                return Ok(Termination::Fatal);
            }
        }
    }
}
