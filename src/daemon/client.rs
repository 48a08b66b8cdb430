use crate::daemon::protocol::{write_line, Request, Response};
use crate::daemon::registry::PortRegistry;
use crate::error::{KpMenuError, Result};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// 응답 대기 시간
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// 실행 중인 데몬에 요청 보내기
///
/// 재시도하지 않습니다. 어떤 실패든 호출자에게는 "살아 있는 데몬 없음"입니다.
pub struct DaemonClient {
    registry: PortRegistry,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(registry: PortRegistry) -> Self {
        Self {
            registry,
            timeout: CLIENT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 요청 전송 후 응답 대기
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let port = self.registry.lookup()?;
        debug!("trying daemon on port {}", port);

        let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await?;
        write_line(&mut stream, &request.to_json()?).await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let read = tokio::time::timeout(self.timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| KpMenuError::Timeout)??;
        if read == 0 {
            return Err(KpMenuError::Protocol(
                "daemon closed the connection without a response".to_string(),
            ));
        }

        Ok(Response::from_json(&line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn listener(dir: &TempDir) -> (TcpListener, PortRegistry) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let registry = PortRegistry::new(dir.path().join("server.port"));
        registry.publish(listener.local_addr().unwrap().port()).unwrap();
        (listener, registry)
    }

    #[tokio::test]
    async fn test_no_registry_fails() {
        let dir = TempDir::new().unwrap();
        let client = DaemonClient::new(PortRegistry::new(dir.path().join("server.port")));
        assert!(client.send(&Request::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_round_trip_with_fake_daemon() {
        let dir = TempDir::new().unwrap();
        let (listener, registry) = listener(&dir).await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            let request = Request::from_json(&line).unwrap();
            let response = Response::new(request.arguments.join(","));
            write_line(&mut writer, &response.to_json().unwrap()).await.unwrap();
        });

        let request = Request::new(vec!["-d".to_string(), "db.kdbx".to_string()]);
        let response = DaemonClient::new(registry).send(&request).await.unwrap();
        assert_eq!(response.output, "-d,db.kdbx");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_daemon_times_out() {
        let dir = TempDir::new().unwrap();
        let (listener, registry) = listener(&dir).await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            stream.shutdown().await.ok();
        });

        let client = DaemonClient::new(registry).with_timeout(Duration::from_millis(100));
        let err = client.send(&Request::default()).await.unwrap_err();
        assert!(matches!(err, KpMenuError::Timeout));
        server.await.unwrap();
    }
}
