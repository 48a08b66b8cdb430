use crate::error::{KpMenuError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 데몬 포트 파일 (~/.cache/kpmenu/server.port)
///
/// 데몬이 bind할 때마다 덮어쓰고, 클라이언트는 매번 새로 읽습니다.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    path: PathBuf,
}

impl PortRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 기본 경로의 레지스트리
    pub fn default_location() -> Result<Self> {
        let dir = dirs::cache_dir().ok_or_else(|| {
            KpMenuError::Config("Could not find cache directory".to_string())
        })?;
        Ok(Self::new(dir.join("kpmenu").join("server.port")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 포트 기록 (캐시 디렉토리가 없으면 생성)
    pub fn publish(&self, port: u16) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, port.to_string())?;
        Ok(())
    }

    /// 현재 기록된 포트
    pub fn lookup(&self) -> Result<u16> {
        let content = fs::read_to_string(&self.path)?;
        content.trim().parse().map_err(|_| {
            KpMenuError::Protocol(format!(
                "invalid port in {}: {:?}",
                self.path.display(),
                content
            ))
        })
    }
}
