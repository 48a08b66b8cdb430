use super::{flags, Configuration};
use crate::cli::Cli;
use crate::error::{KpMenuError, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 설정 재구성 기능
///
/// 프로세스 시작 시 한 번 만들어지고, 이후 요청마다 클라이언트의 인자 벡터로
/// 설정을 다시 만듭니다 (명령줄 파싱 + 설정 파일 재로드).
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// 명시적인 설정 파일 경로 (없으면 인자의 --config, 그 다음 기본 경로)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// 고정된 설정 파일을 사용하는 로더
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// 기본 설정 파일 경로 (~/.config/kpmenu/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            KpMenuError::Config("Could not find config directory".to_string())
        })?;
        Ok(dir.join("kpmenu").join("config.toml"))
    }

    /// 인자 벡터(프로그램 이름 제외)로 설정 구성
    pub fn load(&self, args: &[String]) -> Result<Configuration> {
        let cli = Cli::try_parse_from(std::iter::once("kpmenu".to_string()).chain(args.iter().cloned()))
            .map_err(|e| KpMenuError::Config(e.to_string()))?;
        self.load_cli(&cli)
    }

    /// 이미 파싱된 명령줄로 설정 구성
    pub fn load_cli(&self, cli: &Cli) -> Result<Configuration> {
        let mut config = Configuration::default();

        let path = match (&self.config_path, &cli.config) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(path)) => Some(path.clone()),
            (None, None) => Self::default_path().ok(),
        };
        if let Some(path) = path {
            apply_file(&mut config, &path)?;
        }

        for (name, value) in cli.overrides() {
            flags::apply(&mut config, name, &value)?;
        }

        config.flags.daemon = cli.daemon;
        config.flags.autotype = cli.autotype;
        config.flags.quit = cli.quit;

        Ok(config)
    }
}

/// 설정 파일 적용 (없으면 기본값 유지)
fn apply_file(config: &mut Configuration, path: &Path) -> Result<()> {
    if !path.exists() {
        debug!("config file {} not found, using defaults", path.display());
        return Ok(());
    }

    let content = fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| KpMenuError::Config(format!("{}: {}", path.display(), e)))?;

    for (key, value) in table {
        let raw = match value {
            toml::Value::String(s) => s,
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Integer(i) => i.to_string(),
            other => {
                warn!("ignoring config key {}: unsupported value {}", key, other);
                continue;
            }
        };

        if flags::lookup(&key).is_none() {
            warn!("ignoring unknown config key {}", key);
            continue;
        }
        flags::apply(config, &key, &raw)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("missing.toml"));
        let config = loader.load(&args(&["-d", "/tmp/db.kdbx"])).unwrap();

        assert_eq!(config.database.database, "/tmp/db.kdbx");
        assert_eq!(config.general.menu, "dmenu");
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
                database = "/from/file.kdbx"
                menu = "rofi"
                cacheTimeout = "2m"
                fillOtherFields = false
                clipboardTimeout = 5
                colour = "red"
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::with_path(&path);
        let config = loader.load(&args(&["--menu", "wofi"])).unwrap();

        assert_eq!(config.database.database, "/from/file.kdbx");
        assert_eq!(config.general.menu, "wofi");
        assert_eq!(config.general.cache_timeout, Duration::from_secs(120));
        assert_eq!(config.general.clipboard_timeout, Duration::from_secs(5));
        assert!(!config.database.fill_other_fields);
    }

    #[test]
    fn test_flags_come_from_cli_only() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("missing.toml"));
        let config = loader.load(&args(&["--daemon", "--autotype"])).unwrap();

        assert!(config.flags.daemon);
        assert!(config.flags.autotype);
        assert!(!config.flags.quit);
    }

    #[test]
    fn test_invalid_arguments() {
        let loader = ConfigLoader::with_path("/nonexistent/config.toml");
        let err = loader.load(&args(&["--no-such-flag"])).unwrap_err();
        assert!(matches!(err, KpMenuError::Config(_)));
    }

    #[test]
    fn test_invalid_file_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cacheTimeout = \"soon\"\n").unwrap();

        let loader = ConfigLoader::with_path(&path);
        assert!(loader.load(&[]).is_err());
    }
}
