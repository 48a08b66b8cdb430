use crate::config::{Configuration, DatabaseSettings};
use crate::vault::{Entry, Vault};
use tokio::time::Instant;
use tracing::info;

/// 복호화 방법을 결정하는 설정 값 (하나라도 바뀌면 캐시 무효)
#[derive(Debug, Clone, PartialEq, Eq)]
struct VaultKey {
    database: String,
    key_file: String,
    password: String,
}

impl VaultKey {
    fn of(settings: &DatabaseSettings) -> Self {
        Self {
            database: settings.database.clone(),
            key_file: settings.key_file.clone(),
            password: settings.password.clone(),
        }
    }
}

/// 캐시 검증 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// 데이터베이스 경로/키 파일/비밀번호가 바뀜
    ConfigChanged,
    /// 캐시 비활성화 (--nocache)
    Disabled,
    /// 이 세션에서 아직 캐시가 시작되지 않음
    NotPrimed,
    Valid,
    Expired,
    /// 상주 모드: 시간 제한 없음
    Resident,
}

impl CacheStatus {
    /// 재사용 가능한 상태인지 (`loaded`는 그대로 유지)
    pub fn is_reusable(&self) -> bool {
        matches!(self, CacheStatus::Valid | CacheStatus::Resident)
    }
}

/// 데몬 세션
///
/// 데몬의 메인 루프만 소유하며, 요청은 한 번에 하나씩 처리되므로 잠금 없이 변경합니다.
pub struct Session {
    /// 마지막 요청의 설정
    pub config: Configuration,
    /// 캐시 시작 시각 (없으면 다음 호출에서 재복호화)
    pub cache_start: Option<Instant>,
    pub vault: Box<dyn Vault>,
    pub entries: Vec<Entry>,
    /// false면 다음 호출 전에 반드시 재복호화
    pub loaded: bool,
    loaded_with: Option<VaultKey>,
    /// 상주 모드 (데몬 시작 시 고정)
    pub resident: bool,
}

impl Session {
    pub fn new(config: Configuration, vault: Box<dyn Vault>) -> Self {
        let resident = config.flags.daemon;
        Self {
            config,
            cache_start: None,
            vault,
            entries: Vec::new(),
            loaded: false,
            loaded_with: None,
            resident,
        }
    }

    /// 클라이언트 요청으로 재구성한 설정 설치
    ///
    /// 원격 호출이 데몬을 상주 모드로 바꾸지 못하도록 `daemon` 플래그는 항상 끕니다.
    pub fn install(&mut self, mut config: Configuration) {
        config.flags.daemon = false;
        self.config = config;
    }

    /// 캐시 유효성 검사 (매 Pipeline 실행 시작 시)
    ///
    /// 재사용할 수 없으면 `loaded`를 false로 내리고, 슬라이딩 캐시면 시작 시각을 갱신합니다.
    pub fn validate_cache(&mut self, now: Instant) -> CacheStatus {
        let status = self.check_cache(now);
        match status {
            CacheStatus::Valid => {
                if !self.config.general.cache_one_time {
                    self.cache_start = Some(now);
                }
            }
            CacheStatus::Resident => {}
            CacheStatus::ConfigChanged => {
                info!("database configuration is changed, re-opening the database");
                self.loaded = false;
            }
            CacheStatus::Disabled => {
                info!("no cache flag is set, re-opening the database");
                self.loaded = false;
            }
            CacheStatus::NotPrimed => {
                info!("cache start time not set, re-opening the database");
                self.loaded = false;
            }
            CacheStatus::Expired => {
                info!("cache timed out, re-opening the database");
                self.loaded = false;
            }
        }
        status
    }

    fn check_cache(&self, now: Instant) -> CacheStatus {
        if let Some(key) = &self.loaded_with {
            if *key != VaultKey::of(&self.config.database) {
                return CacheStatus::ConfigChanged;
            }
        }
        if self.resident {
            return CacheStatus::Resident;
        }
        if self.config.general.no_cache {
            return CacheStatus::Disabled;
        }
        match self.cache_start {
            None => CacheStatus::NotPrimed,
            Some(start) if now.saturating_duration_since(start) < self.config.general.cache_timeout => {
                CacheStatus::Valid
            }
            Some(_) => CacheStatus::Expired,
        }
    }

    /// 복호화 성공 기록 (캐시 창 시작)
    ///
    /// 일회성 캐시는 처음 시작한 시각을 유지하므로 재복호화해도 마감이 늦춰지지 않습니다.
    pub fn mark_loaded(&mut self, entries: Vec<Entry>, now: Instant) {
        self.entries = entries;
        self.loaded = true;
        self.loaded_with = Some(VaultKey::of(&self.config.database));
        if self.config.general.no_cache || self.resident {
            return;
        }
        if self.cache_start.is_none() || !self.config.general.cache_one_time {
            self.cache_start = Some(now);
        }
    }

    /// 다음 호출에서 재복호화하도록 표시
    pub fn invalidate(&mut self) {
        self.loaded = false;
    }

    /// 다음 accept의 마감 시각 (상주 모드면 없음)
    ///
    /// 캐시가 시작되지 않았다면 이미 만료된 것으로 봅니다.
    pub fn cache_deadline(&self, now: Instant) -> Option<Instant> {
        if self.resident {
            return None;
        }
        Some(match self.cache_start {
            Some(start) => start + self.config.general.cache_timeout,
            None => now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeVault;
    use std::time::Duration;

    fn session() -> Session {
        let mut config = Configuration::default();
        config.database.database = "/tmp/test.kdbx".to_string();
        config.general.cache_timeout = Duration::from_secs(60);
        Session::new(config, Box::new(FakeVault::new(vec![])))
    }

    fn primed(start: Instant) -> Session {
        let mut session = session();
        session.mark_loaded(vec![], start);
        session
    }

    #[test]
    fn test_new_session_not_primed() {
        let mut session = session();
        assert_eq!(session.validate_cache(Instant::now()), CacheStatus::NotPrimed);
        assert!(!session.loaded);
    }

    #[test]
    fn test_sliding_cache_refreshes_start() {
        let t0 = Instant::now();
        let mut session = primed(t0);

        let t1 = t0 + Duration::from_secs(50);
        assert_eq!(session.validate_cache(t1), CacheStatus::Valid);
        assert_eq!(session.cache_start, Some(t1));

        // 원래 시작 기준으로는 만료지만 갱신된 시작 기준으로는 유효
        let t2 = t0 + Duration::from_secs(100);
        assert_eq!(session.validate_cache(t2), CacheStatus::Valid);
        assert!(session.loaded);
    }

    #[test]
    fn test_one_shot_cache_keeps_original_deadline() {
        let t0 = Instant::now();
        let mut session = primed(t0);
        session.config.general.cache_one_time = true;

        assert_eq!(session.validate_cache(t0 + Duration::from_secs(30)), CacheStatus::Valid);
        assert_eq!(session.cache_start, Some(t0));
        assert_eq!(
            session.cache_deadline(t0 + Duration::from_secs(30)),
            Some(t0 + Duration::from_secs(60))
        );

        assert_eq!(
            session.validate_cache(t0 + Duration::from_secs(61)),
            CacheStatus::Expired
        );
        assert!(!session.loaded);
    }

    #[test]
    fn test_one_shot_reload_keeps_cache_start() {
        let t0 = Instant::now();
        let mut session = session();
        session.config.general.cache_one_time = true;
        session.mark_loaded(vec![], t0);
        assert_eq!(session.cache_start, Some(t0));

        session.mark_loaded(vec![], t0 + Duration::from_secs(30));
        assert_eq!(session.cache_start, Some(t0));
        assert_eq!(
            session.cache_deadline(t0 + Duration::from_secs(30)),
            Some(t0 + Duration::from_secs(60))
        );

        // 슬라이딩 캐시는 재복호화 시각부터 다시 셈
        session.config.general.cache_one_time = false;
        session.mark_loaded(vec![], t0 + Duration::from_secs(30));
        assert_eq!(session.cache_start, Some(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_no_cache_forces_reload() {
        let t0 = Instant::now();
        let mut session = primed(t0);
        session.config.general.no_cache = true;
        assert_eq!(session.validate_cache(t0), CacheStatus::Disabled);
        assert!(!session.loaded);
    }

    #[test]
    fn test_database_change_forces_reload() {
        let t0 = Instant::now();
        let changes: [fn(&mut Configuration); 3] = [
            |c| c.database.database = "/tmp/other.kdbx".to_string(),
            |c| c.database.key_file = "/tmp/key".to_string(),
            |c| c.database.password = "hunter2".to_string(),
        ];
        for change in changes {
            let mut session = primed(t0);
            let mut config = session.config.clone();
            change(&mut config);
            session.install(config);
            assert_eq!(session.validate_cache(t0), CacheStatus::ConfigChanged);
            assert!(!session.loaded);
        }
    }

    #[test]
    fn test_resident_ignores_time_but_not_config_change() {
        let t0 = Instant::now();
        let mut session = session();
        session.resident = true;
        session.mark_loaded(vec![], t0);
        assert_eq!(session.cache_start, None);
        assert_eq!(session.cache_deadline(t0), None);

        assert_eq!(
            session.validate_cache(t0 + Duration::from_secs(3600)),
            CacheStatus::Resident
        );
        assert!(session.loaded);

        let mut config = session.config.clone();
        config.database.database = "/tmp/other.kdbx".to_string();
        session.install(config);
        assert_eq!(session.validate_cache(t0), CacheStatus::ConfigChanged);
    }

    #[test]
    fn test_install_clears_daemon_flag() {
        let mut session = session();
        let mut config = Configuration::default();
        config.flags.daemon = true;
        session.install(config);
        assert!(!session.config.flags.daemon);
        assert!(!session.resident);
    }
}
