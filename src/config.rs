// region:    --- Imports
use chrono::Duration;
// endregion: --- Imports

// region:    --- Engine Config

/// 엔진 정책 설정
/// 기동 시 환경 변수에서 한 번 읽어 스냅샷으로 핸들러에 전달한다.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 입찰 단위 (센트, 기본 500 = $5)
    pub bid_increment: i64,
    /// 아이템당 상회 입찰 알림 제한 윈도우
    pub outbid_throttle: Duration,
    /// 낙찰 요약을 받을 관리자 이메일 목록
    pub admin_emails: Vec<String>,
    /// 알림 큐 용량
    pub notify_queue_capacity: usize,
    /// 마감 스케줄러 실행 간격 (초)
    pub scheduler_interval_secs: u64,
}

impl EngineConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        let bid_increment = env_parse("BID_INCREMENT_CENTS", 500);
        let throttle_secs: i64 = env_parse("OUTBID_THROTTLE_SECS", 1800);
        let admin_emails = std::env::var("ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        EngineConfig {
            bid_increment,
            outbid_throttle: Duration::seconds(throttle_secs),
            admin_emails,
            notify_queue_capacity: env_parse("NOTIFY_QUEUE_CAPACITY", 1024),
            scheduler_interval_secs: env_parse("SCHEDULER_INTERVAL_SECS", 30),
        }
    }
}

/// 환경 변수 파싱 (없거나 잘못된 값이면 기본값 사용)
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// endregion: --- Engine Config
