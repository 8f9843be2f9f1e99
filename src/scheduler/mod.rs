/// 경매 마감 스케줄러
/// 주기적으로 마감 처리기를 force 없이 호출한다.
/// 마감 시각 전에는 BEFORE_DEADLINE, 이미 마감되었으면 ALREADY_CLOSED 로
/// 무해하게 끝나므로 타이머 호출 자체는 부수 효과가 없다.
// region:    --- Imports
use crate::closing::{self, CloseState};
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::notification::Notifier;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler

/// 경매 마감 스케줄러
pub struct AuctionScheduler {
    db_manager: Arc<DatabaseManager>,
    notifier: Notifier,
    cfg: EngineConfig,
}

/// 경매 마감 스케줄러 구현
impl AuctionScheduler {
    pub fn new(db_manager: Arc<DatabaseManager>, notifier: Notifier, cfg: EngineConfig) -> Self {
        Self {
            db_manager,
            notifier,
            cfg,
        }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let db_manager = Arc::clone(&self.db_manager);
        let notifier = self.notifier.clone();
        let cfg = self.cfg.clone();

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(cfg.scheduler_interval_secs));
            loop {
                interval.tick().await;
                match closing::close_auction(&db_manager, &notifier, &cfg, false).await {
                    Ok(report) => match report.state {
                        CloseState::Closed => {
                            info!(
                                "{:<12} --> 경매 마감 완료: 낙찰 {}건, 발송 성공 {}건, 실패 {}건",
                                "Scheduler",
                                report.winners.len(),
                                report.notified.fulfilled,
                                report.notified.rejected
                            );
                        }
                        state => {
                            debug!("{:<12} --> 마감 확인: {:?}", "Scheduler", state);
                        }
                    },
                    Err(e) => {
                        error!("{:<12} --> 마감 처리 중 오류 발생: {:?}", "Scheduler", e);
                    }
                }
            }
        });
    }
}

// endregion: --- Auction Scheduler
