/// 경매 일괄 마감 처리기
/// 사이클당 OPEN -> CLOSED 전이가 정확히 한 번 일어나도록 보장한다.
/// items.is_closed 를 기록하는 유일한 쓰기 주체.
// region:    --- Imports
use crate::auction::window::{self, WindowStatus};
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::notification::{Notifier, WinnerLine, WonItem};
use crate::query::handlers as store;
use crate::query::queries;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Close Report

/// 마감 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseState {
    BeforeDeadline,
    AlreadyClosed,
    Closed,
}

/// 알림 발송 집계 (수신자 단위 성공/실패)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryCounts {
    pub fulfilled: u32,
    pub rejected: u32,
}

/// 마감 보고서
#[derive(Debug, Serialize)]
pub struct CloseReport {
    pub state: CloseState,
    pub winners: Vec<ItemWinner>,
    pub notified: DeliveryCounts,
}

impl CloseReport {
    fn without_winners(state: CloseState) -> Self {
        CloseReport {
            state,
            winners: Vec::new(),
            notified: DeliveryCounts::default(),
        }
    }
}

/// 상품별 낙찰 결과 (마감 시점에 한 번 파생 계산)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemWinner {
    pub item_id: i64,
    pub title: String,
    pub alias_id: i64,
    pub email: String,
    pub amount: i64,
}

/// 입찰자별 낙찰 묶음 (같은 입찰자가 여러 상품을 낙찰하면 한 통으로)
#[derive(Debug, Clone)]
pub struct WinnerNotice {
    pub alias_id: i64,
    pub email: String,
    pub items: Vec<WonItem>,
}

/// 낙찰 목록을 입찰자별로 묶는다. 첫 등장 순서를 유지한다.
pub fn group_winners(winners: &[ItemWinner]) -> Vec<WinnerNotice> {
    let mut order: Vec<i64> = Vec::new();
    let mut grouped: HashMap<i64, WinnerNotice> = HashMap::new();

    for w in winners {
        let notice = grouped.entry(w.alias_id).or_insert_with(|| {
            order.push(w.alias_id);
            WinnerNotice {
                alias_id: w.alias_id,
                email: w.email.clone(),
                items: Vec::new(),
            }
        });
        notice.items.push(WonItem {
            item_id: w.item_id,
            title: w.title.clone(),
            amount: w.amount,
        });
    }

    order
        .into_iter()
        .filter_map(|alias_id| grouped.remove(&alias_id))
        .collect()
}

// endregion: --- Close Report

// region:    --- Auction Closer

/// 경매 일괄 마감
/// force 가 아니면 마감 시각 전에는 아무것도 바꾸지 않는다.
/// 두 번째 호출은 ALREADY_CLOSED 를 돌려주는 무해한 no-op 이다.
/// 저장소 오류는 Err 로 돌려주며, 갱신이 단일 문장이므로 부분 마감 상태는 없다.
pub async fn close_auction(
    db_manager: &DatabaseManager,
    notifier: &Notifier,
    cfg: &EngineConfig,
    force: bool,
) -> Result<CloseReport, sqlx::Error> {
    let now = Utc::now();

    // 1. 마감 시각 전 확인 (타이머가 미리 불러도 안전)
    if !force {
        let settings = store::get_settings(db_manager).await?;
        match window::evaluate(&settings, now) {
            WindowStatus::Open | WindowStatus::NotStarted => {
                return Ok(CloseReport::without_winners(CloseState::BeforeDeadline));
            }
            WindowStatus::DeadlinePassed | WindowStatus::ManuallyClosed => {}
        }
    }

    // 2. 열려 있는 상품 전부를 한 트랜잭션의 조건부 단일 문장으로 마감한다.
    //    동시 실행되어도 각 상품은 정확히 한 번만 이 목록에 잡힌다.
    //    전역 종료 플래그도 같은 트랜잭션에서 기록해 윈도우와 상품 상태를 맞춘다.
    let closed_ids: Vec<i64> = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let ids = sqlx::query_scalar::<_, i64>(queries::CLOSE_OPEN_ITEMS)
                    .fetch_all(&mut **tx)
                    .await?;
                if !ids.is_empty() {
                    sqlx::query(queries::MARK_AUCTION_CLOSED)
                        .execute(&mut **tx)
                        .await?;
                }
                Ok::<_, sqlx::Error>(ids)
            })
        })
        .await?;

    if closed_ids.is_empty() {
        info!("{:<12} --> 이미 마감된 경매", "Closer");
        return Ok(CloseReport::without_winners(CloseState::AlreadyClosed));
    }

    info!("{:<12} --> 상품 {}건 마감", "Closer", closed_ids.len());

    // 3. 방금 마감된 상품들의 낙찰자 파생 계산 (무입찰 상품은 건너뜀)
    let winners = get_winning_bids(db_manager, closed_ids).await?;

    // 4. 낙찰 알림 팬아웃. 실패는 집계만 하고 마감 결과는 바꾸지 않는다
    let notified = dispatch_winner_notifications(notifier, cfg, &winners).await;

    Ok(CloseReport {
        state: CloseState::Closed,
        winners,
        notified,
    })
}

/// 낙찰 입찰 조회 (상품별 최고 금액, 동률은 선입찰 우선)
async fn get_winning_bids(
    db_manager: &DatabaseManager,
    item_ids: Vec<i64>,
) -> Result<Vec<ItemWinner>, sqlx::Error> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ItemWinner>(queries::GET_WINNING_BIDS)
                    .bind(item_ids)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰자별 낙찰 통지와 관리자 요약을 동시에 보내고 수신자 단위로 집계한다.
async fn dispatch_winner_notifications(
    notifier: &Notifier,
    cfg: &EngineConfig,
    winners: &[ItemWinner],
) -> DeliveryCounts {
    let mut handles = Vec::new();

    for notice in group_winners(winners) {
        let notifier = notifier.clone();
        handles.push(tokio::spawn(async move {
            notifier
                .notify_winner(notice.alias_id, notice.email, notice.items)
                .await
        }));
    }

    if !winners.is_empty() {
        let lines: Vec<WinnerLine> = winners
            .iter()
            .map(|w| WinnerLine {
                item_id: w.item_id,
                title: w.title.clone(),
                alias_id: w.alias_id,
                email: w.email.clone(),
                amount: w.amount,
            })
            .collect();

        for admin in &cfg.admin_emails {
            let notifier = notifier.clone();
            let admin = admin.clone();
            let lines = lines.clone();
            handles.push(tokio::spawn(async move {
                notifier.notify_admins_winners_summary(admin, lines).await
            }));
        }
    }

    let mut counts = DeliveryCounts::default();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => counts.fulfilled += 1,
            Ok(Err(e)) => {
                error!("{:<12} --> 낙찰 알림 실패: {}", "Closer", e);
                counts.rejected += 1;
            }
            Err(e) => {
                error!("{:<12} --> 알림 작업 실패: {:?}", "Closer", e);
                counts.rejected += 1;
            }
        }
    }
    counts
}

// endregion: --- Auction Closer
