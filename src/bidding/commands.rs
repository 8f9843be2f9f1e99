/// 입찰 수리 커맨드 처리
/// 윈도우 확인 -> 상품 확인 -> 신원 확인 -> 검증 -> 삽입 -> 알림 순서.
// region:    --- Imports
use super::model::Item;
use super::rules;
use crate::auction::window;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::error::{BidError, IdentityError, ItemError};
use crate::identity::IdentityProvider;
use crate::notification::Notifier;
use crate::query::handlers as store;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Commands

/// 입찰 커맨드
/// 상품은 id 또는 slug 로 지정한다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub item_id: Option<i64>,
    pub slug: Option<String>,
    pub email: String,
    pub amount: i64,
}

/// 입찰 수리 결과
/// next_min 을 돌려주어 클라이언트가 재조회 없이 다음 입찰가를 보여줄 수 있다.
#[derive(Debug, Serialize)]
pub struct BidAccepted {
    pub ok: bool,
    pub bid_id: i64,
    pub item_id: i64,
    pub amount: i64,
    pub next_min: i64,
}

/// 입찰 수리
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    db_manager: &DatabaseManager,
    identity: &dyn IdentityProvider,
    notifier: &Notifier,
    cfg: &EngineConfig,
) -> Result<BidAccepted, BidError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let now = Utc::now();

    // 1. 경매 윈도우 확인
    let settings = store::get_settings(db_manager).await?;
    if let Some(err) = window::evaluate(&settings, now).as_error() {
        return Err(err.into());
    }

    // 2. 상품 확인
    // 전역 윈도우가 열려 있어도 이전 사이클에서 닫힌 상품은 거부한다.
    let item = resolve_item(db_manager, &cmd).await?;
    if item.is_closed {
        return Err(ItemError::AlreadyClosed.into());
    }

    // 3. 입찰자 신원 확인
    // 입찰 테이블에 손대기 전에 거른다. 미검증 신원은 입찰 행으로 남지 않는다.
    let alias = identity
        .resolve_verified_alias(&cmd.email)
        .await?
        .ok_or(IdentityError::NoVerifiedAlias)?;

    // 4. 파생 최고 입찰가 기준 검증
    let current_high = store::get_current_high_bid(db_manager, item.id).await?;
    let minimum =
        rules::minimum_acceptable(item.start_price, current_high.as_ref(), cfg.bid_increment);
    rules::validate(cmd.amount, minimum, item.start_price, cfg.bid_increment)?;

    // 5. 첫 입찰 여부는 삽입 전에 읽는다
    let first_bid = !store::has_prior_bid(db_manager, item.id, alias.alias_id).await?;

    // 6. 입찰 삽입. 유일한 쓰기이며 단일 문장
    // 검증과 삽입 사이에 마감이 끼어들면 0행이 되어 거부된다.
    let bid = store::insert_bid(
        db_manager,
        item.id,
        alias.alias_id,
        &cmd.email,
        cmd.amount,
        now,
    )
    .await?
    .ok_or(ItemError::AlreadyClosed)?;

    info!(
        "{:<12} --> 입찰 수리: item {}, alias {}, amount {}",
        "Command", item.id, alias.alias_id, bid.amount
    );

    // 7. 알림은 커밋된 입찰의 하류. 실패해도 입찰 결과에는 영향 없음
    if first_bid {
        notifier.notify_bid_confirmation(&bid, &item);
    }
    if let Some(prev) = current_high {
        // 자기 입찰을 스스로 올린 경우에는 보내지 않는다
        if prev.alias_id != bid.alias_id {
            notifier.notify_outbid(&prev, &item, bid.amount, now);
        }
    }

    let next_min = bid.amount + cfg.bid_increment;
    Ok(BidAccepted {
        ok: true,
        bid_id: bid.id,
        item_id: item.id,
        amount: bid.amount,
        next_min,
    })
}

/// 상품 결정 (id 우선, 없으면 slug)
pub async fn resolve_item(
    db_manager: &DatabaseManager,
    cmd: &PlaceBidCommand,
) -> Result<Item, BidError> {
    let found = if let Some(id) = cmd.item_id {
        store::get_item_by_id(db_manager, id).await?
    } else if let Some(slug) = &cmd.slug {
        store::get_item_by_slug(db_manager, slug).await?
    } else {
        None
    };

    found.ok_or_else(|| ItemError::NotFound.into())
}

// endregion: --- Commands
