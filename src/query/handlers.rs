// region:    --- Imports
use super::queries;
use crate::bidding::model::{AuctionSettings, Bid, Item};
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 전역 설정 조회
pub async fn get_settings(db_manager: &DatabaseManager) -> Result<AuctionSettings, SqlxError> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionSettings>(queries::GET_SETTINGS)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 조회 (id)
pub async fn get_item_by_id(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ITEM_BY_ID)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 조회 (slug)
pub async fn get_item_by_slug(
    db_manager: &DatabaseManager,
    slug: &str,
) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> 상품 조회 slug: {}", "Query", slug);
    let slug = slug.to_owned();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ITEM_BY_SLUG)
                    .bind(slug)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 상품 조회
pub async fn get_all_items(db_manager: &DatabaseManager) -> Result<Vec<Item>, SqlxError> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ALL_ITEMS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 현재 최고 입찰 조회 (파생 값)
pub async fn get_current_high_bid(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Bid>, SqlxError> {
    info!("{:<12} --> 최고 입찰 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_CURRENT_HIGH_BID)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 이력 조회
pub async fn get_item_bids(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 같은 별칭의 기존 입찰 존재 여부
pub async fn has_prior_bid(
    db_manager: &DatabaseManager,
    item_id: i64,
    alias_id: i64,
) -> Result<bool, SqlxError> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, bool>(queries::HAS_PRIOR_BID)
                    .bind(item_id)
                    .bind(alias_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 삽입 (유일한 쓰기, 단일 문장)
/// 상품이 그 사이 마감되었으면 None 을 돌려준다.
pub async fn insert_bid(
    db_manager: &DatabaseManager,
    item_id: i64,
    alias_id: i64,
    email: &str,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<Option<Bid>, SqlxError> {
    info!(
        "{:<12} --> 입찰 삽입 item: {}, alias: {}, amount: {}",
        "Query", item_id, alias_id, amount
    );
    let email = email.to_owned();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                    .bind(item_id)
                    .bind(alias_id)
                    .bind(email)
                    .bind(amount)
                    .bind(now)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
