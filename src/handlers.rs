// region:    --- Imports
use crate::auction::window;
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::bidding::model::{BidView, Item};
use crate::closing;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::error::{BidError, ItemError};
use crate::identity::IdentityProvider;
use crate::notification::Notifier;
use crate::query::handlers as store;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- App State

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db_manager: Arc<DatabaseManager>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Notifier,
    pub cfg: EngineConfig,
}

// endregion: --- App State

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 처리 시작", "Handler");

    match handle_place_bid(
        cmd,
        &state.db_manager,
        state.identity.as_ref(),
        &state.notifier,
        &state.cfg,
    )
    .await
    {
        Ok(accepted) => (StatusCode::OK, Json(accepted)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 일괄 마감 요청 처리 (관리자 액션 또는 스케줄러)
#[derive(Debug, Default, Deserialize)]
pub struct CloseAuctionRequest {
    #[serde(default)]
    pub force: bool,
}

pub async fn handle_close_auction(
    State(state): State<AppState>,
    body: Option<Json<CloseAuctionRequest>>,
) -> impl IntoResponse {
    let force = body.map(|Json(b)| b.force).unwrap_or(false);
    info!(
        "{:<12} --> 경매 마감 요청 처리 시작 (force: {})",
        "Handler", force
    );

    match closing::close_auction(&state.db_manager, &state.notifier, &state.cfg, force).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("{:<12} --> 경매 마감 실패: {:?}", "Handler", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "내부 오류가 발생했습니다.",
                    "code": "STORE_ERROR"
                })),
            )
                .into_response()
        }
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 설정 및 현재 윈도우 상태 조회
pub async fn handle_get_auction(State(state): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 경매 상태 조회", "HandlerQuery");
    match store::get_settings(&state.db_manager).await {
        Ok(settings) => {
            let status = window::evaluate(&settings, Utc::now());
            Json(serde_json::json!({
                "settings": settings,
                "window": status,
                "open": status.is_open(),
            }))
            .into_response()
        }
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 모든 상품 조회
pub async fn handle_get_items(State(state): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 모든 상품 조회", "HandlerQuery");
    match store::get_all_items(&state.db_manager).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 상품 조회 (id 또는 slug)
pub async fn handle_get_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 조회 key: {}", "HandlerQuery", key);
    match find_item_by_key(&state.db_manager, &key).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => BidError::from(ItemError::NotFound).into_response(),
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 상품 입찰 이력 조회 (공개 화면이므로 별칭만 노출)
pub async fn handle_get_item_bids(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 이력 조회 key: {}", "HandlerQuery", key);
    let item = match find_item_by_key(&state.db_manager, &key).await {
        Ok(Some(item)) => item,
        Ok(None) => return BidError::from(ItemError::NotFound).into_response(),
        Err(e) => return BidError::from(e).into_response(),
    };

    match store::get_item_bids(&state.db_manager, item.id).await {
        Ok(bids) => {
            let views: Vec<BidView> = bids.iter().map(BidView::from).collect();
            Json(views).into_response()
        }
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 현재 최고 입찰 조회 (파생 값, 공개 화면용)
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 최고 입찰 조회 key: {}", "HandlerQuery", key);
    let item = match find_item_by_key(&state.db_manager, &key).await {
        Ok(Some(item)) => item,
        Ok(None) => return BidError::from(ItemError::NotFound).into_response(),
        Err(e) => return BidError::from(e).into_response(),
    };

    match store::get_current_high_bid(&state.db_manager, item.id).await {
        Ok(high) => Json(high.as_ref().map(BidView::from)).into_response(),
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 상품 결정: 숫자면 id, 아니면 slug
async fn find_item_by_key(
    db_manager: &DatabaseManager,
    key: &str,
) -> Result<Option<Item>, sqlx::Error> {
    match key.parse::<i64>() {
        Ok(id) => store::get_item_by_id(db_manager, id).await,
        Err(_) => store::get_item_by_slug(db_manager, key).await,
    }
}

// endregion: --- Query Handlers
