// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
// endregion: --- Imports

// region:    --- Error Taxonomy

/// 경매 윈도우 오류 (윈도우가 바뀌기 전에는 재시도 불가)
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,
    #[error("경매 마감 시간이 지났습니다.")]
    DeadlinePassed,
    #[error("경매가 수동으로 종료되었습니다.")]
    ManuallyClosed,
}

impl WindowError {
    pub fn code(&self) -> &'static str {
        match self {
            WindowError::NotStarted => "NOT_STARTED",
            WindowError::DeadlinePassed => "DEADLINE_PASSED",
            WindowError::ManuallyClosed => "MANUALLY_CLOSED",
        }
    }
}

/// 상품 오류
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ItemError {
    #[error("상품을 찾을 수 없습니다.")]
    NotFound,
    #[error("이미 종료된 상품입니다.")]
    AlreadyClosed,
}

impl ItemError {
    pub fn code(&self) -> &'static str {
        match self {
            ItemError::NotFound => "ITEM_NOT_FOUND",
            ItemError::AlreadyClosed => "ITEM_CLOSED",
        }
    }
}

/// 입찰 금액 검증 오류
/// 클라이언트가 바로 재시도할 수 있도록 현재 최소 입찰가를 함께 담는다.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("입찰 금액은 0보다 커야 합니다.")]
    NonPositive { minimum: i64 },
    #[error("입찰 금액이 최소 입찰가보다 낮습니다.")]
    BelowMinimum { minimum: i64 },
    #[error("입찰 금액이 입찰 단위에 맞지 않습니다.")]
    NotOnIncrement { minimum: i64 },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NonPositive { .. } => "NON_POSITIVE",
            ValidationError::BelowMinimum { .. } => "BELOW_MINIMUM",
            ValidationError::NotOnIncrement { .. } => "NOT_ON_INCREMENT",
        }
    }

    /// 현재 최소 입찰가
    pub fn minimum(&self) -> i64 {
        match self {
            ValidationError::NonPositive { minimum }
            | ValidationError::BelowMinimum { minimum }
            | ValidationError::NotOnIncrement { minimum } => *minimum,
        }
    }
}

/// 입찰자 신원 오류
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("검증된 별칭이 없습니다. 본인 확인을 먼저 완료해 주세요.")]
    NoVerifiedAlias,
    #[error("본인 확인 서비스 호출 실패: {0}")]
    Unavailable(String),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::NoVerifiedAlias => "NO_VERIFIED_ALIAS",
            IdentityError::Unavailable(_) => "IDENTITY_UNAVAILABLE",
        }
    }
}

// endregion: --- Error Taxonomy

// region:    --- Bid Error

/// 입찰 처리 오류. 경계(axum)에서 HTTP 상태 코드와
/// `{"error", "code"}` JSON 응답으로 변환된다.
#[derive(Debug, Error)]
pub enum BidError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("저장소 오류")]
    Store(#[from] sqlx::Error),
}

impl BidError {
    pub fn status(&self) -> StatusCode {
        match self {
            BidError::Window(_) | BidError::Validation(_) => StatusCode::BAD_REQUEST,
            BidError::Item(ItemError::NotFound) => StatusCode::NOT_FOUND,
            BidError::Item(ItemError::AlreadyClosed) => StatusCode::BAD_REQUEST,
            BidError::Identity(IdentityError::NoVerifiedAlias) => StatusCode::BAD_REQUEST,
            BidError::Identity(IdentityError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BidError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문. 저장소 오류는 내부 정보를 노출하지 않는다.
    pub fn body(&self) -> serde_json::Value {
        match self {
            BidError::Window(e) => serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
            }),
            BidError::Item(e) => serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
            }),
            BidError::Validation(e) => serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
                "minimum": e.minimum(),
            }),
            BidError::Identity(e) => serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
            }),
            BidError::Store(_) => serde_json::json!({
                "error": "내부 오류가 발생했습니다.",
                "code": "STORE_ERROR",
            }),
        }
    }
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        if let BidError::Store(e) = &self {
            error!("{:<12} --> 저장소 오류: {:?}", "BidError", e);
        }
        (self.status(), Json(self.body())).into_response()
    }
}

// endregion: --- Bid Error
