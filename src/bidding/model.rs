use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 전역 설정 (단일 행)
// 요청마다 스냅샷으로 읽어 윈도우 판정에 그대로 넘긴다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuctionSettings {
    pub auction_start: Option<DateTime<Utc>>,
    pub auction_deadline: Option<DateTime<Utc>>,
    pub auction_closed: bool,
    pub payment_instructions: Option<String>,
    pub pickup_instructions: Option<String>,
    pub contact_email: Option<String>,
}

// 상품 모델
// is_closed 는 마감 처리기만 기록한다. 입찰 쪽은 읽기 전용.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub start_price: i64,
    pub is_closed: bool,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델 (추가 전용, 수정이나 삭제 없음)
// 현재 최고가는 저장하지 않고 항상 최대값 질의로 파생한다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub alias_id: i64,
    pub email: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

// 공개 화면용 입찰 뷰 (이메일 등 연락처는 노출하지 않는다)
#[derive(Debug, Clone, Serialize)]
pub struct BidView {
    pub alias_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Bid> for BidView {
    fn from(bid: &Bid) -> Self {
        BidView {
            alias_id: bid.alias_id,
            amount: bid.amount,
            created_at: bid.created_at,
        }
    }
}
