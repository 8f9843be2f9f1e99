/// 경매 전역 설정 조회 (단일 행)
pub const GET_SETTINGS: &str = "SELECT auction_start, auction_deadline, auction_closed, payment_instructions, pickup_instructions, contact_email FROM auction_settings WHERE id = 1";

/// 상품 조회 (id)
pub const GET_ITEM_BY_ID: &str = "SELECT id, slug, title, description, start_price, is_closed, owner, created_at FROM items WHERE id = $1";

/// 상품 조회 (slug)
pub const GET_ITEM_BY_SLUG: &str = "SELECT id, slug, title, description, start_price, is_closed, owner, created_at FROM items WHERE slug = $1";

/// 모든 상품 조회
pub const GET_ALL_ITEMS: &str = "SELECT id, slug, title, description, start_price, is_closed, owner, created_at FROM items ORDER BY created_at DESC";

/// 현재 최고 입찰 조회
/// 저장된 컬럼이 아니라 항상 파생 값이다. 최대 금액, 동률이면 선입찰 우선.
pub const GET_CURRENT_HIGH_BID: &str = r#"
    SELECT id, item_id, alias_id, email, amount, created_at
    FROM bids
    WHERE item_id = $1
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// 입찰 이력 조회
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, alias_id, email, amount, created_at
    FROM bids
    WHERE item_id = $1
    ORDER BY created_at DESC
"#;

/// 같은 별칭의 기존 입찰 존재 여부 (첫 입찰 확인 메일 판단용)
pub const HAS_PRIOR_BID: &str =
    "SELECT EXISTS(SELECT 1 FROM bids WHERE item_id = $1 AND alias_id = $2)";

/// 입찰 삽입
/// 단일 문장이며 열려 있는 상품에 한해서만 행이 생긴다.
/// 검증과 삽입 사이에 마감이 끼어든 경우 0행이 되어 거부된다.
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (item_id, alias_id, email, amount, created_at)
    SELECT i.id, $2, $3, $4, $5
    FROM items i
    WHERE i.id = $1 AND i.is_closed = FALSE
    RETURNING id, item_id, alias_id, email, amount, created_at
"#;

/// 열려 있는 모든 상품 일괄 마감 (조건부 단일 문장)
/// 루프형 개별 UPDATE 는 부분 마감 상태를 남길 수 있어 금지.
pub const CLOSE_OPEN_ITEMS: &str =
    "UPDATE items SET is_closed = TRUE WHERE is_closed = FALSE RETURNING id";

/// 경매 전역 종료 플래그 기록
pub const MARK_AUCTION_CLOSED: &str =
    "UPDATE auction_settings SET auction_closed = TRUE WHERE id = 1";

/// 방금 마감된 상품들의 낙찰 입찰 조회
/// 상품별 최고 금액, 동률이면 먼저 들어온 입찰이 낙찰.
pub const GET_WINNING_BIDS: &str = r#"
    SELECT DISTINCT ON (b.item_id)
        b.item_id, i.title, b.alias_id, b.email, b.amount
    FROM bids b
    JOIN items i ON i.id = b.item_id
    WHERE b.item_id = ANY($1)
    ORDER BY b.item_id, b.amount DESC, b.created_at ASC
"#;
