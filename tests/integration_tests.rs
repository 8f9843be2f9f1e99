//! 전체 스택 통합 테스트
//! 로컬에서 PostgreSQL, Kafka, 서버(localhost:3000)를 띄운 뒤 개별 실행한다.
//! 신원 스텁은 테스트가 직접 4000번 포트에 띄운다.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use silent_auction_service::bidding::model::Item;
use silent_auction_service::database::DatabaseManager;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 트레이싱 초기화
#[allow(dead_code)]
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 신원 스텁 기동 (서비스 기본값인 localhost:4000)
/// 이미 떠 있으면 바인드 실패를 무시하고 그대로 쓴다.
async fn spawn_identity_stub() {
    async fn resolve(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let email = params.get("email").cloned().unwrap_or_default();
        let alias_id = email.bytes().map(|b| b as i64).sum::<i64>();
        Json(json!({
            "alias_id": alias_id,
            "display_name": format!("파랑-여우-{}", alias_id % 100),
        }))
    }

    let app = Router::new().route("/aliases/verified", get(resolve));
    if let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:4000").await {
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
    }
}

/// 경매 윈도우 열기 (이전 테스트가 남긴 종료 플래그 정리 포함)
async fn open_auction_window(db_manager: &DatabaseManager) {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "UPDATE auction_settings
                     SET auction_closed = FALSE, auction_start = NULL, auction_deadline = $1
                     WHERE id = 1",
                )
                .bind(Utc::now() + Duration::hours(2))
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();
}

/// 테스트용 상품 생성
async fn create_test_item(
    db_manager: &DatabaseManager,
    slug: String,
    title: String,
    start_price: i64,
) -> Item {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(
                    "INSERT INTO items (slug, title, description, start_price, owner, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT (slug) DO UPDATE SET is_closed = FALSE
                     RETURNING id, slug, title, description, start_price, is_closed, owner, created_at",
                )
                .bind(&slug)
                .bind(&title)
                .bind("통합 테스트용 상품입니다.")
                .bind(start_price)
                .bind("test-vendor")
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 입찰 직접 삽입 (신원 확인을 거치지 않는 픽스처)
async fn insert_bid_row(db_manager: &DatabaseManager, item_id: i64, alias_id: i64, amount: i64) {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT INTO bids (item_id, alias_id, email, amount, created_at)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(item_id)
                .bind(alias_id)
                .bind(format!("alias{}@example.com", alias_id))
                .bind(amount)
                .bind(Utc::now())
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();
}

/// 입찰 요청 전송
async fn post_bid(client: &Client, slug: &str, email: &str, amount: i64) -> (u16, Value) {
    let response = client
        .post("http://localhost:3000/bid")
        .json(&json!({ "slug": slug, "email": email, "amount": amount }))
        .send()
        .await
        .expect("Failed to send request");

    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse body");
    (status, body)
}

/// 시작가 $20, 단위 $5 시나리오
#[tokio::test]
#[ignore = "로컬 스택(PostgreSQL, Kafka, 서버) 필요"]
async fn test_bid_admission_scenario() {
    init_tracing();
    let db_manager = setup().await;
    let client = Client::new();
    spawn_identity_stub().await;
    open_auction_window(&db_manager).await;

    let item = create_test_item(
        &db_manager,
        "scenario-item".to_string(),
        "입찰 시나리오 테스트 상품".to_string(),
        2000,
    )
    .await;
    info!("테스트 상품 생성: {}", item.id);

    // 첫 입찰: 시작가 그대로 수리
    let (status, body) = post_bid(&client, "scenario-item", "first@example.com", 2000).await;
    assert_eq!(status, 200);
    assert_eq!(body["next_min"], 2500);

    // $22 는 거부되고 현재 최소 금액이 함께 온다
    let (status, body) = post_bid(&client, "scenario-item", "second@example.com", 2200).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BELOW_MINIMUM");
    assert_eq!(body["minimum"], 2500);

    // $25 수리, 다음 최소 $30
    let (status, body) = post_bid(&client, "scenario-item", "second@example.com", 2500).await;
    assert_eq!(status, 200);
    assert_eq!(body["next_min"], 3000);

    // 없는 상품은 404
    let (status, body) = post_bid(&client, "no-such-item", "first@example.com", 2000).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "ITEM_NOT_FOUND");
}

/// 시작 시간 전에는 금액이 유효해도 NOT_STARTED
#[tokio::test]
#[ignore = "로컬 스택(PostgreSQL, Kafka, 서버) 필요"]
async fn test_bid_before_start_rejected() {
    let db_manager = setup().await;
    let client = Client::new();
    spawn_identity_stub().await;

    create_test_item(
        &db_manager,
        "not-started-item".to_string(),
        "시작 전 테스트 상품".to_string(),
        2000,
    )
    .await;

    // 시작 시간을 한 시간 뒤로
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "UPDATE auction_settings
                     SET auction_closed = FALSE, auction_start = $1, auction_deadline = NULL
                     WHERE id = 1",
                )
                .bind(Utc::now() + Duration::hours(1))
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();

    let (status, body) = post_bid(&client, "not-started-item", "first@example.com", 2000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "NOT_STARTED");

    open_auction_window(&db_manager).await;
}

/// 마감은 한 번만 일어나고 두 번째 호출은 무해하다
#[tokio::test]
#[ignore = "로컬 스택(PostgreSQL, Kafka, 서버) 필요"]
async fn test_close_auction_idempotent() {
    init_tracing();
    let db_manager = setup().await;
    let client = Client::new();
    open_auction_window(&db_manager).await;

    let item = create_test_item(
        &db_manager,
        "close-item".to_string(),
        "마감 테스트 상품".to_string(),
        2000,
    )
    .await;

    // A $25, B $30. 낙찰자는 B
    insert_bid_row(&db_manager, item.id, 101, 2500).await;
    insert_bid_row(&db_manager, item.id, 102, 3000).await;

    let response = client
        .post("http://localhost:3000/admin/close-auction")
        .json(&json!({ "force": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let report: Value = response.json().await.unwrap();
    assert_eq!(report["state"], "CLOSED");
    let winners = report["winners"].as_array().unwrap();
    let won = winners
        .iter()
        .find(|w| w["item_id"] == item.id)
        .expect("낙찰 목록에 상품이 없음");
    assert_eq!(won["alias_id"], 102);
    assert_eq!(won["amount"], 3000);

    // 두 번째 호출: ALREADY_CLOSED, 낙찰 목록은 다시 계산되지 않는다
    let response = client
        .post("http://localhost:3000/admin/close-auction")
        .json(&json!({ "force": true }))
        .send()
        .await
        .expect("Failed to send request");
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["state"], "ALREADY_CLOSED");
    assert!(report["winners"].as_array().unwrap().is_empty());

    // 마감 후 입찰은 거부
    spawn_identity_stub().await;
    let (status, _body) = post_bid(&client, "close-item", "late@example.com", 3500).await;
    assert_eq!(status, 400);

    open_auction_window(&db_manager).await;
}

/// 동시 입찰: 유실 없이 모두 남고 파생 최고가가 최댓값과 일치한다
#[tokio::test]
#[ignore = "로컬 스택(PostgreSQL, Kafka, 서버) 필요"]
async fn test_concurrent_bidding() {
    init_tracing();
    let db_manager = setup().await;
    spawn_identity_stub().await;
    open_auction_window(&db_manager).await;

    let item = create_test_item(
        &db_manager,
        "concurrent-item".to_string(),
        "동시성 테스트 상품".to_string(),
        2000,
    )
    .await;

    // 50개의 동시 입찰 (전부 단위에 맞는 서로 다른 금액)
    let mut handles = vec![];
    for i in 1..=50_i64 {
        let amount = 2000 + i * 500;
        let handle = tokio::spawn(async move {
            let client = Client::new();
            post_bid(
                &client,
                "concurrent-item",
                &format!("bidder{}@example.com", i),
                amount,
            )
            .await
        });
        handles.push(handle);
    }

    let mut accepted = vec![];
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == 200 {
            accepted.push(body["amount"].as_i64().unwrap());
        } else {
            // 경쟁에서 밀린 입찰은 최소 금액 미달로만 거부되어야 한다
            assert_eq!(body["code"], "BELOW_MINIMUM", "예상 밖 거부: {:?}", body);
        }
    }
    assert!(!accepted.is_empty());
    let max_accepted = *accepted.iter().max().unwrap();
    info!("수리된 입찰 수: {}, 최고가: {}", accepted.len(), max_accepted);

    // 파생 최고가 == 수리된 금액의 최댓값
    let client = Client::new();
    let high: Value = client
        .get(format!(
            "http://localhost:3000/items/{}/highest-bid",
            item.id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(high["amount"].as_i64().unwrap(), max_accepted);

    // 행 유실 없음: 입찰 행 수 == 수리된 수
    let count: i64 = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bids WHERE item_id = $1")
                    .bind(item.id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
        .unwrap();
    assert_eq!(count, accepted.len() as i64);
}
