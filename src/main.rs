// region:    --- Imports
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::identity::{HttpIdentityProvider, IdentityProvider};
use crate::message_broker::KafkaManager;
use crate::notification::{KafkaTransport, Notifier};
use crate::scheduler::AuctionScheduler;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod closing;
mod config;
mod database;
mod error;
mod handlers;
mod identity;
mod message_broker;
mod notification;
mod query;
mod scheduler;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 정책 설정 스냅샷 (입찰 단위, 알림 제한 윈도우 등)
    let cfg = EngineConfig::from_env();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 초기화
    let kafka_manager = Arc::new(KafkaManager::new());
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 알림 토픽 생성 (외부 이메일 발송 서비스가 소비)
    kafka_manager.create_topic("notifications", 5, 1).await?;

    // 알림 큐 기동 (유한 큐 + 소진 워커)
    let transport = Arc::new(KafkaTransport::new(kafka_manager.get_producer()));
    let notifier = Notifier::start(transport, cfg.notify_queue_capacity, cfg.outbid_throttle);

    // 신원 제공자 (별칭, 이메일 검증은 외부 마이크로서비스 몫)
    let identity: Arc<dyn IdentityProvider> = Arc::new(HttpIdentityProvider::new());

    // 마감 스케줄러 시작
    let scheduler = AuctionScheduler::new(Arc::clone(&db_manager), notifier.clone(), cfg.clone());
    scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        db_manager,
        identity,
        notifier,
        cfg,
    };

    // 라우터 설정
    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route("/admin/close-auction", post(handlers::handle_close_auction))
        .route("/auction", get(handlers::handle_get_auction))
        .route("/items", get(handlers::handle_get_items))
        .route("/items/:key", get(handlers::handle_get_item))
        .route("/items/:key/bids", get(handlers::handle_get_item_bids))
        .route(
            "/items/:key/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .layer(cors)
        .with_state(state);

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await.unwrap();
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr().unwrap()
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
