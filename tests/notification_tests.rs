use async_trait::async_trait;
use chrono::{Duration, Utc};
use silent_auction_service::bidding::model::{Bid, Item};
use silent_auction_service::closing::{group_winners, ItemWinner};
use silent_auction_service::notification::{
    NotificationEvent, NotificationTransport, Notifier, OutbidThrottle,
};
use std::sync::{Arc, Mutex};

/// 전송된 이벤트를 쌓아 두는 테스트 대역
#[derive(Default)]
struct RecordingTransport {
    delivered: Mutex<Vec<NotificationEvent>>,
}

impl RecordingTransport {
    fn events(&self) -> Vec<NotificationEvent> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), String> {
        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// 테스트용 상품
fn item(id: i64) -> Item {
    Item {
        id,
        slug: format!("item-{}", id),
        title: format!("상품 {}", id),
        description: String::new(),
        start_price: 2000,
        is_closed: false,
        owner: "vendor-1".to_string(),
        created_at: Utc::now(),
    }
}

/// 테스트용 입찰
fn bid(item_id: i64, alias_id: i64, amount: i64) -> Bid {
    Bid {
        id: amount,
        item_id,
        alias_id,
        email: format!("alias{}@example.com", alias_id),
        amount,
        created_at: Utc::now(),
    }
}

/// 낙찰 한 건
fn winner(item_id: i64, alias_id: i64, amount: i64) -> ItemWinner {
    ItemWinner {
        item_id,
        title: format!("상품 {}", item_id),
        alias_id,
        email: format!("alias{}@example.com", alias_id),
        amount,
    }
}

// region:    --- Outbid Throttle

/// 첫 발송은 허용, 윈도우 안의 재발송은 차단
#[test]
fn throttle_blocks_within_window() {
    let mut throttle = OutbidThrottle::new(Duration::minutes(30));
    let now = Utc::now();

    assert!(throttle.should_send(1, now));
    assert!(!throttle.should_send(1, now + Duration::minutes(5)));
    assert!(!throttle.should_send(1, now + Duration::minutes(29)));
}

/// 윈도우가 지나면 다시 발송된다
#[test]
fn throttle_resets_after_window() {
    let mut throttle = OutbidThrottle::new(Duration::minutes(30));
    let now = Utc::now();

    assert!(throttle.should_send(1, now));
    assert!(throttle.should_send(1, now + Duration::minutes(31)));
}

/// 아이템별로 독립적으로 제한한다
#[test]
fn throttle_tracks_items_independently() {
    let mut throttle = OutbidThrottle::new(Duration::minutes(30));
    let now = Utc::now();

    assert!(throttle.should_send(1, now));
    assert!(throttle.should_send(2, now));
    assert!(!throttle.should_send(1, now + Duration::minutes(1)));
    assert!(!throttle.should_send(2, now + Duration::minutes(1)));
}

// endregion: --- Outbid Throttle

// region:    --- Winner Grouping

/// 같은 입찰자가 여러 상품을 낙찰하면 한 통으로 묶인다
#[test]
fn group_winners_one_notice_per_bidder() {
    let winners = vec![winner(1, 7, 2500), winner(2, 9, 4000), winner(3, 7, 1500)];

    let notices = group_winners(&winners);
    assert_eq!(notices.len(), 2);

    // 첫 등장 순서 유지
    assert_eq!(notices[0].alias_id, 7);
    assert_eq!(notices[0].items.len(), 2);
    assert_eq!(notices[0].items[0].item_id, 1);
    assert_eq!(notices[0].items[1].item_id, 3);

    assert_eq!(notices[1].alias_id, 9);
    assert_eq!(notices[1].items.len(), 1);
}

#[test]
fn group_winners_empty() {
    assert!(group_winners(&[]).is_empty());
}

// endregion: --- Winner Grouping

// region:    --- Notifier

/// 확인 알림은 큐를 거쳐 전송되고, 같은 아이템의 상회 알림은 윈도우당 1건만 나간다
#[tokio::test]
async fn notifier_delivers_confirmation_and_throttles_outbid() {
    let transport = Arc::new(RecordingTransport::default());
    let notifier = Notifier::start(
        Arc::clone(&transport) as Arc<dyn NotificationTransport>,
        16,
        Duration::minutes(30),
    );

    let item = item(1);
    let first = bid(1, 7, 2000);
    let second = bid(1, 9, 2500);

    notifier.notify_bid_confirmation(&first, &item);

    let now = Utc::now();
    notifier.notify_outbid(&first, &item, second.amount, now);
    // 같은 아이템, 같은 윈도우라서 버려져야 한다
    notifier.notify_outbid(&second, &item, 3000, now + Duration::minutes(1));

    // 소진 워커 처리 대기
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let events = transport.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        NotificationEvent::BidConfirmation { item_id: 1, amount: 2000, .. }
    ));
    assert!(matches!(
        events[1],
        NotificationEvent::Outbid { item_id: 1, new_amount: 2500, .. }
    ));
}

/// 낙찰 통지는 바로 전송되고 결과가 호출자에게 돌아온다
#[tokio::test]
async fn notify_winner_reports_transport_result() {
    let transport = Arc::new(RecordingTransport::default());
    let notifier = Notifier::start(
        Arc::clone(&transport) as Arc<dyn NotificationTransport>,
        16,
        Duration::minutes(30),
    );

    let notices = group_winners(&[winner(1, 7, 2500)]);
    let notice = notices.into_iter().next().unwrap();

    let result = notifier
        .notify_winner(notice.alias_id, notice.email, notice.items)
        .await;
    assert!(result.is_ok());

    let events = transport.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        NotificationEvent::Winner { alias_id: 7, .. }
    ));
}

// endregion: --- Notifier
