// region:    --- Imports
use crate::bidding::model::{Bid, Item};
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Notification Events

/// 낙찰 상품 한 건 (입찰자별 낙찰 메일에 담긴다)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WonItem {
    pub item_id: i64,
    pub title: String,
    pub amount: i64,
}

/// 관리자 요약용 낙찰 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerLine {
    pub item_id: i64,
    pub title: String,
    pub alias_id: i64,
    pub email: String,
    pub amount: i64,
}

/// 외부 이메일 발송 서비스로 전달되는 알림 이벤트
/// 본문 템플릿은 발송 서비스가 관리한다. 여기서는 사실만 싣는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// 상품당 첫 입찰 확인
    BidConfirmation {
        email: String,
        alias_id: i64,
        item_id: i64,
        item_title: String,
        amount: i64,
    },
    /// 상회 입찰 통지 (밀려난 이전 최고 입찰자에게)
    Outbid {
        email: String,
        alias_id: i64,
        item_id: i64,
        item_title: String,
        new_amount: i64,
    },
    /// 낙찰 통지 (입찰자당 한 통, 낙찰 상품 전부 포함)
    Winner {
        email: String,
        alias_id: i64,
        items: Vec<WonItem>,
    },
    /// 관리자 낙찰 요약
    AdminsWinnersSummary {
        email: String,
        winners: Vec<WinnerLine>,
    },
}

impl NotificationEvent {
    /// 수신자 주소 (Kafka 파티션 키로도 쓴다)
    pub fn recipient(&self) -> &str {
        match self {
            NotificationEvent::BidConfirmation { email, .. }
            | NotificationEvent::Outbid { email, .. }
            | NotificationEvent::Winner { email, .. }
            | NotificationEvent::AdminsWinnersSummary { email, .. } => email,
        }
    }
}

// endregion: --- Notification Events

// region:    --- Notification Transport

/// 알림 전송 계층 트레이트 (운영은 Kafka, 테스트는 대역)
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), String>;
}

/// 알림 토픽으로 JSON 이벤트를 발행하는 Kafka 어댑터
pub struct KafkaTransport {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaTransport {
    pub fn new(producer: Arc<KafkaProducer>) -> Self {
        KafkaTransport {
            producer,
            topic: "notifications".to_string(),
        }
    }
}

#[async_trait]
impl NotificationTransport for KafkaTransport {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        self.producer
            .send_message(&self.topic, event.recipient(), &payload)
            .await
    }
}

// endregion: --- Notification Transport

// region:    --- Outbid Throttle

/// 상회 입찰 알림 빈도 제한
/// 입찰 경쟁 중 알림 폭주를 막기 위해 아이템당 롤링 윈도우에 1회만 보낸다.
#[derive(Debug)]
pub struct OutbidThrottle {
    window: Duration,
    last_sent: HashMap<i64, DateTime<Utc>>,
}

impl OutbidThrottle {
    pub fn new(window: Duration) -> Self {
        OutbidThrottle {
            window,
            last_sent: HashMap::new(),
        }
    }

    /// 발송 가능 여부 판단. 가능하면 발송 시각을 기록한다.
    pub fn should_send(&mut self, item_id: i64, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(&item_id) {
            Some(last) if now - *last < self.window => false,
            _ => {
                self.last_sent.insert(item_id, now);
                true
            }
        }
    }
}

// endregion: --- Outbid Throttle

// region:    --- Notifier

/// 알림 디스패처 앞단
/// 입찰 경로의 알림은 유한 큐에 던지고 결과를 기다리지 않는다.
/// 느린 브로커가 입찰 응답 지연으로 이어지면 안 된다.
#[derive(Clone)]
pub struct Notifier {
    queue: mpsc::Sender<NotificationEvent>,
    transport: Arc<dyn NotificationTransport>,
    throttle: Arc<Mutex<OutbidThrottle>>,
}

impl Notifier {
    /// 알림 큐 기동: 유한 큐를 만들고 소진 워커를 하나 띄운다.
    pub fn start(
        transport: Arc<dyn NotificationTransport>,
        queue_capacity: usize,
        outbid_throttle: Duration,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<NotificationEvent>(queue_capacity);

        let worker_transport = Arc::clone(&transport);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // 알림 실패는 기록만 하고 삼킨다. 입찰과 마감은 이미 커밋된 뒤다.
                if let Err(e) = worker_transport.deliver(&event).await {
                    error!("{:<12} --> 알림 발송 실패: {}", "Notifier", e);
                } else {
                    debug!(
                        "{:<12} --> 알림 발송 완료: {}",
                        "Notifier",
                        event.recipient()
                    );
                }
            }
        });

        Notifier {
            queue: tx,
            transport,
            throttle: Arc::new(Mutex::new(OutbidThrottle::new(outbid_throttle))),
        }
    }

    /// 큐 투입. 포화 시 이벤트를 버린다. 입찰 지연이 알림보다 우선이다.
    fn enqueue(&self, event: NotificationEvent) {
        if let Err(e) = self.queue.try_send(event) {
            warn!("{:<12} --> 알림 큐 포화로 이벤트 폐기: {}", "Notifier", e);
        }
    }

    /// 첫 입찰 확인 알림
    pub fn notify_bid_confirmation(&self, bid: &Bid, item: &Item) {
        self.enqueue(NotificationEvent::BidConfirmation {
            email: bid.email.clone(),
            alias_id: bid.alias_id,
            item_id: item.id,
            item_title: item.title.clone(),
            amount: bid.amount,
        });
    }

    /// 상회 입찰 알림 (아이템당 윈도우 내 1회)
    pub fn notify_outbid(&self, prev: &Bid, item: &Item, new_amount: i64, now: DateTime<Utc>) {
        let send = {
            let mut throttle = self.throttle.lock().unwrap();
            throttle.should_send(item.id, now)
        };
        if !send {
            debug!(
                "{:<12} --> 상회 입찰 알림 생략 (제한 윈도우): item {}",
                "Notifier", item.id
            );
            return;
        }

        self.enqueue(NotificationEvent::Outbid {
            email: prev.email.clone(),
            alias_id: prev.alias_id,
            item_id: item.id,
            item_title: item.title.clone(),
            new_amount,
        });
    }

    /// 낙찰 통지. 마감 처리기가 결과를 집계하므로 여기서는 바로 전송한다.
    pub async fn notify_winner(
        &self,
        alias_id: i64,
        email: String,
        items: Vec<WonItem>,
    ) -> Result<(), String> {
        info!(
            "{:<12} --> 낙찰 통지: alias {}, 상품 {}건",
            "Notifier",
            alias_id,
            items.len()
        );
        self.transport
            .deliver(&NotificationEvent::Winner {
                email,
                alias_id,
                items,
            })
            .await
    }

    /// 관리자 낙찰 요약 통지
    pub async fn notify_admins_winners_summary(
        &self,
        email: String,
        winners: Vec<WinnerLine>,
    ) -> Result<(), String> {
        self.transport
            .deliver(&NotificationEvent::AdminsWinnersSummary { email, winners })
            .await
    }
}

// endregion: --- Notifier
