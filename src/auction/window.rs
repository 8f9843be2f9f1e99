// region:    --- Imports
use crate::bidding::model::AuctionSettings;
use crate::error::WindowError;
use chrono::{DateTime, Utc};
use serde::Serialize;
// endregion: --- Imports

// region:    --- Window Evaluator

/// 경매 윈도우 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowStatus {
    Open,
    NotStarted,
    DeadlinePassed,
    ManuallyClosed,
}

impl WindowStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, WindowStatus::Open)
    }

    /// 닫힌 윈도우를 입찰 거부 오류로 변환
    pub fn as_error(&self) -> Option<WindowError> {
        match self {
            WindowStatus::Open => None,
            WindowStatus::NotStarted => Some(WindowError::NotStarted),
            WindowStatus::DeadlinePassed => Some(WindowError::DeadlinePassed),
            WindowStatus::ManuallyClosed => Some(WindowError::ManuallyClosed),
        }
    }
}

/// 입찰 허용 여부 판정 (순수 함수, 부수 효과 없음)
/// 검사 순서 고정: 수동 종료 플래그 -> 시작 시간 -> 마감 시간.
/// 관리자가 조기 종료한 경우 마감 시간이 남아 있어도 거부되어야 한다.
pub fn evaluate(settings: &AuctionSettings, now: DateTime<Utc>) -> WindowStatus {
    if settings.auction_closed {
        return WindowStatus::ManuallyClosed;
    }

    if let Some(start) = settings.auction_start {
        if now < start {
            return WindowStatus::NotStarted;
        }
    }

    if let Some(deadline) = settings.auction_deadline {
        if now >= deadline {
            return WindowStatus::DeadlinePassed;
        }
    }

    WindowStatus::Open
}

// endregion: --- Window Evaluator
