// region:    --- Imports
use super::model::Bid;
use crate::error::ValidationError;
// endregion: --- Imports

// region:    --- Bid Rules

/// 다음 입찰의 최소 허용 금액 (센트, 순수 함수)
/// 입찰이 없으면 시작가 그대로가 최소이고, 시작가와 같은 첫 입찰은 유효하다.
/// 최고 입찰이 있으면 그 금액 + 입찰 단위부터 받는다.
pub fn minimum_acceptable(start_price: i64, current_high: Option<&Bid>, increment: i64) -> i64 {
    match current_high {
        Some(high) => high.amount + increment,
        None => start_price,
    }
}

/// 제출 금액 검증 (순수 함수)
/// 금액은 전부 정수 센트로 다룬다. 부동소수점 오차를 피하기 위함.
/// 시작가 기준 오프셋이 입찰 단위로 나누어 떨어져야 한다.
/// ($5.01 같은 입찰이 단위 증가 가정을 깨지 않도록)
pub fn validate(
    amount: i64,
    minimum: i64,
    start_price: i64,
    increment: i64,
) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::NonPositive { minimum });
    }

    if amount < minimum {
        return Err(ValidationError::BelowMinimum { minimum });
    }

    if increment > 0 && (amount - start_price) % increment != 0 {
        return Err(ValidationError::NotOnIncrement { minimum });
    }

    Ok(())
}

// endregion: --- Bid Rules
