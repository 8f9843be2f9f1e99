// region:    --- Imports
use crate::error::IdentityError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
// endregion: --- Imports

// region:    --- Identity Provider

/// 검증된 입찰자 별칭
/// 공개 화면에는 실명 대신 이 별칭만 노출된다.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedAlias {
    pub alias_id: i64,
    pub display_name: String,
}

/// 입찰자 신원 제공자 (외부 협력 서비스 인터페이스)
/// 별칭 생성과 이메일 검증 절차 자체는 이 엔진의 범위 밖이다.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 검증된 이메일에 연결된 별칭 조회. 별칭이 없으면 None.
    async fn resolve_verified_alias(
        &self,
        email: &str,
    ) -> Result<Option<VerifiedAlias>, IdentityError>;
}

// endregion: --- Identity Provider

// region:    --- HTTP Adapter

/// 신원 마이크로서비스 HTTP 어댑터
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new() -> Self {
        let base_url = std::env::var("IDENTITY_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());
        HttpIdentityProvider {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

impl Default for HttpIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_verified_alias(
        &self,
        email: &str,
    ) -> Result<Option<VerifiedAlias>, IdentityError> {
        info!("{:<12} --> 별칭 조회: {}", "Identity", email);

        let url = format!("{}/aliases/verified", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(format!(
                "응답 상태 {}",
                response.status()
            )));
        }

        let alias = response
            .json::<VerifiedAlias>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Some(alias))
    }
}

// endregion: --- HTTP Adapter
