//! Operator login, logout and session tokens

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::Session;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::SessionStore;

/// Credential lookup against the personnel store
#[async_trait]
pub trait PersonnelDirectory: Send + Sync {
    /// `Ok(None)` when no operator matches
    async fn authenticate(
        &self,
        factory_code: &str,
        employee_id: &str,
        password: &str,
    ) -> AppResult<Option<Session>>;
}

/// Personnel rows from `NHAN_VIEN`; only operators with a warehouse may log in
#[derive(Clone)]
pub struct PgPersonnelDirectory {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PersonnelRow {
    macongty: String,
    masothe: String,
    hoten: String,
    phongban: Option<String>,
}

impl PgPersonnelDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersonnelDirectory for PgPersonnelDirectory {
    async fn authenticate(
        &self,
        factory_code: &str,
        employee_id: &str,
        password: &str,
    ) -> AppResult<Option<Session>> {
        let row = sqlx::query_as::<_, PersonnelRow>(
            r#"
            SELECT MACONGTY, MASOTHE, HOTEN, PHONGBAN
            FROM NHAN_VIEN
            WHERE MACONGTY = $1 AND MASOTHE = $2 AND MATKHAU = $3 AND KHO IS NOT NULL
            "#,
        )
        .bind(factory_code)
        .bind(employee_id)
        .bind(password)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| {
            let factory_code = r.macongty.trim().to_string();
            Session {
                warehouse_scope: factory_code.clone(),
                factory_code,
                employee_id: r.masothe.trim().to_string(),
                display_name: r.hoten.trim().to_string(),
                department: r.phongban.map(|p| p.trim().to_string()),
            }
        }))
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Session ID
    pub factory_code: String,
    pub employee_id: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub session: Session,
}

/// Decode and validate a session token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized {
        message: format!("Invalid token: {}", e),
        message_vi: "Phiên đăng nhập không hợp lệ".to_string(),
    })
}

#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn PersonnelDirectory>,
    sessions: SessionStore,
    jwt_secret: String,
    session_token_expiry: i64,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn PersonnelDirectory>,
        sessions: SessionStore,
        config: &Config,
    ) -> Self {
        Self {
            directory,
            sessions,
            jwt_secret: config.jwt.secret.clone(),
            session_token_expiry: config.jwt.session_token_expiry,
        }
    }

    /// Check credentials and open a session
    pub async fn login(
        &self,
        factory_code: &str,
        employee_id: &str,
        password: &str,
    ) -> AppResult<LoginResponse> {
        let factory_code = factory_code.trim();
        let employee_id = employee_id.trim();
        if factory_code.is_empty() || employee_id.is_empty() || password.is_empty() {
            return Err(AppError::Validation {
                field: "credentials".to_string(),
                message: "Factory code, employee ID and password are required".to_string(),
                message_vi: "Vui lòng nhập đầy đủ thông tin đăng nhập".to_string(),
            });
        }

        let session = self
            .directory
            .authenticate(factory_code, employee_id, password)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let session_id = self.sessions.open(session.clone()).await;
        let access_token = self.issue_token(session_id, &session)?;

        tracing::info!(
            %session_id,
            factory = %session.factory_code,
            employee = %session.employee_id,
            "Operator logged in"
        );

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.session_token_expiry,
            session,
        })
    }

    pub async fn logout(&self, session_id: Uuid) {
        if let Some(session) = self.sessions.close(session_id).await {
            tracing::info!(%session_id, employee = %session.employee_id, "Operator logged out");
        }
    }

    fn issue_token(&self, session_id: Uuid, session: &Session) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: session_id.to_string(),
            factory_code: session.factory_code.clone(),
            employee_id: session.employee_id.clone(),
            exp: (now + Duration::seconds(self.session_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
