//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tutorhub_db::Account;

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub role: String,
}

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// ==================== Account Types ====================

/// Account update request (admin)
#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Password change request (admin)
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub id: i64,
    pub password: String,
}

/// Account response (without password)
#[derive(Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            full_name: a.full_name,
            email: a.email,
            phone: a.phone,
            role: a.role.as_str().to_string(),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Resource Types ====================

/// `?id=` query
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// Body naming a single record
#[derive(Deserialize)]
pub struct IdRequest {
    pub id: i64,
}

/// Replace a resource document
#[derive(Deserialize)]
pub struct UpdateResourceRequest {
    pub id: i64,
    pub data: Map<String, Value>,
}

/// Set the status field of a new-class request
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub id: i64,
    pub status: Value,
}

/// Transactions of one account
#[derive(Deserialize)]
pub struct AccountTransactionsRequest {
    pub account_id: i64,
}

/// Transaction statistics
#[derive(Serialize, Deserialize)]
pub struct TransactionStatsResponse {
    pub count: i64,
    pub total_amount: f64,
}
