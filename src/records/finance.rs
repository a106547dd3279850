use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{require_user, SessionService, UserId};
use crate::store::{self, KeyValueStore};

use super::compliance::record_error_response;
use super::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Farm ledger entry. Amounts are kept in minor currency units to avoid
/// floating-point drift in totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub owner_id: UserId,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount_minor: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

static TRANSACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_transaction_id() -> String {
    let seq = TRANSACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("txn-{}-{seq:04}", Utc::now().timestamp_millis())
}

fn record_key(id: &str) -> String {
    format!("transaction:{id}")
}

fn index_key(owner: &UserId) -> String {
    format!("user:{}:transactions", owner.0)
}

pub struct FinanceService {
    store: Arc<dyn KeyValueStore>,
}

impl FinanceService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        owner: &UserId,
        transaction: NewTransaction,
    ) -> Result<Transaction, RecordError> {
        let transaction = Transaction {
            id: next_transaction_id(),
            owner_id: owner.clone(),
            kind: transaction.kind,
            category: transaction.category,
            amount_minor: transaction.amount_minor,
            date: transaction.date,
            description: transaction.description,
            created_at: Utc::now(),
        };

        store::put_record(
            self.store.as_ref(),
            &record_key(&transaction.id),
            &transaction,
        )?;
        store::push_index(self.store.as_ref(), &index_key(owner), &transaction.id)?;
        Ok(transaction)
    }

    pub fn list(&self, owner: &UserId) -> Result<Vec<Transaction>, RecordError> {
        let ids = store::read_index(self.store.as_ref(), &index_key(owner))?;
        let mut transactions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(transaction) = store::get_record(self.store.as_ref(), &record_key(&id))? {
                transactions.push(transaction);
            }
        }
        transactions.reverse();
        Ok(transactions)
    }

    pub fn delete(&self, owner: &UserId, id: &str) -> Result<(), RecordError> {
        let transaction: Option<Transaction> =
            store::get_record(self.store.as_ref(), &record_key(id))?;
        match transaction {
            Some(transaction) if &transaction.owner_id == owner => {
                self.store.delete(&record_key(id))?;
                store::remove_from_index(self.store.as_ref(), &index_key(owner), id)?;
                Ok(())
            }
            _ => Err(RecordError::NotFound),
        }
    }
}

/// Shared state for the finance endpoints.
#[derive(Clone)]
pub struct FinanceApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<FinanceService>,
}

pub fn finance_router(api: FinanceApi) -> Router {
    Router::new()
        .route("/api/v1/finance", get(list_handler).post(create_handler))
        .route(
            "/api/v1/finance/:transaction_id",
            axum::routing::delete(delete_handler),
        )
        .with_state(api)
}

async fn create_handler(
    State(api): State<FinanceApi>,
    headers: HeaderMap,
    Json(transaction): Json<NewTransaction>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.create(&profile.id, transaction) {
        Ok(transaction) => {
            (StatusCode::CREATED, Json(json!({ "transaction": transaction }))).into_response()
        }
        Err(error) => record_error_response(error),
    }
}

async fn list_handler(State(api): State<FinanceApi>, headers: HeaderMap) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.list(&profile.id) {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(error) => record_error_response(error),
    }
}

async fn delete_handler(
    State(api): State<FinanceApi>,
    headers: HeaderMap,
    Path(transaction_id): Path<String>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.delete(&profile.id, &transaction_id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => record_error_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn create_list_delete_round_trip() {
        let service = FinanceService::new(Arc::new(MemoryStore::default()));
        let owner = UserId("user-1".to_string());

        let feed = service
            .create(
                &owner,
                NewTransaction {
                    kind: TransactionKind::Expense,
                    category: "feed".to_string(),
                    amount_minor: 125_000,
                    date: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
                    description: "Layer feed, 50 bags".to_string(),
                },
            )
            .expect("create");
        let eggs = service
            .create(
                &owner,
                NewTransaction {
                    kind: TransactionKind::Income,
                    category: "eggs".to_string(),
                    amount_minor: 280_000,
                    date: NaiveDate::from_ymd_opt(2026, 8, 5).expect("valid date"),
                    description: "Weekly egg sales".to_string(),
                },
            )
            .expect("create");

        let listed = service.list(&owner).expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, eggs.id);

        service.delete(&owner, &feed.id).expect("delete");
        let remaining = service.list(&owner).expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, eggs.id);
    }

    #[test]
    fn delete_rejects_foreign_owner() {
        let service = FinanceService::new(Arc::new(MemoryStore::default()));
        let owner = UserId("user-1".to_string());
        let intruder = UserId("user-2".to_string());

        let transaction = service
            .create(
                &owner,
                NewTransaction {
                    kind: TransactionKind::Expense,
                    category: "medication".to_string(),
                    amount_minor: 4_500,
                    date: NaiveDate::from_ymd_opt(2026, 8, 12).expect("valid date"),
                    description: String::new(),
                },
            )
            .expect("create");

        match service.delete(&intruder, &transaction.id) {
            Err(RecordError::NotFound) => {}
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(service.list(&owner).expect("list").len(), 1);
    }
}
