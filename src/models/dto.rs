//pour les requêtes et réponses structurées
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::orders::{self, OrderStatus};

/// Projection minimale d'un utilisateur attachée à une commande
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Commande + utilisateur résolu. `user` est toujours sérialisé (null si inconnu)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: orders::Model,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(alias = "_id")]
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Id durable, ancien username, ou absent (invité)
    pub user_id: Option<String>,
    #[serde(alias = "products")]
    pub items: Option<Vec<LineItemInput>>,
    pub total: Option<Decimal>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub arriving_info: Option<String>,
    pub arriving_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAddressRequest {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    pub message: &'static str,
    pub scanned: usize,
    pub updated: usize,
}
