// ============================================================================
// MODÈLE : ORDERS
// ============================================================================
//
// Colonnes d'identité:
//   - user_id (UUID, nullable)      - référence durable vers users
//   - legacy_user (TEXT, nullable)  - ancien identifiant texte (username)
//   Au plus une des deux est renseignée. Le code ne manipule jamais ces
//   colonnes directement: passer par `Model::user_ref` / `UserRef::into_columns`.
//
// Champs "snapshot" (username, phone, address) copiés au moment de la
// commande: ils ont priorité sur les données live du compte à l'affichage.
//
// order_code: code lisible (ORD...), UNIQUE mais nullable (les anciennes
// lignes n'en ont pas, NULL ne collisionne pas).
//
// ============================================================================

use std::fmt;

use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::identity::UserRef;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_code: Option<String>,
    pub user_id: Option<Uuid>,
    pub legacy_user: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub items: LineItems,
    pub total: Decimal,
    pub address: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub arriving_info: Option<String>,
    pub arriving_date: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn user_ref(&self) -> UserRef {
        UserRef::from_columns(self.user_id, self.legacy_user.as_deref())
    }

    pub fn order_status(&self) -> OrderStatus {
        OrderStatus::parse(&self.status).unwrap_or(OrderStatus::Placed)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.updated_at = Set(chrono::Utc::now());
        Ok(self)
    }
}

/// Ligne de commande: copie du produit au moment de l'achat (pas une référence live)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct LineItems(pub Vec<LineItem>);

impl LineItems {
    pub fn total(&self) -> Decimal {
        self.0
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "COD")]
    #[serde(rename = "COD")]
    Cod,
    #[sea_orm(string_value = "online")]
    #[serde(rename = "online")]
    Online,
    #[sea_orm(string_value = "UPI")]
    #[serde(rename = "UPI")]
    Upi,
    #[sea_orm(string_value = "CARD")]
    #[serde(rename = "CARD")]
    Card,
}

impl PaymentMethod {
    /// Accepte les libellés historiques sans tenir compte de la casse
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cod" | "cash-on-delivery" => Some(Self::Cod),
            "online" => Some(Self::Online),
            "upi" => Some(Self::Upi),
            "card" => Some(Self::Card),
            _ => None,
        }
    }

    /// Statut de paiement initial: seul le paiement en ligne attend une confirmation
    pub fn initial_status(self) -> PaymentStatus {
        match self {
            Self::Online => PaymentStatus::Pending,
            _ => PaymentStatus::NotApplicable,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    #[serde(rename = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,
    #[sea_orm(string_value = "not-applicable")]
    #[serde(rename = "not-applicable")]
    NotApplicable,
}

/// Statut de commande. `Other` porte le texte libre des transporteurs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Placed,
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// `None` pour une chaîne vide
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let status = match trimmed.to_ascii_lowercase().as_str() {
            "placed" => Self::Placed,
            "pending" => Self::Pending,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(trimmed.to_string()),
        };
        Some(status)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Placed => "placed",
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(text) => text,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        OrderStatus::parse(&raw).ok_or_else(|| serde::de::Error::custom("status must not be empty"))
    }
}
