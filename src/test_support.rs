// Outils de test: base SQLite en mémoire + fixtures

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use uuid::Uuid;

use crate::models::orders::{self, LineItem, LineItems, PaymentMethod, PaymentStatus};
use crate::models::users;
use crate::services::identity::UserRef;

pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // une seule connexion: chaque connexion SQLite mémoire est une base distincte
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("sqlite memory db");
    crate::db::create_schema(&db).await.expect("schema");
    db
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compte non persisté: nom = username capitalisé, email = <username>@example.com
pub fn user(username: &str, address: Option<&str>) -> users::Model {
    let now = Utc::now();
    users::Model {
        id: Uuid::new_v4(),
        name: capitalize(username),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        phone: Some("555-0000".to_string()),
        address: address.map(str::to_string),
        password_hash: "pbkdf2:sha256:1$AA$AA".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub async fn insert_user(db: &DatabaseConnection, username: &str, address: Option<&str>) -> users::Model {
    let model = user(username, address);
    users::ActiveModel {
        id: Set(model.id),
        name: Set(model.name),
        username: Set(model.username),
        email: Set(model.email),
        phone: Set(model.phone),
        address: Set(model.address),
        password_hash: Set(model.password_hash),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub fn ring() -> LineItem {
    LineItem {
        product_id: None,
        name: "Ring".to_string(),
        price: Decimal::new(500, 0),
        quantity: 1,
        image: None,
    }
}

/// Commande non persistée sans snapshot ni adresse
pub fn order(user_ref: UserRef) -> orders::Model {
    let (user_id, legacy_user) = user_ref.into_columns();
    let items = LineItems(vec![ring()]);
    let now = Utc::now();
    orders::Model {
        id: Uuid::new_v4(),
        order_code: Some(format!("ORD-TEST-{}", Uuid::new_v4().simple())),
        user_id,
        legacy_user,
        total: items.total(),
        items,
        address: None,
        username: None,
        phone: None,
        status: "placed".to_string(),
        arriving_info: None,
        arriving_date: None,
        payment_method: PaymentMethod::Cod,
        payment_status: PaymentStatus::NotApplicable,
        created_at: now,
        updated_at: now,
    }
}

/// Insère une commande telle quelle (utile pour simuler d'anciennes lignes)
pub async fn insert_order(db: &DatabaseConnection, model: orders::Model) -> orders::Model {
    try_insert_order(db, model).await.expect("insert order")
}

pub async fn try_insert_order(db: &DatabaseConnection, model: orders::Model) -> Result<orders::Model, DbErr> {
    orders::ActiveModel {
        id: Set(model.id),
        order_code: Set(model.order_code),
        user_id: Set(model.user_id),
        legacy_user: Set(model.legacy_user),
        items: Set(model.items),
        total: Set(model.total),
        address: Set(model.address),
        username: Set(model.username),
        phone: Set(model.phone),
        status: Set(model.status),
        arriving_info: Set(model.arriving_info),
        arriving_date: Set(model.arriving_date),
        payment_method: Set(model.payment_method),
        payment_status: Set(model.payment_status),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
    .insert(db)
    .await
}
