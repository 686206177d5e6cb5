use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::models::dto::{CreateOrderRequest, LineItemInput};
use crate::models::orders::{self, LineItem, LineItems, OrderStatus, PaymentMethod};
use crate::services::identity::{IdentityService, UserRef};
use crate::services::lookup::{first_match, LookupStrategy};
use crate::utils::error::{AppError, AppResult};

const ORDER_CODE_PREFIX: &str = "ORD";
const ORDER_CODE_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Code lisible: ORD<millis>-<6 caractères base36>
/// Collision improbable mais possible: la contrainte UNIQUE fait foi
pub fn generate_order_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_CODE_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}-{}", ORDER_CODE_PREFIX, Utc::now().timestamp_millis(), suffix)
}

/// Commande validée, prête à être persistée
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_ref: UserRef,
    pub items: LineItems,
    pub address: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub payment_method: PaymentMethod,
}

impl NewOrder {
    pub fn from_request(request: CreateOrderRequest) -> AppResult<Self> {
        let inputs = request
            .items
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AppError::validation("Missing or invalid products"))?;

        let items = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| line_item(index, input))
            .collect::<AppResult<Vec<_>>>()?;
        let items = LineItems(items);

        let computed = items.total();
        if let Some(claimed) = request.total {
            if claimed != computed {
                tracing::warn!(%claimed, %computed, "client total ignored, using computed total");
            }
        }

        let payment_method = match request.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::Cod,
            Some(raw) => PaymentMethod::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown payment method: {raw}")))?,
        };

        Ok(Self {
            user_ref: UserRef::classify(request.user_id.as_deref()),
            items,
            address: request.address,
            username: request.username,
            phone: request.phone,
            payment_method,
        })
    }
}

fn line_item(index: usize, input: LineItemInput) -> AppResult<LineItem> {
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation(format!("Item {index} is missing a name")))?;

    let price = input
        .price
        .ok_or_else(|| AppError::validation(format!("Item {index} is missing a price")))?;
    if price < Decimal::ZERO {
        return Err(AppError::validation(format!("Item {index} has a negative price")));
    }

    let quantity = match input.quantity {
        None => 1,
        Some(q) if q >= 1 => u32::try_from(q)
            .map_err(|_| AppError::validation(format!("Item {index} quantity is too large")))?,
        Some(_) => {
            return Err(AppError::validation(format!("Item {index} quantity must be at least 1")));
        }
    };

    Ok(LineItem {
        product_id: input.product_id,
        name,
        price,
        quantity,
        image: input.image,
    })
}

/// Retrouve une commande par id durable ou par code
#[derive(Debug, Clone)]
pub enum OrderLookup {
    ById(Uuid),
    ByCode(String),
}

impl OrderLookup {
    pub fn chain(key: &str) -> Vec<OrderLookup> {
        let key = key.trim();
        if key.is_empty() {
            return Vec::new();
        }
        let mut chain = Vec::with_capacity(2);
        if let Ok(id) = Uuid::try_parse(key) {
            chain.push(OrderLookup::ById(id));
        }
        chain.push(OrderLookup::ByCode(key.to_string()));
        chain
    }
}

#[async_trait]
impl LookupStrategy for OrderLookup {
    type Output = orders::Model;

    async fn find(&self, db: &DatabaseConnection) -> Result<Option<orders::Model>, DbErr> {
        match self {
            OrderLookup::ById(id) => orders::Entity::find_by_id(*id).one(db).await,
            OrderLookup::ByCode(code) => {
                orders::Entity::find()
                    .filter(orders::Column::OrderCode.eq(code.as_str()))
                    .one(db)
                    .await
            }
        }
    }
}

pub struct OrderService;

impl OrderService {
    pub async fn create(db: &DatabaseConnection, new_order: NewOrder) -> AppResult<orders::Model> {
        let (user_id, legacy_user) = new_order.user_ref.into_columns();
        let now = Utc::now();

        let model = orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_code: Set(Some(generate_order_code())),
            user_id: Set(user_id),
            legacy_user: Set(legacy_user),
            total: Set(new_order.items.total()),
            items: Set(new_order.items),
            address: Set(new_order.address),
            username: Set(new_order.username),
            phone: Set(new_order.phone),
            status: Set(OrderStatus::Placed.to_string()),
            arriving_info: Set(None),
            arriving_date: Set(None),
            payment_method: Set(new_order.payment_method),
            payment_status: Set(new_order.payment_method.initial_status()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let order = model.insert(db).await?;
        tracing::info!(order_id = %order.id, order_code = ?order.order_code, "order created");
        Ok(order)
    }

    /// Toutes les commandes, plus récentes d'abord
    pub async fn find_all(db: &DatabaseConnection) -> AppResult<Vec<orders::Model>> {
        Ok(orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Commandes d'un client, quel que soit le format du jeton (id ou username)
    /// Si le compte est retrouvé, ses commandes sous l'autre format sont incluses
    pub async fn find_by_user_token(
        db: &DatabaseConnection,
        token: &str,
    ) -> AppResult<Vec<orders::Model>> {
        let user_ref = UserRef::classify(Some(token));
        let mut condition = Condition::any();

        match &user_ref {
            UserRef::Guest => return Ok(Vec::new()),
            UserRef::Durable(id) => {
                condition = condition
                    .add(orders::Column::UserId.eq(*id))
                    .add(orders::Column::LegacyUser.eq(token.trim()));
            }
            UserRef::Legacy(name) => {
                condition = condition.add(orders::Column::LegacyUser.eq(name.as_str()));
            }
        }

        if let Some(account) = IdentityService::resolve(db, &user_ref).await {
            condition = condition
                .add(orders::Column::UserId.eq(account.id))
                .add(orders::Column::LegacyUser.eq(account.username));
        }

        Ok(orders::Entity::find()
            .filter(condition)
            .order_by_desc(orders::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Id durable d'abord, puis code commande
    pub async fn find(db: &DatabaseConnection, key: &str) -> AppResult<orders::Model> {
        first_match(db, &OrderLookup::chain(key))
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))
    }

    pub async fn update_status(
        db: &DatabaseConnection,
        key: &str,
        status: OrderStatus,
        arriving_info: Option<String>,
        arriving_date: Option<String>,
    ) -> AppResult<orders::Model> {
        let order = Self::find(db, key).await?;
        let previous = order.order_status();

        let mut active: orders::ActiveModel = order.into();
        active.status = Set(status.to_string());
        if let Some(info) = arriving_info {
            active.arriving_info = Set(Some(info));
        }
        if let Some(date) = arriving_date {
            active.arriving_date = Set(Some(date));
        }

        let updated = active.update(db).await?;
        tracing::info!(order_id = %updated.id, %previous, status = %updated.status, "order status updated");
        Ok(updated)
    }

    /// Une adresse vide est une valeur valide
    pub async fn update_address(
        db: &DatabaseConnection,
        key: &str,
        address: String,
    ) -> AppResult<orders::Model> {
        let order = Self::find(db, key).await?;
        let mut active: orders::ActiveModel = order.into();
        active.address = Set(Some(address));
        Ok(active.update(db).await?)
    }

    pub async fn cancel(db: &DatabaseConnection, key: &str) -> AppResult<orders::Model> {
        let order = Self::find(db, key).await?;
        // déjà annulée: rien à écrire
        if order.order_status() == OrderStatus::Cancelled {
            return Ok(order);
        }
        let mut active: orders::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled.to_string());
        let cancelled = active.update(db).await?;
        tracing::info!(order_id = %cancelled.id, "order cancelled");
        Ok(cancelled)
    }

    pub async fn delete(db: &DatabaseConnection, key: &str) -> AppResult<()> {
        let order = Self::find(db, key).await?;
        orders::Entity::delete_by_id(order.id).exec(db).await?;
        tracing::info!(order_id = %order.id, "order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::orders::PaymentStatus;
    use crate::test_support;

    fn ring_request() -> CreateOrderRequest {
        CreateOrderRequest {
            items: Some(vec![LineItemInput {
                name: Some("Ring".into()),
                price: Some(Decimal::new(500, 0)),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn order_code_shape() {
        let code = generate_order_code();
        let (head, suffix) = code.split_once('-').unwrap();
        assert!(head.starts_with("ORD"));
        assert!(head[3..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn rejects_empty_or_incomplete_items() {
        let empty = CreateOrderRequest {
            items: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(NewOrder::from_request(empty), Err(AppError::Validation(_))));
        assert!(matches!(
            NewOrder::from_request(CreateOrderRequest::default()),
            Err(AppError::Validation(_))
        ));

        let no_price = CreateOrderRequest {
            items: Some(vec![LineItemInput {
                name: Some("Ring".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(matches!(NewOrder::from_request(no_price), Err(AppError::Validation(_))));

        let no_name = CreateOrderRequest {
            items: Some(vec![LineItemInput {
                price: Some(Decimal::ONE),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(matches!(NewOrder::from_request(no_name), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_payment_method() {
        let mut request = ring_request();
        request.payment_method = Some("barter".into());
        assert!(matches!(NewOrder::from_request(request), Err(AppError::Validation(_))));
    }

    #[test]
    fn classifies_identity_token_on_write() {
        let id = Uuid::new_v4();
        let mut request = ring_request();
        request.user_id = Some(id.to_string());
        assert_eq!(NewOrder::from_request(request).unwrap().user_ref, UserRef::Durable(id));

        let mut request = ring_request();
        request.user_id = Some("alice".into());
        assert_eq!(
            NewOrder::from_request(request).unwrap().user_ref,
            UserRef::Legacy("alice".into())
        );

        // 32 hex sans tirets: ancien username, pas un id
        let hex_name = id.simple().to_string();
        let mut request = ring_request();
        request.user_id = Some(hex_name.clone());
        assert_eq!(
            NewOrder::from_request(request).unwrap().user_ref,
            UserRef::Legacy(hex_name)
        );
    }

    #[tokio::test]
    async fn create_assigns_code_status_and_payment_status() {
        let db = test_support::memory_db().await;
        let mut request = ring_request();
        request.address = Some("221B Baker St".into());
        request.total = Some(Decimal::new(1, 0));

        let order = OrderService::create(&db, NewOrder::from_request(request).unwrap())
            .await
            .unwrap();

        assert!(order.order_code.as_deref().unwrap().starts_with("ORD"));
        assert_eq!(order.status, "placed");
        assert_eq!(order.payment_method, PaymentMethod::Cod);
        assert_eq!(order.payment_status, PaymentStatus::NotApplicable);
        assert_eq!(order.total, Decimal::new(500, 0));
        assert_eq!(order.user_id, None);
        assert_eq!(order.legacy_user, None);

        let reread = OrderService::find(&db, &order.id.to_string()).await.unwrap();
        assert_eq!(reread.order_code, order.order_code);
    }

    #[tokio::test]
    async fn online_payment_starts_pending() {
        let db = test_support::memory_db().await;
        let mut request = ring_request();
        request.payment_method = Some("online".into());
        let order = OrderService::create(&db, NewOrder::from_request(request).unwrap())
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn order_codes_are_unique_across_the_store() {
        let db = test_support::memory_db().await;
        let mut codes = std::collections::HashSet::new();
        for _ in 0..20 {
            let order = OrderService::create(&db, NewOrder::from_request(ring_request()).unwrap())
                .await
                .unwrap();
            assert!(codes.insert(order.order_code.unwrap()));
        }
    }

    #[tokio::test]
    async fn duplicate_order_code_is_a_conflict() {
        let db = test_support::memory_db().await;
        let first = test_support::insert_order(&db, test_support::order(UserRef::Guest)).await;

        let mut clash = test_support::order(UserRef::Guest);
        clash.order_code = first.order_code.clone();
        let err: AppError = test_support::try_insert_order(&db, clash)
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn legacy_rows_without_code_do_not_collide() {
        let db = test_support::memory_db().await;
        for _ in 0..2 {
            let mut legacy = test_support::order(UserRef::Guest);
            legacy.order_code = None;
            test_support::insert_order(&db, legacy).await;
        }
        assert_eq!(OrderService::find_all(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_by_token_reconciles_both_representations() {
        let db = test_support::memory_db().await;
        let alice = test_support::insert_user(&db, "alice", None).await;
        let bob = test_support::insert_user(&db, "bob", None).await;

        let durable = test_support::insert_order(&db, test_support::order(UserRef::Durable(alice.id))).await;
        let legacy = test_support::insert_order(&db, test_support::order(UserRef::Legacy("alice".into()))).await;
        test_support::insert_order(&db, test_support::order(UserRef::Durable(bob.id))).await;

        for token in [alice.id.to_string(), "alice".to_string()] {
            let found = OrderService::find_by_user_token(&db, &token).await.unwrap();
            let mut ids: Vec<Uuid> = found.iter().map(|o| o.id).collect();
            ids.sort();
            let mut expected = vec![durable.id, legacy.id];
            expected.sort();
            assert_eq!(ids, expected, "token {token}");
        }
    }

    #[tokio::test]
    async fn find_by_unknown_token_is_empty() {
        let db = test_support::memory_db().await;
        assert!(OrderService::find_by_user_token(&db, "nobody").await.unwrap().is_empty());
        assert!(OrderService::find_by_user_token(&db, &Uuid::new_v4().to_string())
            .await
            .unwrap()
            .is_empty());
        assert!(OrderService::find_by_user_token(&db, "  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_accept_id_or_code() {
        let db = test_support::memory_db().await;
        let order = test_support::insert_order(&db, test_support::order(UserRef::Guest)).await;
        let code = order.order_code.clone().unwrap();

        let by_id = OrderService::update_status(
            &db,
            &order.id.to_string(),
            OrderStatus::Shipped,
            Some("Arriving soon".into()),
            None,
        )
        .await
        .unwrap();
        assert_eq!(by_id.status, "Shipped");
        assert_eq!(by_id.arriving_info.as_deref(), Some("Arriving soon"));

        let by_code = OrderService::update_status(
            &db,
            &code,
            OrderStatus::Other("Out for delivery".into()),
            None,
            Some("2026-10-21".into()),
        )
        .await
        .unwrap();
        assert_eq!(by_code.status, "Out for delivery");
        // non fourni => conservé
        assert_eq!(by_code.arriving_info.as_deref(), Some("Arriving soon"));
        assert_eq!(by_code.arriving_date.as_deref(), Some("2026-10-21"));

        let addressed = OrderService::update_address(&db, &code, String::new()).await.unwrap();
        assert_eq!(addressed.address.as_deref(), Some(""));

        let cancelled = OrderService::cancel(&db, &order.id.to_string()).await.unwrap();
        assert_eq!(cancelled.order_status(), OrderStatus::Cancelled);
        let again = OrderService::cancel(&db, &code).await.unwrap();
        assert_eq!(again.status, "Cancelled");

        OrderService::delete(&db, &code).await.unwrap();
        assert!(matches!(
            OrderService::find(&db, &code).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn mutations_on_unknown_key_are_not_found() {
        let db = test_support::memory_db().await;
        let unknown = Uuid::new_v4().to_string();
        for key in [unknown.as_str(), "ORD0-NOPE", ""] {
            assert!(matches!(
                OrderService::update_status(&db, key, OrderStatus::Shipped, None, None).await,
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(
                OrderService::update_address(&db, key, "x".into()).await,
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(OrderService::cancel(&db, key).await, Err(AppError::NotFound(_))));
            assert!(matches!(OrderService::delete(&db, key).await, Err(AppError::NotFound(_))));
        }
    }
}
