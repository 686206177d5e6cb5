use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::cart_items;
use crate::services::product_service::ProductService;
use crate::utils::error::{AppError, AppResult};

pub struct CartService;

impl CartService {
    pub async fn items(db: &DatabaseConnection, user_token: &str) -> AppResult<Vec<cart_items::Model>> {
        Ok(cart_items::Entity::find()
            .filter(cart_items::Column::UserToken.eq(user_token))
            .order_by_asc(cart_items::Column::AddedAt)
            .all(db)
            .await?)
    }

    /// Ajoute un produit; si la ligne existe déjà, la quantité est incrémentée
    pub async fn add(
        db: &DatabaseConnection,
        user_token: &str,
        product_id: &str,
        quantity: Option<i32>,
    ) -> AppResult<cart_items::Model> {
        let quantity = quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }

        let product = ProductService::get(db, product_id).await?;

        let existing = cart_items::Entity::find_by_id((user_token.to_string(), product.id))
            .one(db)
            .await?;

        let item = match existing {
            Some(line) => {
                let total = line.quantity.saturating_add(quantity);
                let mut active: cart_items::ActiveModel = line.into();
                active.quantity = Set(total);
                active.update(db).await?
            }
            None => {
                cart_items::ActiveModel {
                    user_token: Set(user_token.to_string()),
                    product_id: Set(product.id),
                    quantity: Set(quantity),
                    name: Set(product.name.clone()),
                    price: Set(product.price),
                    image: Set(product.images.first().map(str::to_string)),
                    added_at: Set(Utc::now()),
                }
                .insert(db)
                .await?
            }
        };
        Ok(item)
    }

    pub async fn set_quantity(
        db: &DatabaseConnection,
        user_token: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<cart_items::Model> {
        if quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        let line = cart_items::Entity::find_by_id((user_token.to_string(), product_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Item not found"))?;

        let mut active: cart_items::ActiveModel = line.into();
        active.quantity = Set(quantity);
        Ok(active.update(db).await?)
    }

    pub async fn remove(db: &DatabaseConnection, user_token: &str, product_id: Uuid) -> AppResult<()> {
        let result = cart_items::Entity::delete_by_id((user_token.to_string(), product_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Item not found"));
        }
        Ok(())
    }

    /// Vide le panier, renvoie le nombre de lignes supprimées
    pub async fn clear(db: &DatabaseConnection, user_token: &str) -> AppResult<u64> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserToken.eq(user_token))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
