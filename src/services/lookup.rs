use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};

/// Une façon de retrouver un enregistrement (par id, par code, par username...)
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    type Output: Send;

    async fn find(&self, db: &DatabaseConnection) -> Result<Option<Self::Output>, DbErr>;
}

/// Essaie les stratégies dans l'ordre, s'arrête à la première qui trouve
pub async fn first_match<S: LookupStrategy>(
    db: &DatabaseConnection,
    strategies: &[S],
) -> Result<Option<S::Output>, DbErr> {
    for strategy in strategies {
        if let Some(found) = strategy.find(db).await? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
