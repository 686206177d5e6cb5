// ============================================================================
// SERVICE : RÉPARATION DES ANCIENNES COMMANDES
// ============================================================================
//
// - backfill_addresses : copie l'adresse du compte sur les commandes sans adresse
// - backfill_order_codes : génère un code pour les commandes créées avant le champ
//
// Les deux jobs sont idempotents: un second passage ne modifie rien.
// Traitement séquentiel, une écriture atomique par commande (pas de transaction).
//
// ============================================================================

use sea_orm::*;

use crate::models::orders;
use crate::services::identity::IdentityService;
use crate::services::order_service::generate_order_code;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
}

pub struct BackfillService;

impl BackfillService {
    /// Ne remplace jamais une adresse non vide
    pub async fn backfill_addresses(db: &DatabaseConnection) -> Result<BackfillReport, DbErr> {
        let candidates = orders::Entity::find()
            .filter(
                Condition::any()
                    .add(orders::Column::Address.is_null())
                    .add(orders::Column::Address.eq("")),
            )
            .all(db)
            .await?;

        let mut report = BackfillReport {
            scanned: candidates.len(),
            updated: 0,
        };

        for order in candidates {
            let Some(account) = IdentityService::resolve_with_fallback(db, &order.user_ref()).await
            else {
                continue;
            };

            // copiée telle quelle; le trim ne sert qu'à écarter les adresses blanches
            let Some(address) = account
                .address
                .clone()
                .filter(|a| !a.trim().is_empty())
            else {
                continue;
            };

            let order_id = order.id;
            let mut active: orders::ActiveModel = order.into();
            active.address = Set(Some(address));
            active.update(db).await?;

            report.updated += 1;
            tracing::info!(%order_id, user_id = %account.id, "order address backfilled");
        }

        tracing::info!(scanned = report.scanned, updated = report.updated, "address backfill complete");
        Ok(report)
    }

    pub async fn backfill_order_codes(db: &DatabaseConnection) -> Result<BackfillReport, DbErr> {
        let candidates = orders::Entity::find()
            .filter(
                Condition::any()
                    .add(orders::Column::OrderCode.is_null())
                    .add(orders::Column::OrderCode.eq("")),
            )
            .all(db)
            .await?;

        let mut report = BackfillReport {
            scanned: candidates.len(),
            updated: 0,
        };

        for order in candidates {
            let mut active: orders::ActiveModel = order.into();
            active.order_code = Set(Some(generate_order_code()));
            active.update(db).await?;
            report.updated += 1;
        }

        tracing::info!(scanned = report.scanned, updated = report.updated, "order code backfill complete");
        Ok(report)
    }
}
