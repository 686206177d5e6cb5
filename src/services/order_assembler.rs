use sea_orm::DatabaseConnection;

use crate::models::dto::OrderView;
use crate::models::orders;
use crate::services::identity::IdentityService;

/// Attache l'utilisateur résolu aux commandes.
/// Ne renvoie jamais d'erreur: un lien d'identité cassé donne `user: null` ou Guest.
pub struct OrderAssembler;

impl OrderAssembler {
    pub async fn attach_user(db: &DatabaseConnection, order: orders::Model) -> OrderView {
        let account = IdentityService::resolve(db, &order.user_ref()).await;
        let user = IdentityService::summarize(&order, account.as_ref());
        OrderView { order, user }
    }

    /// Version lot: deux requêtes au maximum, même résultat que `attach_user` ligne par ligne
    pub async fn attach_users(db: &DatabaseConnection, rows: Vec<orders::Model>) -> Vec<OrderView> {
        let refs: Vec<_> = rows.iter().map(orders::Model::user_ref).collect();
        let accounts = IdentityService::resolve_many(db, &refs).await;

        rows.into_iter()
            .zip(refs.iter())
            .map(|(order, user_ref)| {
                let user = IdentityService::summarize(&order, accounts.get(user_ref));
                OrderView { order, user }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::UserRef;
    use crate::test_support;

    #[tokio::test]
    async fn batch_equals_single_for_mixed_identities() {
        let db = test_support::memory_db().await;
        let alice = test_support::insert_user(&db, "alice", Some("Alice Street")).await;
        let bob = test_support::insert_user(&db, "bob", None).await;

        let mut guest_with_snapshot = test_support::order(UserRef::Guest);
        guest_with_snapshot.address = Some("221B Baker St".into());
        let mut snapshot_over_live = test_support::order(UserRef::Durable(bob.id));
        snapshot_over_live.username = Some("bobby".into());
        snapshot_over_live.phone = Some("555-1234".into());
        let mut dangling_with_snapshot = test_support::order(UserRef::Durable(uuid::Uuid::new_v4()));
        dangling_with_snapshot.username = Some("ghost".into());

        let fixtures = vec![
            test_support::order(UserRef::Durable(alice.id)),
            test_support::order(UserRef::Legacy("alice".into())),
            test_support::order(UserRef::Legacy("departed".into())),
            test_support::order(UserRef::Guest),
            guest_with_snapshot,
            snapshot_over_live,
            dangling_with_snapshot,
        ];
        let mut stored = Vec::new();
        for order in fixtures {
            stored.push(test_support::insert_order(&db, order).await);
        }

        let batch = OrderAssembler::attach_users(&db, stored.clone()).await;
        let mut single = Vec::new();
        for order in stored {
            single.push(OrderAssembler::attach_user(&db, order).await);
        }
        assert_eq!(batch, single);

        // durable et legacy pointent vers le même compte
        assert_eq!(batch[0].user, batch[1].user);
        assert_eq!(batch[0].user.as_ref().unwrap().id, Some(alice.id));
        assert_eq!(batch[2].user, None);
        assert_eq!(batch[3].user, None);
        assert_eq!(batch[4].user.as_ref().unwrap().name, "Guest");
        assert_eq!(batch[5].user.as_ref().unwrap().username, "bobby");
        assert_eq!(batch[5].user.as_ref().unwrap().email.as_deref(), Some("bob@example.com"));
        assert_eq!(batch[6].user.as_ref().unwrap().id, None);
        assert_eq!(batch[6].user.as_ref().unwrap().name, "ghost");
    }

    #[tokio::test]
    async fn live_address_is_a_display_fallback_only() {
        let db = test_support::memory_db().await;
        let user = test_support::insert_user(&db, "carol", Some("Old Address")).await;
        let order = test_support::insert_order(&db, test_support::order(UserRef::Durable(user.id))).await;

        let view = OrderAssembler::attach_user(&db, order.clone()).await;
        assert_eq!(view.user.unwrap().address.as_deref(), Some("Old Address"));
        assert_eq!(view.order.address, None);

        let json = serde_json::to_value(OrderAssembler::attach_user(&db, order).await).unwrap();
        assert!(json["address"].is_null());
        assert_eq!(json["user"]["address"], "Old Address");
    }

    #[tokio::test]
    async fn unknown_user_is_serialized_as_null() {
        let db = test_support::memory_db().await;
        let order = test_support::insert_order(&db, test_support::order(UserRef::Guest)).await;
        let json = serde_json::to_value(OrderAssembler::attach_user(&db, order).await).unwrap();
        assert!(json.as_object().unwrap().contains_key("user"));
        assert!(json["user"].is_null());
        assert_eq!(json["paymentStatus"], "not-applicable");
    }
}
