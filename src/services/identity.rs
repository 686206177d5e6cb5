// ============================================================================
// SERVICE : RÉSOLUTION D'IDENTITÉ
// ============================================================================
//
// Une commande référence son client de trois façons selon son âge:
//   - Durable(uuid)   : id du compte (format actuel)
//   - Legacy(texte)   : ancien identifiant texte, en pratique un username
//   - Guest           : aucune identité, seulement le snapshot de la commande
//
// `UserRef::classify` est le seul endroit qui décide du format, à l'écriture
// (création de commande) comme à la lecture.
//
// Une résolution qui échoue n'est jamais une erreur de requête: le compte est
// simplement considéré comme introuvable (warn dans les logs).
//
// ============================================================================

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::dto::UserSummary;
use crate::models::{orders, users};
use crate::services::lookup::{first_match, LookupStrategy};

const GUEST_NAME: &str = "Guest";
const GUEST_USERNAME: &str = "guest";

/// Seule la forme canonique (36 caractères avec tirets) est un id durable;
/// 32 hex, accolades ou `urn:uuid:` restent des usernames
fn durable_id(token: &str) -> Option<Uuid> {
    if token.len() != 36 {
        return None;
    }
    Uuid::try_parse(token).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    Durable(Uuid),
    Legacy(String),
    Guest,
}

impl UserRef {
    /// Classe un jeton brut: UUID => Durable, texte non vide => Legacy, sinon Guest
    pub fn classify(token: Option<&str>) -> Self {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => UserRef::Guest,
            Some(t) => match durable_id(t) {
                Some(id) => UserRef::Durable(id),
                None => UserRef::Legacy(t.to_string()),
            },
        }
    }

    /// Reconstruit la référence depuis les deux colonnes de `orders`
    pub fn from_columns(user_id: Option<Uuid>, legacy_user: Option<&str>) -> Self {
        if let Some(id) = user_id {
            return UserRef::Durable(id);
        }
        match legacy_user.map(str::trim).filter(|t| !t.is_empty()) {
            Some(name) => UserRef::Legacy(name.to_string()),
            None => UserRef::Guest,
        }
    }

    /// (user_id, legacy_user): jamais les deux à la fois
    pub fn into_columns(self) -> (Option<Uuid>, Option<String>) {
        match self {
            UserRef::Durable(id) => (Some(id), None),
            UserRef::Legacy(name) => (None, Some(name)),
            UserRef::Guest => (None, None),
        }
    }

    /// Recherche utilisée sur le chemin des requêtes (identique au mode batch)
    fn primary_lookup(&self) -> Option<UserLookup> {
        match self {
            UserRef::Durable(id) => Some(UserLookup::ById(*id)),
            UserRef::Legacy(name) => Some(UserLookup::ByUsername(name.clone())),
            UserRef::Guest => None,
        }
    }

    /// Chaîne complète: id puis username (jobs de réparation)
    fn lookup_chain(&self) -> Vec<UserLookup> {
        match self {
            UserRef::Durable(id) => vec![
                UserLookup::ById(*id),
                UserLookup::ByUsername(id.to_string()),
            ],
            UserRef::Legacy(name) => vec![UserLookup::ByUsername(name.clone())],
            UserRef::Guest => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum UserLookup {
    ById(Uuid),
    ByUsername(String),
}

#[async_trait]
impl LookupStrategy for UserLookup {
    type Output = users::Model;

    async fn find(&self, db: &DatabaseConnection) -> Result<Option<users::Model>, DbErr> {
        match self {
            UserLookup::ById(id) => users::Entity::find_by_id(*id).one(db).await,
            UserLookup::ByUsername(name) => {
                users::Entity::find()
                    .filter(users::Column::Username.eq(name.as_str()))
                    .one(db)
                    .await
            }
        }
    }
}

/// Comptes chargés en lot, indexés par id et par username
#[derive(Debug, Default)]
pub struct ResolvedAccounts {
    by_id: HashMap<Uuid, users::Model>,
    by_username: HashMap<String, users::Model>,
}

impl ResolvedAccounts {
    pub fn get(&self, user_ref: &UserRef) -> Option<&users::Model> {
        match user_ref {
            UserRef::Durable(id) => self.by_id.get(id),
            UserRef::Legacy(name) => self.by_username.get(name),
            UserRef::Guest => None,
        }
    }
}

pub struct IdentityService;

impl IdentityService {
    /// Résout une référence unique (une requête au plus)
    pub async fn resolve(db: &DatabaseConnection, user_ref: &UserRef) -> Option<users::Model> {
        let lookup = user_ref.primary_lookup()?;
        match lookup.find(db).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(?user_ref, error = %e, "identity resolution failed");
                None
            }
        }
    }

    /// Résout avec repli id -> username
    pub async fn resolve_with_fallback(
        db: &DatabaseConnection,
        user_ref: &UserRef,
    ) -> Option<users::Model> {
        match first_match(db, &user_ref.lookup_chain()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(?user_ref, error = %e, "identity resolution failed");
                None
            }
        }
    }

    /// Résout N références avec au plus deux requêtes:
    /// une `id IN (...)` et une `username IN (...)`
    pub async fn resolve_many<'a, I>(db: &DatabaseConnection, refs: I) -> ResolvedAccounts
    where
        I: IntoIterator<Item = &'a UserRef>,
    {
        let mut ids: HashSet<Uuid> = HashSet::new();
        let mut usernames: HashSet<String> = HashSet::new();
        for user_ref in refs {
            match user_ref {
                UserRef::Durable(id) => {
                    ids.insert(*id);
                }
                UserRef::Legacy(name) => {
                    usernames.insert(name.clone());
                }
                UserRef::Guest => {}
            }
        }

        let mut resolved = ResolvedAccounts::default();

        if !ids.is_empty() {
            match users::Entity::find()
                .filter(users::Column::Id.is_in(ids))
                .all(db)
                .await
            {
                Ok(found) => {
                    resolved.by_id = found.into_iter().map(|u| (u.id, u)).collect();
                }
                Err(e) => tracing::warn!(error = %e, "batch identity resolution by id failed"),
            }
        }

        if !usernames.is_empty() {
            match users::Entity::find()
                .filter(users::Column::Username.is_in(usernames))
                .all(db)
                .await
            {
                Ok(found) => {
                    resolved.by_username =
                        found.into_iter().map(|u| (u.username.clone(), u)).collect();
                }
                Err(e) => tracing::warn!(error = %e, "batch identity resolution by username failed"),
            }
        }

        resolved
    }

    /// Fusionne le snapshot de la commande avec le compte live
    ///
    /// - compte trouvé: snapshot prioritaire (username, phone, address), email toujours live
    /// - pas de compte mais snapshot (username ou address): résumé "Guest"
    /// - sinon: None
    pub fn summarize(order: &orders::Model, account: Option<&users::Model>) -> Option<UserSummary> {
        let snap_username = non_blank(order.username.as_deref());
        let snap_phone = non_blank(order.phone.as_deref());
        let snap_address = non_blank(order.address.as_deref());

        if let Some(user) = account {
            return Some(UserSummary {
                id: Some(user.id),
                name: snap_username.unwrap_or(&user.name).to_string(),
                username: snap_username.unwrap_or(&user.username).to_string(),
                email: Some(user.email.clone()),
                phone: snap_phone.or(user.phone.as_deref()).map(str::to_string),
                address: snap_address.or(user.address.as_deref()).map(str::to_string),
            });
        }

        if snap_username.is_none() && snap_address.is_none() {
            return None;
        }

        Some(UserSummary {
            id: None,
            name: snap_username.unwrap_or(GUEST_NAME).to_string(),
            username: snap_username.unwrap_or(GUEST_USERNAME).to_string(),
            email: None,
            phone: snap_phone.map(str::to_string),
            address: snap_address.map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
