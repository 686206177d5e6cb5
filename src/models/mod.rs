// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Liste des modules:
//   - health : Health check API
//   - users : Comptes clients (username et email uniques)
//   - orders : Commandes (snapshot client, statut, paiement)
//   - products : Catalogue
//   - cart_items : Panier persistant
//   - dto : Requêtes / réponses de l'API commandes
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les ids durables sont des UUID v4 générés côté service
//
// ============================================================================

pub mod health;
pub mod users;
pub mod orders;
pub mod products;
pub mod cart_items;
pub mod dto;
