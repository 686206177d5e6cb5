use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::users::{self, ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users};
use crate::services::identity::UserRef;
use crate::settings::Settings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::jwt::TokenService;
use crate::utils::password;

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour changer le mot de passe
#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

// Réponse après signup/login
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: users::Model,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

fn issue_token(tokens: &TokenService, user: &users::Model) -> AppResult<String> {
    tokens
        .generate_token(user.id, &user.email, &user.username)
        .map_err(AppError::Internal)
}

/// POST /api/auth/signup - Créer un compte (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
    tokens: web::Data<TokenService>,
) -> AppResult<HttpResponse> {
    // Normaliser avant de valider: "   " doit échouer comme ""
    let mut body = body.into_inner();
    body.name = body.name.trim().to_string();
    body.username = body.username.trim().to_string();
    body.email = body.email.trim().to_lowercase();
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Un username au format id serait classé Durable sur les commandes
    if matches!(UserRef::classify(Some(&body.username)), UserRef::Durable(_)) {
        return Err(AppError::validation("Username cannot be a user id"));
    }

    let username = body.username;
    let email = body.email;

    // 1. Vérifier si le username ou l'email existe déjà
    let existing = Users::find()
        .filter(
            Condition::any()
                .add(UserColumn::Username.eq(username.as_str()))
                .add(UserColumn::Email.eq(email.as_str())),
        )
        .one(db.get_ref())
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username or email already exists".into()));
    }

    // 2. Hash le mot de passe
    let password_hash =
        password::hash_password(&body.password).map_err(|e| AppError::Internal(e.to_string()))?;

    // 3. Créer l'utilisateur (une violation d'unicité concurrente devient un 409)
    let now = Utc::now();
    let user = UserActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(body.name),
        username: Set(username),
        email: Set(email),
        phone: Set(body.phone),
        address: Set(body.address),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db.get_ref())
    .await?;

    tracing::info!(user_id = %user.id, "account created");

    let token = issue_token(&tokens, &user)?;
    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// POST /api/auth/login - Se connecter par email (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    tokens: web::Data<TokenService>,
) -> AppResult<HttpResponse> {
    let user = Users::find()
        .filter(UserColumn::Email.eq(body.email.trim().to_lowercase()))
        .one(db.get_ref())
        .await?
        .ok_or_else(invalid_credentials)?;

    // Un hash illisible est traité comme un mauvais mot de passe
    let is_valid = password::verify_password(&body.password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "stored password hash unreadable");
        false
    });
    if !is_valid {
        return Err(invalid_credentials());
    }

    let token = issue_token(&tokens, &user)?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

/// GET /api/auth/me - Compte courant (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let user = Users::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/auth/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // 1. Récupérer l'utilisateur
    let user = Users::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // 2. Vérifier l'ancien mot de passe
    let is_valid = password::verify_password(&body.current_password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !is_valid {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    // 3. Hasher et enregistrer le nouveau mot de passe
    let new_hash =
        password::hash_password(&body.new_password).map_err(|e| AppError::Internal(e.to_string()))?;
    let mut active_model: UserActiveModel = user.into();
    active_model.password_hash = Set(new_hash);
    active_model.update(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

/// GET /api/auth/users - Liste des comptes, sans hash
#[get("/users")]
pub async fn list_users(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let users = Users::find()
        .order_by_asc(UserColumn::CreatedAt)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/auth/is-admin (PROTÉGÉE)
#[get("/is-admin")]
pub async fn is_admin(auth_user: AuthUser, settings: web::Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "isAdmin": settings.is_admin(&auth_user.email)
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(me)
            .service(change_password)
            .service(list_users)
            .service(is_admin),
    );
}
