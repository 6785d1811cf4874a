use axum::{extract::State, http::{HeaderMap, StatusCode}, response::IntoResponse, Json};
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;

use crate::api::dtos::requests::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::api::dtos::responses::{InviteResponse, LoginResponse, RefreshResponse, RegisterResponse};
use crate::api::extractors::auth::OwnerUser;
use crate::api::handlers::{client_ip, log_activity};
use crate::background::BackgroundJob;
use crate::domain::models::invite::Invite;
use crate::domain::models::user::{User, ROLE_EMPLOYEE, ROLE_OWNER};
use crate::error::AppError;
use crate::state::AppState;

const REFRESH_COOKIE: &str = "refresh_token";

pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.password != payload.password_confirm {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    if state.user_repo.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    // An invite grants the employee role; without one the caller becomes
    // an owner. Invalid or used codes fail registration entirely.
    let role = match &payload.invite {
        Some(code) if !code.trim().is_empty() => {
            if !state.invite_repo.consume(code.trim()).await? {
                return Err(AppError::Validation("Invalid or expired invite code".to_string()));
            }
            ROLE_EMPLOYEE
        }
        _ => ROLE_OWNER,
    };

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let user = User::new(payload.email.clone(), payload.name.clone(), password_hash, role.to_string());
    let created = state.user_repo.create(&user).await?;

    info!("Registered user {} with role {}", created.id, created.role);

    let _ = state.jobs.send(BackgroundJob::SendWelcomeMail {
        recipient: created.email.clone(),
        display_name: created.display_name(),
    });
    log_activity(&state, &created.email, "register", None, client_ip(&headers)).await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!("User registered successfully with role {role}"),
            role: role.to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repo
        .find_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    state.auth_service.verify_password(&payload.password, &user.password_hash)?;

    let access_token = state.auth_service.issue_access_token(&user.email)?;
    let refresh_token = state.auth_service.issue_refresh_token(&user.email)?;

    set_refresh_cookie(&cookies, &refresh_token);

    info!("User logged in: {}", user.id);
    log_activity(&state, &user.email, "login", None, client_ip(&headers)).await;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        display_name: user.display_name(),
    }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies.get(REFRESH_COOKIE).ok_or(AppError::Unauthorized)?;
    let claims = state.auth_service.verify_refresh(refresh_cookie.value())?;

    let user = state
        .user_repo
        .find_by_email(&claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let access_token = state.auth_service.issue_access_token(&user.email)?;

    info!("Token refreshed for user: {}", user.id);

    Ok(Json(RefreshResponse {
        access_token,
        user_email: user.email.clone(),
        display_name: user.display_name(),
    }))
}

pub async fn logout(cookies: Cookies) -> Result<impl IntoResponse, AppError> {
    cookies.remove(Cookie::build((REFRESH_COOKIE, "")).path("/").into());

    info!("User logged out");

    Ok(Json(serde_json::json!({ "message": "Logout successful" })))
}

/// Consumes an unused invite code as the authorization to set a new
/// password.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repo
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found for that email".to_string()))?;

    if !state.invite_repo.consume(payload.code.trim()).await? {
        return Err(AppError::Validation("Invalid or expired invite code".to_string()));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    state.user_repo.update_password(&user.id, &password_hash).await?;

    info!("Password reset for user: {}", user.id);

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    OwnerUser(user): OwnerUser,
) -> Result<impl IntoResponse, AppError> {
    let code = state.auth_service.generate_invite_code();
    let invite = Invite::new(code.clone(), user.id.clone());
    state.invite_repo.create(&invite).await?;

    info!("Invite created by {}", user.id);

    Ok(Json(InviteResponse {
        invite_link: format!("{}/register?invite={}", state.config.public_base_url, code),
        code,
    }))
}

fn set_refresh_cookie(cookies: &Cookies, refresh: &str) {
    let mut cookie = Cookie::new(REFRESH_COOKIE, refresh.to_string());
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(Duration::days(7));
    cookies.add(cookie);
}
