/// /api/auth endpoints: login, registration, logout
use crate::{
    account::{LoginRequest, RegisterRequest, RegistrationState, RegistrationToggle},
    auth::{removal_cookie, session_cookie, AuthUser},
    context::AppContext,
    db::models::User,
    error::{EthosError, EthosResult},
    settings::verify_admin_password,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/disable-registration", post(toggle_registration))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// Check credentials and set the session cookie
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> EthosResult<(CookieJar, Json<User>)> {
    let session = ctx.account_manager.login(&req.username, &req.password).await?;
    tracing::info!(user_id = session.user.id, "user logged in");

    let jar = jar.add(session_cookie(&ctx.config.authentication, session.token));
    Ok((jar, Json(session.user)))
}

/// Create an account while registration is open, then log it in
async fn register(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> EthosResult<(StatusCode, CookieJar, Json<User>)> {
    if !ctx.settings.is_registration_enabled().await? {
        tracing::debug!("register: rejected, registration disabled");
        return Err(EthosError::RegistrationDisabled);
    }

    req.validate()?;

    let user = ctx.account_manager.create_user(&req.username, &req.password).await?;
    let token = ctx.account_manager.issue_token(user.id)?;

    let jar = jar.add(session_cookie(&ctx.config.authentication, token));
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// Open or close self-service registration with the admin secret
async fn toggle_registration(
    State(ctx): State<AppContext>,
    Json(req): Json<RegistrationToggle>,
) -> EthosResult<Json<RegistrationState>> {
    if !verify_admin_password(&req.admin_password, &ctx.config.authentication.admin_secret) {
        tracing::warn!("registration toggle rejected: bad admin password");
        return Err(EthosError::Authentication("Invalid admin password".to_string()));
    }

    let registration_enabled = ctx.settings.set_registration_enabled(req.enabled).await?;
    Ok(Json(RegistrationState { registration_enabled }))
}

/// Drop the session cookie
async fn logout(State(ctx): State<AppContext>, jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(removal_cookie(&ctx.config.authentication));
    (jar, Json(serde_json::json!({ "ok": true })))
}

async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}
