//! Authentication and account handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use forge_core::domain::Account;
use forge_core::ports::{AccountRepository, BaseRepository, PasswordService, TokenService};
use forge_infra::mask_email;
use forge_shared::dto::{
    AccountResponse, AddCreditsRequest, AuthResponse, CreditBalanceResponse, LoginRequest,
    RegisterRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn account_response(account: &Account) -> AccountResponse {
    AccountResponse {
        id: account.id.to_string(),
        name: account.name.clone(),
        email: account.email.clone(),
        credits: account.credits,
        role: account.role.clone(),
        created_at: account.created_at.to_rfc3339(),
    }
}

fn issue_token(token_service: &dyn TokenService, account: &Account) -> AppResult<AuthResponse> {
    let token =
        token_service.generate_token(account.id, &account.email, vec![account.role.clone()])?;

    Ok(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
        user: account_response(account),
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    Account::validate_registration(&req.email, &req.password)?;

    if state.accounts.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;
    let account = Account::new(
        req.name,
        &req.email,
        password_hash,
        state.credits.starting_credits,
    );
    // A concurrent registration for the same email surfaces as a constraint conflict here.
    let account = state.accounts.save(account).await?;

    tracing::info!(
        account_id = %account.id,
        email = %mask_email(&account.email),
        "Account registered"
    );

    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &account)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let account = state
        .accounts
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password_service.verify(&req.password, &account.password_hash)? {
        tracing::info!(email = %mask_email(&account.email), "Login rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &account)?))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let account = identity.account(&state).await?;
    Ok(HttpResponse::Ok().json(account_response(&account)))
}

/// POST /api/auth/add-credits
pub async fn add_credits(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<AddCreditsRequest>,
) -> AppResult<HttpResponse> {
    let amount = body.into_inner().amount;
    Account::validate_credit_grant(amount)?;

    let account = identity.account(&state).await?;
    let updated = state.accounts.add_credits(account.id, amount).await?;

    tracing::info!(
        account_id = %updated.id,
        added = amount,
        balance = updated.credits,
        "Credits added"
    );

    Ok(HttpResponse::Ok().json(CreditBalanceResponse {
        message: "Credits added successfully".to_string(),
        new_balance: updated.credits,
        added: amount,
    }))
}
