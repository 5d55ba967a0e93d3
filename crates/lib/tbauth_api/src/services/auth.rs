//! OIDC login: verify → resolve → look up → mint.

use tbauth_core::auth::LoginError;
use tbauth_core::auth::identity::resolve_account_email;
use tbauth_core::auth::queries::find_user_by_email;
use tbauth_core::models::auth::LoginResult;
use tracing::info;

use crate::AppState;

/// Exchange an identity provider access token for a platform session.
pub async fn oidc_login(
    state: &AppState,
    token: &str,
    tenant: Option<&str>,
) -> Result<LoginResult, LoginError> {
    let claims = state.keys.verify(token).await?;
    let email = resolve_account_email(&claims, tenant)?;
    let user = find_user_by_email(state.users.as_ref(), &email).await?;
    let result = state.minter.mint(&user)?;

    info!(user_id = %user.id, tenant = tenant.unwrap_or_default(), "OIDC login succeeded");
    Ok(result)
}
