//! Startup data: the initial admin account.

use learnhub_auth::User;
use learnhub_auth::middleware::types::ADMIN_ROLE;
use learnhub_auth::password::hash_password;
use tracing::info;

use crate::config::AdminUserConfig;
use crate::state::AppState;

/// Creates the configured admin account unless an account already uses its
/// email. Returns `true` if an account was created.
pub async fn bootstrap_admin_user(
    state: &AppState,
    admin: &AdminUserConfig,
) -> anyhow::Result<bool> {
    if let Some(existing) = state.auth.users.find_by_email(&admin.email).await? {
        info!(subject = %existing.id, "Admin account already present, skipping bootstrap");
        return Ok(false);
    }

    let user = User::builder(admin.name.trim(), admin.email.trim())
        .password_hash(hash_password(&admin.password)?)
        .role(ADMIN_ROLE)
        .verified()
        .build();
    let user = state.auth.users.create(user).await?;
    info!(subject = %user.id, "Admin account created");
    Ok(true)
}
