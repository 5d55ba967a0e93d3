//! Account identifier resolution.
//!
//! Platform accounts provisioned for OIDC users are keyed by a synthetic email
//! of the form `<level>-<tenant>-<email>`, where the level comes from the
//! caller's `<tenant>-admin` / `<tenant>-user` realm role.

use super::IdentityError;
use crate::models::auth::OidcClaims;

/// Derive the platform account email for `claims` within `tenant`.
///
/// Admin wins over user when both roles are granted. A token without a
/// `realm_access` block fails before the tenant is looked at.
pub fn resolve_account_email(
    claims: &OidcClaims,
    tenant: Option<&str>,
) -> Result<String, IdentityError> {
    if claims.realm_access.is_none() {
        return Err(IdentityError::MissingRealmAccess);
    }

    let no_role = || IdentityError::NoMatchingRole {
        tenant: tenant.map(str::to_string),
    };
    let tenant = tenant.filter(|t| !t.is_empty()).ok_or_else(no_role)?;

    let has_role = |suffix: &str| {
        let wanted = format!("{tenant}-{suffix}");
        claims.roles().iter().any(|r| *r == wanted)
    };

    if has_role("admin") {
        Ok(format!("admin-{tenant}-{}", claims.email))
    } else if has_role("user") {
        Ok(format!("user-{tenant}-{}", claims.email))
    } else {
        Err(no_role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::RealmAccess;

    fn claims(roles: &[&str]) -> OidcClaims {
        OidcClaims {
            email: "jane@example.com".into(),
            realm_access: Some(RealmAccess {
                roles: roles.iter().map(|r| r.to_string()).collect(),
            }),
            sub: None,
            iss: None,
            exp: 0,
        }
    }

    #[test]
    fn admin_role_prefixes_admin() {
        let email = resolve_account_email(&claims(&["acme-admin"]), Some("acme")).unwrap();
        assert_eq!(email, "admin-acme-jane@example.com");
    }

    #[test]
    fn user_role_prefixes_user() {
        let email = resolve_account_email(&claims(&["acme-user"]), Some("acme")).unwrap();
        assert_eq!(email, "user-acme-jane@example.com");
    }

    #[test]
    fn admin_wins_over_user() {
        let email =
            resolve_account_email(&claims(&["acme-user", "acme-admin"]), Some("acme")).unwrap();
        assert_eq!(email, "admin-acme-jane@example.com");
    }

    #[test]
    fn role_for_other_tenant_does_not_match() {
        let err = resolve_account_email(&claims(&["globex-admin"]), Some("acme")).unwrap_err();
        assert!(matches!(err, IdentityError::NoMatchingRole { tenant: Some(t) } if t == "acme"));
    }

    #[test]
    fn missing_tenant_does_not_match() {
        assert!(resolve_account_email(&claims(&["acme-admin"]), None).is_err());
        assert!(resolve_account_email(&claims(&["-admin"]), Some("")).is_err());
    }

    #[test]
    fn missing_realm_access_is_its_own_failure() {
        let mut c = claims(&["acme-admin"]);
        c.realm_access = None;
        let err = resolve_account_email(&c, Some("acme")).unwrap_err();
        assert!(matches!(err, IdentityError::MissingRealmAccess));
        let err = resolve_account_email(&c, None).unwrap_err();
        assert!(matches!(err, IdentityError::MissingRealmAccess));
    }
}
