// Role gate for the back-office routes. Must be layered AFTER
// auth_middleware so the claims extension is already present.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

use crate::middleware::auth::Claims;

pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !claims.is_admin() {
        tracing::warn!(
            "Admin access denied for user {} ({}) with role {:?}",
            claims.user_id,
            claims.email,
            claims.role
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use crate::middleware::auth::Claims;
    use crate::models::user::UserRole;
    use uuid::Uuid;

    fn claims_with_role(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn customer_is_not_admin() {
        assert!(!claims_with_role(UserRole::Customer).is_admin());
    }

    #[test]
    fn admin_roles_pass_the_gate() {
        assert!(claims_with_role(UserRole::Admin).is_admin());
        assert!(claims_with_role(UserRole::Superadmin).is_admin());
    }
}
