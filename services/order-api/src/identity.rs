use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use order_service::Actor;
use uuid::Uuid;

use crate::error::{bad_request, forbidden, ApiRejection};

/// Caller identity forwarded by the authenticating gateway. The core trusts
/// these headers; token verification happens before requests reach us.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub customer_id: Option<Uuid>,
    pub roles: Vec<String>,
}

impl CallerIdentity {
    pub fn actor(&self) -> Actor {
        Actor::new(self.customer_id, self.roles.clone())
    }

    pub fn require_customer(&self) -> Result<Uuid, ApiRejection> {
        self.customer_id
            .ok_or_else(|| bad_request("Missing x-customer-id header"))
    }

    pub fn require_admin(&self) -> Result<(), ApiRejection> {
        if self.actor().is_admin() {
            Ok(())
        } else {
            Err(forbidden("Admin role required"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = match parts.headers.get("x-customer-id") {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| bad_request("Invalid x-customer-id header"))?;
                Some(
                    Uuid::parse_str(raw)
                        .map_err(|_| bad_request("Invalid x-customer-id header"))?,
                )
            }
            None => None,
        };

        let roles = parts
            .headers
            .get("x-roles")
            .and_then(|value| value.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(|role| role.trim().to_string())
                    .filter(|role| !role.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { customer_id, roles })
    }
}
