use axum::{
    extract::{Path, State},
    Json,
};
use domain::order::Order;
use uuid::Uuid;

use crate::error::{map_service_error, ApiRejection};
use crate::state::AppState;

/// Get a single order by ID
pub async fn handle(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiRejection> {
    let order = state
        .service
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    #[test]
    fn test_order_id_parsing() {
        let id = Uuid::new_v4();
        let parsed = Uuid::parse_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
