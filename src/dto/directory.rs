use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PickupPoint;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePickupPointRequest {
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickupPointList {
    pub items: Vec<PickupPoint>,
}
