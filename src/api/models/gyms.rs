//! API models for gyms.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::gyms::Gym;
use crate::types::GymId;

/// Public gym summary embedded in booking responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: GymId,
    pub name: String,
    pub city: String,
    pub country: String,
    pub currency: String,
    pub is_verified: bool,
}

impl From<Gym> for GymSummary {
    fn from(gym: Gym) -> Self {
        Self {
            id: gym.id,
            name: gym.name,
            city: gym.city,
            country: gym.country,
            currency: gym.currency,
            is_verified: gym.is_verified,
        }
    }
}
