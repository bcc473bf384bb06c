use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    pub id: Uuid,
    pub title: String,
    pub price_per_night: i64,
}

impl Apartment {
    pub fn summary(&self) -> ApartmentSummary {
        ApartmentSummary {
            id: self.id,
            title: self.title.clone(),
            price_per_night: self.price_per_night,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentSummary {
    pub id: Uuid,
    pub title: String,
    pub price_per_night: i64,
}
