use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VehicleType {
    Bike,
    Scooter,
    Car,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub is_available: bool,
    pub current_location: Option<GeoPoint>,
    pub rating: f64,
    pub total_deliveries: u64,
    pub registered_at: DateTime<Utc>,
}

impl Partner {
    pub fn new(
        name: String,
        phone: String,
        vehicle_type: VehicleType,
        vehicle_number: String,
        rating: f64,
    ) -> Result<Self, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("name cannot be empty".to_string()));
        }

        if phone.trim().is_empty() {
            return Err(AppError::InvalidInput("phone cannot be empty".to_string()));
        }

        if vehicle_number.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "vehicle number cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            phone,
            vehicle_type,
            vehicle_number,
            is_available: true,
            current_location: None,
            rating: rating.clamp(0.0, 5.0),
            total_deliveries: 0,
            registered_at: Utc::now(),
        })
    }
}
