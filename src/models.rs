use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::Role,
    error::{ApiError, FieldError},
};

// --- Core Application Schemas (Mapped to Database) ---

/// CarStatus
///
/// Closed set of listing states. A car moves freely among these via update;
/// there is no enforced transition graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "car_status", rename_all = "lowercase")]
#[ts(export)]
pub enum CarStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Sold => "sold",
            CarStatus::Reserved => "reserved",
        }
    }
}

impl FromStr for CarStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CarStatus::Available),
            "sold" => Ok(CarStatus::Sold),
            "reserved" => Ok(CarStatus::Reserved),
            _ => Err(()),
        }
    }
}

/// User
///
/// The canonical identity record resolved during authentication. Token
/// subjects that do not map to one of these rows are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // The RBAC field: admin, manager, or sales.
    pub role: Role,
}

/// Car
///
/// A vehicle listing from the `cars` table. This is the primary data structure
/// for the core business logic. Wire names are camelCase (`carModel`,
/// `fuelType`, ...) for compatibility with the existing API consumers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Car {
    // Assigned at creation, immutable for the record's lifetime.
    pub id: Uuid,
    pub brand: String,
    pub car_model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: f64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub status: CarStatus,
    pub features: Vec<String>,
    pub images: Vec<String>,

    // Timestamp handling for database integration and JSON serialization.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// CreateCarRequest
///
/// Input payload for submitting a new listing (POST /cars). Every field is
/// optional at the deserialization boundary so that `validate` can name *all*
/// missing or invalid fields in a single response instead of letting serde
/// reject the body at the first absence.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCarRequest {
    pub brand: Option<String>,
    pub car_model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub mileage: Option<f64>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    // Optional; defaults to "available". Validated against the closed enum.
    pub status: Option<String>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// UpdateCarRequest
///
/// Partial update payload for modifying an existing listing (PUT /cars/{id}).
/// One optional field per attribute; absent, null, and empty-string values are
/// all dropped from the update rather than written through.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateCarRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// --- Validated Forms (Internal) ---

/// NewCar
///
/// A create payload that has passed validation: every required field present
/// and non-empty, every numeric field in range, status resolved to the enum.
#[derive(Debug, Clone)]
pub struct NewCar {
    pub brand: String,
    pub car_model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: f64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub status: CarStatus,
    pub features: Vec<String>,
    pub images: Vec<String>,
}

/// CarPatch
///
/// A sanitized, validated partial update. Only fields that survived the
/// drop-null/empty pass are `Some`; construction fails if nothing survives.
#[derive(Debug, Clone, Default)]
pub struct CarPatch {
    pub brand: Option<String>,
    pub car_model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub mileage: Option<f64>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub status: Option<CarStatus>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl CarPatch {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.car_model.is_none()
            && self.year.is_none()
            && self.price.is_none()
            && self.mileage.is_none()
            && self.color.is_none()
            && self.fuel_type.is_none()
            && self.transmission.is_none()
            && self.status.is_none()
            && self.features.is_none()
            && self.images.is_none()
    }
}

// --- Validation ---

/// The latest model year accepted on any write.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Pulls a required text field, recording an error when it is absent or blank.
/// The placeholder value never escapes: callers return Err when any error was
/// recorded.
fn require_text(
    value: Option<String>,
    field: &'static str,
    message: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.push(FieldError::new(field, message));
            String::new()
        }
    }
}

impl CreateCarRequest {
    /// validate
    ///
    /// Checks every field rule and accumulates all violations, so a payload
    /// missing three fields with a bad year reports four errors at once.
    pub fn validate(self) -> Result<NewCar, Vec<FieldError>> {
        let mut errors = Vec::new();

        let brand = require_text(self.brand, "brand", "Brand is required", &mut errors);
        let car_model = require_text(self.car_model, "carModel", "Model is required", &mut errors);
        let color = require_text(self.color, "color", "Color is required", &mut errors);
        let fuel_type = require_text(
            self.fuel_type,
            "fuelType",
            "Fuel type is required",
            &mut errors,
        );
        let transmission = require_text(
            self.transmission,
            "transmission",
            "Transmission is required",
            &mut errors,
        );

        let year = match self.year {
            Some(y) if (1900..=current_year()).contains(&y) => y,
            _ => {
                errors.push(FieldError::new("year", "Please enter a valid year"));
                0
            }
        };
        let price = match self.price {
            Some(p) if p >= 0.0 => p,
            _ => {
                errors.push(FieldError::new("price", "Price must be a positive number"));
                0.0
            }
        };
        let mileage = match self.mileage {
            Some(m) if m >= 0.0 => m,
            _ => {
                errors.push(FieldError::new(
                    "mileage",
                    "Mileage must be a positive number",
                ));
                0.0
            }
        };

        // Absent and blank both mean "use the default".
        let status = match self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            None => CarStatus::default(),
            Some(s) => s.parse().unwrap_or_else(|_| {
                errors.push(FieldError::new("status", "Invalid status value"));
                CarStatus::default()
            }),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewCar {
            brand,
            car_model,
            year,
            price,
            mileage,
            color,
            fuel_type,
            transmission,
            status,
            features: self.features.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
        })
    }
}

impl UpdateCarRequest {
    /// into_patch
    ///
    /// Drops absent/null/empty-string fields, rejects the update when nothing
    /// remains, then re-validates whatever is present with the same rules as
    /// create.
    pub fn into_patch(self) -> Result<CarPatch, ApiError> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let status_raw = self.status.filter(|s| !s.trim().is_empty());

        let patch = CarPatch {
            brand: non_blank(self.brand),
            car_model: non_blank(self.car_model),
            year: self.year,
            price: self.price,
            mileage: self.mileage,
            color: non_blank(self.color),
            fuel_type: non_blank(self.fuel_type),
            transmission: non_blank(self.transmission),
            status: None,
            features: self.features,
            images: self.images,
        };

        if patch.is_empty() && status_raw.is_none() {
            return Err(ApiError::bad_request("No valid fields provided for update"));
        }

        let mut errors = Vec::new();

        if let Some(y) = patch.year
            && !(1900..=current_year()).contains(&y)
        {
            errors.push(FieldError::new("year", "Please enter a valid year"));
        }
        if let Some(p) = patch.price
            && p < 0.0
        {
            errors.push(FieldError::new("price", "Price must be a positive number"));
        }
        if let Some(m) = patch.mileage
            && m < 0.0
        {
            errors.push(FieldError::new(
                "mileage",
                "Mileage must be a positive number",
            ));
        }

        let status = match status_raw.as_deref() {
            None => None,
            Some(s) => match s.parse::<CarStatus>() {
                Ok(st) => Some(st),
                Err(()) => {
                    errors.push(FieldError::new("status", "Invalid status value"));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(CarPatch { status, ..patch })
    }
}

/// --- Profile Schema (Output) ---

/// Profile
///
/// Output schema for the authenticated principal's own record (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}
