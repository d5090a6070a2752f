use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    models::{CarStatus, current_year},
};

/// ListCarsQuery
///
/// The accepted query parameters for GET /cars, bound by Axum's Query
/// extractor. Everything arrives as an optional string; `CarFilters::build`
/// and `PaginationOptions::normalize` own the parsing and validation.
/// Unrecognized parameters are ignored by serde, which gives the endpoint its
/// allow-list semantics.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListCarsQuery {
    pub brand: Option<String>,
    pub car_model: Option<String>,
    pub year: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// Legacy page-local re-sort switch; see `handlers::get_cars`.
    pub sort: Option<String>,
}

/// CarFilters
///
/// The structured predicate built from a listing request. Text fields are
/// case-insensitive substring matches, year and status are exact, price is an
/// inclusive range. A pure value: building twice from the same input yields
/// the same filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarFilters {
    pub brand: Option<String>,
    pub car_model: Option<String>,
    pub year: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub status: Option<CarStatus>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub color: Option<String>,
}

// Empty string means "not provided".
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

impl CarFilters {
    /// build
    ///
    /// Turns the raw query parameters into a validated predicate. Numeric
    /// parameters that fail to parse or violate their range fail with a
    /// field-specific BadRequest; the first violation wins.
    pub fn build(query: &ListCarsQuery) -> Result<Self, ApiError> {
        let year = match non_empty(&query.year) {
            None => None,
            Some(raw) => {
                let y: i32 = raw
                    .parse()
                    .map_err(|_| ApiError::bad_request("Invalid year"))?;
                if !(1900..=current_year()).contains(&y) {
                    return Err(ApiError::bad_request("Invalid year"));
                }
                Some(y)
            }
        };

        let min_price = match non_empty(&query.min_price) {
            None => None,
            Some(raw) => {
                let p: f64 = raw
                    .parse()
                    .map_err(|_| ApiError::bad_request("Minimum price must be a number"))?;
                if p < 0.0 {
                    return Err(ApiError::bad_request("Minimum price cannot be negative"));
                }
                Some(p)
            }
        };

        let max_price = match non_empty(&query.max_price) {
            None => None,
            Some(raw) => {
                let p: f64 = raw
                    .parse()
                    .map_err(|_| ApiError::bad_request("Maximum price must be a number"))?;
                if p < 0.0 {
                    return Err(ApiError::bad_request("Maximum price cannot be negative"));
                }
                Some(p)
            }
        };

        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            return Err(ApiError::bad_request(
                "Minimum price cannot be greater than maximum price",
            ));
        }

        let status = match non_empty(&query.status) {
            None => None,
            Some(raw) => Some(
                raw.parse::<CarStatus>()
                    .map_err(|_| ApiError::bad_request("Invalid status value"))?,
            ),
        };

        Ok(Self {
            brand: non_empty(&query.brand),
            car_model: non_empty(&query.car_model),
            year,
            min_price,
            max_price,
            status,
            fuel_type: non_empty(&query.fuel_type),
            transmission: non_empty(&query.transmission),
            color: non_empty(&query.color),
        })
    }

    /// True when no filter was provided at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// matches
    ///
    /// Evaluates the predicate against a single record: the conjunction of
    /// every provided filter. Text filters are case-insensitive substring
    /// matches, year and status exact, price an inclusive range.
    pub fn matches(&self, car: &crate::models::Car) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        if let Some(brand) = &self.brand
            && !contains_ci(&car.brand, brand)
        {
            return false;
        }
        if let Some(model) = &self.car_model
            && !contains_ci(&car.car_model, model)
        {
            return false;
        }
        if let Some(fuel) = &self.fuel_type
            && !contains_ci(&car.fuel_type, fuel)
        {
            return false;
        }
        if let Some(transmission) = &self.transmission
            && !contains_ci(&car.transmission, transmission)
        {
            return false;
        }
        if let Some(color) = &self.color
            && !contains_ci(&car.color, color)
        {
            return false;
        }
        if let Some(year) = self.year
            && car.year != year
        {
            return false;
        }
        if let Some(min) = self.min_price
            && car.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && car.price > max
        {
            return false;
        }
        if let Some(status) = self.status
            && car.status != status
        {
            return false;
        }
        true
    }
}

/// SortKey
///
/// The closed set of sortable fields. The relational backend interpolates the
/// mapped column name into ORDER BY, so this set must stay closed; anything
/// outside it is a client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Price,
    Year,
    Mileage,
    Brand,
    CarModel,
    Status,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "price" => Some(Self::Price),
            "year" => Some(Self::Year),
            "mileage" => Some(Self::Mileage),
            "brand" => Some(Self::Brand),
            "carModel" => Some(Self::CarModel),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// The `cars` table column backing this key.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Price => "price",
            Self::Year => "year",
            Self::Mileage => "mileage",
            Self::Brand => "brand",
            Self::CarModel => "car_model",
            Self::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }
}

/// PaginationOptions
///
/// Normalized page/limit/sort parameters. Invalid values are a client error,
/// never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationOptions {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl PaginationOptions {
    /// normalize
    ///
    /// Applies defaults (page 1, limit 10, createdAt desc) and rejects
    /// out-of-range values.
    pub fn normalize(query: &ListCarsQuery) -> Result<Self, ApiError> {
        let page = match non_empty(&query.page) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    return Err(ApiError::bad_request("Page number must be greater than 0"));
                }
            },
        };

        let limit = match non_empty(&query.limit) {
            None => 10,
            Some(raw) => match raw.parse::<u32>() {
                Ok(l) if (1..=100).contains(&l) => l,
                _ => return Err(ApiError::bad_request("Limit must be between 1 and 100")),
            },
        };

        let sort_by = match non_empty(&query.sort_by) {
            None => SortKey::CreatedAt,
            Some(raw) => SortKey::parse(&raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Cannot sort by field '{raw}'")))?,
        };

        let sort_order = match non_empty(&query.sort_order).as_deref() {
            None => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => {
                return Err(ApiError::bad_request(
                    "Sort order must be either \"asc\" or \"desc\"",
                ));
            }
        };

        Ok(Self {
            page,
            limit,
            sort_by,
            sort_order,
        })
    }

    /// Never negative by construction since page >= 1. Widened to u64 so the
    /// multiplication cannot overflow for any accepted page/limit pair.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// PageMeta
///
/// Page-count metadata returned alongside every list response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    /// compute
    ///
    /// `totalPages = ceil(total / limit)` (0 when total is 0),
    /// `hasNext <=> page < totalPages`, `hasPrev <=> page > 1`.
    pub fn compute(total: u64, page: u32, limit: u32) -> Self {
        let total_pages = total.div_ceil(u64::from(limit)) as u32;
        Self {
            total,
            page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
