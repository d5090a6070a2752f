use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{Car, CarPatch, NewCar, User},
    query::{CarFilters, PaginationOptions, SortKey},
};

/// CarPage
///
/// One page of matching records plus the count of *all* matches, taken over
/// the filtered set before pagination.
#[derive(Debug)]
pub struct CarPage {
    pub cars: Vec<Car>,
    pub total: u64,
}

/// CarStore Trait
///
/// The abstract contract for all persistence operations. Handlers interact
/// with the data layer through this trait without knowing the concrete
/// implementation (Postgres, in-memory, ...).
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn CarStore>`)
/// safely shareable across Axum's asynchronous task boundaries. Every write is
/// a single atomic statement against one record; the count-then-fetch pair in
/// `list_cars` is not snapshot-isolated.
#[async_trait]
pub trait CarStore: Send + Sync {
    // --- Car CRUD ---
    /// Assigns identity and timestamps, persists, returns the full record.
    async fn create_car(&self, new: NewCar) -> Result<Car, StoreError>;
    /// Applies the filter predicate conjunctively, sorts, paginates, and
    /// separately counts the total matches.
    async fn list_cars(
        &self,
        filters: &CarFilters,
        page: &PaginationOptions,
    ) -> Result<CarPage, StoreError>;
    async fn get_car(&self, id: Uuid) -> Result<Option<Car>, StoreError>;
    /// Applies only the fields present in the patch; `None` when the id does
    /// not resolve to an existing record.
    async fn update_car(&self, id: Uuid, patch: CarPatch) -> Result<Option<Car>, StoreError>;
    /// Returns true if a row was deleted.
    async fn delete_car(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

/// StoreState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type StoreState = Arc<dyn CarStore>;

const CAR_COLUMNS: &str = "id, brand, car_model, year, price, mileage, color, fuel_type, \
     transmission, status, features, images, created_at, updated_at";

/// PostgresCarStore
///
/// The concrete implementation of the `CarStore` trait, backed by PostgreSQL.
/// All queries are built at runtime with bound parameters; the only
/// interpolated fragments are the allow-listed sort column and direction.
pub struct PostgresCarStore {
    pool: PgPool,
}

impl PostgresCarStore {
    /// Creates a new store instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the WHERE fragments for every provided filter. Shared between the
/// page query and the count query so the two always agree on the predicate.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &CarFilters) {
    if let Some(brand) = &filters.brand {
        builder.push(" AND brand ILIKE ");
        builder.push_bind(format!("%{brand}%"));
    }
    if let Some(model) = &filters.car_model {
        builder.push(" AND car_model ILIKE ");
        builder.push_bind(format!("%{model}%"));
    }
    if let Some(fuel) = &filters.fuel_type {
        builder.push(" AND fuel_type ILIKE ");
        builder.push_bind(format!("%{fuel}%"));
    }
    if let Some(transmission) = &filters.transmission {
        builder.push(" AND transmission ILIKE ");
        builder.push_bind(format!("%{transmission}%"));
    }
    if let Some(color) = &filters.color {
        builder.push(" AND color ILIKE ");
        builder.push_bind(format!("%{color}%"));
    }
    if let Some(year) = filters.year {
        builder.push(" AND year = ");
        builder.push_bind(year);
    }
    if let Some(min) = filters.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filters.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max);
    }
    if let Some(status) = filters.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

#[async_trait]
impl CarStore for PostgresCarStore {
    /// create_car
    ///
    /// Inserts a validated listing. Identity and both timestamps are assigned
    /// here; a single atomic INSERT.
    async fn create_car(&self, new: NewCar) -> Result<Car, StoreError> {
        let id = Uuid::new_v4();
        let car = sqlx::query_as::<_, Car>(
            "INSERT INTO cars (id, brand, car_model, year, price, mileage, color, fuel_type, \
             transmission, status, features, images, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now()) \
             RETURNING id, brand, car_model, year, price, mileage, color, fuel_type, \
             transmission, status, features, images, created_at, updated_at",
        )
        .bind(id)
        .bind(new.brand)
        .bind(new.car_model)
        .bind(new.year)
        .bind(new.price)
        .bind(new.mileage)
        .bind(new.color)
        .bind(new.fuel_type)
        .bind(new.transmission)
        .bind(new.status)
        .bind(new.features)
        .bind(new.images)
        .fetch_one(&self.pool)
        .await?;
        Ok(car)
    }

    /// list_cars
    ///
    /// Implements the dynamic filter composition with QueryBuilder for safe
    /// parameterization. The count runs over the same predicate before
    /// LIMIT/OFFSET, so `total` reflects all matches, not just the returned
    /// page.
    async fn list_cars(
        &self,
        filters: &CarFilters,
        page: &PaginationOptions,
    ) -> Result<CarPage, StoreError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM cars WHERE 1=1");
        push_filters(&mut count_builder, filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CAR_COLUMNS} FROM cars WHERE 1=1"));
        push_filters(&mut builder, filters);
        // sort_by/sort_order come from the closed SortKey/SortOrder sets, so
        // interpolating them here cannot inject.
        builder.push(format!(
            " ORDER BY {} {}",
            page.sort_by.column(),
            page.sort_order.sql()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(page.limit));
        builder.push(" OFFSET ");
        builder.push_bind(page.offset() as i64);

        let cars = builder
            .build_query_as::<Car>()
            .fetch_all(&self.pool)
            .await?;

        Ok(CarPage {
            cars,
            total: total.max(0) as u64,
        })
    }

    async fn get_car(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        let car =
            sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(car)
    }

    /// update_car
    ///
    /// Builds the SET list from only the fields present in the patch, bumps
    /// `updated_at`, and RETURNs the post-update row. A single atomic UPDATE.
    async fn update_car(&self, id: Uuid, patch: CarPatch) -> Result<Option<Car>, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE cars SET ");
        {
            let mut set = builder.separated(", ");
            set.push("updated_at = now()");
            if let Some(brand) = patch.brand {
                set.push("brand = ");
                set.push_bind_unseparated(brand);
            }
            if let Some(model) = patch.car_model {
                set.push("car_model = ");
                set.push_bind_unseparated(model);
            }
            if let Some(year) = patch.year {
                set.push("year = ");
                set.push_bind_unseparated(year);
            }
            if let Some(price) = patch.price {
                set.push("price = ");
                set.push_bind_unseparated(price);
            }
            if let Some(mileage) = patch.mileage {
                set.push("mileage = ");
                set.push_bind_unseparated(mileage);
            }
            if let Some(color) = patch.color {
                set.push("color = ");
                set.push_bind_unseparated(color);
            }
            if let Some(fuel) = patch.fuel_type {
                set.push("fuel_type = ");
                set.push_bind_unseparated(fuel);
            }
            if let Some(transmission) = patch.transmission {
                set.push("transmission = ");
                set.push_bind_unseparated(transmission);
            }
            if let Some(status) = patch.status {
                set.push("status = ");
                set.push_bind_unseparated(status);
            }
            if let Some(features) = patch.features {
                set.push("features = ");
                set.push_bind_unseparated(features);
            }
            if let Some(images) = patch.images {
                set.push("images = ");
                set.push_bind_unseparated(images);
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {CAR_COLUMNS}"));

        let car = builder
            .build_query_as::<Car>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn delete_car(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_user
    ///
    /// Retrieves the identity record (id, email, role) needed for
    /// authentication and authorization.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// InMemoryCarStore
///
/// An in-process implementation of `CarStore` used by unit and integration
/// tests. It implements the full filter/sort/paginate semantics over a locked
/// map, which lets the whole HTTP surface be exercised without a database.
#[derive(Default)]
pub struct InMemoryCarStore {
    cars: RwLock<Vec<Car>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the identity records the auth layer resolves against.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        {
            let mut map = store.users.write().expect("users lock poisoned");
            for user in users {
                map.insert(user.id, user);
            }
        }
        store
    }

    pub fn add_user(&self, user: User) {
        self.users
            .write()
            .expect("users lock poisoned")
            .insert(user.id, user);
    }
}

#[async_trait]
impl CarStore for InMemoryCarStore {
    async fn create_car(&self, new: NewCar) -> Result<Car, StoreError> {
        let now = Utc::now();
        let car = Car {
            id: Uuid::new_v4(),
            brand: new.brand,
            car_model: new.car_model,
            year: new.year,
            price: new.price,
            mileage: new.mileage,
            color: new.color,
            fuel_type: new.fuel_type,
            transmission: new.transmission,
            status: new.status,
            features: new.features,
            images: new.images,
            created_at: now,
            updated_at: now,
        };
        self.cars
            .write()
            .expect("cars lock poisoned")
            .push(car.clone());
        Ok(car)
    }

    async fn list_cars(
        &self,
        filters: &CarFilters,
        page: &PaginationOptions,
    ) -> Result<CarPage, StoreError> {
        let cars = self.cars.read().expect("cars lock poisoned");
        let mut matched: Vec<Car> = cars.iter().filter(|c| filters.matches(c)).cloned().collect();

        matched.sort_by(|a, b| {
            let ord = match page.sort_by {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortKey::Price => a.price.total_cmp(&b.price),
                SortKey::Year => a.year.cmp(&b.year),
                SortKey::Mileage => a.mileage.total_cmp(&b.mileage),
                SortKey::Brand => a.brand.cmp(&b.brand),
                SortKey::CarModel => a.car_model.cmp(&b.car_model),
                SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            };
            if page.sort_order.is_desc() {
                ord.reverse()
            } else {
                ord
            }
        });

        let total = matched.len() as u64;
        let cars = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(CarPage { cars, total })
    }

    async fn get_car(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        let cars = self.cars.read().expect("cars lock poisoned");
        Ok(cars.iter().find(|c| c.id == id).cloned())
    }

    async fn update_car(&self, id: Uuid, patch: CarPatch) -> Result<Option<Car>, StoreError> {
        let mut cars = self.cars.write().expect("cars lock poisoned");
        let Some(car) = cars.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(brand) = patch.brand {
            car.brand = brand;
        }
        if let Some(model) = patch.car_model {
            car.car_model = model;
        }
        if let Some(year) = patch.year {
            car.year = year;
        }
        if let Some(price) = patch.price {
            car.price = price;
        }
        if let Some(mileage) = patch.mileage {
            car.mileage = mileage;
        }
        if let Some(color) = patch.color {
            car.color = color;
        }
        if let Some(fuel) = patch.fuel_type {
            car.fuel_type = fuel;
        }
        if let Some(transmission) = patch.transmission {
            car.transmission = transmission;
        }
        if let Some(status) = patch.status {
            car.status = status;
        }
        if let Some(features) = patch.features {
            car.features = features;
        }
        if let Some(images) = patch.images {
            car.images = images;
        }
        car.updated_at = Utc::now();

        Ok(Some(car.clone()))
    }

    async fn delete_car(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut cars = self.cars.write().expect("cars lock poisoned");
        let before = cars.len();
        cars.retain(|c| c.id != id);
        Ok(cars.len() < before)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().expect("users lock poisoned");
        Ok(users.get(&id).cloned())
    }
}
