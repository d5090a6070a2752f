use std::sync::Arc;

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use car_inventory::{
    AppConfig, AppState, InMemoryCarStore, StoreState, auth::Role, create_router, models::User,
};

struct TestApp {
    address: String,
    client: Client,
    admin: Uuid,
    manager: Uuid,
    sales: Uuid,
}

impl TestApp {
    fn get(&self, path: &str, as_user: Uuid) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.address))
            .header("x-user-id", as_user.to_string())
    }

    fn post(&self, path: &str, as_user: Uuid) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.address))
            .header("x-user-id", as_user.to_string())
    }

    fn put(&self, path: &str, as_user: Uuid) -> reqwest::RequestBuilder {
        self.client
            .put(format!("{}{path}", self.address))
            .header("x-user-id", as_user.to_string())
    }

    fn delete(&self, path: &str, as_user: Uuid) -> reqwest::RequestBuilder {
        self.client
            .delete(format!("{}{path}", self.address))
            .header("x-user-id", as_user.to_string())
    }

    /// Creates a listing as the admin and returns its id.
    async fn seed_car(&self, payload: Value) -> Uuid {
        let response = self
            .post("/cars", self.admin)
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "seeding a car failed");
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }
}

async fn spawn_app() -> TestApp {
    let admin = Uuid::new_v4();
    let manager = Uuid::new_v4();
    let sales = Uuid::new_v4();
    let store = InMemoryCarStore::with_users([
        User {
            id: admin,
            email: "admin@dealer.test".to_string(),
            role: Role::Admin,
        },
        User {
            id: manager,
            email: "manager@dealer.test".to_string(),
            role: Role::Manager,
        },
        User {
            id: sales,
            email: "sales@dealer.test".to_string(),
            role: Role::Sales,
        },
    ]);

    let state = AppState {
        store: Arc::new(store) as StoreState,
        config: AppConfig::default(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    TestApp {
        address,
        client: Client::new(),
        admin,
        manager,
        sales,
    }
}

fn camry() -> Value {
    json!({
        "brand": "Toyota",
        "carModel": "Camry",
        "year": 2021,
        "price": 15000,
        "mileage": 30000,
        "color": "Red",
        "fuelType": "Petrol",
        "transmission": "Automatic"
    })
}

fn car(brand: &str, model: &str, year: i32, price: f64) -> Value {
    json!({
        "brand": brand,
        "carModel": model,
        "year": year,
        "price": price,
        "mileage": 10000,
        "color": "Black",
        "fuelType": "Petrol",
        "transmission": "Manual"
    })
}

#[tokio::test]
async fn health_check_is_public() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

// --- Create ---

#[tokio::test]
async fn admin_creates_a_car() {
    let app = spawn_app().await;

    let response = app
        .post("/cars", app.admin)
        .json(&camry())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 201);
    assert_eq!(body["message"], "Car created successfully");
    assert_eq!(body["data"]["brand"], "Toyota");
    assert_eq!(body["data"]["carModel"], "Camry");
    assert_eq!(body["data"]["status"], "available");
    assert!(body["data"]["id"].as_str().is_some());
    assert!(body["data"]["createdAt"].as_str().is_some());
    assert_eq!(body["data"]["features"], json!([]));
}

#[tokio::test]
async fn manager_creates_a_car() {
    let app = spawn_app().await;

    let response = app
        .post("/cars", app.manager)
        .json(&camry())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn sales_cannot_create_a_car() {
    let app = spawn_app().await;

    let response = app
        .post("/cars", app.sales)
        .json(&camry())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Insufficient permissions");
}

#[tokio::test]
async fn create_with_missing_fields_reports_all_of_them() {
    let app = spawn_app().await;

    let response = app
        .post("/cars", app.admin)
        .json(&json!({ "brand": "Toyota" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 7);
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"carModel"));
    assert!(fields.contains(&"year"));
}

#[tokio::test]
async fn create_with_bad_year_is_rejected() {
    let app = spawn_app().await;

    let mut payload = camry();
    payload["year"] = json!(1850);
    let response = app
        .post("/cars", app.admin)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "year");
    assert_eq!(body["errors"][0]["message"], "Please enter a valid year");
}

// --- List, filter, sort, paginate ---

#[tokio::test]
async fn brand_filter_matches_case_insensitively() {
    let app = spawn_app().await;
    app.seed_car(car("Toyota", "Corolla", 2020, 12000.0)).await;
    app.seed_car(car("Honda", "Civic", 2021, 14000.0)).await;
    app.seed_car(car("Ford", "Focus", 2019, 9000.0)).await;

    let response = app
        .get("/cars?brand=toyota", app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let cars = body["data"].as_array().unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0]["brand"], "Toyota");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn price_range_filter_is_inclusive() {
    let app = spawn_app().await;
    app.seed_car(car("Toyota", "Corolla", 2020, 10000.0)).await;
    app.seed_car(car("Honda", "Civic", 2021, 15000.0)).await;
    app.seed_car(car("Ford", "Focus", 2019, 20000.0)).await;

    let response = app
        .get("/cars?minPrice=10000&maxPrice=15000", app.sales)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn inverted_price_range_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .get("/cars?minPrice=5000&maxPrice=1000", app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Minimum price cannot be greater than maximum price"
    );
}

#[tokio::test]
async fn unknown_sort_field_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .get("/cars?sortBy=color", app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Cannot sort by field 'color'");
}

#[tokio::test]
async fn sort_by_price_orders_the_whole_set() {
    let app = spawn_app().await;
    app.seed_car(car("Toyota", "Corolla", 2020, 20000.0)).await;
    app.seed_car(car("Honda", "Civic", 2021, 10000.0)).await;
    app.seed_car(car("Ford", "Focus", 2019, 15000.0)).await;

    let response = app
        .get("/cars?sortBy=price&sortOrder=asc", app.sales)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    let prices: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, [10000.0, 15000.0, 20000.0]);
}

#[tokio::test]
async fn legacy_price_sort_reorders_only_the_page() {
    let app = spawn_app().await;
    for (i, price) in [30000.0, 10000.0, 20000.0].iter().enumerate() {
        app.seed_car(car("Toyota", &format!("Model{i}"), 2020, *price))
            .await;
    }

    // Default ordering is createdAt desc; sort=price then re-sorts the
    // returned page ascending by price.
    let response = app.get("/cars?sort=price", app.sales).send().await.unwrap();

    let body: Value = response.json().await.unwrap();
    let prices: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, [10000.0, 20000.0, 30000.0]);
}

#[tokio::test]
async fn pagination_reports_totals_and_flags() {
    let app = spawn_app().await;
    for i in 0..25 {
        app.seed_car(car("Toyota", &format!("Model{i}"), 2020, 10000.0 + i as f64))
            .await;
    }

    let response = app
        .get("/cars?page=2&limit=10", app.sales)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    let meta = &body["pagination"];
    assert_eq!(meta["total"], 25);
    assert_eq!(meta["page"], 2);
    assert_eq!(meta["totalPages"], 3);
    assert_eq!(meta["hasNext"], true);
    assert_eq!(meta["hasPrev"], true);
}

#[tokio::test]
async fn page_past_the_end_is_empty_but_well_formed() {
    let app = spawn_app().await;
    app.seed_car(camry()).await;

    let response = app
        .get("/cars?page=5&limit=10", app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrev"], true);
}

#[tokio::test]
async fn zero_page_and_oversized_limit_are_rejected() {
    let app = spawn_app().await;

    let response = app.get("/cars?page=0", app.sales).send().await.unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Page number must be greater than 0");

    let response = app.get("/cars?limit=101", app.sales).send().await.unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Limit must be between 1 and 100");
}

// --- Read by id ---

#[tokio::test]
async fn get_by_id_round_trips() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .get(&format!("/cars/{id}"), app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Car retrieved successfully");
    assert_eq!(body["data"]["id"], id.to_string());
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .get(&format!("/cars/{}", Uuid::new_v4()), app.sales)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Car not found");
}

// --- Update ---

#[tokio::test]
async fn manager_updates_price_and_status() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .put(&format!("/cars/{id}"), app.manager)
        .json(&json!({ "price": 13500, "status": "reserved" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Car updated successfully");
    assert_eq!(body["data"]["price"], 13500.0);
    assert_eq!(body["data"]["status"], "reserved");
    // Untouched fields survive a partial update.
    assert_eq!(body["data"]["brand"], "Toyota");
}

#[tokio::test]
async fn status_moves_freely_between_states() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    for status in ["sold", "reserved", "available"] {
        let response = app
            .put(&format!("/cars/{id}"), app.admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["status"], status);
    }
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .put(&format!("/cars/{id}"), app.admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No valid fields provided for update");
}

#[tokio::test]
async fn update_with_negative_price_is_rejected() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .put(&format!("/cars/{id}"), app.admin)
        .json(&json!({ "price": -1000 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "price");
    assert_eq!(body["errors"][0]["message"], "Price must be a positive number");
}

#[tokio::test]
async fn sales_cannot_update_a_car() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .put(&format!("/cars/{id}"), app.sales)
        .json(&json!({ "price": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .put(&format!("/cars/{}", Uuid::new_v4()), app.admin)
        .json(&json!({ "price": 5000 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

// --- Delete ---

#[tokio::test]
async fn admin_deletes_a_car() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    let response = app
        .delete(&format!("/cars/{id}"), app.admin)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Car deleted successfully");

    // The record is really gone.
    let response = app
        .get(&format!("/cars/{id}"), app.admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn only_admin_may_delete() {
    let app = spawn_app().await;
    let id = app.seed_car(camry()).await;

    for user in [app.manager, app.sales] {
        let response = app
            .delete(&format!("/cars/{id}"), user)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 403);
    }
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .delete(&format!("/cars/{}", Uuid::new_v4()), app.admin)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}
