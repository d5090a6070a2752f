use car_inventory::{
    error::ApiError,
    models::{CarStatus, CreateCarRequest, UpdateCarRequest, current_year},
};

fn valid_create() -> CreateCarRequest {
    CreateCarRequest {
        brand: Some("Toyota".to_string()),
        car_model: Some("Camry".to_string()),
        year: Some(2021),
        price: Some(15000.0),
        mileage: Some(30000.0),
        color: Some("Red".to_string()),
        fuel_type: Some("Petrol".to_string()),
        transmission: Some("Automatic".to_string()),
        status: Some("available".to_string()),
        features: None,
        images: None,
    }
}

// --- Create validation ---

#[test]
fn valid_payload_passes_and_fills_defaults() {
    let new = valid_create().validate().unwrap();
    assert_eq!(new.brand, "Toyota");
    assert_eq!(new.status, CarStatus::Available);
    assert!(new.features.is_empty());
    assert!(new.images.is_empty());
}

#[test]
fn missing_status_defaults_to_available() {
    let mut req = valid_create();
    req.status = None;
    assert_eq!(req.validate().unwrap().status, CarStatus::Available);
}

#[test]
fn empty_payload_names_every_missing_field() {
    let errors = CreateCarRequest::default().validate().unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    for expected in [
        "brand",
        "carModel",
        "year",
        "price",
        "mileage",
        "color",
        "fuelType",
        "transmission",
    ] {
        assert!(fields.contains(&expected), "missing error for {expected}");
    }
}

#[test]
fn blank_strings_count_as_missing() {
    let mut req = valid_create();
    req.brand = Some("   ".to_string());
    let errors = req.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "brand");
    assert_eq!(errors[0].message, "Brand is required");
}

#[test]
fn year_outside_range_is_rejected() {
    for bad in [1899, current_year() + 1] {
        let mut req = valid_create();
        req.year = Some(bad);
        let errors = req.validate().unwrap_err();
        assert_eq!(errors[0].field, "year");
        assert_eq!(errors[0].message, "Please enter a valid year");
    }
}

#[test]
fn negative_price_and_mileage_are_rejected() {
    let mut req = valid_create();
    req.price = Some(-1.0);
    req.mileage = Some(-30.0);
    let errors = req.validate().unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["price", "mileage"]);
}

#[test]
fn unknown_status_is_rejected() {
    let mut req = valid_create();
    req.status = Some("scrapped".to_string());
    let errors = req.validate().unwrap_err();
    assert_eq!(errors[0].field, "status");
    assert_eq!(errors[0].message, "Invalid status value");
}

#[test]
fn violations_accumulate_into_one_error_list() {
    let req = CreateCarRequest {
        year: Some(1700),
        price: Some(-5.0),
        ..CreateCarRequest::default()
    };
    let errors = req.validate().unwrap_err();
    // Five missing text fields, bad year, bad price, missing mileage.
    assert_eq!(errors.len(), 8);
}

// --- Update sanitization ---

#[test]
fn empty_update_is_rejected() {
    let err = UpdateCarRequest::default().into_patch().unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
    assert_eq!(err.to_string(), "No valid fields provided for update");
}

#[test]
fn update_with_only_blank_values_is_rejected() {
    let req = UpdateCarRequest {
        brand: Some(String::new()),
        color: Some("  ".to_string()),
        status: Some(String::new()),
        ..UpdateCarRequest::default()
    };
    let err = req.into_patch().unwrap_err();
    assert_eq!(err.to_string(), "No valid fields provided for update");
}

#[test]
fn blank_fields_are_dropped_not_written() {
    let req = UpdateCarRequest {
        brand: Some(String::new()),
        price: Some(12000.0),
        ..UpdateCarRequest::default()
    };
    let patch = req.into_patch().unwrap();
    assert!(patch.brand.is_none());
    assert_eq!(patch.price, Some(12000.0));
}

#[test]
fn update_revalidates_numeric_fields() {
    let req = UpdateCarRequest {
        price: Some(-1000.0),
        ..UpdateCarRequest::default()
    };
    let err = req.into_patch().unwrap_err();
    let ApiError::Validation(errors) = err else {
        panic!("expected field-level validation errors");
    };
    assert_eq!(errors[0].field, "price");
    assert_eq!(errors[0].message, "Price must be a positive number");
}

#[test]
fn update_revalidates_year_and_status() {
    let req = UpdateCarRequest {
        year: Some(1850),
        status: Some("junk".to_string()),
        ..UpdateCarRequest::default()
    };
    let ApiError::Validation(errors) = req.into_patch().unwrap_err() else {
        panic!("expected field-level validation errors");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["year", "status"]);
}

#[test]
fn whitespace_only_status_is_dropped_like_other_blanks() {
    let req = UpdateCarRequest {
        status: Some(" ".to_string()),
        price: Some(9000.0),
        ..UpdateCarRequest::default()
    };
    let patch = req.into_patch().unwrap();
    assert!(patch.status.is_none());
    assert_eq!(patch.price, Some(9000.0));
}

#[test]
fn whitespace_only_status_on_create_falls_back_to_default() {
    let mut req = valid_create();
    req.status = Some("  ".to_string());
    assert_eq!(req.validate().unwrap().status, CarStatus::Available);
}

#[test]
fn update_status_parses_into_enum() {
    let req = UpdateCarRequest {
        status: Some("sold".to_string()),
        ..UpdateCarRequest::default()
    };
    let patch = req.into_patch().unwrap();
    assert_eq!(patch.status, Some(CarStatus::Sold));
}
