// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); they are skipped otherwise.
//!
//! Every test uses fresh IDs and emails so runs do not interfere.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use zone_de_grimpe::error::AppError;
use zone_de_grimpe::models::{GearItem, Role, User};

mod common;
use common::{create_emulator_app, create_test_jwt, json_body, request, test_db};

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@grimpe.test", Uuid::new_v4().simple())
}

fn test_user(email: &str) -> User {
    User::new(
        Uuid::new_v4().to_string(),
        email.to_string(),
        "Test".to_string(),
        vec![Role::User],
        Utc::now(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// EMAIL UNIQUENESS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_email_claim_is_exclusive() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("claim");

    db.claim_email(&email, &Uuid::new_v4().to_string())
        .await
        .unwrap();
    let second = db.claim_email(&email, &Uuid::new_v4().to_string()).await;
    assert!(matches!(second, Err(AppError::Conflict("email_taken"))));

    db.release_email(&email).await.unwrap();
    db.claim_email(&email, &Uuid::new_v4().to_string())
        .await
        .unwrap();

    println!("✓ Email claim exclusive: {}", email);
}

#[tokio::test]
async fn test_register_login_flow() {
    require_emulator!();

    let (app, state) = create_emulator_app().await;
    let email = unique_email("flow");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": "s3cret!", "displayName": "Lynn" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    // Same email again is a conflict
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "other" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "email_taken");

    // No second document was written
    let users = state.db.list_users().await.unwrap();
    assert_eq!(users.iter().filter(|u| u.email == email).count(), 1);

    // Wrong password and unknown email look the same
    let mut failures = Vec::new();
    for (e, p) in [(email.as_str(), "wrong"), ("nobody@grimpe.test", "s3cret!")] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": e, "password": p })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        failures.push(json_body(response).await);
    }
    assert_eq!(failures[0], failures[1]);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "s3cret!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["display_name"], "Lynn");

    println!("✓ Register/login flow verified: {}", email);
}

#[tokio::test]
async fn test_register_adopts_directory_entry() {
    require_emulator!();

    let (app, _) = create_emulator_app().await;
    let email = unique_email("directory");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "Catherine", "email": email })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    // The entry has no password yet, so registering sets it
    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "s3cret!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["user"]["id"], id);
}

// ═══════════════════════════════════════════════════════════════════════════
// SPOTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_spot_coordinates_rounded_and_near() {
    require_emulator!();

    let (app, _) = create_emulator_app().await;
    let name = format!("Secteur {}", Uuid::new_v4().simple());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/spots",
            None,
            Some(json!({
                "name": name,
                "type": "falaise",
                "geometry": { "type": "Point", "coordinates": [5.123456789, 44.987654321] },
                "orientation": "se",
                "grade_mean": "6a+",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/spots/{id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spot = json_body(response).await;
    assert_eq!(spot["location"]["coordinates"], json!([5.123457, 44.987654]));
    assert_eq!(spot["orientation"], "SE");

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/spots/near?lng=5.1235&lat=44.9877&radius=500&format=flat",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rows = json_body(response).await;
    let found = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == id.as_str())
        .expect("new spot should be near");
    assert!(found["dist_m"].as_f64().unwrap() < 500.0);

    let response = app
        .oneshot(request("DELETE", &format!("/api/spots/{id}"), None, None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["deleted"], true);
}

// ═══════════════════════════════════════════════════════════════════════════
// GEAR OWNERSHIP
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_gear_is_isolated_per_owner() {
    require_emulator!();

    let (app, state) = create_emulator_app().await;
    let alice = Uuid::new_v4().to_string();
    let bob = Uuid::new_v4().to_string();
    let alice_token = create_test_jwt(&alice, &state.config.jwt_signing_key);
    let bob_token = create_test_jwt(&bob, &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/user_materiel",
            Some(&alice_token),
            Some(json!({
                "category": "Corde",
                "owner_id": bob,
                "specs": { "length_m": 70 },
                "lifecycle": { "lastInspectionAt": "2025-01-15" },
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_str().unwrap().to_string();
    let uri = format!("/api/user_materiel/{id}");

    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some(&alice_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let item = json_body(response).await;
    assert_eq!(item["owner_id"], alice);
    assert_eq!(item["lifecycle"]["next_inspection_at"], "2025-07-15T00:00:00Z");

    // Bob cannot see, change or delete Alice's item
    for (method, body) in [
        ("GET", None),
        ("PATCH", Some(json!({ "category": "Dégaines" }))),
        ("DELETE", None),
    ] {
        let response = app
            .clone()
            .oneshot(request(method, &uri, Some(&bob_token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
    }

    // Alice's item is untouched
    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some(&alice_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let after = json_body(response).await;
    assert_eq!(after["category"], "Corde");
    assert_eq!(after["lifecycle"], item["lifecycle"]);
    assert_eq!(after["meta"]["updated_at"], item["meta"]["updated_at"]);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/user_materiel", Some(&bob_token), None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["total"], 0);

    // Retiring is idempotent
    let first = app
        .clone()
        .oneshot(request("POST", &format!("{uri}/retire"), Some(&alice_token), None))
        .await
        .unwrap();
    let first = json_body(first).await;
    let second = app
        .oneshot(request("POST", &format!("{uri}/retire"), Some(&alice_token), None))
        .await
        .unwrap();
    let second = json_body(second).await;
    assert!(first["lifecycle"]["retired_at"].is_string());
    assert_eq!(first["lifecycle"]["retired_at"], second["lifecycle"]["retired_at"]);

    println!("✓ Gear isolation verified: gear_id={}", id);
}

#[tokio::test]
async fn test_delete_user_data_removes_gear_and_claim() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("delete");
    let user = test_user(&email);

    db.claim_email(&email, &user.id).await.unwrap();
    db.upsert_user(&user).await.unwrap();
    for category in ["Corde", "Casque", "Baudrier"] {
        let item = GearItem::new(
            Uuid::new_v4().to_string(),
            user.id.clone(),
            category.to_string(),
            Utc::now(),
        );
        db.upsert_gear(&item).await.unwrap();
    }

    let deleted = db.delete_user_data(&user).await.unwrap();
    assert_eq!(deleted, 5);

    assert!(db.get_user(&user.id).await.unwrap().is_none());
    assert!(db
        .list_gear_for_owner(&user.id, None)
        .await
        .unwrap()
        .is_empty());
    // The email is free again
    db.claim_email(&email, &Uuid::new_v4().to_string())
        .await
        .unwrap();

    println!("✓ User data deletion verified: user_id={}", user.id);
}
