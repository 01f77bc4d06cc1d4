//! HTTP integration tests.
//!
//! Starts the storefront on an in-memory store and exercises it with reqwest.

mod common;

use std::sync::atomic::Ordering;

use common::{order_form, spawn_app, spawn_app_with, ADMIN_TOKEN};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn decimal(v: &Value) -> Decimal {
    v.as_str().unwrap().parse().unwrap()
}

fn first_message(body: &Value) -> String {
    body["messages"][0]["text"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;
    let resp = app.client.get(app.base.replace("/api/v1", "/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_email() {
    let app = spawn_app().await;
    app.register("ann").await;

    let resp = app.client.post(app.url("/accounts")).json(&json!({ "username": "ann", "email": "ann@example.com" })).send().await.unwrap();
    assert_eq!(resp.status(), 409);

    let resp = app.client.post(app.url("/accounts")).json(&json!({ "username": "bob", "email": "nope" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn product_management_requires_superuser() {
    let app = spawn_app().await;
    let token = app.register("ann").await;
    let product = json!({ "name": "Kettle", "price": "10.00" });

    let resp = app.client.post(app.url("/products")).json(&product).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app.client.post(app.url("/products")).bearer_auth(&token).json(&product).send().await.unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Only store admins can access this page!");

    let resp = app.client.post(app.url("/products")).bearer_auth("not-a-token").json(&product).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app.client.post(app.url("/products")).bearer_auth(ADMIN_TOKEN).json(&json!({ "name": "Kettle", "price": "-1" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn product_form_bounds() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/products"))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "name": "Gold", "price": "79228162514264337593543950335" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["price"].is_array());

    let resp = app.client.post(app.url("/products")).bearer_auth(ADMIN_TOKEN).json(&json!({ "name": "Gold", "price": "10000" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);

    let resp = app.client.post(app.url("/products")).bearer_auth(ADMIN_TOKEN).json(&json!({ "name": "Kettle", "price": "5.00", "sku": "   " })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["sku"].is_array());
}

#[tokio::test]
async fn bag_quantities_are_capped() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Safe", "price": "9999.99" })).await;

    let resp = app.add_to_bag("s1", &id, 10_000).await;
    assert_eq!(resp.status(), 422);

    let resp = app.add_to_bag("s1", &id, 9_999).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(decimal(&body["total"]), dec!(99989900.01));

    let resp = app.add_to_bag("s1", &id, 1).await;
    assert_eq!(resp.status(), 422);
    let body: Value = app.client.get(app.url("/bag/s1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["product_count"], 9_999);
}

#[tokio::test]
async fn product_crud_and_reviews() {
    let app = spawn_app().await;
    let kitchen = app.create_category("kitchen").await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00", "category_id": kitchen, "sku": "kt-1" })).await;

    let resp = app.client.get(app.url(&format!("/products/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["product"]["name"], "Kettle");
    assert_eq!(body["category"]["name"], "kitchen");

    let resp = app
        .client
        .put(app.url(&format!("/products/{id}")))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "name": "Steel Kettle", "price": "12.50", "category_id": kitchen }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(decimal(&body["product"]["price"]), dec!(12.50));
    assert_eq!(first_message(&body), "Successfully updated!");

    let ann = app.register("ann").await;
    let bob = app.register("bob").await;
    let resp = app.client.post(app.url(&format!("/products/{id}/reviews"))).bearer_auth(&ann).json(&json!({ "stars": 5, "content": "Boils fast" })).send().await.unwrap();
    assert_eq!(resp.status(), 201);
    let review: Value = resp.json().await.unwrap();
    let review_id = review["id"].as_str().unwrap();

    let resp = app.client.delete(app.url(&format!("/reviews/{review_id}"))).bearer_auth(&bob).send().await.unwrap();
    assert_eq!(resp.status(), 403);
    let resp = app.client.delete(app.url(&format!("/reviews/{review_id}"))).bearer_auth(&ann).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.delete(app.url(&format!("/products/{id}"))).bearer_auth(ADMIN_TOKEN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = app.client.get(app.url(&format!("/products/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn catalog_search_sort_and_filter() {
    let app = spawn_app().await;
    let kitchen = app.create_category("kitchen").await;
    let garden = app.create_category("garden").await;
    app.create_product(json!({ "name": "Kettle", "price": "10.00", "category_id": kitchen })).await;
    app.create_product(json!({ "name": "Toaster", "price": "25.00", "category_id": kitchen, "description": "Two slots" })).await;
    app.create_product(json!({ "name": "Rake", "price": "7.00", "category_id": garden })).await;

    let body: Value = app.client.get(app.url("/products?sort=price&direction=desc")).send().await.unwrap().json().await.unwrap();
    let names: Vec<&str> = body["products"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Toaster", "Kettle", "Rake"]);
    assert_eq!(body["current_sorting"], "price_desc");

    let body: Value = app.client.get(app.url("/products?category=garden")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
    assert_eq!(body["current_categories"][0]["name"], "garden");
    assert_eq!(body["current_sorting"], "None_None");

    let body: Value = app.client.get(app.url("/products?q=slots")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["products"][0]["name"], "Toaster");
    assert_eq!(body["search_term"], "slots");

    let resp = app.client.get(app.url("/products?q=")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let resp = app.client.get(app.url("/products?sort=colour")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn bag_add_adjust_remove() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;

    let resp = app.add_to_bag("s1", &id, 1).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(first_message(&body), "Added Kettle to your bag");

    let body: Value = app.add_to_bag("s1", &id, 1).await.json().await.unwrap();
    assert_eq!(body["product_count"], 2);
    assert_eq!(decimal(&body["total"]), dec!(20.00));
    assert_eq!(decimal(&body["delivery"]), dec!(2.00));
    assert_eq!(decimal(&body["free_delivery_delta"]), dec!(30.00));
    assert_eq!(decimal(&body["grand_total"]), dec!(22.00));

    let resp = app.client.post(app.url(&format!("/bag/s1/adjust/{id}"))).json(&json!({ "quantity": 6 })).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["product_count"], 6);
    assert_eq!(decimal(&body["delivery"]), Decimal::ZERO);
    assert_eq!(first_message(&body), "Updated Kettle quantity to 6");

    let resp = app.client.post(app.url(&format!("/bag/s1/adjust/{id}"))).json(&json!({ "quantity": 0 })).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["bag_items"].as_array().unwrap().is_empty());

    let resp = app.client.post(app.url(&format!("/bag/s1/remove/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app.add_to_bag("s1", &id, 0).await;
    assert_eq!(resp.status(), 422);
    let resp = app.add_to_bag("s1", &uuid::Uuid::nil().to_string(), 1).await;
    assert_eq!(resp.status(), 404);
    let resp = app.client.get(app.url("/bag/bad%20key")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn bags_are_isolated_per_session() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    app.add_to_bag("first", &id, 3).await;

    let body: Value = app.client.get(app.url("/bag/second")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["product_count"], 0);
    let body: Value = app.client.get(app.url("/bag/first")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["product_count"], 3);
}

#[tokio::test]
async fn deleted_products_drop_out_of_the_bag() {
    let app = spawn_app().await;
    let kettle = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    let rake = app.create_product(json!({ "name": "Rake", "price": "7.00" })).await;
    app.add_to_bag("s1", &kettle, 1).await;
    app.add_to_bag("s1", &rake, 1).await;
    app.client.delete(app.url(&format!("/products/{rake}"))).bearer_auth(ADMIN_TOKEN).send().await.unwrap();

    let body: Value = app.client.get(app.url("/bag/s1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["bag_items"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&body["total"]), dec!(10.00));
}

#[tokio::test]
async fn checkout_requires_a_bag() {
    let app = spawn_app().await;
    let resp = app.client.get(app.url("/checkout/s1")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "There's nothing in your bag at the moment");
    assert_eq!(app.payments.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn anonymous_checkout_flow() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00", "sku": "kt-1" })).await;
    app.add_to_bag("s1", &id, 2).await;

    let page: Value = app.client.get(app.url("/checkout/s1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(page["stripe_public_key"], "pk_test_storefront");
    assert_eq!(page["client_secret"], "pi_1_secret_test");
    assert_eq!(page["order_form"]["email"], "");

    let resp = app.client.post(app.url("/checkout/s1")).json(&order_form(false, "pi_1_secret_test")).send().await.unwrap();
    assert_eq!(resp.status(), 201);
    let placed: Value = resp.json().await.unwrap();
    let number = placed["order_number"].as_str().unwrap().to_string();
    assert_eq!(number.len(), 32);
    assert_eq!(number, number.to_uppercase());
    assert_eq!(placed["order"]["stripe_pid"], "pi_1");
    assert_eq!(decimal(&placed["order"]["order_total"]), dec!(20.00));
    assert_eq!(decimal(&placed["order"]["grand_total"]), dec!(22.00));
    assert_eq!(placed["order"]["line_items"][0]["quantity"], 2);

    let resp = app.client.get(app.url(&format!("/checkout/s1/success/{number}"))).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        first_message(&body),
        format!("Order successfully placed! Your order number is {number}. A confirmation email will be sent to ann@example.com.")
    );

    let bag: Value = app.client.get(app.url("/bag/s1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(bag["product_count"], 0);

    let resp = app.client.get(app.url("/checkout/s1/success/DOESNOTEXIST")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn invalid_order_form_is_rejected() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    app.add_to_bag("s1", &id, 1).await;

    let mut form = order_form(false, "pi_1_secret_test");
    form["country"] = json!("Ireland");
    let resp = app.client.post(app.url("/checkout/s1")).json(&form).send().await.unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["country"].is_array());
}

#[tokio::test]
async fn unassigned_country_code_is_rejected() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    app.add_to_bag("s1", &id, 1).await;

    let mut form = order_form(false, "pi_1_secret_test");
    form["country"] = json!("ZZ");
    let resp = app.client.post(app.url("/checkout/s1")).json(&form).send().await.unwrap();
    assert_eq!(resp.status(), 422);

    let token = app.register("ann").await;
    let resp = app.client.put(app.url("/profile")).bearer_auth(&token).json(&json!({ "default_country": "ZZ" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn declined_payment_intent_is_a_bad_gateway() {
    let app = spawn_app().await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    app.add_to_bag("s1", &id, 1).await;
    app.payments.decline.store(true, Ordering::SeqCst);

    let resp = app.client.get(app.url("/checkout/s1")).send().await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Payment provider rejected the request: Your card was declined.");

    let bag: Value = app.client.get(app.url("/bag/s1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(bag["product_count"], 1);
}

#[tokio::test]
async fn checkout_warns_without_public_key() {
    let app = spawn_app_with(|settings| settings.stripe_public_key = String::new()).await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "10.00" })).await;
    app.add_to_bag("s1", &id, 1).await;

    let resp = app.client.get(app.url("/checkout/s1")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["stripe_public_key"], "");
    assert_eq!(page["messages"][0]["level"], "warning");
    assert_eq!(first_message(&page), "Stripe public key is missing. Did you forget to set it in your environment?");
}

#[tokio::test]
async fn signed_in_checkout_saves_delivery_info() {
    let app = spawn_app().await;
    let token = app.register("ann").await;
    let id = app.create_product(json!({ "name": "Kettle", "price": "60.00" })).await;
    app.add_to_bag("s1", &id, 1).await;

    let page: Value = app.client.get(app.url("/checkout/s1")).bearer_auth(&token).send().await.unwrap().json().await.unwrap();
    assert_eq!(page["order_form"]["email"], "ann@example.com");
    assert_eq!(decimal(&page["bag"]["delivery"]), Decimal::ZERO);

    let placed: Value = app
        .client
        .post(app.url("/checkout/s1"))
        .bearer_auth(&token)
        .json(&order_form(true, "pi_1_secret_test"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let number = placed["order_number"].as_str().unwrap().to_string();

    let resp = app.client.get(app.url(&format!("/checkout/s1/success/{number}"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let profile: Value = app.client.get(app.url("/profile")).bearer_auth(&token).send().await.unwrap().json().await.unwrap();
    assert_eq!(profile["profile"]["default_country"], "IE");
    assert_eq!(profile["profile"]["default_town_or_city"], "Dublin");
    assert_eq!(profile["orders"][0]["order_number"], number.as_str());

    let resp = app.client.get(app.url(&format!("/profile/orders/{number}"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(first_message(&body), format!("This is a past confirmation for order number {number}."));

    let other = app.register("bob").await;
    let resp = app.client.get(app.url(&format!("/profile/orders/{number}"))).bearer_auth(&other).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn profile_update() {
    let app = spawn_app().await;
    let token = app.register("ann").await;

    let resp = app.client.get(app.url("/profile")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app.client.put(app.url("/profile")).bearer_auth(&token).json(&json!({ "default_country": "GB", "default_postcode": "" })).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(first_message(&body), "Profile updated successfully");
    assert_eq!(body["profile"]["default_country"], "GB");
    assert!(body["profile"]["default_postcode"].is_null());

    let resp = app.client.put(app.url("/profile")).bearer_auth(&token).json(&json!({ "default_country": "Britain" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn news_publication_and_admin_changelist() {
    let app = spawn_app().await;
    let ann = app.register("ann").await;
    let post = json!({ "title": "Summer Sale!", "content": "Everything half price", "status": "published" });

    let resp = app.client.post(app.url("/admin/news")).bearer_auth(&ann).json(&post).send().await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app.client.post(app.url("/admin/news")).bearer_auth(ADMIN_TOKEN).json(&post).send().await.unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["slug"], "summer-sale");

    let resp = app.client.post(app.url("/admin/news")).bearer_auth(ADMIN_TOKEN).json(&post).send().await.unwrap();
    assert_eq!(resp.status(), 409);

    let draft: Value = app
        .client
        .post(app.url("/admin/news"))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "title": "Winter plans", "content": "Coming soon" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(draft["status"], "draft");

    let public: Value = app.client.get(app.url("/news")).send().await.unwrap().json().await.unwrap();
    assert_eq!(public.as_array().unwrap().len(), 1);
    let resp = app.client.get(app.url("/news/winter-plans")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let resp = app.client.get(app.url("/news/summer-sale")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let drafts: Value = app.client.get(app.url("/admin/news?status=draft")).bearer_auth(ADMIN_TOKEN).send().await.unwrap().json().await.unwrap();
    assert_eq!(drafts.as_array().unwrap().len(), 1);
    assert_eq!(drafts[0]["title"], "Winter plans");
    let found: Value = app.client.get(app.url("/admin/news?q=half")).bearer_auth(ADMIN_TOKEN).send().await.unwrap().json().await.unwrap();
    assert_eq!(found[0]["slug"], "summer-sale");

    let draft_id = draft["id"].as_str().unwrap();
    let resp = app
        .client
        .put(app.url(&format!("/admin/news/{draft_id}")))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "title": "Winter plans", "content": "Here now", "status": "published" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let resp = app.client.get(app.url("/news/winter-plans")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.delete(app.url(&format!("/admin/news/{draft_id}"))).bearer_auth(ADMIN_TOKEN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = app.client.delete(app.url(&format!("/admin/news/{draft_id}"))).bearer_auth(ADMIN_TOKEN).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app.client.post(app.url("/admin/news")).bearer_auth(ADMIN_TOKEN).json(&json!({ "title": "!!!" })).send().await.unwrap();
    assert_eq!(resp.status(), 422);
}
