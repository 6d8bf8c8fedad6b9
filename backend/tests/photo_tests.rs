mod common;

use common::{at, parse_response_body, png_bytes, response_bytes, TestSetup};
use http::{header, StatusCode};
use pretty_assertions::assert_eq;

fn seed(context: &TestSetup) {
    context
        .store
        .put_object("user_u1/a.txt", at(30), b"notes".to_vec());
    context
        .store
        .put_object("user_u1/b.png", at(20), png_bytes(16, 12));
    context
        .store
        .put_object("user_u1/c.jpg", at(10), vec![0xff, 0xd8, 0xff]);
    context
        .store
        .put_object("user_u2/d.png", at(40), png_bytes(2, 2));
}

#[tokio::test]
async fn test_last_photos_newest_first_with_urls() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/user/u1/photos?photo_num=2", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let photos = body.as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0]["key"], "user_u1/b.png");
    assert_eq!(photos[1]["key"], "user_u1/c.jpg");
    assert_eq!(photos[0]["modified_at"], "2023-11-14T22:13:40Z");
    assert!(photos
        .iter()
        .all(|photo| photo["url"].as_str().is_some_and(|url| url.contains("X-Amz-Expires=3600"))));
}

#[tokio::test]
async fn test_last_photos_requires_valid_photo_num() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    for route in ["/user/u1/photos", "/user/u1/photos?photo_num=abc"] {
        let response = context.send_get_request(route, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(body["error"]["message"], "Invalid photo_num parameter");
    }
}

#[tokio::test]
async fn test_last_photos_zero_returns_all() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/user/u1/photos?photo_num=0", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_last_photo_is_cached() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let first = context
        .send_get_request("/user/u1/photo", Some(&token))
        .await;
    let second = context
        .send_get_request("/user/u1/photo", Some(&token))
        .await;

    assert_eq!(first.status(), StatusCode::OK);
    let first = parse_response_body(first).await;
    let second = parse_response_body(second).await;
    assert_eq!(first["key"], "user_u1/b.png");
    assert_eq!(first, second);
    assert_eq!(context.store.list_page_calls(), 1);
}

#[tokio::test]
async fn test_last_photo_for_user_without_images() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("nouser");

    let response = context
        .send_get_request("/user/nouser/photo", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "no_images_found");
    assert_eq!(
        body["error"]["message"],
        "no image files found for user nouser"
    );
}

#[tokio::test]
async fn test_presign_failure_fails_request_and_is_not_cached() {
    let context = TestSetup::new();
    seed(&context);
    context.store.fail_presign_for("user_u1/c.jpg");
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/user/u1/photos?photo_num=5", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "presign_failed");
    assert!(context.cache.is_empty().await);
}

#[tokio::test]
async fn test_photo_routes_require_auth() {
    let context = TestSetup::new();
    seed(&context);

    for route in [
        "/user/u1/photos?photo_num=1",
        "/user/u1/photo",
        "/photo/user_u1/b.png",
    ] {
        let response = context.send_get_request(route, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{route}");
    }
}

#[tokio::test]
async fn test_download_original_photo() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/photo/user_u1/b.png", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response_bytes(response).await, png_bytes(16, 12));
}

#[tokio::test]
async fn test_download_small_photo_is_resized() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    for route in [
        "/photo/user_u1%2Fb.png?Image-Type=small",
        "/photo/user_u1/b.png?Image-Type=image/small",
    ] {
        let response = context.send_get_request(route, Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK, "{route}");
        let decoded = image::load_from_memory(&response_bytes(response).await).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }
}

#[tokio::test]
async fn test_download_missing_photo() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/photo/user_u1/missing.png", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "download_failed");
}

#[tokio::test]
async fn test_small_variant_of_non_image_fails() {
    let context = TestSetup::new();
    seed(&context);
    let token = context.token_for("u1");

    let response = context
        .send_get_request("/photo/user_u1/a.txt?Image-Type=small", Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "image_processing_failed");
}
