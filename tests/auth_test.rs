mod common;

use serde_json::Value;

#[tokio::test]
async fn sign_in_creates_then_refreshes_profile() {
    let app = common::spawn_app().await;
    let (token, profile_id) = common::new_user();

    for _ in 0..2 {
        let resp = app
            .client
            .post(app.url("/forum/auth"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["profile"]["id"], profile_id.as_str());
        assert_eq!(body["profile"]["name"], format!("hacker{profile_id}"));
        assert_eq!(
            body["profile"]["avatarUrl"],
            format!("https://avatars.example/{profile_id}")
        );
    }
}

#[tokio::test]
async fn sign_in_rejects_missing_or_bad_tokens() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/forum/auth"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");

    let resp = app
        .client
        .post(app.url("/forum/auth"))
        .bearer_auth("revoked")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .post(app.url("/forum/auth"))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
