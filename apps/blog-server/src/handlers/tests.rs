use std::sync::{Arc, Mutex};

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use blog_core::domain::{Comment, Post, Tag, User};
use blog_core::ports::{MailError, Mailer, OutgoingMail, PasswordService, TokenService};
use blog_infra::{Argon2PasswordService, JwtConfig, JwtTokenService, LogMailer, MemoryStore};

use super::configure_routes;
use crate::config::AppConfig;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::Transport("smtp relay down".into()))
    }
}

fn state_with(mailer: Arc<dyn Mailer>) -> AppState {
    let config = AppConfig {
        public_base_url: Some("https://blog.example.com".into()),
        ..AppConfig::default()
    };
    let store = MemoryStore::new(config.search_language);
    AppState::in_memory(config, store, mailer)
}

fn tokens() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig::default()))
}

fn passwords() -> Arc<dyn PasswordService> {
    Arc::new(Argon2PasswordService::new())
}

macro_rules! init_app {
    ($state:expr, $tokens:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new($tokens.clone()))
                .app_data(web::Data::new(passwords()))
                .configure(configure_routes),
        )
        .await
    };
}

async fn seed_user(state: &AppState, username: &str, staff: bool) -> User {
    let mut user = User::new(
        username.into(),
        format!("{username}@example.com"),
        "not-a-real-hash".into(),
    );
    user.is_staff = staff;
    state.users.create(user).await.unwrap()
}

async fn seed_post(
    state: &AppState,
    author: &User,
    title: &str,
    content: &str,
    tags: &[&str],
    minutes_ago: i64,
) -> Post {
    let mut post = Post::new(
        author.id,
        title.into(),
        content.into(),
        tags.iter().map(|t| Tag::new(t)).collect(),
    );
    post.created_at = Utc::now() - Duration::minutes(minutes_ago);
    post.updated_at = post.created_at;
    state.posts.create(post).await.unwrap()
}

async fn seed_comment(state: &AppState, post: &Post, name: &str, active: bool) -> Comment {
    let mut comment = Comment::new(
        post.id,
        name.into(),
        format!("{}@example.com", name.to_lowercase()),
        format!("{name} was here"),
    );
    comment.set_active(active);
    state.comments.create(comment).await.unwrap()
}

fn bearer(tokens: &Arc<dyn TokenService>, user: &User) -> (header::HeaderName, String) {
    let token = tokens
        .generate_token(user.id, &user.username, user.roles())
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn titles(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_health_reports_memory_storage() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_malformed_body_is_a_tagged_bad_request() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let app = init_app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .insert_header(("x-request-id", "trace-7"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["status"], 400);
    assert_eq!(problem["request_id"], "trace-7");
}

#[actix_web::test]
async fn test_home_listing_paginates_newest_first() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    for (i, title) in ["p1", "p2", "p3", "p4"].iter().enumerate() {
        seed_post(&state, &ann, title, "body", &[], 40 - 10 * i as i64).await;
    }
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&first["items"]), vec!["p4", "p3", "p2"]);
    assert_eq!(first["total_items"], 4);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["has_next"], true);
    assert_eq!(first["has_previous"], false);

    let req = test::TestRequest::get().uri("/api/posts?page=2").to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&second["items"]), vec!["p1"]);
    assert_eq!(second["has_next"], false);

    let req = test::TestRequest::get().uri("/api/posts?page=9").to_request();
    let past_end: Value = test::call_and_read_body_json(&app, req).await;
    assert!(past_end["items"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/api/posts?page=abc").to_request();
    let fallback: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fallback["page"], 1);
}

#[actix_web::test]
async fn test_tag_listing_and_user_archive() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let bob = seed_user(&state, "bob", false).await;
    seed_post(&state, &ann, "Django tips", "body", &["Python", "Django"], 30).await;
    seed_post(&state, &bob, "Rust tips", "body", &["Rust"], 20).await;
    seed_post(&state, &bob, "Django deploys", "body", &["django", "ops"], 10).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get().uri("/api/tags/django/posts").to_request();
    let tagged: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&tagged["items"]), vec!["Django deploys", "Django tips"]);

    let req = test::TestRequest::get().uri("/api/tags/unknown/posts").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let empty: Value = test::read_body_json(res).await;
    assert_eq!(empty["total_items"], 0);

    let req = test::TestRequest::get().uri("/api/users/bob/posts").to_request();
    let archive: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&archive["items"]), vec!["Django deploys", "Rust tips"]);
    assert_eq!(archive["per_page"], 4);

    let req = test::TestRequest::get().uri("/api/users/nobody/posts").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_post_detail_hides_inactive_comments_and_recommends_similar() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let a = seed_post(&state, &ann, "A", "body", &["python", "django"], 30).await;
    let b = seed_post(&state, &ann, "B", "body", &["django", "web"], 20).await;
    seed_post(&state, &ann, "C", "body", &["cooking"], 10).await;
    seed_comment(&state, &a, "Visible", true).await;
    seed_comment(&state, &a, "Hidden", false).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", a.id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(detail["post"]["title"], "A");
    let comments = detail["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["name"], "Visible");
    assert!(comments[0].get("email").is_none());

    let similar = detail["similar_posts"].as_array().unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0]["post"]["id"], b.id.to_string());
    assert_eq!(similar[0]["shared_tags"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_post_requires_auth_and_a_valid_form() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let app = init_app!(state, tokens);

    let form = json!({"title": "Hello", "content": "World", "tags": ["Rust Lang", "rust lang"]});

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(&form)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&tokens, &ann))
        .set_json(json!({"title": " ", "content": ""}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let problem: Value = test::read_body_json(res).await;
    let detail = problem["detail"].as_str().unwrap();
    assert!(detail.contains("title is required"));
    assert!(detail.contains("content is required"));

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&tokens, &ann))
        .set_json(&form)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(res).await;
    assert_eq!(created["author_id"], ann.id.to_string());
    assert_eq!(created["tags"], json!([{"name": "Rust Lang", "slug": "rust-lang"}]));
}

#[actix_web::test]
async fn test_only_the_author_may_edit_or_delete() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let bob = seed_user(&state, "bob", false).await;
    let post = seed_post(&state, &ann, "Mine", "body", &["a"], 10).await;
    let app = init_app!(state, tokens);

    let uri = format!("/api/posts/{}", post.id);
    let edit = json!({"title": "Edited", "content": "new body", "tags": ["b"]});

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&tokens, &bob))
        .set_json(&edit)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&tokens, &bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&tokens, &ann))
        .set_json(&edit)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(res).await;
    assert_eq!(updated["title"], "Edited");
    assert_eq!(updated["tags"][0]["slug"], "b");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&tokens, &ann))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_submission() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let post = seed_post(&state, &ann, "Post", "body", &[], 10).await;
    let app = init_app!(state, tokens);

    let comment = json!({"name": "Bob", "email": "bob@example.com", "body": "Nice"});

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", uuid::Uuid::new_v4()))
        .insert_header(bearer(&tokens, &ann))
        .set_json(&comment)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", post.id))
        .insert_header(bearer(&tokens, &ann))
        .set_json(json!({"name": "Bob", "email": "bob", "body": "Nice"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", post.id))
        .insert_header(bearer(&tokens, &ann))
        .set_json(&comment)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(res).await;
    assert_eq!(created["active"], true);
    assert_eq!(created["post_id"], post.id.to_string());
}

#[actix_web::test]
async fn test_search_ranks_matches_and_validates_input() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    seed_post(&state, &ann, "Platforms", "This is a blogging platform", &[], 20).await;
    seed_post(&state, &ann, "Dinner", "Cooking fresh pasta", &[], 10).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get()
        .uri("/api/search?query=blogging%20platforms")
        .to_request();
    let found: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found["query"], "blogging platforms");
    let results = found["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["post"]["title"], "Platforms");
    assert!(results[0]["rank"].as_f64().unwrap() > 0.0);

    let req = test::TestRequest::get().uri("/api/search").to_request();
    let idle: Value = test::call_and_read_body_json(&app, req).await;
    assert!(idle["query"].is_null());
    assert!(idle["results"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/api/search?query=%20").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_web::test]
async fn test_share_sends_the_composed_mail() {
    let mailer = Arc::new(RecordingMailer::default());
    let state = state_with(mailer.clone());
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let post = seed_post(&state, &ann, "Ownership", "body", &[], 10).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/share", post.id))
        .set_json(json!({
            "name": "Ann",
            "email": "ann@example.com",
            "to": "bob@example.com",
            "comments": "worth it"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["sent"], true);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Ann recommends you read 'Ownership'");
    assert_eq!(sent[0].to, vec!["bob@example.com".to_string()]);
    assert!(
        sent[0]
            .body
            .contains(&format!("https://blog.example.com/post/{}/", post.id))
    );
    assert!(sent[0].body.ends_with("Ann's comments: worth it"));
}

#[actix_web::test]
async fn test_share_reports_mail_failures_and_bad_forms() {
    let state = state_with(Arc::new(FailingMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let post = seed_post(&state, &ann, "Ownership", "body", &[], 10).await;
    let app = init_app!(state, tokens);

    let uri = format!("/api/posts/{}/share", post.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_json(json!({"name": "Ann", "email": "ann@example.com", "to": "bob@example.com"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_json(json!({"name": "A name that is far too long to fit", "email": "x", "to": "y"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_unknown_post_wins_over_invalid_form() {
    let mailer = Arc::new(RecordingMailer::default());
    let state = state_with(mailer.clone());
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let app = init_app!(state, tokens);

    let missing = uuid::Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{missing}/share"))
        .set_json(json!({"name": "", "email": "x", "to": "y"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{missing}/comments"))
        .insert_header(bearer(&tokens, &ann))
        .set_json(json!({"name": "", "email": "bob", "body": ""}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn test_moderation_is_staff_only() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let mod_user = seed_user(&state, "moderator", true).await;
    let post = seed_post(&state, &ann, "Post", "body", &[], 10).await;
    seed_comment(&state, &post, "Visible", true).await;
    let hidden = seed_comment(&state, &post, "Hidden", false).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get()
        .uri("/api/admin/comments")
        .insert_header(bearer(&tokens, &ann))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/admin/comments?active=false")
        .insert_header(bearer(&tokens, &mod_user))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], hidden.id.to_string());
    assert_eq!(listed[0]["email"], "hidden@example.com");

    let req = test::TestRequest::get()
        .uri("/api/admin/comments?q=VISIBLE")
        .insert_header(bearer(&tokens, &mod_user))
        .to_request();
    let searched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(searched.as_array().unwrap().len(), 1);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/admin/comments/{}", hidden.id))
        .insert_header(bearer(&tokens, &mod_user))
        .set_json(json!({"active": true}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", post.id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_stats_widgets() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let ann = seed_user(&state, "ann", false).await;
    let quiet = seed_post(&state, &ann, "Quiet", "body", &[], 20).await;
    let busy = seed_post(&state, &ann, "Busy", "body", &[], 30).await;
    seed_comment(&state, &quiet, "One", true).await;
    seed_comment(&state, &busy, "One", true).await;
    seed_comment(&state, &busy, "Two", false).await;
    let app = init_app!(state, tokens);

    let req = test::TestRequest::get().uri("/api/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(stats["total_posts"], 2);
    assert_eq!(titles(&stats["latest_posts"]), vec!["Quiet", "Busy"]);
    assert_eq!(stats["most_commented"][0]["post"]["title"], "Busy");
    assert_eq!(stats["most_commented"][0]["total_comments"], 2);
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let state = state_with(Arc::new(LogMailer));
    let tokens = tokens();
    let app = init_app!(state, tokens);

    let register = json!({"username": "ann", "email": "Ann@Example.com", "password": "correct horse"});

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "ann", "password": "wrong password"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "ann", "password": "correct horse"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let auth: Value = test::read_body_json(res).await;
    assert_eq!(auth["token_type"], "Bearer");
    let token = auth["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "ann");
    assert_eq!(me["roles"], json!(["user"]));
}
