//! Path, prefix, method and request predicates over HTTP.

use crate::helpers::*;
use reqwest::{Method, StatusCode};
use tokio_chain::core::{Context, Response};

fn routes() -> tokio_chain::handler::ChainHandler {
    app(|chain| {
        chain
            .path_root(|ctx: Context| ctx.render(Response::ok("root")))?
            .prefix("api", |api| {
                api.get_path("users/:id", |ctx: Context| {
                    let id = ctx.path_binding().token("id").unwrap_or_default().to_string();
                    ctx.render(Response::ok(format!("user {}", id)))
                })?
                .post_path("users", |ctx: Context| {
                    let body = String::from_utf8_lossy(ctx.request().body()).into_owned();
                    ctx.render(Response::ok(format!("created {}", body)).with_status(StatusCode::CREATED))
                })?
                .header("x-api-version", "2", |ctx: Context| ctx.render(Response::ok("v2")))?
                .all(|ctx: Context| ctx.render(Response::ok("api fallback")))?;
                Ok(())
            })?
            .host("admin.local", |admin| {
                admin.all(|ctx: Context| ctx.render(Response::ok("admin")))?;
                Ok(())
            })?
            .content_type("application/json", |ctx: Context| ctx.render(Response::ok("json body")))?
            .prefix("old", |old| {
                old.redirect(301, "/")?;
                Ok(())
            })?;
        Ok(())
    })
}

#[tokio::test]
async fn test_root_path() {
    let server = TestServer::start(routes()).await;
    assert_body(server.get("/").await, StatusCode::OK, "root").await;
}

#[tokio::test]
async fn test_prefix_binds_tokens() {
    let server = TestServer::start(routes()).await;
    assert_body(server.get("/api/users/42").await, StatusCode::OK, "user 42").await;
}

#[tokio::test]
async fn test_method_predicate_falls_through() {
    let server = TestServer::start(routes()).await;

    let resp = server
        .client
        .post(server.url("/api/users"))
        .body("alice")
        .send()
        .await
        .unwrap();
    assert_body(resp, StatusCode::CREATED, "created alice").await;

    // DELETE matches nothing inside the prefix but the catch-all
    let resp = server.request(Method::DELETE, "/api/users/42").await;
    assert_body(resp, StatusCode::OK, "api fallback").await;
}

#[tokio::test]
async fn test_header_predicate() {
    let server = TestServer::start(routes()).await;

    let resp = server.get_with_headers("/api/anything", &[("x-api-version", "2")]).await;
    assert_body(resp, StatusCode::OK, "v2").await;

    let resp = server.get_with_headers("/api/anything", &[("x-api-version", "1")]).await;
    assert_body(resp, StatusCode::OK, "api fallback").await;
}

#[tokio::test]
async fn test_host_predicate() {
    let server = TestServer::start(routes()).await;

    let resp = server.get_with_headers("/dashboard", &[("host", "admin.local")]).await;
    assert_body(resp, StatusCode::OK, "admin").await;

    let resp = server.get("/dashboard").await;
    assert_status(&resp, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_type_predicate() {
    let server = TestServer::start(routes()).await;

    let resp = server
        .client
        .post(server.url("/submit"))
        .header("content-type", "application/json; charset=utf-8")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_body(resp, StatusCode::OK, "json body").await;
}

#[tokio::test]
async fn test_redirect() {
    let server = TestServer::start(routes()).await;

    let resp = server.get("/old/page").await;
    assert_status(&resp, StatusCode::MOVED_PERMANENTLY);
    assert_header(&resp, "location", "/");
}

#[tokio::test]
async fn test_end_of_chain_is_404() {
    let server = TestServer::start(routes()).await;

    let resp = server.get("/nowhere").await;
    assert_header(&resp, "content-type", "text/plain; charset=utf-8");
    assert_header(&resp, "server", "tokio_chain");
    assert_body(resp, StatusCode::NOT_FOUND, "Not Found").await;
}
