//! By-method and by-content dispatch over HTTP.

use crate::helpers::*;
use reqwest::{Method, StatusCode};
use tokio_chain::core::{Context, Response};

fn resource() -> tokio_chain::handler::ChainHandler {
    app(|chain| {
        chain
            .path("things", |ctx: Context| {
                ctx.by_method(|m| {
                    m.get(|ctx| {
                        ctx.by_content(|c| {
                            c.json(|ctx| ctx.render(Response::ok("[\"a\"]")))
                                .html(|ctx| ctx.render(Response::ok("<li>a</li>")))
                                .plain_text(|ctx| ctx.render(Response::ok("a")));
                        })
                    })
                    .post(|ctx| ctx.render(Response::empty(StatusCode::CREATED)));
                })
            })?
            .all(|ctx: Context| ctx.render(Response::ok("should not be reached from /things")))?;
        Ok(())
    })
}

#[tokio::test]
async fn test_by_method_selects_branch() {
    let server = TestServer::start(resource()).await;

    let resp = server.request(Method::POST, "/things").await;
    assert_status(&resp, StatusCode::CREATED);
}

#[tokio::test]
async fn test_by_method_405_with_allow() {
    let server = TestServer::start(resource()).await;

    let resp = server.request(Method::PUT, "/things").await;
    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);
    assert_header(&resp, "allow", "GET, POST");
}

#[tokio::test]
async fn test_by_method_options() {
    let server = TestServer::start(resource()).await;

    let resp = server.request(Method::OPTIONS, "/things").await;
    assert_status(&resp, StatusCode::OK);
    assert_header(&resp, "allow", "GET, POST");
}

#[tokio::test]
async fn test_by_content_weighted_accept() {
    let server = TestServer::start(resource()).await;

    let resp = server
        .get_with_headers("/things", &[("accept", "text/plain;q=0.5, text/html;q=0.8")])
        .await;
    assert_header(&resp, "content-type", "text/html");
    assert_body(resp, StatusCode::OK, "<li>a</li>").await;
}

#[tokio::test]
async fn test_by_content_wildcard_uses_first_declared() {
    let server = TestServer::start(resource()).await;

    let resp = server.get_with_headers("/things", &[("accept", "*/*")]).await;
    assert_header(&resp, "content-type", "application/json");
    assert_body(resp, StatusCode::OK, "[\"a\"]").await;
}

#[tokio::test]
async fn test_by_content_406() {
    let server = TestServer::start(resource()).await;

    let resp = server.get_with_headers("/things", &[("accept", "image/png")]).await;
    assert_status(&resp, StatusCode::NOT_ACCEPTABLE);
}
