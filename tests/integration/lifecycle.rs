//! Deferred rendering, failures, timeouts, concurrency and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::helpers::*;
use reqwest::StatusCode;
use tokio_chain::core::{Context, DispatchError, Response};
use tokio_chain::dispatch::Dispatcher;

#[tokio::test]
async fn test_render_from_spawned_task() {
    let app = app(|chain| {
        chain.all(|ctx: Context| -> Result<(), DispatchError> {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _ = ctx.render(Response::ok("deferred"));
            });
            Ok(())
        })?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_body(server.get("/").await, StatusCode::OK, "deferred").await;
}

#[tokio::test]
async fn test_handler_error_is_500() {
    let app = app(|chain| {
        chain.all(|_ctx: Context| -> Result<(), DispatchError> { Err(DispatchError::handler("database down")) })?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_body(server.get("/").await, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").await;
}

#[tokio::test]
async fn test_dropped_context_is_500() {
    let app = app(|chain| {
        chain.all(|ctx: Context| -> Result<(), DispatchError> {
            drop(ctx);
            Ok(())
        })?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_status(&server.get("/").await, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_request_timeout_is_504() {
    let app = app(|chain| {
        chain.all(|ctx: Context| -> Result<(), DispatchError> {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                let _ = ctx.render(Response::ok("too late"));
            });
            Ok(())
        })?;
        Ok(())
    });
    let dispatcher = Dispatcher::new(app).with_request_timeout(Some(Duration::from_millis(50)));
    let server = TestServer::with_dispatcher(dispatcher).await;

    assert_status(&server.get("/").await, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_close_hooks_fire_once_per_request() {
    let closed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&closed);

    let app = app(move |chain| {
        chain
            .all(move |ctx: Context| {
                let seen = Arc::clone(&seen);
                ctx.on_close(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                });
                ctx.next()
            })?
            .prefix("a", |a| {
                a.path("b", |ctx: Context| ctx.render(Response::ok("b")))?;
                Ok(())
            })?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_status(&server.get("/a/b").await, StatusCode::OK);
    assert_status(&server.get("/a/missing").await, StatusCode::NOT_FOUND);
    assert_eq!(closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let app = app(|chain| {
        chain.path(":n", |ctx: Context| {
            let n = ctx.path_binding().token("n").unwrap_or_default().to_string();
            ctx.render(Response::ok(n))
        })?;
        Ok(())
    });
    let server = Arc::new(TestServer::start(app).await);

    let mut handles = Vec::new();
    for i in 0..20 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            let resp = server.get(&format!("/{}", i)).await;
            assert_eq!(resp.text().await.unwrap(), i.to_string());
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_http2_prior_knowledge() {
    let app = app(|chain| {
        chain.all(|ctx: Context| {
            let version = format!("{:?}", ctx.request().version());
            ctx.render(Response::ok(version))
        })?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    let client = reqwest::Client::builder().http2_prior_knowledge().build().unwrap();
    let resp = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.version(), reqwest::Version::HTTP_2);
    assert_body(resp, StatusCode::OK, "HTTP/2.0").await;
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let app = app(|chain| {
        chain.all(|ctx: Context| ctx.render(Response::ok("up")))?;
        Ok(())
    });
    let server = TestServer::start(app).await;
    let url = server.url("/");

    assert_body(server.get("/").await, StatusCode::OK, "up").await;
    assert!(server.shutdown().await);

    let result = reqwest::Client::new().get(url).send().await;
    assert!(result.is_err());
}
