//! Registry scoping and handler resolution over HTTP.

use std::sync::Arc;

use crate::helpers::*;
use reqwest::StatusCode;
use tokio_chain::core::{Context, DispatchError, Response};
use tokio_chain::dispatch::Dispatcher;
use tokio_chain::handler::{resolve, Chain, ClientErrorHandler, Handler};
use tokio_chain::registry::Registry;

struct Greeting(&'static str);

trait Page: Handler {}

struct About;

impl Handler for About {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        ctx.render(Response::ok("about us"))
    }
}

impl Page for About {}

fn greet(ctx: Context) -> Result<(), DispatchError> {
    let greeting = ctx.maybe_get::<Greeting>().map_or("none", |g| g.0);
    ctx.render(Response::ok(greeting))
}

#[tokio::test]
async fn test_nested_registry_is_not_visible_to_siblings() {
    let app = app(|chain| {
        chain
            .register_with(Registry::single(Greeting("hello")), |inner| {
                inner.path("inner", greet)?;
                Ok(())
            })?
            .path("outer", greet)?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_body(server.get("/inner").await, StatusCode::OK, "hello").await;
    assert_body(server.get("/outer").await, StatusCode::OK, "none").await;
}

#[tokio::test]
async fn test_register_applies_to_later_handlers() {
    let app = app(|chain| {
        chain
            .path("before", greet)?
            .register(Registry::single(Greeting("later")))?
            .path("after", greet)?;
        Ok(())
    });
    let server = TestServer::start(app).await;

    assert_body(server.get("/before").await, StatusCode::OK, "none").await;
    assert_body(server.get("/after").await, StatusCode::OK, "later").await;
}

#[tokio::test]
async fn test_build_registry_serves_requests() {
    let page: Arc<dyn Page> = Arc::new(About);
    let registry = Registry::builder()
        .add(Greeting("base"))
        .add_arc(page)
        .build();

    let app = Chain::build(&registry, |chain| {
        chain.path("about", resolve::<dyn Page>())?.path("greet", greet)?;
        Ok(())
    })
    .expect("chain should build");

    let server = TestServer::start(app).await;
    assert_body(server.get("/about").await, StatusCode::OK, "about us").await;
    assert_body(server.get("/greet").await, StatusCode::OK, "base").await;
}

#[tokio::test]
async fn test_custom_client_error_handler() {
    struct JsonErrors;

    impl ClientErrorHandler for JsonErrors {
        fn error(&self, ctx: Context, status: StatusCode) -> Result<(), DispatchError> {
            ctx.render(
                Response::status_only(status)
                    .with_header("content-type", "application/json")
                    .with_body(format!("{{\"status\":{}}}", status.as_u16())),
            )
        }
    }

    let errors: Arc<dyn ClientErrorHandler> = Arc::new(JsonErrors);

    // 404 past the end of the root chain uses the base registry
    let root_app = app(|chain| {
        chain.path("x", greet)?;
        Ok(())
    });
    let dispatcher = Dispatcher::new(root_app).with_registry(Registry::single_arc(Arc::clone(&errors)));
    let server = TestServer::with_dispatcher(dispatcher).await;

    let resp = server.get("/missing").await;
    assert_header(&resp, "content-type", "application/json");
    assert_body(resp, StatusCode::NOT_FOUND, "{\"status\":404}").await;

    // A 405 inside a scoped chain uses the handler registered for that scope
    let scoped_app = app(move |chain| {
        chain.register_with(Registry::single_arc(errors), |api| {
            api.path("items", |ctx: Context| ctx.by_method(|m| {
                m.get(|ctx| ctx.render(Response::ok("[]")));
            }))?;
            Ok(())
        })?;
        Ok(())
    });
    let server = TestServer::start(scoped_app).await;

    let resp = server.request(reqwest::Method::DELETE, "/items").await;
    assert_header(&resp, "allow", "GET");
    assert_body(resp, StatusCode::METHOD_NOT_ALLOWED, "{\"status\":405}").await;
}

#[tokio::test]
async fn test_client_error_handler_from_build_registry() {
    struct PlainErrors;

    impl ClientErrorHandler for PlainErrors {
        fn error(&self, ctx: Context, status: StatusCode) -> Result<(), DispatchError> {
            ctx.render(Response::status_only(status).with_body(format!("no route ({})", status.as_u16())))
        }
    }

    let errors: Arc<dyn ClientErrorHandler> = Arc::new(PlainErrors);
    let app = Chain::build(&Registry::single_arc(errors), |chain| {
        chain.path("x", greet)?;
        Ok(())
    })
    .expect("chain should build");
    let server = TestServer::start(app).await;

    assert_body(server.get("/missing").await, StatusCode::NOT_FOUND, "no route (404)").await;
}
