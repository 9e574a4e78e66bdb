use http::StatusCode;
use tracing::info;

use tokio_chain::config::Config;
use tokio_chain::core::{ChainBuildError, Context, DispatchError, Response};
use tokio_chain::dispatch::Dispatcher;
use tokio_chain::handler::{Chain, ChainHandler};
use tokio_chain::logging;
use tokio_chain::registry::Registry;
use tokio_chain::server::Server;

/// Demo service made available to handlers through the registry.
struct Greeter {
    greeting: String,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

fn app() -> Result<ChainHandler, ChainBuildError> {
    let registry = Registry::single(Greeter {
        greeting: "Hello".to_string(),
    });

    Chain::build(&registry, |chain| {
        chain
            .all(|mut ctx: Context| {
                ctx.set_response_header("x-powered-by", "tokio_chain");
                ctx.next()
            })?
            .path_root(|ctx: Context| ctx.render(Response::text("tokio_chain demo\n")))?
            .get_path("hello/:name", greet)?
            .path("items", |ctx: Context| {
                ctx.by_method(|m| {
                    m.get(|ctx| ctx.render(Response::json("[]")))
                        .post(|ctx| ctx.render(Response::empty(StatusCode::CREATED)));
                })
            })?
            .prefix("old", |old| {
                old.redirect(301, "/")?;
                Ok(())
            })?
            .assets("public", &["index.html"])?;
        Ok(())
    })
}

fn greet(ctx: Context) -> Result<(), DispatchError> {
    let greeter = ctx.get::<Greeter>()?;
    let message = greeter.greet(ctx.path_binding().token("name").unwrap_or("world"));

    ctx.by_content(|c| {
        c.plain_text(|ctx| ctx.render(Response::ok(format!("{}\n", message))))
            .json(|ctx| ctx.render(Response::ok(serde_json::json!({ "message": message }).to_string())))
            .html(|ctx| ctx.render(Response::ok(format!("<p>{}</p>", message))));
    })
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(&config.logging);

    info!("Starting tokio_chain {}", tokio_chain::VERSION);
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let dispatcher = Dispatcher::from_config(app()?, &config.server);
    let server = Server::new(config.server, dispatcher);

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    server.trigger_shutdown();
    if !server.wait_for_drain(server.drain_timeout()).await {
        info!("Exiting with {} connections still open", server.active_connections());
    }

    Ok(())
}
