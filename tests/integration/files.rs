//! File-system binding and static assets over HTTP.

use crate::helpers::*;
use reqwest::StatusCode;
use tokio_chain::core::{Context, Response};
use tokio_chain::dispatch::Dispatcher;
use tokio_chain::file_system::FileSystemBinding;

#[tokio::test]
async fn test_assets_from_rebound_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("public/css")).unwrap();
    std::fs::write(dir.path().join("public/css/site.css"), "body {}").unwrap();
    std::fs::write(dir.path().join("public/hello world.txt"), "spaced").unwrap();
    std::fs::write(dir.path().join("public/index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let app = app(|chain| {
        chain
            .assets("public", &["index.html"])?
            .path("where", |ctx: Context| {
                let root = ctx.file_system().root().display().to_string();
                ctx.render(Response::ok(root))
            })?;
        Ok(())
    });

    let dispatcher = Dispatcher::new(app).with_file_system(FileSystemBinding::new(dir.path()));
    let server = TestServer::with_dispatcher(dispatcher).await;

    let resp = server.get("/public/css/site.css").await;
    assert_header(&resp, "content-type", "text/css");
    assert_body(resp, StatusCode::OK, "body {}").await;
    assert_body(server.get("/public/hello%20world.txt").await, StatusCode::OK, "spaced").await;
    assert_body(server.get("/public").await, StatusCode::OK, "<h1>home</h1>").await;

    // Only the rebound root is served from
    assert_status(&server.get("/public/secret.txt").await, StatusCode::NOT_FOUND);
    assert_status(&server.get("/public/missing.css").await, StatusCode::NOT_FOUND);

    // The rebind does not leak out of its nested chain
    let expected = dir.path().display().to_string();
    assert_body(server.get("/where").await, StatusCode::OK, &expected).await;
}

#[tokio::test]
async fn test_file_system_rebind_under_prefix() {
    let app = app(|chain| {
        chain.prefix("static", |assets| {
            assets.file_system("public", |public| {
                public.all(|ctx: Context| {
                    let file = ctx.file_system().file_for_uri_path(ctx.path_binding().remaining());
                    ctx.render(Response::ok(file.display().to_string()))
                })?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    });

    let dispatcher = Dispatcher::new(app).with_file_system(FileSystemBinding::new("/srv"));
    let server = TestServer::with_dispatcher(dispatcher).await;

    assert_body(server.get("/static/css/a.css").await, StatusCode::OK, "/srv/public/css/a.css").await;
    assert_body(server.get("/static/a%20b.txt").await, StatusCode::OK, "/srv/public/a b.txt").await;
}
