//! Static assets served from the contextual file-system binding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use tracing::{debug, error, warn};

use super::Handler;
use crate::core::{Context, DispatchError, Response};

/// Serves the file at the remaining request path, or the first existing
/// index file when that path is a directory. Anything else is passed on.
///
/// Files are read on a spawned task; the context renders from there.
pub(crate) struct AssetsHandler {
    index_files: Arc<[String]>,
}

impl AssetsHandler {
    pub(crate) fn new(index_files: &[&str]) -> Self {
        Self {
            index_files: index_files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Handler for AssetsHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let method = ctx.request().method();
        if method != Method::GET && method != Method::HEAD {
            return ctx.next();
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => return Err(DispatchError::handler("assets must be served on a Tokio runtime")),
        };

        let target = ctx.file_system().file_for_uri_path(ctx.path_binding().remaining());
        let index_files = Arc::clone(&self.index_files);
        runtime.spawn(async move {
            if let Err(e) = serve(ctx, target, &index_files).await {
                warn!(error = %e, "asset dispatch failed");
            }
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "assets"
    }
}

async fn serve(ctx: Context, target: PathBuf, index_files: &[String]) -> Result<(), DispatchError> {
    let Some(file) = locate(&target, index_files).await else {
        debug!(path = %target.display(), "no asset");
        return ctx.next();
    };

    match tokio::fs::read(&file).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            ctx.render(Response::ok(Bytes::from(contents)).with_header("content-type", mime.as_ref()))
        }
        Err(e) => {
            error!("Failed to read file {:?}: {}", file, e);
            ctx.render(Response::internal_error("Internal Server Error"))
        }
    }
}

/// `target` itself when it is a file, else its first index file.
async fn locate(target: &Path, index_files: &[String]) -> Option<PathBuf> {
    let meta = tokio::fs::metadata(target).await.ok()?;
    if meta.is_file() {
        return Some(target.to_path_buf());
    }
    if !meta.is_dir() {
        return None;
    }
    for index in index_files {
        let candidate = target.join(index);
        if tokio::fs::metadata(&candidate).await.map_or(false, |m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}
