//! Consuming dispatch on the negotiated response content type.

use http::{header, StatusCode};
use tracing::debug;

use crate::core::{Context, DispatchError};
use crate::negotiation::AcceptHeader;

type Branch<'a> = Box<dyn FnOnce(Context) -> Result<(), DispatchError> + 'a>;

/// Branches declared inside [`Context::by_content`], in declaration order.
#[derive(Default)]
pub struct ByContentSpec<'a> {
    branches: Vec<(String, Branch<'a>)>,
    no_match: Option<Branch<'a>>,
    unspecified: Option<Branch<'a>>,
}

impl<'a> ByContentSpec<'a> {
    /// Declare the branch for `mime`. Redeclaring a type replaces its branch
    /// but keeps its original position.
    pub fn media_type<F>(&mut self, mime: &str, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        let mime = mime.trim().to_ascii_lowercase();
        let branch: Branch<'a> = Box::new(branch);
        match self.branches.iter_mut().find(|(m, _)| *m == mime) {
            Some(slot) => slot.1 = branch,
            None => self.branches.push((mime, branch)),
        }
        self
    }

    pub fn plain_text<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.media_type("text/plain", branch)
    }

    pub fn html<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.media_type("text/html", branch)
    }

    pub fn json<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.media_type("application/json", branch)
    }

    pub fn xml<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.media_type("application/xml", branch)
    }

    /// Runs when no declared type is acceptable, instead of a 406.
    pub fn no_match<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.no_match = Some(Box::new(branch));
        self
    }

    /// Runs when the request states no preference, instead of the first
    /// declared type.
    pub fn unspecified<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.unspecified = Some(Box::new(branch));
        self
    }
}

impl Context {
    /// Run exactly one branch chosen by content negotiation.
    ///
    /// The chosen type becomes the response `Content-Type` unless the branch
    /// sets its own. Without an acceptable type the `no_match` branch runs,
    /// else a 406 is rendered. Control never returns to the enclosing chain.
    pub fn by_content<'a, F>(mut self, block: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&mut ByContentSpec<'a>),
    {
        let mut spec = ByContentSpec::default();
        block(&mut spec);

        let accept = self
            .request()
            .accept()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(AcceptHeader::parse);

        let selected = match accept {
            None => {
                if let Some(branch) = spec.unspecified {
                    debug!("by_content: no Accept header, using unspecified branch");
                    return branch(self);
                }
                (!spec.branches.is_empty()).then_some(0)
            }
            Some(accept) => {
                let offered: Vec<&str> = spec.branches.iter().map(|(m, _)| m.as_str()).collect();
                accept.best_match(&offered)
            }
        };

        match selected {
            Some(idx) => {
                let (mime, branch) = spec.branches.swap_remove(idx);
                debug!(content_type = %mime, "by_content branch selected");
                self.set_response_header(header::CONTENT_TYPE, &mime);
                branch(self)
            }
            None => match spec.no_match {
                Some(branch) => {
                    debug!("by_content: nothing acceptable, using no_match branch");
                    branch(self)
                }
                None => {
                    debug!(accept = ?self.request().accept(), "by_content: nothing acceptable");
                    self.client_error(StatusCode::NOT_ACCEPTABLE)
                }
            },
        }
    }
}
