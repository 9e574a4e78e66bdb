//! Consuming dispatch on the request method.

use http::{header, Method, StatusCode};
use tracing::debug;

use crate::core::{Context, DispatchError, Response};

type Branch<'a> = Box<dyn FnOnce(Context) -> Result<(), DispatchError> + 'a>;

/// Branches declared inside [`Context::by_method`]. Last write wins per method.
#[derive(Default)]
pub struct ByMethodSpec<'a> {
    branches: Vec<(Method, Branch<'a>)>,
}

impl<'a> ByMethodSpec<'a> {
    /// Declare the branch for `method`.
    pub fn named<F>(&mut self, method: Method, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        let branch: Branch<'a> = Box::new(branch);
        match self.branches.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = branch,
            None => self.branches.push((method, branch)),
        }
        self
    }

    pub fn get<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::GET, branch)
    }

    pub fn post<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::POST, branch)
    }

    pub fn put<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::PUT, branch)
    }

    pub fn patch<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::PATCH, branch)
    }

    pub fn delete<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::DELETE, branch)
    }

    pub fn options<F>(&mut self, branch: F) -> &mut Self
    where
        F: FnOnce(Context) -> Result<(), DispatchError> + 'a,
    {
        self.named(Method::OPTIONS, branch)
    }

    fn allow(&self) -> String {
        self.branches
            .iter()
            .map(|(m, _)| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Context {
    /// Run exactly one branch chosen by the request method.
    ///
    /// Unmatched methods get a 405 with an `Allow` header; `OPTIONS` without
    /// its own branch gets a 200 listing the declared methods. Control never
    /// returns to the enclosing chain.
    pub fn by_method<'a, F>(mut self, block: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&mut ByMethodSpec<'a>),
    {
        let mut spec = ByMethodSpec::default();
        block(&mut spec);

        let allow = spec.allow();
        let method = self.request().method().clone();
        let selected = spec
            .branches
            .into_iter()
            .find(|(m, _)| m.as_str().eq_ignore_ascii_case(method.as_str()));

        if let Some((_, branch)) = selected {
            debug!(method = %method, "by_method branch selected");
            return branch(self);
        }

        self.set_response_header(header::ALLOW, &allow);
        if method == Method::OPTIONS {
            debug!(allow = %allow, "answering OPTIONS");
            return self.render(Response::empty(StatusCode::OK));
        }

        debug!(method = %method, allow = %allow, "no by_method branch");
        self.client_error(StatusCode::METHOD_NOT_ALLOWED)
    }
}
