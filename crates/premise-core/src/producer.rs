//! Prerequisite producers.
//!
//! A producer supplies the values a test is arranged from: exactly one value
//! for "given" producers, the items of a finite collection for "given each of"
//! producers. Producer failures are not handled here; they surface from
//! [`Test::arrange`](crate::Test::arrange) as arrangement failures.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::context::SharedContext;
use crate::error::BoxError;
use crate::outcome::{capture, capture_async};

/// Bound shared by every prerequisite value.
///
/// Values are cloned into each case of the cross product and rendered with
/// `Debug` to describe cases.
pub trait Value: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Supplies an ordered, finite sequence of prerequisite values.
#[async_trait]
pub trait Prerequisite<T: Send + 'static>: Send + Sync {
    /// Produces the values, in order.
    ///
    /// # Errors
    /// Returns an error if the underlying factory fails or panics.
    async fn produce(&self, ctx: &SharedContext) -> Result<Vec<T>, BoxError>;
}

/// Single value from a factory closure.
pub struct Single<F> {
    factory: F,
}

impl<F> Single<F> {
    /// Wraps `factory`.
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<T, F> Prerequisite<T> for Single<F>
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync,
{
    async fn produce(&self, _ctx: &SharedContext) -> Result<Vec<T>, BoxError> {
        let value = capture(&self.factory)?;
        Ok(vec![value])
    }
}

/// Every item of the collection returned by a factory closure.
pub struct EachOf<F, I> {
    factory: F,
    _items: PhantomData<fn() -> I>,
}

impl<F, I> EachOf<F, I>
where
    F: Fn() -> I,
{
    /// Wraps `factory`.
    pub const fn new(factory: F) -> Self {
        Self {
            factory,
            _items: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, I> Prerequisite<T> for EachOf<F, I>
where
    T: Send + 'static,
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = T>,
{
    async fn produce(&self, _ctx: &SharedContext) -> Result<Vec<T>, BoxError> {
        let values = capture(|| (self.factory)().into_iter().collect::<Vec<_>>())?;
        Ok(values)
    }
}

/// Single value from a fallible factory closure.
pub struct Fallible<F> {
    factory: F,
}

impl<F> Fallible<F> {
    /// Wraps `factory`.
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<T, E, F> Prerequisite<T> for Fallible<F>
where
    T: Send + 'static,
    E: Into<BoxError>,
    F: Fn() -> Result<T, E> + Send + Sync,
{
    async fn produce(&self, _ctx: &SharedContext) -> Result<Vec<T>, BoxError> {
        match capture(&self.factory)? {
            Ok(value) => Ok(vec![value]),
            Err(err) => Err(err.into()),
        }
    }
}

/// Single value from an async factory closure.
pub struct Deferred<F> {
    factory: F,
}

impl<F> Deferred<F> {
    /// Wraps `factory`.
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<T, F, Fut> Prerequisite<T> for Deferred<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
{
    async fn produce(&self, _ctx: &SharedContext) -> Result<Vec<T>, BoxError> {
        let future = capture(&self.factory)?;
        let value = capture_async(future).await?;
        Ok(vec![value])
    }
}

/// The host-supplied test context itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct Context;

#[async_trait]
impl Prerequisite<SharedContext> for Context {
    async fn produce(&self, ctx: &SharedContext) -> Result<Vec<SharedContext>, BoxError> {
        Ok(vec![SharedContext::clone(ctx)])
    }
}
