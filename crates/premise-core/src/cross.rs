//! Cross product of independent prerequisite streams.
//!
//! Rows are ordered row-major: the first prerequisite varies slowest, the
//! last varies fastest, exactly as nested loops with the first prerequisite
//! outermost. With no prerequisites there is a single empty row.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::SharedContext;
use crate::error::{BoxError, TestError};
use crate::producer::{Prerequisite, Value};

type Produce<P> =
    Arc<dyn Fn(SharedContext) -> BoxFuture<'static, Result<Vec<P>, BoxError>> + Send + Sync>;

/// Lazily evaluated cross product of the prerequisites declared so far.
///
/// Extending a cross product never mutates it: the result shares the earlier
/// producers and appends one more, so builders can fork freely.
pub struct CrossProduct<P> {
    produce: Produce<P>,
    arity: usize,
}

impl<P> Clone for CrossProduct<P> {
    fn clone(&self) -> Self {
        Self {
            produce: Arc::clone(&self.produce),
            arity: self.arity,
        }
    }
}

impl CrossProduct<()> {
    /// The cross product of zero prerequisites: one empty row.
    #[must_use]
    pub fn unit() -> Self {
        Self {
            produce: Arc::new(|_ctx: SharedContext| {
                futures::future::ready(Ok::<_, BoxError>(vec![()])).boxed()
            }),
            arity: 0,
        }
    }
}

impl<P: Send + 'static> CrossProduct<P> {
    /// Number of prerequisites combined so far.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Appends `next`, joining every existing row with every value it produces.
    #[must_use]
    pub fn extend<T, Q, J>(self, next: Arc<dyn Prerequisite<T>>, join: J) -> CrossProduct<Q>
    where
        T: Send + 'static,
        Q: Send + 'static,
        J: Fn(&P, &T) -> Q + Send + Sync + 'static,
    {
        let previous = self.produce;
        let index = self.arity + 1;
        let join = Arc::new(join);

        let produce: Produce<Q> = Arc::new(move |ctx: SharedContext| {
            extend_rows(
                Arc::clone(&previous),
                Arc::clone(&next),
                Arc::clone(&join),
                index,
                ctx,
            )
            .boxed()
        });

        CrossProduct {
            produce,
            arity: index,
        }
    }

    /// Evaluates every prerequisite once, in declaration order, and returns
    /// the ordered rows.
    ///
    /// # Errors
    /// Returns the first producer failure.
    pub async fn produce(&self, ctx: SharedContext) -> Result<Vec<P>, BoxError> {
        (self.produce)(ctx).await
    }
}

async fn extend_rows<P, T, Q, J>(
    previous: Produce<P>,
    next: Arc<dyn Prerequisite<T>>,
    join: Arc<J>,
    index: usize,
    ctx: SharedContext,
) -> Result<Vec<Q>, BoxError>
where
    T: Send + 'static,
    J: Fn(&P, &T) -> Q,
{
    let rows = previous(SharedContext::clone(&ctx)).await?;
    let values = next.produce(&ctx).await?;
    if values.is_empty() {
        return Err(TestError::EmptyPrerequisite { index }.into());
    }
    tracing::trace!(prerequisite = index, values = values.len(), "prerequisite produced");
    Ok(combine(&rows, &values, &*join))
}

/// Joins every row with every value, first row slowest.
pub fn combine<P, T, Q>(rows: &[P], values: &[T], join: impl Fn(&P, &T) -> Q) -> Vec<Q> {
    let mut out = Vec::with_capacity(rows.len().saturating_mul(values.len()));
    for row in rows {
        for value in values {
            out.push(join(row, value));
        }
    }
    out
}

/// A tuple of prerequisite values forming one case.
pub trait Row: Send + Sync + 'static {
    /// Textual form used as the case description.
    fn describe(&self) -> String;
}

impl Row for () {
    fn describe(&self) -> String {
        "()".to_string()
    }
}

macro_rules! impl_row {
    ($($T:ident $t:ident),+) => {
        impl<$($T: Value),+> Row for ($($T,)+) {
            fn describe(&self) -> String {
                let ($($t,)+) = self;
                let parts = [$(format!("{:?}", $t)),+];
                if let [single] = parts.as_slice() {
                    single.clone()
                } else {
                    format!("({})", parts.join(", "))
                }
            }
        }
    };
}

impl_row!(T1 t1);
impl_row!(T1 t1, T2 t2);
impl_row!(T1 t1, T2 t2, T3 t3);
impl_row!(T1 t1, T2 t2, T3 t3, T4 t4);
