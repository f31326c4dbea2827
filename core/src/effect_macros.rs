//! Declarative macros for ergonomic effect construction
//!
//! These macros cut the boilerplate of boxing futures and actions when a
//! reducer returns effects.

/// Create an `Effect::Future` from an async block
///
/// The block evaluates to `Option<Action>`; `Some` is fed back into the reducer.
///
/// # Example
///
/// ```rust,ignore
/// use pantry_core::async_effect;
///
/// async_effect! {
///     let batch = repository.soft_delete(ids, variant).await.ok()?;
///     Some(ListAction::SoftDeleted { batch: batch.id, count: batch.count })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}

/// Create an `Effect::Delay` that dispatches an action after a duration
///
/// # Example
///
/// ```rust,ignore
/// use pantry_core::delay;
///
/// delay! {
///     duration: Duration::from_secs(4),
///     action: ListAction::UndoWindowElapsed { batch }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
