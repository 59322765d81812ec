//! Declarative macros for ergonomic effect construction
//!
//! Most effects in the onboarding client are a single backend request whose
//! outcome is turned into a success or failure action. These macros keep that
//! shape readable inside reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use onboarding_core::async_effect;
///
/// async_effect! {
///     navigator.redirect("/register");
///     None
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that awaits a fallible request
///
/// The request future must resolve to a `Result`. Exactly one of the two
/// handlers runs and its `Option<Action>` is fed back into the reducer.
///
/// # Example
///
/// ```rust,ignore
/// use onboarding_core::request;
///
/// request! {
///     call: purchases.delete_purchase(variant_id),
///     on_success: |()| Some(OnboardingAction::PurchaseDeleted { variant_id }),
///     on_error: |error| Some(OnboardingAction::MutationFailed { error })
/// }
/// ```
#[macro_export]
macro_rules! request {
    (
        call: $call:expr,
        on_success: |$success_param:pat_param| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use onboarding_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(5),
///     action: OnboardingAction::DismissNotification { id }
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
