/// Router Module Index
///
/// Splits the HTTP surface by what the request carries. Every module is wrapped by
/// the route guard in `create_router`; the guard decides page access, these modules
/// only decide what exists.

/// Routes accessible to everyone: health, derived session, provider callback.
pub mod public;

/// Routes acting on the caller's session indicator.
pub mod session;

/// The page renderer boundary. Everything not matched above falls through here.
pub mod pages;
