/// Router Module Index
///
/// Routing is segregated by access level, and each level gets its middleware
/// applied explicitly in `create_router` so no protected endpoint can be
/// exposed by accident.

/// Routes accessible without a session (health, register, login).
pub mod public;

/// Routes behind the `AuthUser` extractor middleware.
pub mod authenticated;

/// Routes whose operations only ADMIN accounts may complete. The role check
/// itself lives in the authorization policy, not the router.
pub mod admin;
