/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.

/// Routes accessible to all clients (health check only).
pub mod public;

/// The car inventory surface, protected by the `AuthUser` extractor
/// middleware. Role gating beyond authentication happens inside the handlers
/// through the single `require` gate.
pub mod cars;
