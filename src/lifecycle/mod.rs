//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build stores & jobs → Build chain → Bind listener
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → server stops accepting and drains
//!     → rate-limit reset job and revocation sweep job exit their loops
//! ```
//!
//! # Design Decisions
//! - Background jobs are owned by their component and stop on the shared signal
//! - Fail fast: any startup error is fatal

pub mod period;
pub mod shutdown;
pub mod signals;

pub use period::ZeroPeriod;
pub use shutdown::Shutdown;
pub use signals::shutdown_on_signal;
