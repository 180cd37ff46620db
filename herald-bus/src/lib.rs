//! # herald-bus
//!
//! Change propagation between execution contexts that share one store.
//!
//! [`ContentBus`] combines the synchronous same-context transport
//! ([`herald_core::LocalBroadcast`]) with [`SignalBroadcast`], which carries
//! changes to other processes through signal files watched with `notify`.
//! [`ContentView`] is what a renderer holds: the latest observed document per
//! key, kept current by the bus.

pub mod bus;
mod error;
pub mod signal;
pub mod view;

pub use bus::ContentBus;
pub use error::BusError;
pub use signal::{SignalBroadcast, SignalEnvelope};
pub use view::ContentView;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `default`. Records emitted through the `log` facade by
/// the store and workflow crates are captured as well. Calling this twice is
/// harmless.
pub fn init_tracing(default: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
