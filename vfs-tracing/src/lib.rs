//! Tracing bootstrap shared by consumers of `vfs-core`.
//!
//! This is deliberately small: `vfs-core` itself only depends on the
//! `tracing` facade and never initialises a subscriber on its own, so a
//! library consumer (or a test binary) can wire up output however it likes.
//! This crate is the "reasonable default" for anything that wants stderr
//! logging with `RUST_LOG` support, in the same spirit as `tvix-tracing`.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

pub struct TracingBuilder {
    level: Level,
}

impl Default for TracingBuilder {
    fn default() -> Self {
        TracingBuilder { level: Level::INFO }
    }
}

impl TracingBuilder {
    /// Sets the default log level for the stderr layer. `RUST_LOG` still
    /// takes priority over this value.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Installs a global stderr subscriber filtered by `RUST_LOG` (falling
    /// back to the configured level).
    pub fn build(self) -> Result<(), Error> {
        let subscriber = tracing_subscriber::registry().with(
            EnvFilter::builder()
                .with_default_directive(self.level.into())
                .from_env()
                .expect("invalid RUST_LOG"),
        );

        subscriber
            .with(tracing_subscriber::fmt::Layer::new().compact())
            .try_init()?;

        Ok(())
    }
}
