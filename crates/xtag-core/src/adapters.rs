//! Typesetting engines behind [`TypesetPort`].

mod command_typesetter;
mod unicode_typesetter;

use std::{sync::Arc, time::Duration};

use log::info;
use xtag_proto::{config::TypesetConfig, ports::typeset::TypesetPort};

pub use command_typesetter::CommandTypesetter;
pub use unicode_typesetter::UnicodeTypesetter;

/// Selects the engine described by the `[typeset]` section: the configured
/// command when present, the built-in Unicode typesetter otherwise.
pub fn typesetter_from_config(config: &TypesetConfig) -> Arc<dyn TypesetPort> {
    match &config.command {
        Some(command) => {
            info!("Typesetting math with `{command}`");
            Arc::new(CommandTypesetter::new(
                command.clone(),
                Duration::from_millis(config.timeout_ms),
            ))
        }
        None => {
            info!("Typesetting math with the built-in Unicode typesetter");
            Arc::new(UnicodeTypesetter)
        }
    }
}
