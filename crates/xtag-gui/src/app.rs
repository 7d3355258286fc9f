mod bus;
mod micro_ticker;
mod state;
mod update;
mod view;

pub use bus::BusFlushOutcome;
pub use state::{App, Message};
