use std::time::Duration;

use chrono::Local;
use log::error;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use super::Message;
use crate::{ElementContext, ElementEventSender};

/// Recurring tick source owned by one clock. Dropping it cancels the task.
#[derive(Debug)]
pub(super) struct TickTimer {
    task: JoinHandle<()>,
}

impl TickTimer {
    /// Starts publishing [`Message::Tick`] through `sender` every `period`,
    /// beginning one period from now.
    pub(super) fn start(
        ctx: &ElementContext,
        sender: ElementEventSender<Message>,
        period: Duration,
    ) -> Self {
        let task = ctx.runtime_handle().spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Err(err) = sender.try_send(Message::Tick(Local::now())) {
                    error!("Failed to publish clock tick for {}: {err}", sender.id());
                }
            }
        });

        Self { task }
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
