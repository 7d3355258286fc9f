use std::sync::Arc;

use iced::{Subscription, Task, time, window};
use log::{debug, error, info, warn};
use xtag_core::{
    adapters::typesetter_from_config,
    config::{
        manager::ConfigApplied,
        watch::{self, ConfigEvent},
    },
    event_bus::BusEvent,
};

use super::{
    bus::drain_bus,
    state::{App, Message, window_size},
};
use crate::get_log_spec;

impl App {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::None => Task::none(),
            Message::MicroTick => {
                Task::perform(drain_bus(Arc::clone(&self.bus_receiver)), Message::BusFlushed)
            }
            Message::BusFlushed(outcome) => {
                if outcome.had_error() {
                    error!("failed to drain event bus, keeping fast cadence");
                    self.micro_ticker.record_activity();
                }

                if outcome.is_empty() {
                    if !outcome.had_error() {
                        self.micro_ticker.record_idle();
                    }
                } else {
                    if !outcome.had_error() {
                        self.micro_ticker.record_activity();
                    }

                    for event in outcome.into_events() {
                        self.handle_bus_event(event);
                    }
                }

                Task::none()
            }
            Message::ConfigChanged(applied) => self.apply_config(applied),
            Message::ConfigDegraded(degradation) => {
                warn!(
                    "Page file could not be reloaded, keeping the current page: {}",
                    degradation.reason
                );
                Task::none()
            }
            Message::WindowOpened(id) => {
                debug!("Window {id:?} opened");
                self.window = Some(id);
                Task::none()
            }
            Message::WindowClosed(id) => {
                if self.window != Some(id) {
                    return Task::none();
                }

                let removed = self.page.unmount_all();
                info!("Window closed, detached {} elements", removed.len());
                self.window = None;

                iced::exit()
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            time::every(self.micro_ticker.interval()).map(|_| Message::MicroTick),
            watch::subscription(&self.config_path, Arc::clone(&self.config_manager)).map(
                |event| match event {
                    ConfigEvent::Applied(applied) => Message::ConfigChanged(applied),
                    ConfigEvent::Degraded(degradation) => Message::ConfigDegraded(degradation),
                },
            ),
            window::close_events().map(Message::WindowClosed),
        ])
    }

    fn handle_bus_event(&mut self, event: BusEvent) {
        match event {
            BusEvent::Element { id, event } => {
                self.page.dispatch(&id, event);
            }
        }
    }

    fn apply_config(&mut self, applied: ConfigApplied) -> Task<Message> {
        let ConfigApplied { config, impact } = applied;

        info!("New page applied");
        debug!("Config impact: {impact:?}");

        self.config = Arc::unwrap_or_clone(config);

        if impact.typeset_changed {
            self.context = self
                .context
                .with_typesetter(typesetter_from_config(&self.config.typeset));
            self.page.mount(&self.config.elements, &self.context);
        } else if impact.elements_changed {
            self.page.sync(&self.config.elements, &self.context);
        }

        if impact.log_level_changed {
            self.logger.set_new_spec(get_log_spec(&self.config.log_level));
        }

        match self.window {
            Some(id) if impact.page_changed => window::resize(id, window_size(&self.config.page)),
            _ => Task::none(),
        }
    }
}
