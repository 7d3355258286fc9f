use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use flexi_logger::LoggerHandle;
use iced::{
    Size, Task,
    window::{self, Id},
};
use log::info;
use xtag_core::{
    ElementContext,
    adapters::typesetter_from_config,
    config::manager::{ConfigApplied, ConfigDegradation, ConfigManager},
    event_bus::{EventReceiver, EventSender},
    page::Page,
    registry::ElementRegistry,
};
use xtag_proto::config::{Config, PageConfig};
use tokio::runtime::Handle;

use super::{bus::BusFlushOutcome, micro_ticker::MicroTicker};

pub struct App {
    pub(super) config_path: PathBuf,
    pub(super) logger: LoggerHandle,
    pub(super) config_manager: Arc<ConfigManager>,
    pub(super) bus_receiver: Arc<Mutex<EventReceiver>>,
    pub(super) micro_ticker: MicroTicker,
    pub(super) context: ElementContext,
    pub(super) page: Page<'static>,
    pub(super) window: Option<Id>,
    pub config: Config,
}

#[derive(Debug, Clone)]
pub enum Message {
    None,
    MicroTick,
    BusFlushed(BusFlushOutcome),
    ConfigChanged(ConfigApplied),
    ConfigDegraded(ConfigDegradation),
    WindowOpened(Id),
    WindowClosed(Id),
}

impl App {
    pub fn new(
        (logger, config, config_manager, config_path, event_sender, runtime_handle, bus_receiver): (
            LoggerHandle,
            Config,
            Arc<ConfigManager>,
            PathBuf,
            EventSender,
            Handle,
            EventReceiver,
        ),
    ) -> impl FnOnce() -> (Self, Task<Message>) {
        move || {
            let context = ElementContext::new(
                event_sender,
                runtime_handle,
                typesetter_from_config(&config.typeset),
            );

            let mut page = Page::new(ElementRegistry::global());
            let diff = page.mount(&config.elements, &context);
            info!("Mounted {} elements", diff.attached.len());

            let (_, open) = window::open(window_settings(&config.page));

            let app = App {
                config_path,
                logger,
                config_manager,
                bus_receiver: Arc::new(Mutex::new(bus_receiver)),
                micro_ticker: MicroTicker::default(),
                context,
                page,
                window: None,
                config,
            };

            (app, open.map(Message::WindowOpened))
        }
    }

    pub fn page(&self) -> &Page<'static> {
        &self.page
    }
}

pub(super) fn window_size(page: &PageConfig) -> Size {
    Size::new(page.width.to_pixels(), page.height.to_pixels())
}

fn window_settings(page: &PageConfig) -> window::Settings {
    window::Settings {
        size: window_size(page),
        ..window::Settings::default()
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::{num::NonZeroUsize, sync::OnceLock};

    use flexi_logger::LoggerHandle;
    use xtag_core::{event_bus::EventBus, page::ElementNode};
    use xtag_proto::config::{CssLength, ElementDef};

    use super::*;

    pub(in crate::app) fn test_logger() -> LoggerHandle {
        static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();
        LOGGER
            .get_or_init(|| {
                flexi_logger::Logger::try_with_env_or_str("off")
                    .expect("failed to configure test logger")
                    .start()
                    .expect("failed to start test logger")
            })
            .clone()
    }

    pub(in crate::app) fn test_app(config: Config, runtime: &tokio::runtime::Runtime) -> (App, EventBus) {
        let bus = EventBus::new(NonZeroUsize::new(16).expect("non-zero"));
        let config_manager = Arc::new(ConfigManager::new(config.clone()));

        let (app, _) = runtime.block_on(async {
            App::new((
                test_logger(),
                config,
                config_manager,
                PathBuf::new(),
                bus.sender(),
                Handle::current(),
                bus.receiver(),
            ))()
        });

        (app, bus)
    }

    #[test]
    fn new_mounts_configured_elements() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mut config = Config::default();
        config
            .elements
            .push(ElementDef::new("x-math").with_id("euler").with_content("e^{i\\pi}"));

        let (app, _bus) = test_app(config, &runtime);

        let ids: Vec<&str> = app
            .page()
            .elements()
            .iter()
            .map(|element| element.id().as_str())
            .collect();
        assert_eq!(ids, vec!["x-clock-0", "euler"]);
        assert!(
            app.page()
                .elements()
                .iter()
                .all(|element| matches!(element.node(), ElementNode::Custom(_)))
        );
    }

    #[test]
    fn window_size_follows_page_dimensions() {
        let page = PageConfig {
            width: CssLength::px(300.),
            height: "12pt".parse().expect("valid length"),
            ..PageConfig::default()
        };

        assert_eq!(window_size(&page), Size::new(300., 16.));
    }
}
