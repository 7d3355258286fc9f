use std::{
    any::TypeId,
    ffi::{OsStr, OsString},
    fmt::Display,
    future::Future,
    path::Path,
    pin::Pin,
    sync::Arc,
};

use iced::{
    Subscription,
    futures::{
        SinkExt, Stream, StreamExt,
        channel::mpsc::{SendError, Sender},
        pin_mut,
    },
    stream::channel,
};
use inotify::{EventMask, Inotify, WatchMask};
use log::{debug, error, info, warn};

use super::{ConfigReadError, read_config};
use crate::config::manager::{ConfigApplied, ConfigDegradation, ConfigManager, ConfigUpdateError};

/// Events produced by the page file watcher subscription.
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// A new, validated configuration was applied.
    Applied(ConfigApplied),
    /// The page file could not be reloaded; the previous page stays mounted.
    Degraded(ConfigDegradation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileEvent {
    Changed,
    Removed,
}

trait WatchedEvent {
    fn file_name(&self) -> Option<&OsStr>;

    fn mask(&self) -> EventMask;
}

impl WatchedEvent for inotify::Event<OsString> {
    fn file_name(&self) -> Option<&OsStr> {
        self.name.as_deref()
    }

    fn mask(&self) -> EventMask {
        self.mask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchLoopOutcome {
    StreamEnded,
    HandlerClosed,
}

fn interpret_event<E: WatchedEvent>(event: &E, target_name: &OsStr) -> Option<FileEvent> {
    if event.file_name()? != target_name {
        return None;
    }

    let mask = event.mask();
    let is_removed = mask.intersects(EventMask::DELETE | EventMask::MOVED_FROM);
    let is_written = mask.intersects(
        EventMask::CREATE | EventMask::MODIFY | EventMask::MOVED_TO | EventMask::CLOSE_WRITE,
    );

    if is_removed && !is_written {
        debug!("Page file deleted or moved away");
        Some(FileEvent::Removed)
    } else if is_written {
        debug!("Page file changed");
        Some(FileEvent::Changed)
    } else {
        None
    }
}

/// Collapses each batch of raw events into at most one reload.
async fn process_event_batches<S, E, Err, F, Fut>(
    mut stream: Pin<&mut S>,
    target_name: &OsStr,
    mut handler: F,
) -> WatchLoopOutcome
where
    S: Stream<Item = Vec<Result<E, Err>>>,
    E: WatchedEvent + std::fmt::Debug,
    Err: Display,
    F: FnMut(FileEvent) -> Fut,
    Fut: Future<Output = Result<(), SendError>>,
{
    while let Some(batch) = stream.as_mut().next().await {
        let mut file_event = None;

        for event in batch {
            match event {
                Ok(event) => {
                    debug!("Event: {event:?}");

                    if let Some(kind) = interpret_event(&event, target_name) {
                        file_event = Some(kind);
                    }
                }
                Err(err) => {
                    error!("Failed to read watch event: {err}");
                }
            }
        }

        if let Some(kind) = file_event {
            if let Err(err) = handler(kind).await {
                warn!("Stopping config watch because handler returned an error: {err}");
                return WatchLoopOutcome::HandlerClosed;
            }
        }
    }

    WatchLoopOutcome::StreamEnded
}

async fn handle_watch_event(
    output: &mut Sender<ConfigEvent>,
    path: &Path,
    event: FileEvent,
    manager: Arc<ConfigManager>,
) -> Result<(), SendError> {
    match event {
        FileEvent::Changed => {
            info!("Reload page file");

            match load_candidate(path, &manager) {
                Ok(applied) => output.send(ConfigEvent::Applied(applied)).await,
                Err(reason) => {
                    warn!("Page update failed: {reason}");
                    send_degradation(output, &manager, reason).await
                }
            }
        }
        FileEvent::Removed => {
            info!("Page file removed");

            send_degradation(output, &manager, ConfigUpdateError::Removed).await
        }
    }
}

fn load_candidate(path: &Path, manager: &ConfigManager) -> Result<ConfigApplied, ConfigUpdateError> {
    let config = read_config(path).map_err(convert_read_error)?;

    config.validate()?;

    manager
        .apply(config)
        .map_err(|err| ConfigUpdateError::state(err.to_string()))
}

fn convert_read_error(err: ConfigReadError) -> ConfigUpdateError {
    match err {
        ConfigReadError::Read { path, source } => ConfigUpdateError::read(path, &source),
        ConfigReadError::Parse { path, source } => ConfigUpdateError::parse(path, &source),
    }
}

async fn send_degradation(
    output: &mut Sender<ConfigEvent>,
    manager: &ConfigManager,
    reason: ConfigUpdateError,
) -> Result<(), SendError> {
    match manager.degraded(reason) {
        Ok(degradation) => output.send(ConfigEvent::Degraded(degradation)).await,
        Err(err) => {
            error!("Failed to report page degradation: {err}");
            Ok(())
        }
    }
}

/// Watches the page file's directory and reloads the file whenever it changes.
pub fn subscription(path: &Path, manager: Arc<ConfigManager>) -> Subscription<ConfigEvent> {
    let id = TypeId::of::<ConfigEvent>();
    let path = path.to_path_buf();

    Subscription::run_with_id(
        id,
        channel(100, move |output| {
            let manager = Arc::clone(&manager);

            async move {
                let Some(folder) = path.parent().map(Path::to_path_buf) else {
                    error!("Page file path does not have a parent directory, cannot watch for changes");
                    return;
                };

                let Some(file_name) = path.file_name().map(OsStr::to_os_string) else {
                    error!("Page file path does not have a file name, cannot watch for changes");
                    return;
                };

                loop {
                    let inotify = match Inotify::init() {
                        Ok(inotify) => inotify,
                        Err(e) => {
                            error!("Failed to initialize inotify: {e}");
                            break;
                        }
                    };

                    debug!("Watching page file at {path:?}");

                    let watch_result = inotify.watches().add(
                        &folder,
                        WatchMask::CREATE
                            | WatchMask::DELETE
                            | WatchMask::MOVE
                            | WatchMask::MODIFY
                            | WatchMask::CLOSE_WRITE,
                    );

                    if let Err(e) = watch_result {
                        error!("Failed to add watch for {folder:?}: {e}");
                        break;
                    }

                    let buffer = [0; 1024];
                    let stream = match inotify.into_event_stream(buffer) {
                        Ok(stream) => stream,
                        Err(e) => {
                            error!("Failed to create inotify event stream: {e}");
                            break;
                        }
                    };

                    let event_stream = stream.ready_chunks(10);
                    pin_mut!(event_stream);

                    let sender_template = output.clone();
                    let path_clone = path.clone();
                    let manager_clone = Arc::clone(&manager);

                    match process_event_batches(
                        event_stream.as_mut(),
                        file_name.as_os_str(),
                        move |event| {
                            let mut sender = sender_template.clone();
                            let path = path_clone.clone();
                            let manager = Arc::clone(&manager_clone);

                            async move { handle_watch_event(&mut sender, &path, event, manager).await }
                        },
                    )
                    .await
                    {
                        WatchLoopOutcome::StreamEnded => {
                            info!("Page watch stream closed; restarting the inotify watcher");
                            continue;
                        }
                        WatchLoopOutcome::HandlerClosed => {
                            info!("Page watch handler closed; stopping watcher loop");
                            break;
                        }
                    }
                }

                info!("Page watcher terminated");
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::ffi::{OsStr, OsString};

    use iced::futures::{channel::mpsc, stream};
    use tempfile::TempDir;
    use xtag_proto::config::{Config, ConfigValidationError};

    use super::*;

    #[derive(Debug)]
    struct FakeEvent {
        name: Option<OsString>,
        mask: EventMask,
    }

    impl FakeEvent {
        fn new(name: &str, mask: EventMask) -> Self {
            Self {
                name: Some(OsString::from(name)),
                mask,
            }
        }
    }

    impl WatchedEvent for FakeEvent {
        fn file_name(&self) -> Option<&OsStr> {
            self.name.as_deref()
        }

        fn mask(&self) -> EventMask {
            self.mask
        }
    }

    fn page_file(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("page.toml");
        std::fs::write(&path, content).expect("failed to write page file");

        (temp_dir, path)
    }

    #[test]
    fn interpret_event_detects_removed_events() {
        let target = OsStr::new("page.toml");

        for mask in [EventMask::DELETE, EventMask::MOVED_FROM] {
            assert_eq!(
                interpret_event(&FakeEvent::new("page.toml", mask), target),
                Some(FileEvent::Removed)
            );
        }

        assert_eq!(
            interpret_event(&FakeEvent::new("other.toml", EventMask::DELETE), target),
            None
        );
    }

    #[test]
    fn interpret_event_detects_changed_events() {
        let target = OsStr::new("page.toml");

        for mask in [
            EventMask::CREATE,
            EventMask::MODIFY,
            EventMask::MOVED_TO,
            EventMask::CLOSE_WRITE,
        ] {
            assert_eq!(
                interpret_event(&FakeEvent::new("page.toml", mask), target),
                Some(FileEvent::Changed)
            );
        }

        assert_eq!(
            interpret_event(&FakeEvent::new("page.toml", EventMask::ACCESS), target),
            None
        );
        assert_eq!(
            interpret_event(
                &FakeEvent {
                    name: None,
                    mask: EventMask::MODIFY
                },
                target
            ),
            None
        );
    }

    #[tokio::test]
    async fn batches_collapse_into_one_reload() {
        let batches = vec![
            vec![
                Ok::<_, std::io::Error>(FakeEvent::new("page.toml", EventMask::CREATE)),
                Ok(FakeEvent::new("page.toml", EventMask::MODIFY)),
                Ok(FakeEvent::new("notes.txt", EventMask::MODIFY)),
            ],
            vec![Ok(FakeEvent::new("notes.txt", EventMask::DELETE))],
        ];
        let stream = stream::iter(batches);
        pin_mut!(stream);
        let mut seen = Vec::new();

        let outcome = process_event_batches(stream.as_mut(), OsStr::new("page.toml"), |event| {
            seen.push(event);
            async { Ok(()) }
        })
        .await;

        assert_eq!(outcome, WatchLoopOutcome::StreamEnded);
        assert_eq!(seen, vec![FileEvent::Changed]);
    }

    #[tokio::test]
    async fn emits_applied_event_for_valid_update() {
        let (_dir, path) = page_file("[[element]]\ntag = \"x-math\"\ncontent = \"x\"\n");
        let manager = Arc::new(ConfigManager::new(Config::default()));
        let (mut sender, mut receiver) = mpsc::channel(10);

        handle_watch_event(&mut sender, &path, FileEvent::Changed, Arc::clone(&manager))
            .await
            .expect("sending event should succeed");

        match receiver.next().await {
            Some(ConfigEvent::Applied(applied)) => {
                assert!(applied.impact.elements_changed);
                assert_eq!(applied.config.elements.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn emits_degraded_event_for_invalid_toml() {
        let (_dir, path) = page_file("invalid = [");
        let manager = Arc::new(ConfigManager::new(Config::default()));
        let (mut sender, mut receiver) = mpsc::channel(10);

        handle_watch_event(&mut sender, &path, FileEvent::Changed, Arc::clone(&manager))
            .await
            .expect("sending event should succeed");

        match receiver.next().await {
            Some(ConfigEvent::Degraded(event)) => {
                assert!(matches!(event.reason, ConfigUpdateError::Parse { .. }));
                assert_eq!(*event.last_valid, Config::default());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn emits_degraded_event_for_duplicate_ids() {
        let (_dir, path) = page_file(
            "[[element]]\ntag = \"x-clock\"\nid = \"a\"\n\n[[element]]\ntag = \"x-clock\"\nid = \"a\"\n",
        );
        let manager = Arc::new(ConfigManager::new(Config::default()));
        let (mut sender, mut receiver) = mpsc::channel(10);

        handle_watch_event(&mut sender, &path, FileEvent::Changed, Arc::clone(&manager))
            .await
            .expect("sending event should succeed");

        match receiver.next().await {
            Some(ConfigEvent::Degraded(event)) => {
                assert_eq!(
                    event.reason,
                    ConfigUpdateError::Validation(ConfigValidationError::DuplicateElementId {
                        id: "a".to_owned()
                    })
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(manager.last_valid().expect("state"), Config::default());
    }

    #[tokio::test]
    async fn emits_degraded_event_when_file_removed() {
        let (_dir, path) = page_file("");
        let manager = Arc::new(ConfigManager::new(Config::default()));
        let (mut sender, mut receiver) = mpsc::channel(10);

        handle_watch_event(&mut sender, &path, FileEvent::Removed, manager)
            .await
            .expect("sending event should succeed");

        match receiver.next().await {
            Some(ConfigEvent::Degraded(event)) => {
                assert!(matches!(event.reason, ConfigUpdateError::Removed));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
