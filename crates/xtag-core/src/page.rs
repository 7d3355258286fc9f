//! The set of elements currently attached to the document, kept in page order.

use std::collections::HashMap;

use log::{debug, error, info};
use xtag_proto::config::ElementDef;

use crate::{
    ElementContext,
    elements::{ElementError, ElementEvent, ElementId, ElementInstance},
    registry::ElementRegistry,
};

/// What the registry produced for a page entry.
#[derive(Debug)]
pub enum ElementNode {
    Custom(ElementInstance),
    /// The tag is not defined; the entry shows its text content as-is.
    Unknown,
    /// The constructor failed.
    Broken(ElementError),
}

#[derive(Debug)]
pub struct MountedElement {
    id: ElementId,
    def: ElementDef,
    node: ElementNode,
}

impl MountedElement {
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn def(&self) -> &ElementDef {
        &self.def
    }

    pub fn node(&self) -> &ElementNode {
        &self.node
    }

    fn detach(&mut self) {
        if let ElementNode::Custom(instance) = &mut self.node {
            instance.detach();
        }
    }
}

/// Ids touched by a [`Page::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDiff {
    pub attached: Vec<ElementId>,
    pub detached: Vec<ElementId>,
    pub replaced: Vec<ElementId>,
}

impl PageDiff {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty() && self.replaced.is_empty()
    }
}

#[derive(Debug)]
pub struct Page<'r> {
    registry: &'r ElementRegistry,
    elements: Vec<MountedElement>,
}

impl<'r> Page<'r> {
    pub fn new(registry: &'r ElementRegistry) -> Self {
        Self {
            registry,
            elements: Vec::new(),
        }
    }

    /// Replaces the page content, instantiating every entry in page order.
    pub fn mount(&mut self, defs: &[ElementDef], ctx: &ElementContext) -> PageDiff {
        let detached = self.unmount_all();
        let attached = self.instantiate(defs, ctx);

        PageDiff {
            attached,
            detached,
            replaced: Vec::new(),
        }
    }

    /// Brings the page in line with `defs`. Entries are matched by
    /// [`ElementDef::key`]: unchanged ones are kept running, changed ones are
    /// re-created, missing ones are detached and dropped.
    pub fn sync(&mut self, defs: &[ElementDef], ctx: &ElementContext) -> PageDiff {
        let mut previous: HashMap<ElementId, MountedElement> = self
            .elements
            .drain(..)
            .map(|element| (element.id.clone(), element))
            .collect();
        let mut diff = PageDiff::default();

        for (index, def) in defs.iter().enumerate() {
            let id = ElementId::from(def.key(index));

            match previous.remove(&id) {
                Some(element) if element.def == *def => self.elements.push(element),
                Some(mut element) => {
                    element.detach();
                    let element = self.create(id.clone(), def, ctx);
                    self.elements.push(element);
                    diff.replaced.push(id);
                }
                None => {
                    let element = self.create(id.clone(), def, ctx);
                    self.elements.push(element);
                    diff.attached.push(id);
                }
            }
        }

        for (id, mut element) in previous {
            element.detach();
            diff.detached.push(id);
        }
        diff.detached.sort();

        if !diff.is_empty() {
            info!(
                "Page synced: {} attached, {} detached, {} replaced",
                diff.attached.len(),
                diff.detached.len(),
                diff.replaced.len()
            );
        }

        diff
    }

    /// Routes an event to the element it is addressed to. Returns whether the
    /// element's visual state changed.
    pub fn dispatch(&mut self, id: &ElementId, event: ElementEvent) -> bool {
        match self.elements.iter_mut().find(|element| element.id == *id) {
            Some(MountedElement {
                node: ElementNode::Custom(instance),
                ..
            }) => instance.update(event),
            Some(_) => false,
            None => {
                debug!("Discarding event for {id}: no longer on the page");
                false
            }
        }
    }

    /// Detaches and drops one element.
    pub fn remove(&mut self, id: &ElementId) -> bool {
        let Some(position) = self.elements.iter().position(|element| element.id == *id) else {
            return false;
        };

        self.elements.remove(position).detach();
        true
    }

    /// Detaches and drops every element. Returns their ids in page order.
    pub fn unmount_all(&mut self) -> Vec<ElementId> {
        self.elements
            .drain(..)
            .map(|mut element| {
                element.detach();
                element.id
            })
            .collect()
    }

    pub fn elements(&self) -> &[MountedElement] {
        &self.elements
    }

    pub fn get(&self, id: &ElementId) -> Option<&MountedElement> {
        self.elements.iter().find(|element| element.id == *id)
    }

    fn instantiate(&mut self, defs: &[ElementDef], ctx: &ElementContext) -> Vec<ElementId> {
        let mut attached = Vec::with_capacity(defs.len());

        for (index, def) in defs.iter().enumerate() {
            let id = ElementId::from(def.key(index));
            let element = self.create(id.clone(), def, ctx);
            self.elements.push(element);
            attached.push(id);
        }

        attached
    }

    fn create(&self, id: ElementId, def: &ElementDef, ctx: &ElementContext) -> MountedElement {
        let node = match self.registry.construct(id.clone(), def, ctx) {
            Some(Ok(instance)) => ElementNode::Custom(instance),
            Some(Err(err)) => {
                error!("Failed to create <{}> {id}: {err}", def.tag);
                ElementNode::Broken(err)
            }
            None => {
                debug!("<{}> is not defined, {id} stays inert", def.tag);
                ElementNode::Unknown
            }
        };

        MountedElement {
            id,
            def: def.clone(),
            node,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{runtime::Handle, time};

    use super::*;
    use crate::{
        elements::clock::{Lifecycle, TICK_PERIOD},
        event_bus::BusEvent,
        test_utils::{drain, settle, test_bus, test_context},
    };

    fn clock(id: &str) -> ElementDef {
        ElementDef::new("x-clock").with_id(id)
    }

    fn ids(page: &Page<'_>) -> Vec<&str> {
        page.elements().iter().map(|element| element.id().as_str()).collect()
    }

    fn tick_targets(events: &[BusEvent]) -> Vec<String> {
        let mut targets: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                BusEvent::Element { id, .. } => Some(id.to_string()),
                _ => None,
            })
            .collect();
        targets.sort();
        targets
    }

    #[tokio::test(start_paused = true)]
    async fn mount_instantiates_in_page_order() {
        let bus = test_bus(16);
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);

        let diff = page.mount(
            &[clock("a"), ElementDef::new("x-math").with_content("x"), clock("b")],
            &ctx,
        );

        assert_eq!(ids(&page), vec!["a", "x-math-1", "b"]);
        assert_eq!(diff.attached.len(), 3);
        assert!(diff.detached.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn removed_clock_stops_ticking() {
        let bus = test_bus(16);
        let mut receiver = bus.receiver();
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);
        page.mount(&[clock("a"), clock("b")], &ctx);
        settle().await;

        time::advance(TICK_PERIOD).await;
        settle().await;
        assert_eq!(tick_targets(&drain(&mut receiver)), vec!["a", "b"]);

        let diff = page.sync(&[clock("b")], &ctx);
        assert_eq!(diff.detached, vec![ElementId::from("a")]);
        assert!(diff.attached.is_empty());

        time::advance(TICK_PERIOD).await;
        settle().await;
        assert_eq!(tick_targets(&drain(&mut receiver)), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_keeps_unchanged_and_replaces_changed_elements() {
        let bus = test_bus(16);
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);
        page.mount(&[clock("a"), clock("b")], &ctx);

        let diff = page.sync(
            &[
                clock("a"),
                clock("b").with_attribute("width", "80px"),
                clock("c"),
            ],
            &ctx,
        );

        assert_eq!(diff.replaced, vec![ElementId::from("b")]);
        assert_eq!(diff.attached, vec![ElementId::from("c")]);
        assert!(diff.detached.is_empty());
        assert_eq!(ids(&page), vec!["a", "b", "c"]);

        let unchanged = page.sync(
            &[
                clock("a"),
                clock("b").with_attribute("width", "80px"),
                clock("c"),
            ],
            &ctx,
        );
        assert!(unchanged.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_routes_by_id_and_drops_stale_events() {
        let bus = test_bus(16);
        let mut receiver = bus.receiver();
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);
        page.mount(&[clock("a")], &ctx);
        settle().await;

        time::advance(TICK_PERIOD).await;
        settle().await;
        let events = drain(&mut receiver);
        assert_eq!(events.len(), 1);

        let (id, event) = match events.into_iter().next() {
            Some(BusEvent::Element { id, event }) => (id, event),
            other => panic!("unexpected event {other:?}"),
        };
        assert!(page.dispatch(&id, event.clone()));

        assert!(page.remove(&id));
        assert!(!page.dispatch(&id, event));
        assert!(page.elements().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_tags_stay_inert() {
        let bus = test_bus(16);
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);

        page.mount(&[ElementDef::new("x-widget").with_content("plain text")], &ctx);

        let element = &page.elements()[0];
        assert!(matches!(element.node(), ElementNode::Unknown));
        assert_eq!(element.def().content, "plain text");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_construction_is_kept_as_broken_entry() {
        let bus = test_bus(16);
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);

        page.mount(&[clock("a").with_attribute("height", "tall")], &ctx);

        assert!(matches!(
            page.get(&ElementId::from("a")).map(MountedElement::node),
            Some(ElementNode::Broken(ElementError::InvalidLength { name: "height", .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_all_stops_every_clock() {
        let bus = test_bus(16);
        let mut receiver = bus.receiver();
        let ctx = test_context(&bus, Handle::current());
        let registry = ElementRegistry::with_builtins();
        let mut page = Page::new(&registry);
        page.mount(&[clock("a"), clock("b")], &ctx);

        let running = |page: &Page<'_>| {
            page.elements()
                .iter()
                .filter(|element| {
                    matches!(
                        element.node(),
                        ElementNode::Custom(ElementInstance::Clock(widget))
                            if widget.lifecycle() == Lifecycle::Running
                    )
                })
                .count()
        };
        assert_eq!(running(&page), 2);

        let removed = page.unmount_all();
        assert_eq!(removed, vec![ElementId::from("a"), ElementId::from("b")]);

        time::advance(TICK_PERIOD * 2).await;
        settle().await;
        assert!(drain(&mut receiver).is_empty());
    }
}
