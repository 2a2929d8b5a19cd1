#![forbid(unsafe_code)]

//! `wasm-bindgen` bindings from the browser to `tutorview-core`.
//!
//! Only compiled on `wasm32` targets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, CustomEventInit, Element, Event, EventTarget, HtmlCollection, HtmlInputElement,
    IntersectionObserver, IntersectionObserverEntry, Node, NodeList, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, Storage, Window,
};

use tutorview_core::tabs::{normalize_tab_keys, select_tab};
use tutorview_core::text::{indent_with_tabs, suggest_line_breaks, wants_tab_indent};
use tutorview_core::{
    BlockId, ChannelSubscription, Document, FrameInfo, IntersectionRecord, ModeChange, ModeChannel,
    PreferenceStore, Rect, TickCallback, TickSource, TutorialPage, Viewport, ViewportObserver,
};

use crate::{
    CLASS_REFERENCE_LINK_SELECTOR, CODE_BLOCK_SELECTOR, MODE_CHANGE_EVENT, TAB_MENU_ITEM_SELECTOR,
    TAB_NODES_SELECTOR, decode_mode_change, encode_mode_change, parse_config,
};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("tutorview panic at {}:{}: {info}", loc.file(), loc.line()),
                None => format!("tutorview panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn browser_window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("tutorview: no window object"))
}

fn viewport_of(window: &Window) -> Viewport {
    let read = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(read(window.inner_width()), read(window.inner_height()))
}

fn collection_elements(collection: &HtmlCollection) -> Vec<Element> {
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .collect()
}

fn node_list_elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn query_all(document: &web_sys::Document, selector: &str) -> Vec<Element> {
    document
        .query_selector_all(selector)
        .map(|list| node_list_elements(&list))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// [`Document`] over the live DOM. Nodes are `web_sys::Element`s.
#[derive(Debug, Clone)]
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    #[must_use]
    pub fn new(window: Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn children(&self, node: &Element) -> Vec<Element> {
        collection_elements(&node.children())
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn class_list(&self, node: &Element) -> Vec<String> {
        node.class_name()
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn create_element(&mut self, tag: &str) -> Element {
        self.document
            .create_element(tag)
            .expect("tutorview only creates elements with fixed, valid tag names")
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        if let Err(err) = parent.append_child(child) {
            tracing::warn!(target: "tutorview.web", error = ?err, "append_child failed");
        }
    }

    fn detach(&mut self, node: &Element) {
        node.remove();
    }

    fn find_descendants(&self, node: &Element, class: &str) -> Vec<Element> {
        collection_elements(&node.get_elements_by_class_name(class))
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let r = node.get_bounding_client_rect();
        Rect::new(r.top(), r.left(), r.width(), r.height())
    }

    fn scroll_top(&self, node: &Element) -> f64 {
        f64::from(node.scroll_top())
    }

    fn set_scroll_top(&mut self, node: &Element, value: f64) {
        node.set_scroll_top(value.round() as i32);
    }

    fn client_height(&self, node: &Element) -> f64 {
        f64::from(node.client_height())
    }

    fn set_checked(&mut self, node: &Element, checked: bool) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
    }

    fn scroll_into_view_centered(&mut self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn scroll_window_by(&mut self, dy: f64) {
        self.window.scroll_by_with_x_and_y(0.0, dy);
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// [`PreferenceStore`] backed by `window.localStorage`.
///
/// When storage is unavailable (privacy modes, sandboxed frames) every
/// load returns `None` and stores are dropped.
#[derive(Debug, Clone)]
pub struct LocalStoragePreferences {
    storage: Option<Storage>,
}

impl LocalStoragePreferences {
    #[must_use]
    pub fn new(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                tracing::warn!(target: "tutorview.web", error = ?err, "localStorage unavailable");
                None
            }
        };
        Self { storage }
    }
}

impl PreferenceStore for LocalStoragePreferences {
    fn load(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn store(&mut self, key: &str, value: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = storage.set_item(key, value) {
            tracing::warn!(target: "tutorview.web", key, error = ?err, "localStorage write failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Event listeners
// ---------------------------------------------------------------------------

/// Registered DOM listener. Dropping it removes the listener.
struct EventListenerGuard {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl EventListenerGuard {
    fn attach(
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            event,
            closure,
        })
    }
}

impl Drop for EventListenerGuard {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

// ---------------------------------------------------------------------------
// Mode channel
// ---------------------------------------------------------------------------

/// [`ModeChannel`] that dispatches a `CustomEvent` on `window`, so every
/// tutorview instance on the page hears every change.
#[derive(Debug, Clone)]
pub struct WindowModeChannel {
    window: Window,
}

impl WindowModeChannel {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn dispatch(&self, change: &ModeChange) -> Result<(), JsValue> {
        let detail = js_sys::JSON::parse(&encode_mode_change(change))?;
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        let event = CustomEvent::new_with_event_init_dict(MODE_CHANGE_EVENT, &init)?;
        self.window.dispatch_event(&event)?;
        Ok(())
    }
}

impl ModeChannel for WindowModeChannel {
    fn publish(&self, change: ModeChange) {
        tracing::debug!(
            target: "tutorview.channel",
            mode = %change.mode,
            source = %change.source,
            "dispatching view mode event"
        );
        if let Err(err) = self.dispatch(&change) {
            tracing::warn!(target: "tutorview.web", error = ?err, "mode event dispatch failed");
        }
    }

    fn subscribe(&self, handler: tutorview_core::channel::ModeHandler) -> ChannelSubscription {
        let target: EventTarget = self.window.clone().into();
        let listener = EventListenerGuard::attach(target, MODE_CHANGE_EVENT, move |event: Event| {
            let Ok(custom) = event.dyn_into::<CustomEvent>() else {
                return;
            };
            let payload = js_sys::JSON::stringify(&custom.detail())
                .ok()
                .map(String::from);
            if let Some(change) = payload.as_deref().and_then(decode_mode_change) {
                handler(&change);
            }
        });
        match listener {
            Ok(guard) => ChannelSubscription::new(guard),
            Err(err) => {
                console_error(&format!("tutorview: cannot listen for mode changes: {err:?}"));
                ChannelSubscription::new(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Intersection observer
// ---------------------------------------------------------------------------

type RecordQueue = Rc<RefCell<Vec<IntersectionRecord<Element>>>>;

fn record_from_entry(value: JsValue) -> Option<IntersectionRecord<Element>> {
    let entry = value.dyn_into::<IntersectionObserverEntry>().ok()?;
    let r = entry.bounding_client_rect();
    Some(IntersectionRecord {
        target: entry.target(),
        is_intersecting: entry.is_intersecting(),
        rect: Rect::new(r.top(), r.left(), r.width(), r.height()),
    })
}

/// [`ViewportObserver`] over a browser `IntersectionObserver` rooted at the
/// viewport. Callback records are queued until the next frame drains them.
pub struct WebViewportObserver {
    observer: IntersectionObserver,
    queue: RecordQueue,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl WebViewportObserver {
    pub fn new() -> Result<Self, JsValue> {
        let queue: RecordQueue = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&queue);
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                sink.borrow_mut()
                    .extend(entries.iter().filter_map(record_from_entry));
            },
        );
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        Ok(Self {
            observer,
            queue,
            _callback: callback,
        })
    }
}

impl core::fmt::Debug for WebViewportObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebViewportObserver")
            .field("queued", &self.queue.borrow().len())
            .finish_non_exhaustive()
    }
}

impl ViewportObserver<Element> for WebViewportObserver {
    fn observe(&mut self, node: &Element) {
        self.observer.observe(node);
    }

    fn disconnect(&mut self) {
        self.observer.disconnect();
        self.queue.borrow_mut().clear();
    }

    fn take_records(&mut self) -> Vec<IntersectionRecord<Element>> {
        let mut records = std::mem::take(&mut *self.queue.borrow_mut());
        records.extend(
            self.observer
                .take_records()
                .iter()
                .filter_map(record_from_entry),
        );
        records
    }
}

impl Drop for WebViewportObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

// ---------------------------------------------------------------------------
// Animation frames
// ---------------------------------------------------------------------------

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(window: &Window, callback: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    window.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// [`TickSource`] driven by `requestAnimationFrame`, re-armed every frame
/// until [`AnimationFrameLoop::stop`].
pub struct AnimationFrameLoop {
    window: Window,
    callbacks: Rc<RefCell<Vec<TickCallback>>>,
    frame: Rc<Cell<u64>>,
    handle: Rc<Cell<Option<i32>>>,
    closure: FrameClosure,
}

impl AnimationFrameLoop {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callbacks: Rc::new(RefCell::new(Vec::new())),
            frame: Rc::new(Cell::new(0)),
            handle: Rc::new(Cell::new(None)),
            closure: Rc::new(RefCell::new(None)),
        }
    }

    /// Request the first frame. Calling `start` on a running loop is a no-op.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.closure.borrow().is_some() {
            return Ok(());
        }
        let window = self.window.clone();
        let callbacks = Rc::clone(&self.callbacks);
        let frame = Rc::clone(&self.frame);
        let handle = Rc::clone(&self.handle);
        let rearm = Rc::clone(&self.closure);

        *self.closure.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_ts: f64| {
            frame.set(frame.get() + 1);
            let info = FrameInfo {
                frame: frame.get(),
                viewport: viewport_of(&window),
            };
            for callback in callbacks.borrow_mut().iter_mut() {
                callback(info);
            }
            let next = rearm
                .borrow()
                .as_ref()
                .and_then(|c| request_frame(&window, c).ok());
            handle.set(next);
        }));

        let first = match self.closure.borrow().as_ref() {
            Some(c) => request_frame(&self.window, c)?,
            None => return Ok(()),
        };
        self.handle.set(Some(first));
        Ok(())
    }

    /// Cancel the pending frame and release the frame closure.
    pub fn stop(&self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for AnimationFrameLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnimationFrameLoop")
            .field("frame", &self.frame.get())
            .field("running", &self.closure.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl TickSource for AnimationFrameLoop {
    fn on_tick(&mut self, callback: TickCallback) {
        self.callbacks.borrow_mut().push(callback);
    }
}

impl Drop for AnimationFrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

type WebPage =
    TutorialPage<WebDocument, WebViewportObserver, LocalStoragePreferences, WindowModeChannel>;

/// Every tutorial block on the page, kept alive until `destroy` or drop.
#[wasm_bindgen]
pub struct TutorialHost {
    page: Rc<RefCell<WebPage>>,
    ticks: AnimationFrameLoop,
    listeners: Vec<EventListenerGuard>,
    failures: Vec<String>,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

fn wire_toggle(page: &Rc<RefCell<WebPage>>, id: BlockId) -> Result<EventListenerGuard, JsValue> {
    let input: EventTarget = {
        let page = page.borrow();
        let controller = page
            .controller(id)
            .ok_or_else(|| JsValue::from_str(&format!("tutorview: block {id} vanished")))?;
        controller.toggle_input().clone().into()
    };
    let weak = Rc::downgrade(page);
    EventListenerGuard::attach(input, "change", move |event: Event| {
        let checked = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .is_some_and(|input| input.checked());
        let Some(page) = weak.upgrade() else {
            return;
        };
        let Ok(mut page) = page.try_borrow_mut() else {
            return;
        };
        if let Err(err) = page.toggle(id, checked) {
            console_error(&format!("tutorview: {err}"));
        }
    })
}

/// Find every tutorial block and mount it.
///
/// `options` is an optional JSON object overriding the configuration.
/// A malformed block is reported on the console and listed in
/// `failures`; the remaining blocks still mount.
#[wasm_bindgen(js_name = mountTutorials)]
pub fn mount_tutorials(options: Option<String>) -> Result<TutorialHost, JsValue> {
    install_panic_hook();
    let config = parse_config(options.as_deref()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let window = browser_window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("tutorview: no document"))?;

    let roots = collection_elements(&document.get_elements_by_class_name(&config.classes.root));
    let page = Rc::new(RefCell::new(TutorialPage::new(
        WebDocument::new(window.clone(), document),
        LocalStoragePreferences::new(&window),
        WindowModeChannel::new(window.clone()),
        config,
        viewport_of(&window),
    )));

    let mut listeners = Vec::new();
    let mut failures = Vec::new();
    for root in roots {
        let mounted = WebViewportObserver::new()
            .and_then(|observer| {
                page.borrow_mut()
                    .mount_block(root, observer)
                    .map_err(|e| JsValue::from_str(&e.to_string()))
            })
            .and_then(|id| wire_toggle(&page, id));
        match mounted {
            Ok(listener) => listeners.push(listener),
            Err(err) => {
                let msg = err.as_string().unwrap_or_else(|| format!("{err:?}"));
                console_error(&format!("tutorview: {msg}"));
                failures.push(msg);
            }
        }
    }

    let mut ticks = AnimationFrameLoop::new(window);
    let weak = Rc::downgrade(&page);
    ticks.on_tick(Box::new(move |info: FrameInfo| {
        let Some(page) = weak.upgrade() else {
            return;
        };
        let Ok(mut page) = page.try_borrow_mut() else {
            return;
        };
        page.deliver_inboxes();
        page.frame(info.viewport);
    }));
    ticks.start()?;

    Ok(TutorialHost {
        page,
        ticks,
        listeners,
        failures,
    })
}

#[wasm_bindgen]
impl TutorialHost {
    /// Number of mounted blocks.
    #[wasm_bindgen(js_name = blockCount)]
    pub fn block_count(&self) -> usize {
        self.page.borrow().block_ids().len()
    }

    /// View mode a block would start in right now.
    #[wasm_bindgen(js_name = viewMode)]
    pub fn view_mode(&self) -> String {
        self.page.borrow().resolved_mode().as_str().to_owned()
    }

    /// Error messages of blocks that failed to mount.
    #[wasm_bindgen(getter)]
    pub fn failures(&self) -> Array {
        self.failures.iter().map(|f| JsValue::from_str(f)).collect()
    }

    /// Stop the frame loop, remove listeners and release every block.
    pub fn destroy(&mut self) {
        self.ticks.stop();
        self.listeners.clear();
        if let Ok(mut page) = self.page.try_borrow_mut() {
            page.teardown();
        }
    }
}

/// Listeners installed by [`apply_page_enhancements`].
#[wasm_bindgen]
pub struct PageEnhancements {
    listeners: Vec<EventListenerGuard>,
}

#[wasm_bindgen]
impl PageEnhancements {
    #[wasm_bindgen(js_name = tabMenuCount)]
    pub fn tab_menu_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn destroy(&mut self) {
        self.listeners.clear();
    }
}

fn suggest_class_reference_breaks(document: &web_sys::Document) -> usize {
    let mut updated = 0;
    for link in query_all(document, CLASS_REFERENCE_LINK_SELECTOR) {
        let children = link.child_nodes();
        let candidate = (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|node| node.node_type() == Node::TEXT_NODE)
            .filter_map(|node| {
                let html = suggest_line_breaks(&node.text_content().unwrap_or_default())?;
                Some((node, html))
            })
            .last();
        let Some((node, html)) = candidate else {
            continue;
        };
        if link.remove_child(&node).is_ok() && link.insert_adjacent_html("beforeend", &html).is_ok()
        {
            updated += 1;
        }
    }
    updated
}

fn retab_code_blocks(document: &web_sys::Document) -> usize {
    let mut updated = 0;
    for pre in query_all(document, CODE_BLOCK_SELECTOR) {
        let Some(container) = pre.parent_element().and_then(|p| p.parent_element()) else {
            continue;
        };
        let classes: Vec<String> = container
            .class_name()
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        if !wants_tab_indent(&classes) {
            continue;
        }
        pre.set_inner_html(&indent_with_tabs(&pre.inner_html()));
        updated += 1;
    }
    updated
}

/// Apply the static page transforms and wire synchronized tab groups.
#[wasm_bindgen(js_name = applyPageEnhancements)]
pub fn apply_page_enhancements() -> Result<PageEnhancements, JsValue> {
    install_panic_hook();
    let window = browser_window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("tutorview: no document"))?;

    let links = suggest_class_reference_breaks(&document);
    let blocks = retab_code_blocks(&document);

    let mut doc = WebDocument::new(window.clone(), document.clone());
    let tab_nodes = query_all(&document, TAB_NODES_SELECTOR);
    normalize_tab_keys(&mut doc, &tab_nodes);

    let mut listeners = Vec::new();
    for item in query_all(&document, TAB_MENU_ITEM_SELECTOR) {
        let doc = doc.clone();
        let clicked = item.clone();
        let listener = EventListenerGuard::attach(item.into(), "click", move |_event: Event| {
            let mut doc = doc.clone();
            let nodes = query_all(&doc.document, TAB_NODES_SELECTOR);
            select_tab(&mut doc, &clicked, &nodes, "active");
        })?;
        listeners.push(listener);
    }

    tracing::debug!(
        target: "tutorview.web",
        links,
        code_blocks = blocks,
        tab_items = listeners.len(),
        "applied page enhancements"
    );
    Ok(PageEnhancements { listeners })
}
