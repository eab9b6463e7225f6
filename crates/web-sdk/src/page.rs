//! Host page adapter: the only way the beacon observes the page it runs in.
//!
//! The beacon never touches the DOM directly. An embedding implements
//! [`HostPage`] (the browser adapter lives in `beacon-wasm`); [`StaticPage`]
//! is a scripted in-process page for tests and headless use.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use beacon_core::{BeaconError, BeaconResult};

/// Handler run once when the page structure has finished loading.
pub type ReadyHandler = Box<dyn FnOnce()>;

/// Handler run for every form submission on the page.
pub type SubmitHandler<F> = Box<dyn Fn(&F)>;

/// Page instrumentation surface consumed by event capture.
pub trait HostPage: 'static {
    /// Handle to a submitted form.
    type Form: ?Sized;

    /// Register a handler for the document-ready signal.
    fn on_ready(&self, handler: ReadyHandler);

    /// Register a document-level submission handler. The handler observes
    /// the submission; it cannot cancel it.
    fn on_submit(&self, handler: SubmitHandler<Self::Form>);

    /// First search-like input inside `form`, see [`select_search_field`].
    fn find_search_field(&self, form: &Self::Form) -> BeaconResult<Option<InputField>>;

    /// Path component of the current URL.
    fn path(&self) -> String;

    /// Current document title.
    fn title(&self) -> String;
}

/// Attributes and current value of an `<input>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    /// The `type` attribute as written in markup.
    pub kind: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub value: String,
}

impl InputField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn is_search_type(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("search"))
    }

    fn name_or_id_contains(&self, needle: &str) -> bool {
        [self.name.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .any(|attr| attr.contains(needle))
    }
}

/// Pick the search field among `inputs` (document order).
///
/// Tiers, highest first: `type="search"`; name or id containing `search`;
/// name or id containing `query`. Within a tier the earliest input wins.
pub fn select_search_field<'a, I>(inputs: I) -> Option<&'a InputField>
where
    I: IntoIterator<Item = &'a InputField>,
    I::IntoIter: Clone,
{
    let inputs = inputs.into_iter();
    inputs
        .clone()
        .find(|input| input.is_search_type())
        .or_else(|| inputs.clone().find(|input| input.name_or_id_contains("search")))
        .or_else(|| inputs.clone().find(|input| input.name_or_id_contains("query")))
}

/// A form as seen at submission time.
#[derive(Debug, Clone, Default)]
pub struct FormSnapshot {
    pub inputs: Vec<InputField>,
    readable: bool,
}

impl FormSnapshot {
    pub fn new(inputs: Vec<InputField>) -> Self {
        Self {
            inputs,
            readable: true,
        }
    }

    /// A form whose inspection fails, as with a hostile or detached node.
    pub fn unreadable() -> Self {
        Self {
            inputs: Vec::new(),
            readable: false,
        }
    }
}

/// Scripted host page. Call [`StaticPage::ready`] and [`StaticPage::submit`]
/// to drive it.
pub struct StaticPage {
    path: RefCell<String>,
    title: RefCell<String>,
    is_ready: Cell<bool>,
    ready_handlers: RefCell<Vec<ReadyHandler>>,
    submit_handlers: RefCell<Vec<Rc<dyn Fn(&FormSnapshot)>>>,
    completed_submissions: Cell<usize>,
}

impl StaticPage {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: RefCell::new(path.into()),
            title: RefCell::new(title.into()),
            is_ready: Cell::new(false),
            ready_handlers: RefCell::new(Vec::new()),
            submit_handlers: RefCell::new(Vec::new()),
            completed_submissions: Cell::new(0),
        }
    }

    /// Signal document-ready. Only the first call has an effect.
    pub fn ready(&self) {
        if self.is_ready.replace(true) {
            return;
        }
        let handlers = std::mem::take(&mut *self.ready_handlers.borrow_mut());
        for handler in handlers {
            handler();
        }
    }

    /// Dispatch a submission to every listener, then let it complete.
    pub fn submit(&self, form: &FormSnapshot) {
        let handlers: Vec<_> = self.submit_handlers.borrow().clone();
        for handler in handlers {
            handler(form);
        }
        self.completed_submissions
            .set(self.completed_submissions.get() + 1);
    }

    /// Number of submissions that ran to completion.
    pub fn completed_submissions(&self) -> usize {
        self.completed_submissions.get()
    }

    /// Move to another path within the same page load.
    pub fn set_location(&self, path: impl Into<String>, title: impl Into<String>) {
        *self.path.borrow_mut() = path.into();
        *self.title.borrow_mut() = title.into();
    }
}

impl HostPage for StaticPage {
    type Form = FormSnapshot;

    fn on_ready(&self, handler: ReadyHandler) {
        if self.is_ready.get() {
            handler();
        } else {
            self.ready_handlers.borrow_mut().push(handler);
        }
    }

    fn on_submit(&self, handler: SubmitHandler<FormSnapshot>) {
        self.submit_handlers.borrow_mut().push(Rc::from(handler));
    }

    fn find_search_field(&self, form: &FormSnapshot) -> BeaconResult<Option<InputField>> {
        if !form.readable {
            return Err(BeaconError::Dom("form is not readable".into()));
        }
        Ok(select_search_field(&form.inputs).cloned())
    }

    fn path(&self) -> String {
        self.path.borrow().clone()
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }
}
