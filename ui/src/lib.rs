//! Browser binding of the ZoneForge row editor
//!
//! On load every `[data-category]` row of the page is bound to its own
//! [`RowEditor`]. Button clicks, the Enter key and record-type changes are
//! turned into editor commands; the outcome decides whether the row is
//! re-rendered, removed, or the page reloaded.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlInputElement, KeyboardEvent};
use zoneforge_editor::{Catalogs, Command, EditorConfig, EditorContext, Outcome, Row, RowEditor};

mod api;
mod components;
mod dialogs;
mod dom;
mod render;

use api::FetchTransport;
use dialogs::WindowDialogs;

/// Collaborators shared by every row of the page
struct Page {
    document: Document,
    transport: FetchTransport,
    dialogs: WindowDialogs,
    catalogs: Catalogs,
    config: EditorConfig,
}

impl Page {
    fn ctx(&self) -> EditorContext<'_> {
        EditorContext {
            transport: &self.transport,
            dialogs: &self.dialogs,
            catalogs: &self.catalogs,
            config: &self.config,
        }
    }
}

struct BoundRow {
    element: Element,
    editor: RefCell<RowEditor>,
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };

    let page = Rc::new(Page {
        catalogs: dom::read_catalogs(&document),
        document,
        transport: FetchTransport,
        dialogs: WindowDialogs,
        config: EditorConfig::default(),
    });

    let rows = dom::elements(&page.document, "[data-category]");
    let bound = rows.into_iter().filter(|element| bind_row(&page, element.clone())).count();
    info!("bound {} rows, {} option catalogs", bound, page.catalogs.len());
}

/// Attach a controller to one row element.
///
/// A row whose markup lacks a required attribute is left untouched.
fn bind_row(page: &Rc<Page>, element: Element) -> bool {
    let row = match dom::read_row(&element).and_then(|spec| Row::bind(spec, &page.catalogs)) {
        Ok(row) => row,
        Err(err) => {
            error!("row not bound: {}", err);
            return false;
        }
    };

    render::render_row(&page.document, &element, &row, &page.catalogs);
    let bound = Rc::new(BoundRow {
        element,
        editor: RefCell::new(RowEditor::new(row)),
    });

    listen(&bound.element, "click", {
        let (page, bound) = (page.clone(), bound.clone());
        move |event: Event| {
            if let Some(command) = clicked_command(&event) {
                run(&page, &bound, command);
            }
        }
    });

    listen(&bound.element, "keydown", {
        let (page, bound) = (page.clone(), bound.clone());
        move |event: Event| {
            let is_enter = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|event| event.key() == "Enter");
            if is_enter && event_control(&event).is_some() {
                event.prevent_default();
                run(&page, &bound, Command::Submit);
            }
        }
    });

    listen(&bound.element, "change", {
        let (page, bound) = (page.clone(), bound.clone());
        move |event: Event| {
            let Some(control) = event_control(&event) else {
                return;
            };
            if dom::field_of(&control).as_deref() != Some("type") {
                return;
            }
            if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
                run(
                    &page,
                    &bound,
                    Command::ChangeRecordType {
                        record_type: input.value(),
                    },
                );
            }
        }
    });

    true
}

fn listen(element: &Element, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(err) = element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        warn!("could not listen to {}: {:?}", event, err);
    }
    // rows live as long as the page
    closure.forget();
}

/// The input or select an event was fired on
fn event_control(event: &Event) -> Option<Element> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    dom::form_control(&target).then_some(target)
}

fn clicked_command(event: &Event) -> Option<Command> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let button = target.closest("button").ok()??;
    let classes = button.class_list();

    [
        ("edit", Command::EnterEdit),
        ("cancel", Command::Cancel),
        ("save", Command::Save),
        ("delete", Command::Delete),
        ("create", Command::Create),
    ]
    .into_iter()
    .find(|(class, _)| classes.contains(class))
    .map(|(_, command)| command)
}

/// Whether the DOM inputs must be copied into the model first
fn reads_inputs(command: &Command) -> bool {
    matches!(
        command,
        Command::Save | Command::Create | Command::Submit | Command::ChangeRecordType { .. }
    )
}

fn run(page: &Rc<Page>, bound: &Rc<BoundRow>, command: Command) {
    let (page, bound) = (page.clone(), bound.clone());

    spawn_local(async move {
        let Ok(mut editor) = bound.editor.try_borrow_mut() else {
            debug!("row busy, {} dropped", command.name());
            return;
        };
        let ctx = page.ctx();

        if reads_inputs(&command) {
            for input in dom::collect_inputs(&bound.element, editor.row()) {
                if let Err(err) = editor.dispatch(input, &ctx).await {
                    warn!("input not applied: {}", err);
                }
            }
        }

        match editor.dispatch(command, &ctx).await {
            Ok(Outcome::Removed) => bound.element.remove(),
            Ok(Outcome::Reload) => reload(),
            Ok(_) => render::render_row(&page.document, &bound.element, editor.row(), &page.catalogs),
            Err(err) => {
                error!("command failed: {}", err);
                render::render_row(&page.document, &bound.element, editor.row(), &page.catalogs);
            }
        }
    });
}

fn reload() {
    let reloaded = web_sys::window().map(|window| window.location().reload());
    if !matches!(reloaded, Some(Ok(()))) {
        warn!("page reload failed");
    }
}
