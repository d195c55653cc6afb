//! Reading the table markup
//!
//! Rows are described by data attributes (`data-category`, `data-field`,
//! `data-original`, `data-name-url`, ...). Everything is read once when a
//! row is bound; after that the [`Row`](zoneforge_editor::Row) model is the
//! source of truth and the DOM is only re-rendered from it.
//!
//! A `data-field` may sit on a table cell or directly on an `<input>` or
//! `<select>`, as new-record rows do. New-record rows pick their initial
//! group or roles from the `#access-options` select, which also serves as
//! the page's option template when it carries no `data-field`.

use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, NodeList};
use zoneforge_editor::{
    AttributeSource, BindError, Catalogs, Category, Command, DisplayValue, FieldInput, FieldKind, OptionCatalog,
    Row, RowSpec, SelectOption,
};

/// Selector of the canonical option templates
pub const CATALOG_SELECTOR: &str = ".select-content select";
/// Id of the association select
pub const ACCESS_OPTIONS: &str = "access-options";

/// Attribute view of a DOM element, optionally standing in for a field it
/// does not name itself
#[derive(Clone)]
pub struct ElementAttributes {
    element: Element,
    field: Option<String>,
}

impl ElementAttributes {
    pub fn new(element: Element) -> Self {
        Self { element, field: None }
    }

    pub fn for_field(element: Element, field: impl Into<String>) -> Self {
        Self {
            element,
            field: Some(field.into()),
        }
    }
}

impl AttributeSource for ElementAttributes {
    fn attribute(&self, name: &str) -> Option<String> {
        match (&self.field, name) {
            (Some(field), "data-field") => Some(field.clone()),
            _ => self.element.get_attribute(name),
        }
    }

    fn describe(&self) -> String {
        let tag = self.element.tag_name().to_ascii_lowercase();
        match self.attribute("data-field") {
            Some(field) => format!("<{} data-field=\"{}\">", tag, field),
            None => format!("<{}>", tag),
        }
    }
}

/// Selector queries shared by documents and elements
pub trait Query {
    fn query_all(&self, selector: &str) -> Result<NodeList, JsValue>;
    fn query_one(&self, selector: &str) -> Result<Option<Element>, JsValue>;
}

impl Query for Document {
    fn query_all(&self, selector: &str) -> Result<NodeList, JsValue> {
        self.query_selector_all(selector)
    }

    fn query_one(&self, selector: &str) -> Result<Option<Element>, JsValue> {
        self.query_selector(selector)
    }
}

impl Query for Element {
    fn query_all(&self, selector: &str) -> Result<NodeList, JsValue> {
        self.query_selector_all(selector)
    }

    fn query_one(&self, selector: &str) -> Result<Option<Element>, JsValue> {
        self.query_selector(selector)
    }
}

/// All elements under `parent` matching `selector`, in document order
pub fn elements<Q: Query>(parent: &Q, selector: &str) -> Vec<Element> {
    let list = match parent.query_all(selector) {
        Ok(list) => list,
        Err(err) => {
            warn!("invalid selector {}: {:?}", selector, err);
            return Vec::new();
        }
    };

    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn first<Q: Query>(parent: &Q, selector: &str) -> Option<Element> {
    parent.query_one(selector).ok().flatten()
}

/// `element` itself when it matches `selector`, else its first match inside
pub fn control<T: JsCast>(element: &Element, selector: &str) -> Option<T> {
    if element.matches(selector).unwrap_or(false) {
        return element.clone().dyn_into::<T>().ok();
    }
    first(element, selector).and_then(|found| found.dyn_into::<T>().ok())
}

/// Field the `#access-options` select feeds in a table of `category`
pub fn access_field(category: &str) -> Option<&'static str> {
    match category.parse::<Category>().ok()? {
        Category::Users => Some("group"),
        Category::Groups => Some("role"),
        Category::Roles | Category::Records => None,
    }
}

fn page_category(element: &Element) -> Option<String> {
    let owner = element.closest("[data-category]").ok().flatten().or_else(|| {
        element
            .owner_document()
            .and_then(|document| first(&document, "[data-category]"))
    })?;
    owner.get_attribute("data-category")
}

/// Field a template select serves: `data-field`, the page's relational field
/// for `#access-options`, then `name`
fn template_field(select: &Element) -> Option<String> {
    let named = |attribute: &str| select.get_attribute(attribute).filter(|field| !field.is_empty());

    named("data-field")
        .or_else(|| {
            (select.id() == ACCESS_OPTIONS)
                .then(|| page_category(select))
                .flatten()
                .and_then(|category| access_field(&category))
                .map(str::to_string)
        })
        .or_else(|| named("name"))
}

fn selected_options(select: &Element) -> Vec<HtmlOptionElement> {
    elements(select, "option")
        .into_iter()
        .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
        .filter(HtmlOptionElement::selected)
        .collect()
}

/// Build one catalog per template select; the first template of a field wins
pub fn read_catalogs(document: &Document) -> Catalogs {
    let mut catalogs = Catalogs::new();
    let selector = format!("{}, select#{}", CATALOG_SELECTOR, ACCESS_OPTIONS);

    for select in elements(document, &selector) {
        let Some(field) = template_field(&select) else {
            warn!("option template without data-field or name, skipped");
            continue;
        };
        if catalogs.contains_key(&field) {
            continue;
        }

        let catalog: OptionCatalog = elements(&select, "option")
            .into_iter()
            .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| {
                let entry = SelectOption::new(option.value(), option.text().trim());
                match option.get_attribute("data-option-url").filter(|url| !url.is_empty()) {
                    Some(url) => entry.with_option_url(url),
                    None => entry,
                }
            })
            .collect();

        catalogs.insert(field, catalog);
    }

    catalogs
}

/// The template select for a field, deep-cloned
pub fn clone_template(document: &Document, field: &str) -> Option<HtmlSelectElement> {
    elements(document, CATALOG_SELECTOR)
        .into_iter()
        .find(|select| template_field(select).as_deref() == Some(field))
        .and_then(|select| select.clone_node_with_deep(true).ok())
        .and_then(|node| node.dyn_into::<HtmlSelectElement>().ok())
}

fn text_of(element: &Element) -> String {
    element.text_content().unwrap_or_default().trim().to_string()
}

/// Current value when the element is itself a form control
fn own_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    element.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
}

/// Value of a structured sub-cell: `data-value`, an input, or its text
fn sub_value(cell: &Element) -> String {
    if let Some(value) = cell.get_attribute("data-value") {
        return value;
    }
    match control::<HtmlInputElement>(cell, "input") {
        Some(input) => input.value(),
        None => text_of(cell),
    }
}

fn display_of(cell: &Element, kind: FieldKind) -> DisplayValue {
    let original = cell.get_attribute("data-original");

    // a select standing for the field shows what is selected in it
    if kind.is_relational() && cell.dyn_ref::<HtmlSelectElement>().is_some() {
        let labels: Vec<String> = selected_options(cell)
            .iter()
            .filter(|option| !option.value().is_empty())
            .map(|option| option.text().trim().to_string())
            .collect();
        return match kind {
            FieldKind::MultiSelect => DisplayValue::List(labels),
            _ => DisplayValue::Text(labels.into_iter().next().unwrap_or_default()),
        };
    }

    match kind {
        FieldKind::MultiSelect => {
            let spans = elements(cell, ".multi-role");
            if spans.is_empty() {
                DisplayValue::from_joined(&original.unwrap_or_else(|| text_of(cell)))
            } else {
                DisplayValue::List(
                    spans
                        .iter()
                        .map(text_of)
                        .filter(|label| !label.is_empty())
                        .collect(),
                )
            }
        }
        FieldKind::Structured => DisplayValue::Pairs(
            elements(cell, "[data-label]")
                .iter()
                .filter_map(|sub| sub.get_attribute("data-label").map(|label| (label, sub_value(sub))))
                .collect(),
        ),
        _ => DisplayValue::Text(
            original
                .or_else(|| own_value(cell))
                .unwrap_or_else(|| text_of(cell)),
        ),
    }
}

pub fn is_new_record(row: &Element) -> bool {
    row.class_list().contains("new-record")
}

/// The `#access-options` select of a new-record row, with the field it feeds
fn access_options(row: &Element) -> Option<(Element, &'static str)> {
    if !is_new_record(row) {
        return None;
    }
    let field = access_field(&row.get_attribute("data-category")?)?;
    if first(row, &format!("[data-field=\"{}\"]", field)).is_some() {
        return None;
    }
    first(row, &format!("select#{}", ACCESS_OPTIONS)).map(|select| (select, field))
}

/// Describe a row element and its `data-field` cells
pub fn read_row(row: &Element) -> Result<RowSpec, BindError> {
    let mut cells: Vec<(ElementAttributes, DisplayValue, bool)> = elements(row, "[data-field]")
        .into_iter()
        .map(|cell| {
            let kind = FieldKind::for_field(&cell.get_attribute("data-field").unwrap_or_default());
            let display = display_of(&cell, kind);
            let editable = cell.class_list().contains("editable") || is_new_record(row);
            (ElementAttributes::new(cell), display, editable)
        })
        .collect();

    if let Some((select, field)) = access_options(row) {
        let display = display_of(&select, FieldKind::for_field(field));
        cells.push((ElementAttributes::for_field(select, field), display, true));
    }

    RowSpec::from_attributes(&ElementAttributes::new(row.clone()), is_new_record(row), cells)
}

/// The element of a field inside a row: its `data-field` cell or control, or
/// `#access-options` for a new-record row's relational field
pub fn cell(row: &Element, field: &str) -> Option<Element> {
    first(row, &format!("[data-field=\"{}\"]", field)).or_else(|| {
        access_options(row)
            .filter(|(_, access)| *access == field)
            .map(|(select, _)| select)
    })
}

/// Input commands carrying what the user typed into the mounted widgets
pub fn collect_inputs(element: &Element, row: &Row) -> Vec<Command> {
    let mut commands = Vec::new();

    for field in row.fields().iter().filter(|field| field.is_editing()) {
        let Some(cell) = cell(element, field.name()) else {
            continue;
        };
        let name = field.name().to_string();

        match field.input() {
            Some(FieldInput::Text(_)) => {
                if let Some(input) = control::<HtmlInputElement>(&cell, "input") {
                    commands.push(Command::SetText {
                        field: name,
                        value: input.value(),
                    });
                }
            }
            Some(FieldInput::Select(_)) => {
                if let Some(select) = control::<HtmlSelectElement>(&cell, "select") {
                    commands.push(Command::Select {
                        field: name,
                        value: Some(select.value()),
                    });
                }
            }
            Some(FieldInput::MultiSelect(_)) => {
                if let Some(select) = control::<Element>(&cell, "select") {
                    let values = selected_options(&select)
                        .into_iter()
                        .map(|option| option.value())
                        .collect();
                    commands.push(Command::SetSelection { field: name, values });
                }
            }
            Some(FieldInput::Structured(_)) => {
                for input in elements(&cell, "input[data-label]") {
                    let Some(label) = input.get_attribute("data-label") else {
                        continue;
                    };
                    if let Ok(input) = input.dyn_into::<HtmlInputElement>() {
                        commands.push(Command::SetSubField {
                            field: name.clone(),
                            label,
                            value: input.value(),
                        });
                    }
                }
            }
            None => {}
        }
    }

    commands
}

/// Field an event target edits: its `name`, else its `data-field`
pub fn field_of(control: &Element) -> Option<String> {
    control
        .get_attribute("name")
        .filter(|name| !name.is_empty())
        .or_else(|| control.get_attribute("data-field"))
}

/// Whether the element is an input or a select
pub fn form_control(target: &Element) -> bool {
    is_control_tag(&target.tag_name())
}

/// Tags that take typed input and submit on Enter
fn is_control_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("select")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_options_feed_the_relational_field() {
        assert_eq!(access_field("users"), Some("group"));
        assert_eq!(access_field("groups"), Some("role"));
        assert_eq!(access_field("roles"), None);
        assert_eq!(access_field("records"), None);
        assert_eq!(access_field("zones-admin"), None);
    }

    #[test]
    fn test_inputs_and_selects_are_controls() {
        assert!(is_control_tag("INPUT"));
        assert!(is_control_tag("SELECT"));
        assert!(is_control_tag("select"));
        assert!(!is_control_tag("TD"));
        assert!(!is_control_tag("BUTTON"));
    }
}
