//! Two-way form binding without a UI framework.
//!
//! Feature modules read and write named fields through [`FormFields`]. The
//! browser implementation ([`DomForm`]) maps a field name to an element id;
//! tests use [`MemoryForm`].
//!
//! Numeric reads always take an explicit fallback, so a blank or garbled
//! input can never put `NaN` on the wire.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use std::cell::RefCell;
use std::collections::HashMap;

/// Named field access for one form.
pub trait FormFields {
    /// Current text of a text, number or select field; `None` if absent.
    fn text(&self, field: &str) -> Option<String>;
    /// Current state of a checkbox; `None` if absent.
    fn checked(&self, field: &str) -> Option<bool>;
    fn set_text(&self, field: &str, value: &str);
    fn set_checked(&self, field: &str, value: bool);
}

/// One failed range check, named by field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Parse a finite float, falling back on blank, garbage, `NaN` or infinity.
#[must_use]
pub fn parse_number(text: Option<&str>, fallback: f64) -> f64 {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

/// Parse a non-negative integer; fractional input is truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(text: Option<&str>, fallback: u32) -> u32 {
    let value = parse_number(text, f64::from(fallback));
    if value < 0.0 {
        return fallback;
    }
    value.min(f64::from(u32::MAX)) as u32
}

#[must_use]
pub fn number(form: &impl FormFields, field: &str, fallback: f64) -> f64 {
    parse_number(form.text(field).as_deref(), fallback)
}

#[must_use]
pub fn count(form: &impl FormFields, field: &str, fallback: u32) -> u32 {
    parse_count(form.text(field).as_deref(), fallback)
}

#[must_use]
pub fn flag(form: &impl FormFields, field: &str, fallback: bool) -> bool {
    form.checked(field).unwrap_or(fallback)
}

/// Text with surrounding whitespace trimmed; blank reads as the fallback.
#[must_use]
pub fn text_or(form: &impl FormFields, field: &str, fallback: &str) -> String {
    form.text(field)
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

/// In-memory form used by tests and headless callers.
#[derive(Debug, Default)]
pub struct MemoryForm {
    texts: RefCell<HashMap<String, String>>,
    checks: RefCell<HashMap<String, bool>>,
}

impl MemoryForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(self, field: &str, value: &str) -> Self {
        self.set_text(field, value);
        self
    }

    #[must_use]
    pub fn with_checked(self, field: &str, value: bool) -> Self {
        self.set_checked(field, value);
        self
    }
}

impl FormFields for MemoryForm {
    fn text(&self, field: &str) -> Option<String> {
        self.texts.borrow().get(field).cloned()
    }

    fn checked(&self, field: &str) -> Option<bool> {
        self.checks.borrow().get(field).copied()
    }

    fn set_text(&self, field: &str, value: &str) {
        self.texts.borrow_mut().insert(field.to_owned(), value.to_owned());
    }

    fn set_checked(&self, field: &str, value: bool) {
        self.checks.borrow_mut().insert(field.to_owned(), value);
    }
}

/// Form bound to DOM elements. Field `a.b_c` lives at element id
/// `{prefix}a-b_c`.
#[cfg(feature = "hydrate")]
#[derive(Debug, Clone)]
pub struct DomForm {
    document: web_sys::Document,
    prefix: String,
}

#[cfg(feature = "hydrate")]
impl DomForm {
    #[must_use]
    pub fn new(document: web_sys::Document, prefix: &str) -> Self {
        Self { document, prefix: prefix.to_owned() }
    }

    #[must_use]
    pub fn element_id(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field.replace('.', "-"))
    }

    fn element(&self, field: &str) -> Option<web_sys::Element> {
        self.document.get_element_by_id(&self.element_id(field))
    }
}

#[cfg(feature = "hydrate")]
impl FormFields for DomForm {
    fn text(&self, field: &str) -> Option<String> {
        use wasm_bindgen::JsCast;

        let el = self.element(field)?;
        if let Some(input) = el.dyn_ref::<web_sys::HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(select) = el.dyn_ref::<web_sys::HtmlSelectElement>() {
            return Some(select.value());
        }
        el.dyn_ref::<web_sys::HtmlTextAreaElement>().map(web_sys::HtmlTextAreaElement::value)
    }

    fn checked(&self, field: &str) -> Option<bool> {
        use wasm_bindgen::JsCast;

        self.element(field)?
            .dyn_ref::<web_sys::HtmlInputElement>()
            .map(web_sys::HtmlInputElement::checked)
    }

    fn set_text(&self, field: &str, value: &str) {
        use wasm_bindgen::JsCast;

        let Some(el) = self.element(field) else {
            return;
        };
        if let Some(input) = el.dyn_ref::<web_sys::HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = el.dyn_ref::<web_sys::HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = el.dyn_ref::<web_sys::HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn set_checked(&self, field: &str, value: bool) {
        use wasm_bindgen::JsCast;

        if let Some(input) = self.element(field).as_ref().and_then(|el| el.dyn_ref::<web_sys::HtmlInputElement>()) {
            input.set_checked(value);
        }
    }
}
