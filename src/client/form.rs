use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const REPLY_TO_FIELD: &str = "_replyto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Select,
    LongText,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    pub max_length: Option<usize>,
    /// Set while a required field is left empty.
    pub invalid: bool,
}

impl Field {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value: String::new(),
            required: false,
            max_length: None,
            invalid: false,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn email(name: &str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn select(name: &str) -> Self {
        Self::new(name, FieldKind::Select)
    }

    pub fn long_text(name: &str) -> Self {
        Self::new(name, FieldKind::LongText)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

/// Client-side model of an HTML form: its fields, an optional relay marker
/// and the submit control.
#[derive(Debug, Clone)]
pub struct Form {
    id: String,
    fields: Vec<Field>,
    relay_id: Option<String>,
    submit: SubmitControl,
}

impl Form {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fields: Vec::new(),
            relay_id: None,
            submit: SubmitControl::default(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Mark the form as delivered through a third-party form relay.
    pub fn relay(mut self, relay_id: &str) -> Self {
        self.relay_id = Some(relay_id.to_string());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn relay_id(&self) -> Option<&str> {
        self.relay_id.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|f| f.value.as_str())
    }

    /// Returns false when the form has no such field.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Empty every field and clear invalid flags.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
            field.invalid = false;
        }
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    /// Flag required fields with blank content and unflag the rest.
    /// Returns the names of the blank ones.
    pub fn check_required(&mut self) -> Vec<String> {
        let mut missing = Vec::new();
        for field in self.fields.iter_mut().filter(|f| f.required) {
            field.invalid = field.value.trim().is_empty();
            if field.invalid {
                missing.push(field.name.clone());
            }
        }
        missing
    }

    /// Name/value pairs as they go on the wire. Adds `_replyto` from `email`
    /// when the form has no reply-to of its own.
    pub fn payload(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        let has_reply_to = self
            .value(REPLY_TO_FIELD)
            .is_some_and(|v| !v.is_empty());
        if !has_reply_to {
            if let Some(email) = self.value("email").filter(|v| !v.is_empty()) {
                let email = email.to_string();
                pairs.retain(|(name, _)| name != REPLY_TO_FIELD);
                pairs.push((REPLY_TO_FIELD.to_string(), email));
            }
        }

        pairs
    }

    /// The long-text field the character counter follows, if any.
    pub fn counter_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::LongText && f.max_length.is_some())
    }
}

/// The form's submit button. Cloning shares the same button.
#[derive(Debug, Clone, Default)]
pub struct SubmitControl {
    disabled: Arc<AtomicBool>,
}

impl SubmitControl {
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Disable the control until the returned guard is dropped.
    /// Returns `None` when it is already disabled.
    pub fn hold(&self) -> Option<SubmitGuard> {
        self.disabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard {
                disabled: self.disabled.clone(),
            })
    }
}

pub struct SubmitGuard {
    disabled: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.disabled.store(false, Ordering::Release);
    }
}

/// Live "`n / max caracteres`" display bound to one long-text field.
#[derive(Debug, Clone)]
pub struct CharCounter {
    field: String,
    max: usize,
    text: String,
}

impl CharCounter {
    pub fn new(field: &str, max: usize) -> Self {
        Self {
            field: field.to_string(),
            max,
            text: String::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn refresh(&mut self, value: &str) {
        self.text = format!("{} / {} caracteres", value.chars().count(), self.max);
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
