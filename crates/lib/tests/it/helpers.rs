use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use formwork::{
    FieldPath, Form, Validation, Validator, Value,
    field::{Required, fallible_validator, validator},
    form::{Bag, FieldConfig, SubmitError, SubmitEvent, SubmitHandler},
    store::Change,
};

// Re-export TestContext for convenience
pub use crate::context::TestContext;

/// Parse a path, panicking on malformed input.
pub fn path(name: &str) -> FieldPath {
    FieldPath::parse(name).expect("valid test path")
}

/// A validator rejecting blank values.
pub fn required() -> Arc<dyn Validator> {
    Arc::new(Required::new("required"))
}

/// A validator that warns (valid, not strictly valid) on text shorter than `min`.
pub fn min_len_warning(min: usize) -> Arc<dyn Validator> {
    validator(move |value: &Value| match value.as_text() {
        Some(text) if text.len() < min => Validation::warning("short"),
        _ => Validation::valid(),
    })
}

/// A validator that always errors.
pub fn exploding() -> Arc<dyn Validator> {
    fallible_validator(|_: &Value| Err("validator exploded".into()))
}

/// A validator that counts its invocations.
pub fn counting(counter: Arc<AtomicUsize>) -> Arc<dyn Validator> {
    validator(move |_: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        Validation::valid()
    })
}

/// Register `name` as a leaf with an initial value and validator.
pub fn leaf(form: &Form, name: &str, initial: impl Into<Value>, validator: Arc<dyn Validator>) {
    form.register_field(name, FieldConfig::new(initial).validator(validator))
        .expect("Failed to register field");
}

/// Read a leaf's current value.
pub fn value_of(form: &Form, name: &str) -> Value {
    form.field(name)
        .expect("valid name")
        .value()
        .expect("Failed to read value")
}

/// Submit handler recording every call.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    submitted: Arc<Mutex<Vec<(Bag, Value)>>>,
    invalid: Arc<Mutex<Vec<(Bag, Value)>>>,
    fail_with: Option<String>,
}

impl RecordingHandler {
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.lock().unwrap().len()
    }

    pub fn last_submitted(&self) -> Option<(Bag, Value)> {
        self.submitted.lock().unwrap().last().cloned()
    }

    pub fn last_invalid(&self) -> Option<(Bag, Value)> {
        self.invalid.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SubmitHandler for RecordingHandler {
    async fn on_submit(&self, bag: &Bag, args: &Value) -> Result<Value, SubmitError> {
        self.submitted
            .lock()
            .unwrap()
            .push((bag.clone(), args.clone()));
        match &self.fail_with {
            Some(reason) => Err(reason.clone().into()),
            None => Ok(bag.values.clone()),
        }
    }

    async fn on_invalid(&self, bag: &Bag, args: &Value) {
        self.invalid.lock().unwrap().push((bag.clone(), args.clone()));
    }
}

/// Host event stand-in that remembers whether its default was prevented.
#[derive(Debug, Default)]
pub struct TestEvent {
    pub default_prevented: bool,
}

impl SubmitEvent for TestEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Observer collecting every change it is notified of.
#[derive(Clone, Default)]
pub struct ChangeLog {
    changes: Arc<Mutex<Vec<Change>>>,
}

impl ChangeLog {
    pub fn observer(&self) -> impl Fn(&Change) + Send + Sync + 'static {
        let changes = self.changes.clone();
        move |change: &Change| changes.lock().unwrap().push(change.clone())
    }

    pub fn len(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    pub fn changes(&self) -> Vec<Change> {
        self.changes.lock().unwrap().clone()
    }
}
