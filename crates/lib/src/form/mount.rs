//! Scoped registration for mounted fields.

use super::Form;
use crate::Result;

/// Keeps a field registered while it is alive.
///
/// Created by [`Form::mount`]. Dropping the guard unregisters the name; an
/// unregister failure on drop is logged and otherwise ignored. The name is
/// fixed for the guard's lifetime.
#[derive(Debug)]
pub struct MountGuard {
    form: Form,
    name: String,
}

impl MountGuard {
    pub(crate) fn new(form: Form, name: String) -> Result<Self> {
        form.register([name.as_str()])?;
        tracing::debug!(form = %form.id(), field = %name, "Mounted field");
        Ok(Self { form, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Reports an attempt to change the mounted name.
    ///
    /// The guard keeps its original name; a different `name` only produces a
    /// warning. Returns whether `name` matched.
    pub fn rebind(&self, name: &str) -> bool {
        if name == self.name {
            return true;
        }
        tracing::warn!(
            form = %self.form.id(),
            field = %self.name,
            requested = %name,
            "Field name cannot change while mounted; keeping the original name"
        );
        false
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        match self.form.unregister([self.name.as_str()]) {
            Ok(()) => tracing::debug!(form = %self.form.id(), field = %self.name, "Unmounted field"),
            Err(err) => tracing::warn!(
                form = %self.form.id(),
                field = %self.name,
                error = %err,
                "Failed to unregister field on unmount"
            ),
        }
    }
}
