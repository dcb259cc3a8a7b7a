//! In-progress form values for adding and editing todos.
//!
//! Validation runs before anything is handed to the mutation layer, so an
//! invalid form never produces a request.

use std::str::FromStr;

use tracing::debug;

use crate::error::{ApiError, ValidationError};
use crate::mutation::{Mutation, Operation};
use crate::types::{Priority, Todo, TodoId, TodoPatch, TITLE_MIN_LEN};

/// Editable fields shared by the add and edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoFields {
    pub title: String,
    pub priority: Priority,
}

impl TodoFields {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            priority,
        }
    }

    /// Title length is counted in characters, not bytes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let actual = self.title.chars().count();
        if actual < TITLE_MIN_LEN {
            return Err(ValidationError::TitleTooShort {
                min: TITLE_MIN_LEN,
                actual,
            });
        }
        Ok(())
    }

    /// Set a field by name. `value` is parsed for `priority`.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        match name.parse::<Field>()? {
            Field::Title => self.title = value.to_string(),
            Field::Priority => self.priority = value.parse()?,
        }
        Ok(())
    }
}

impl From<&Todo> for TodoFields {
    fn from(todo: &Todo) -> Self {
        Self::new(todo.title.clone(), todo.priority)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Priority,
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Field::Title),
            "priority" => Ok(Field::Priority),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// Lifecycle of the add form. No state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Editing,
    Submitting,
}

/// The "Add" form.
pub struct AddForm {
    fields: TodoFields,
    state: FormState,
    mutation: Mutation,
}

impl AddForm {
    pub fn new(mutation: Mutation) -> Self {
        Self {
            fields: TodoFields::default(),
            state: FormState::Empty,
            mutation,
        }
    }

    pub fn values(&self) -> &TodoFields {
        &self.fields
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_pending() {
            "Adding..."
        } else {
            "Add"
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        self.fields.set_field(name, value)?;
        self.state = FormState::Editing;
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.title = title.into();
        self.state = FormState::Editing;
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.fields.priority = priority;
        self.state = FormState::Editing;
    }

    /// Back to `{title: "", priority: low}`.
    pub fn reset(&mut self) {
        self.fields = TodoFields::default();
        self.state = FormState::Empty;
    }

    /// Validate, create the todo, and reset on success. On any failure the
    /// entered values are kept.
    pub async fn submit(&mut self) -> Result<(), ApiError> {
        self.fields.validate()?;
        let todo = self.mutation.coordinator().draft(&self.fields);
        debug!(id = %todo.id, "submitting add form");

        self.state = FormState::Submitting;
        match self.mutation.submit(Operation::Create(todo)).await {
            Ok(()) => {
                self.reset();
                Ok(())
            }
            Err(err) => {
                self.state = FormState::Editing;
                Err(err)
            }
        }
    }
}

/// The edit dialog for one existing todo. Closing it discards the values.
pub struct EditForm {
    id: TodoId,
    fields: TodoFields,
    open: bool,
    mutation: Mutation,
}

impl EditForm {
    /// Seed the form from `todo`. Completed todos are not editable.
    pub fn open(todo: &Todo, mutation: Mutation) -> Result<Self, ValidationError> {
        if todo.completed {
            return Err(ValidationError::AlreadyCompleted);
        }
        Ok(Self {
            id: todo.id.clone(),
            fields: TodoFields::from(todo),
            open: true,
            mutation,
        })
    }

    pub fn id(&self) -> &TodoId {
        &self.id
    }

    pub fn values(&self) -> &TodoFields {
        &self.fields
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        self.fields.set_field(name, value)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.title = title.into();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.fields.priority = priority;
    }

    /// Send the edited title and priority. The dialog closes on success and
    /// stays open with its values on failure.
    pub async fn submit(&mut self) -> Result<(), ApiError> {
        self.fields.validate()?;
        let op = Operation::Update {
            id: self.id.clone(),
            patch: TodoPatch::edit(self.fields.title.clone(), self.fields.priority),
        };
        self.mutation.submit(op).await?;
        self.open = false;
        Ok(())
    }

    pub fn close(self) {}
}

/// The "mark complete" action on a list item.
pub async fn complete_todo(mutation: &Mutation, todo: &Todo) -> Result<(), ApiError> {
    let op = Operation::complete(todo)?;
    mutation.submit(op).await
}
