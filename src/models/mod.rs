use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}
impl Todo {
    pub fn new(id: u64, title: String) -> Self {
        Self {
            id,
            title,
            completed: false,
        }
    }

    /// Applies the fields present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: TodoUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
    }
}

// body of `POST /todos`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}
impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

// body of `PUT` and `PATCH /todos/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
