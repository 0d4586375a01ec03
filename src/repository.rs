use anyhow::Result;

use crate::db::Db;
use crate::models::{NewTodo, Todo, TodoUpdate};

const PREFIX: &str = "todo:";

// zero-padded so a prefix scan yields todos in id order
fn key(id: u64) -> String {
    format!("{PREFIX}{id:020}")
}

#[derive(Debug)]
pub struct TodoRepository {
    db: Db,
}
impl TodoRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn list(&self) -> Result<Vec<Todo>> {
        self.db
            .iter_prefix::<Todo>(PREFIX)
            .map(|item| item.map(|(_, todo)| todo))
            .collect()
    }

    pub fn create(&self, new: NewTodo) -> Result<Todo> {
        // sled ids start at zero, the API hands out ids from one
        let id = self.db.next_id()? + 1;
        let mut todo = Todo::new(id, new.title);
        todo.completed = new.completed;
        self.db.insert(key(id), &todo)?;
        Ok(todo)
    }

    pub fn find(&self, id: u64) -> Result<Option<Todo>> {
        self.db.get(key(id))
    }

    pub fn update(&self, id: u64, update: TodoUpdate) -> Result<Option<Todo>> {
        let Some(mut todo) = self.find(id)? else {
            return Ok(None);
        };
        todo.apply(update);
        self.db.insert(key(id), &todo)?;
        Ok(Some(todo))
    }

    pub fn delete(&self, id: u64) -> Result<bool> {
        self.db.remove(key(id))
    }

    pub fn clear(&self) -> Result<usize> {
        self.db.remove_prefix(PREFIX)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()
    }
}
