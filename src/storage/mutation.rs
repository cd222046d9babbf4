//! Named transformations applied inside the store's critical section.
//!
//! A [`Mutation`] is plain data. [`Mutation::apply`] runs it against an
//! in-memory document without any locking or I/O, which keeps the atomic
//! unit testable on its own.

use crate::Result;
use crate::models::{Direction, Document, Item, Outcome};
use serde::Serialize;

/// One structural change to the directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddCategory {
        name: String,
    },
    RemoveCategory {
        name: String,
    },
    RenameCategory {
        from: String,
        to: String,
    },
    ReorderCategories {
        order: Vec<String>,
    },
    /// Append to a category; no-op if the category is missing
    AddItem {
        category: String,
        item: Item,
    },
    /// Replace in place; no-op if the item is missing
    UpdateItem {
        category: String,
        title: String,
        item: Item,
    },
    RemoveItem {
        category: String,
        title: String,
    },
    ReorderItems {
        category: String,
        order: Vec<String>,
    },
    MoveItem {
        category: String,
        title: String,
        direction: Direction,
    },
    /// Remove from `from` and append to the tail of `to`
    TransferItem {
        from: String,
        to: String,
        title: String,
    },
}

impl Mutation {
    /// Short operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddCategory { .. } => "add_category",
            Mutation::RemoveCategory { .. } => "remove_category",
            Mutation::RenameCategory { .. } => "rename_category",
            Mutation::ReorderCategories { .. } => "reorder_categories",
            Mutation::AddItem { .. } => "add_item",
            Mutation::UpdateItem { .. } => "update_item",
            Mutation::RemoveItem { .. } => "remove_item",
            Mutation::ReorderItems { .. } => "reorder_items",
            Mutation::MoveItem { .. } => "move_item",
            Mutation::TransferItem { .. } => "transfer_item",
        }
    }

    /// Apply to `doc`. On error `doc` is left as it was.
    pub fn apply(&self, doc: &mut Document) -> Result<Outcome> {
        match self {
            Mutation::AddCategory { name } => doc.add_category(name),
            Mutation::RemoveCategory { name } => Ok(doc.remove_category(name)),
            Mutation::RenameCategory { from, to } => doc.rename_category(from, to),
            Mutation::ReorderCategories { order } => Ok(doc.reorder_categories(order)),
            Mutation::AddItem { category, item } => match doc.category_mut(category) {
                Some(category) => category.push_item(item.clone()),
                None => Ok(Outcome::Unchanged),
            },
            Mutation::UpdateItem {
                category,
                title,
                item,
            } => match doc.category_mut(category) {
                Some(category) => category.replace_item(title, item.clone()),
                None => Ok(Outcome::Unchanged),
            },
            Mutation::RemoveItem { category, title } => Ok(doc
                .category_mut(category)
                .map_or(Outcome::Unchanged, |c| c.remove_item(title))),
            Mutation::ReorderItems { category, order } => Ok(doc
                .category_mut(category)
                .map_or(Outcome::Unchanged, |c| c.reorder_items(order))),
            Mutation::MoveItem {
                category,
                title,
                direction,
            } => Ok(doc
                .category_mut(category)
                .map_or(Outcome::Unchanged, |c| c.move_item(title, *direction))),
            Mutation::TransferItem { from, to, title } => doc.transfer_item(from, to, title),
        }
    }
}
