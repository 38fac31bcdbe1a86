use crate::context::Context;
use crate::operators::operators_map;
use crate::types::OperatorMap;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// The element currently being visited by an iterating operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub index: usize,
    pub length: usize,
    pub item: Value,
}

/// Per-call evaluation state passed to every operator eval function.
///
/// One is created for each [`crate::remap`] call and never shared, so the
/// history stack needs no synchronisation.
pub struct EvalCtx<'a> {
    /// The caller-supplied, read-only context.
    pub context: &'a Context,
    /// The operator table used for dispatch.
    pub operators: &'a OperatorMap,
    /// The input the outermost expression was evaluated against.
    pub root: &'a Value,
    history: Vec<Value>,
    array: Option<ArrayItem>,
}

impl<'a> EvalCtx<'a> {
    pub fn new(context: &'a Context, root: &'a Value) -> Self {
        EvalCtx::with_operators(context, root, operators_map())
    }

    pub fn with_operators(context: &'a Context, root: &'a Value, operators: &'a OperatorMap) -> Self {
        EvalCtx {
            context,
            operators,
            root,
            history: Vec::new(),
            array: None,
        }
    }

    /// Returns the `depth`-th most recently pushed history value (`1` is the
    /// latest push).
    pub fn history(&self, depth: usize) -> Option<&Value> {
        if depth == 0 || depth > self.history.len() {
            return None;
        }
        self.history.get(self.history.len() - depth)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Pushes `value` onto the history stack. The value is popped when the
    /// returned scope is dropped.
    pub fn push_history(&mut self, value: Value) -> HistoryScope<'_, 'a> {
        self.history.push(value);
        HistoryScope { ctx: self }
    }

    pub fn array_item(&self) -> Option<&ArrayItem> {
        self.array.as_ref()
    }

    /// Makes `item` the current array element until the returned scope is
    /// dropped, after which the enclosing element (if any) is restored.
    pub fn enter_item(&mut self, item: ArrayItem) -> ItemScope<'_, 'a> {
        let previous = self.array.replace(item);
        ItemScope {
            ctx: self,
            previous,
        }
    }
}

pub struct HistoryScope<'c, 'a> {
    ctx: &'c mut EvalCtx<'a>,
}

impl<'a> Deref for HistoryScope<'_, 'a> {
    type Target = EvalCtx<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for HistoryScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for HistoryScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.history.pop();
    }
}

pub struct ItemScope<'c, 'a> {
    ctx: &'c mut EvalCtx<'a>,
    previous: Option<ArrayItem>,
}

impl<'a> Deref for ItemScope<'_, 'a> {
    type Target = EvalCtx<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for ItemScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for ItemScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.array = self.previous.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_scope_pops_on_drop() {
        let context = Context::default();
        let root = json!(null);
        let mut ctx = EvalCtx::new(&context, &root);
        {
            let mut outer = ctx.push_history(json!("a"));
            {
                let inner = outer.push_history(json!("b"));
                assert_eq!(inner.history(1), Some(&json!("b")));
                assert_eq!(inner.history(2), Some(&json!("a")));
                assert_eq!(inner.history(3), None);
            }
            assert_eq!(outer.history_len(), 1);
        }
        assert_eq!(ctx.history_len(), 0);
        assert_eq!(ctx.history(0), None);
    }

    #[test]
    fn test_item_scope_restores_previous() {
        let context = Context::default();
        let root = json!(null);
        let mut ctx = EvalCtx::new(&context, &root);
        let outer_item = ArrayItem { index: 1, length: 2, item: json!("x") };
        {
            let mut outer = ctx.enter_item(outer_item.clone());
            {
                let inner = outer.enter_item(ArrayItem { index: 0, length: 5, item: json!("y") });
                assert_eq!(inner.array_item().map(|a| a.length), Some(5));
            }
            assert_eq!(outer.array_item(), Some(&outer_item));
        }
        assert!(ctx.array_item().is_none());
    }
}
