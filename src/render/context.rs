//! The context stack: the ordered chain of view layers for one render call.

use crate::value::Value;

/// Lookup direction through the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Top (most recently pushed) layer first — ordinary scoping.
    Nearest,
    /// Bottom-most layer that resolves the name — the `~` sigil.
    Outermost,
}

/// One layer: a borrowed view value, plus its iteration position when it
/// was pushed by list iteration.
struct Frame<'v> {
    value: &'v Value,
    iter: Option<(usize, usize)>,
}

impl<'v> Frame<'v> {
    fn resolve(&self, name: &str, keyword: bool) -> Option<&'v Value> {
        match self.value {
            Value::Map(map) => map.get(name, keyword),
            _ => None,
        }
    }
}

/// Stack-disciplined chain of scopes. Never empty: the bottom layer is the
/// caller's view. Owned exclusively by one render call; layers borrow
/// caller-owned values and are never deep-copied.
pub(crate) struct Stack<'v> {
    frames: Vec<Frame<'v>>,
}

impl<'v> Stack<'v> {
    pub(crate) fn new(root: &'v Value) -> Self {
        Self {
            frames: vec![Frame { value: root, iter: None }],
        }
    }

    /// Enter a section scope.
    pub(crate) fn push(&mut self, value: &'v Value) {
        self.frames.push(Frame { value, iter: None });
    }

    /// Enter one element of a list iteration.
    pub(crate) fn push_element(&mut self, value: &'v Value, index: usize, len: usize) {
        self.frames.push(Frame {
            value,
            iter: Some((index, len)),
        });
    }

    /// Leave a scope. The bottom layer is never popped.
    pub(crate) fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// The value `.` refers to: the top of the stack.
    pub(crate) fn top(&self) -> &'v Value {
        // Invariant: frames is never empty.
        self.frames[self.frames.len() - 1].value
    }

    /// Iteration position `(index, len)` of the nearest iterating layer,
    /// for `.[n]` / `.[end]` conditions.
    pub(crate) fn iter_position(&self) -> Option<(usize, usize)> {
        self.frames.iter().rev().find_map(|f| f.iter)
    }

    /// Resolve `name` through the layers.
    ///
    /// `Nearest` returns the first hit scanning from the top; `Outermost`
    /// returns the hit closest to the root among all layers that define
    /// the name, i.e. the first hit scanning from the bottom.
    pub(crate) fn lookup(&self, name: &str, keyword: bool, mode: Mode) -> Option<&'v Value> {
        match mode {
            Mode::Nearest => self
                .frames
                .iter()
                .rev()
                .find_map(|f| f.resolve(name, keyword)),
            Mode::Outermost => self.frames.iter().find_map(|f| f.resolve(name, keyword)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn text(v: Option<&Value>) -> String {
        v.map(Value::to_text).unwrap_or_default()
    }

    #[test]
    fn nearest_prefers_inner_layer() {
        let root = Value::map([("x", 1), ("y", 10)]);
        let inner = Value::map([("x", 3)]);

        let mut stack = Stack::new(&root);
        stack.push(&inner);

        assert_eq!(text(stack.lookup("x", false, Mode::Nearest)), "3");
        // Falls through layers that do not define the name.
        assert_eq!(text(stack.lookup("y", false, Mode::Nearest)), "10");
    }

    #[test]
    fn outermost_prefers_root_layer() {
        let root = Value::map([("x", 1)]);
        let mid = Value::map([("y", 2)]);
        let inner = Value::map([("x", 3)]);

        let mut stack = Stack::new(&root);
        stack.push(&mid);
        stack.push(&inner);

        assert_eq!(text(stack.lookup("x", false, Mode::Outermost)), "1");
        // Only one layer defines `y`; both modes agree.
        assert_eq!(text(stack.lookup("y", false, Mode::Outermost)), "2");
        assert_eq!(text(stack.lookup("y", false, Mode::Nearest)), "2");
    }

    #[test]
    fn pop_restores_shadowed_binding() {
        let root = Value::map([("x", 1)]);
        let inner = Value::map([("x", 3)]);

        let mut stack = Stack::new(&root);
        stack.push(&inner);
        stack.pop();

        assert_eq!(text(stack.lookup("x", false, Mode::Nearest)), "1");
    }

    #[test]
    fn bottom_layer_survives_pop() {
        let root = Value::map([("x", 1)]);
        let mut stack = Stack::new(&root);
        stack.pop();
        assert_eq!(text(stack.lookup("x", false, Mode::Nearest)), "1");
    }

    #[test]
    fn iter_position_from_nearest_iterating_frame() {
        let root = Value::map([("v", Value::list(["a", "b"]))]);
        let element = Value::Str("a".to_owned());
        let pushed = Value::map([("flag", true)]);

        let mut stack = Stack::new(&root);
        assert_eq!(stack.iter_position(), None);

        stack.push_element(&element, 0, 2);
        assert_eq!(stack.iter_position(), Some((0, 2)));

        // A non-iterating layer on top does not hide the position.
        stack.push(&pushed);
        assert_eq!(stack.iter_position(), Some((0, 2)));
    }

    #[test]
    fn scalar_layers_resolve_nothing() {
        let root = Value::map([("x", 1)]);
        let scalar = Value::Int(7);

        let mut stack = Stack::new(&root);
        stack.push(&scalar);

        assert_eq!(text(stack.lookup("x", false, Mode::Nearest)), "1");
        assert!(matches!(stack.top(), Value::Int(7)));
    }
}
