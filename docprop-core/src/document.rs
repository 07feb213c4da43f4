//! Token-stream front-end: drives the context stack from start/characters/
//! end events.
//!
//! One [`DocumentHandler`] per parse. The event source is assumed
//! well-formed (balanced start/end nesting); nothing here validates it.
//! Unknown structure never errors - it rides the pass-through branch and
//! leaves the stack depth exactly where it found it.

use log::trace;

use crate::context::{
    make_context, ContextHandler, ContextResult, Registry, Token, UnknownContext,
};

/// Per-parse front-end owning the context-handler stack.
///
/// Events arrive in document order; the stack is strictly LIFO and rooted
/// at the registry's document-level context. When the source stops,
/// [`finish`](DocumentHandler::finish) hands the root artifact back for
/// resolution.
pub struct DocumentHandler<'reg> {
    registry: &'reg Registry,
    stack: Vec<Box<dyn ContextHandler>>,
}

impl<'reg> DocumentHandler<'reg> {
    pub fn new(registry: &'reg Registry) -> Self {
        let root = make_context(registry.root(), registry.spec(registry.root()));
        DocumentHandler {
            registry,
            stack: vec![root],
        }
    }

    /// Current nesting depth, root context included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Start-of-element. Pushes the registered child context for `token`
    /// and feeds it the attributes, or pushes the pass-through context if
    /// nothing is registered. Attributes without a registered spec are
    /// dropped silently.
    pub fn start_element(&mut self, token: Token, attributes: &[(Token, &str)]) {
        let parent_spec = self.stack.last().and_then(|top| top.spec());
        let child_spec = parent_spec.and_then(|parent| self.registry.lookup_child(parent, token));

        match child_spec {
            Some(spec_id) => {
                trace!("start element {token:#x}");
                let mut context = make_context(spec_id, self.registry.spec(spec_id));
                for (attr_token, text) in attributes {
                    match self.registry.lookup_attr(spec_id, *attr_token) {
                        Some((id, ty)) => context.attribute(id, ty.value_of(text)),
                        None => trace!("dropped attribute {attr_token:#x}"),
                    }
                }
                self.stack.push(context);
            }
            None => {
                trace!("unknown element {token:#x}");
                self.stack.push(Box::new(UnknownContext));
            }
        }
    }

    /// Character data, delivered to the innermost open context.
    pub fn characters(&mut self, text: &str) {
        if let Some(top) = self.stack.last_mut() {
            top.characters(text);
        }
    }

    /// End-of-element. Pops and finalizes the innermost context and hands
    /// its artifact to the parent. The root context only closes through
    /// [`finish`](DocumentHandler::finish).
    pub fn end_element(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let registry = self.registry;
        let context = match self.stack.pop() {
            Some(context) => context,
            None => return,
        };
        let spec = context.spec();
        let result = context.finish();
        trace!("end element");

        if let (Some(spec_id), Some(parent)) = (spec, self.stack.last_mut()) {
            parent.child(registry.spec(spec_id), result);
        }
    }

    /// End of parse: finalize the root context and return its artifact.
    ///
    /// A source that stopped pumping mid-document (caller abort) leaves
    /// open contexts; they are closed as if their end events had arrived.
    pub fn finish(mut self) -> ContextResult {
        while self.stack.len() > 1 {
            self.end_element();
        }
        match self.stack.pop() {
            Some(root) => root.finish(),
            None => ContextResult::None,
        }
    }
}
