use std::collections::HashMap;

use crate::handlers::{FallbackHandler, Handler};

/// Maps intent labels to handlers. Fixed after start-up; lookups are exact
/// and case-sensitive, with the fallback handler for anything unmapped.
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
    fallback: Box<dyn Handler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_fallback(FallbackHandler)
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback<F>(fallback: F) -> Self
    where
        F: Handler + 'static,
    {
        Self { handlers: HashMap::new(), fallback: Box::new(fallback) }
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.insert(handler.intent().to_string(), Box::new(handler));
    }

    pub fn resolve(&self, intent: &str) -> &dyn Handler {
        match self.handlers.get(intent) {
            Some(handler) => handler.as_ref(),
            None => self.fallback.as_ref(),
        }
    }

    pub fn intents(&self) -> Vec<&str> {
        let mut intents = self.handlers.keys().map(String::as_str).collect::<Vec<_>>();
        intents.sort_unstable();
        intents
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
