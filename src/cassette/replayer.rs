//! Replays recorded exchanges from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};
use crate::ports::Method;

/// Key for indexing interactions by method and path.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct RouteKey {
    method: Method,
    path: String,
}

/// Replays interactions from a loaded cassette, serving them sequentially
/// per method/path pair.
pub struct CassetteReplayer {
    /// Per route queue of interactions (in order).
    queues: HashMap<RouteKey, Vec<Interaction>>,
    /// Per route cursor tracking position.
    cursors: HashMap<RouteKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<RouteKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = RouteKey {
                method: interaction.request.method,
                path: interaction.request.path.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Return the next interaction recorded for `method` and `path`.
    ///
    /// # Errors
    ///
    /// Returns a message listing what remains when the cassette has no
    /// (more) interactions for this route.
    pub fn next_interaction(&mut self, method: Method, path: &str) -> Result<&Interaction, String> {
        let key = RouteKey { method, path: path.to_string() };

        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{} {}", k.method, k.path)).collect();
            available.sort();
            return Err(format!(
                "Cassette exhausted: no interactions recorded for {method} {path}. \
                 Available routes: [{}]",
                available.join(", ")
            ));
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        if *cursor >= queue.len() {
            return Err(format!(
                "Cassette exhausted: all {count} interactions for {method} {path} \
                 have been consumed. Last interaction was seq={last_seq}.",
                count = queue.len(),
                last_seq = queue.last().map_or(0, |i| i.seq),
            ));
        }

        let interaction = &queue[*cursor];
        *cursor += 1;
        Ok(interaction)
    }
}
