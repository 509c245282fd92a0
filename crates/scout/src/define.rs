//! Term definitions: search once, condense with the chat model, save.

use serde_json::json;
use tracing::{info, warn};

use crate::capability::local::SAVE_DEFINITION;
use crate::capability::{CapabilityError, CapabilityRegistry};
use crate::llm::ChatModel;

const SYSTEM_PROMPT: &str = "You write short, precise dictionary definitions. \
Answer with the definition only, in at most three sentences.";

/// Result of a define run.
#[derive(Debug, Clone)]
pub struct DefineOutcome {
    pub term: String,
    pub definition: String,
    /// Completion message returned by `save_definition`.
    pub message: String,
    /// False when the model was unreachable and the raw search text was saved.
    pub condensed: bool,
}

pub struct DefineWorkflow<'a> {
    registry: &'a CapabilityRegistry,
    model: &'a dyn ChatModel,
    search_capability: &'a str,
}

impl<'a> DefineWorkflow<'a> {
    pub fn new(
        registry: &'a CapabilityRegistry,
        model: &'a dyn ChatModel,
        search_capability: &'a str,
    ) -> Self {
        Self {
            registry,
            model,
            search_capability,
        }
    }

    pub async fn run(&self, term: &str) -> Result<DefineOutcome, CapabilityError> {
        let term = term.trim();
        let query = format!("{term} definition");

        let results = self
            .registry
            .invoke(self.search_capability, json!({ "query": query }))
            .await?;
        info!(term = %term, bytes = results.len(), "Search returned");

        let prompt = format!(
            "Define the term '{term}' using these search results:\n\n{results}"
        );
        let (definition, condensed) = match self.model.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => (text, true),
            Err(e) => {
                warn!(error = %e, "Chat model unavailable, saving raw search results");
                (results, false)
            }
        };

        let message = self
            .registry
            .invoke(
                SAVE_DEFINITION,
                json!({ "word": term, "definition": definition }),
            )
            .await?;
        info!(term = %term, condensed, "Definition saved");

        Ok(DefineOutcome {
            term: term.to_string(),
            definition,
            message,
            condensed,
        })
    }
}
