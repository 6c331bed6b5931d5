//! Conversation orchestration.
//!
//! One `respond` call: retrieve memory for the latest user turn, rebuild the
//! system instruction around it, forward the conversation to the language
//! model, persist the produced exchange, return the assistant turn.

use std::sync::Arc;

use tracing::debug;

use crate::error::{MnemoError, Result};
use crate::llm::LanguageModel;
use crate::memory::{MemoryAdapter, MemoryStore};
use crate::message::{Message, Role};
use crate::prompt;
use crate::tool::ToolRegistry;

pub struct Agent<M: LanguageModel, S: MemoryStore> {
    model: Arc<M>,
    tools: ToolRegistry,
    memory: MemoryAdapter<S>,
}

impl<M: LanguageModel, S: MemoryStore> Agent<M, S> {
    pub fn new(model: Arc<M>, memory: MemoryAdapter<S>) -> Self {
        Self {
            model,
            tools: ToolRegistry::new(),
            memory,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    /// Run one exchange for a plain user input.
    pub async fn respond_to(&self, user_input: impl Into<String>, owner: &str) -> Result<Message> {
        self.respond(&[Message::user(user_input)], owner).await
    }

    /// Run one exchange over an existing conversation. The latest user turn
    /// drives memory retrieval; model failures propagate and skip
    /// persistence, memory failures never surface.
    pub async fn respond(&self, turns: &[Message], owner: &str) -> Result<Message> {
        let user_text = turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content.clone())
            .ok_or_else(|| MnemoError::InvalidInput("conversation has no user turn".into()))?;

        let facts = self.memory.retrieve(&user_text, owner).await;
        debug!(%owner, facts = facts.len(), "augmenting conversation with memory context");
        let instruction = prompt::build_system_instruction(&facts);

        let mut conversation = Vec::with_capacity(turns.len() + 1);
        conversation.push(Message::system(instruction));
        conversation.extend(
            turns
                .iter()
                .filter(|turn| turn.role != Role::System)
                .cloned(),
        );

        let produced = self.model.generate(&conversation, &self.tools).await?;
        let reply = produced
            .into_iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .ok_or_else(|| MnemoError::Generation("model returned no assistant turn".into()))?;

        self.memory.persist(owner, &user_text, &reply.content).await;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm::StubModel;
    use crate::memory::{InMemoryMemoryStore, MemoryRecord};

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn generate(&self, _: &[Message], _: &ToolRegistry) -> Result<Vec<Message>> {
            Err(MnemoError::Generation("provider offline".into()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl MemoryStore for FailingStore {
        async fn search(&self, _: &str, _: &str, _: usize) -> Result<Vec<MemoryRecord>> {
            Err(MnemoError::MemoryService("search unavailable".into()))
        }

        async fn add(&self, _: &[Message], _: &str) -> Result<Vec<MemoryRecord>> {
            Err(MnemoError::MemoryService("add unavailable".into()))
        }
    }

    #[tokio::test]
    async fn replies_and_persists_the_exchange() {
        let store = Arc::new(InMemoryMemoryStore::new());
        let agent = Agent::new(
            Arc::new(StubModel::new(vec!["Hello!".into()])),
            MemoryAdapter::new(store.clone()),
        );

        let reply = agent.respond_to("hi there friend", "alex").await.unwrap();

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hello!");

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "hi there friend");
        assert_eq!(records[1].text, "Hello!");
    }

    #[tokio::test]
    async fn model_failure_propagates_and_skips_persistence() {
        let store = Arc::new(InMemoryMemoryStore::new());
        let agent = Agent::new(Arc::new(FailingModel), MemoryAdapter::new(store.clone()));

        let err = agent.respond_to("hi there friend", "alex").await.unwrap_err();

        assert!(matches!(err, MnemoError::Generation(_)));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn memory_outage_degrades_but_still_replies() {
        let agent = Agent::new(
            Arc::new(StubModel::new(vec!["Still here.".into()])),
            MemoryAdapter::new(Arc::new(FailingStore)),
        );

        let reply = agent.respond_to("are you still there", "alex").await.unwrap();
        assert_eq!(reply.content, "Still here.");
    }

    #[tokio::test]
    async fn a_conversation_without_a_user_turn_is_invalid() {
        let agent = Agent::new(
            Arc::new(StubModel::new(vec![])),
            MemoryAdapter::new(Arc::new(InMemoryMemoryStore::new())),
        );

        let err = agent
            .respond(&[Message::assistant("hello?")], "alex")
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::InvalidInput(_)));
    }
}
