//! Memory-augmented multi-tool agent runtime.
//!
//! The crate wires together:
//! - A language model abstraction (`LanguageModel`) with a Gemini adapter.
//! - A simple tool interface (`Tool` and `ToolRegistry`) and four
//!   deterministic tools (math, dates, text statistics, weather).
//! - A long-term memory boundary (`MemoryStore`) with a mem0 REST adapter
//!   and the retrieval/persistence policy (`MemoryAdapter`).
//! - An `Agent` that injects retrieved memory into the system instruction,
//!   forwards the conversation to the model, and persists the exchange.

mod agent;
pub mod config;
mod error;
mod llm;
mod memory;
mod message;
mod prompt;
mod tool;
pub mod tools;

pub use agent::Agent;
pub use config::AppConfig;
pub use error::{MnemoError, Result};
pub use llm::{GeminiClient, GenerationSettings, LanguageModel, StubModel};
pub use memory::{
    InMemoryMemoryStore, Mem0Client, MemoryAdapter, MemoryRecord, MemoryStore, MIN_QUERY_TOKENS,
    RETRIEVAL_LIMIT,
};
pub use message::{Message, Role};
pub use prompt::{build_system_instruction, MEMORY_HEADER, POLICY_DISCLAIMER};
pub use tool::{Tool, ToolDescription, ToolOutput, ToolRegistry};
pub use tools::{core_toolkit, WeatherClient, WeatherTool};
