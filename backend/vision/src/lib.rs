//! Vision model providers.
//!
//! `openai_compat` talks to any OpenAI-style chat-completions endpoint
//! (DashScope compatible mode by default); `mock` is a scripted stand-in
//! for tests and offline runs.

pub mod providers;

pub use providers::mock::{RecordedCall, Reply, ScriptedVisionModel};
pub use providers::openai_compat::{OpenAiCompatProvider, DASHSCOPE_BASE_URL};
