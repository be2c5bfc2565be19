pub mod gemini;
pub mod openai_compatible;

pub use gemini::GeminiNarrativeProvider;
pub use openai_compatible::OpenAiCompatibleNarrativeProvider;
