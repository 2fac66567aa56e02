mod summarizer;

pub use summarizer::{OpenAiConfig, OpenAiSummarizer};
