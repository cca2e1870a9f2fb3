//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kidshield_ai::DEFAULT_GEMINI_MODEL;

#[derive(Debug, Parser)]
#[command(name = "kidshield", version, about = "Message toxicity analyzer and parent assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the message analyzer (`/health`, `/analyze`).
    Analyzer {
        #[arg(long, env = "KIDSHIELD_ANALYZER_ADDR", default_value = "0.0.0.0:5000")]
        addr: SocketAddr,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Serve the assistant (`/health`, `/ai/query`).
    Assistant {
        #[arg(long, env = "KIDSHIELD_ASSISTANT_ADDR", default_value = "0.0.0.0:6000")]
        addr: SocketAddr,
        #[command(flatten)]
        assistant: AssistantArgs,
    },
    /// Analyze one message and print the verdict as JSON.
    Analyze {
        text: String,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Ask the assistant one question and print the answer as JSON.
    Ask {
        query: String,
        #[command(flatten)]
        assistant: AssistantArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Detector {
    /// Reference-sentence similarity plus toxicity classifier.
    Model,
    /// Keyword lists only; no model files needed.
    Keyword,
}

#[derive(Debug, Args)]
pub struct DetectorArgs {
    #[arg(long, env = "KIDSHIELD_DETECTOR", value_enum, default_value_t = Detector::Model)]
    pub detector: Detector,

    /// Directory with the sentence-embedding `model.onnx` and `tokenizer.json`.
    #[arg(
        long,
        env = "KIDSHIELD_EMBEDDING_MODEL",
        default_value = "models/all-MiniLM-L6-v2"
    )]
    pub embedding_model: PathBuf,

    /// Directory with the toxicity classifier `model.onnx`, `tokenizer.json`, `config.json`.
    #[arg(
        long,
        env = "KIDSHIELD_TOXICITY_MODEL",
        default_value = "models/toxic-comment-model"
    )]
    pub toxicity_model: PathBuf,

    /// Comma-separated harassment keywords (keyword detector).
    #[arg(long, env = "KIDSHIELD_HARASSMENT_WORDS", value_delimiter = ',')]
    pub harassment_words: Vec<String>,

    /// Comma-separated offensive keywords (keyword detector).
    #[arg(long, env = "KIDSHIELD_OFFENSIVE_WORDS", value_delimiter = ',')]
    pub offensive_words: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AssistantArgs {
    /// Knowledge-base JSON produced by the ingestion step.
    #[arg(
        long,
        env = "KIDSHIELD_KNOWLEDGE_BASE",
        default_value = "embeddingschild.json"
    )]
    pub knowledge_base: PathBuf,

    /// Must be the model that produced the knowledge-base vectors.
    #[arg(
        long,
        env = "KIDSHIELD_EMBEDDING_MODEL",
        default_value = "models/all-MiniLM-L6-v2"
    )]
    pub embedding_model: PathBuf,

    #[arg(long, env = "KIDSHIELD_LLM_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub llm_model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}
