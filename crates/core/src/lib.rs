mod config;
mod dtm;
mod error;
mod generator;
mod inference;
mod model;
mod phi;
mod similarity;
mod vocabulary;

pub use config::{
    default_topic_labels, InferenceConfig, SimConfig, DEFAULT_ALPHA, DEFAULT_DOCS,
    DEFAULT_DOC_LENGTH, DEFAULT_HIGH_SHARE, DEFAULT_INFERENCE_ITERATIONS, DEFAULT_INFERENCE_SEED,
    DEFAULT_TOPICS, DEFAULT_VOCAB_SIZE,
};
pub use dtm::TermDocumentMatrix;
pub use error::{Result, SimError};
pub use generator::{draw_topic_proportions, DocumentGenerator, GeneratedDocument, PROGRESS_INTERVAL};
pub use inference::{GibbsLda, TopicFit, TopicInference};
pub use model::{generation_rng, GenerativeModel};
pub use phi::TopicWordMatrix;
pub use similarity::{cosine_similarity, mean_similarity, score_documents};
pub use vocabulary::Vocabulary;
