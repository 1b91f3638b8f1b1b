pub mod dictionary;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod rounds;

pub use dictionary::{TemplateDictionary, TemplateId};
pub use filter::InformativeFilter;
pub use pipeline::{Corpus, LineOutcome, Pipeline, PipelineOptions, PipelineStats};
pub use report::Summary;
pub use rounds::{Round, RoundList, RoundSegmenter};
