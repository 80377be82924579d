//! Analysis engine for deriving the pending release from commit history

pub mod version_analyzer;

pub use version_analyzer::{HistoryAnalysis, VersionAnalyzer};
