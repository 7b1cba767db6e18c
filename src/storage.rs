/// Reading annotation sources and writing the combined document.
pub mod annotations;
pub use annotations::{ReadError, WriteError, read_subtree, write_combined};

/// Assembly of the dataset archive.
pub mod archive;
pub use archive::{ArchiveLayout, Assembler, AssemblyError, AssemblyReport};

/// Discovery of test result files.
pub mod test_results;
pub use test_results::{PatternError, TestResultFile, TestResultMatcher};
