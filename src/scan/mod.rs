pub mod aggregator;
pub mod assembler;
pub mod cache;
pub mod classifier;
pub mod dispatcher;
pub mod scanner;

pub use aggregator::Aggregator;
pub use assembler::ReportAssembler;
pub use cache::{CacheStats, VerdictCache};
pub use classifier::RiskClassifier;
pub use dispatcher::Dispatcher;
pub use scanner::Scanner;
