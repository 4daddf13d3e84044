pub mod evaluator;
pub mod report;
pub mod scanner;
