// Page model
pub mod clean;
pub mod dom;

// Extraction core
pub mod assemble;
pub mod harvest;
pub mod locate;

// Runs
pub mod batch;
pub mod fetch;
pub mod listing;
pub mod retry;

// Data tools
pub mod audit;
pub mod index;
