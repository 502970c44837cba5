//! Budget alert handling
//!
//! Decides whether a budget alert requires cutting off billing and applies the
//! configured policy when that fails.

mod evaluator;
mod handler;

pub use evaluator::{should_escalate, BudgetEvaluator, Outcome, SPEND_THRESHOLD};
pub use handler::MessageHandler;
