//! Trade-signal resolution and execution.
//!
//! Turns a validated alert into a broker order: the symbol is matched
//! against the broker's live universe, open positions are fetched fresh for
//! closes, and the broker's mixed reply formats collapse into a single
//! `ExecutionOutcome`.

pub mod executor;
pub mod interpreter;
pub mod locator;
pub mod market;
pub mod orchestrator;
pub mod resolver;

pub use executor::OrderExecutor;
pub use interpreter::{Interpretation, ResponseInterpreter};
pub use locator::PositionLocator;
pub use orchestrator::{select_robot, SignalOrchestrator, SignalReport};
pub use resolver::{normalize, SymbolResolver};
