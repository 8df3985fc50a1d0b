//! Parsing of agent output
//!
//! Agents answer in the ReAct format (`Thought` / `Action` / `Action Input` /
//! `Final Answer`). [`ReActParser`] splits a raw model response into steps so
//! the executor can decide whether to run a tool or stop.

mod parser;
mod react;

pub use parser::{OutputParser, ParseError, ParseResult};
pub use react::{ReActParser, ReActStep, ReActStepType};
