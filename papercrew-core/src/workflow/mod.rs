//! Sequential multi-agent workflow
//!
//! - **Task**: one stage's instructions and the role that executes it
//! - **Agent**: runs a task against the language model, with web search
//! - **Crew**: runs tasks in order, handing earlier outputs forward
//!
//! # Example
//!
//! ```rust,ignore
//! use papercrew_core::workflow::{AgentExecutor, Crew, TaskKind, TaskSpec};
//!
//! let crew = Crew::builder()
//!     .name("paper-analysis")
//!     .task(TaskSpec::new(TaskKind::Explain, description, expected, explainer))
//!     .build();
//!
//! let (output, trace) = crew.kickoff(&executor).await?;
//! ```

mod agent;
mod crew;
mod execution;
mod task;

pub use agent::{AgentConfig, AgentExecutor, TaskExecutor};
pub use crew::{Crew, CrewBuilder};
pub use execution::{ExecutionTrace, TaskTrace, WorkflowError, WorkflowResult};
pub use task::{
    EXPLAIN_EXPECTED_OUTPUT, GAP_EXPECTED_OUTPUT, LITERATURE_EXPECTED_OUTPUT, TaskKind, TaskOutput,
    TaskSpec, explain_description, gap_description, literature_description,
};
