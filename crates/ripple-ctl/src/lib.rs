//! # Ripple CTL
//!
//! Computation Tree Logic over explicit [`ripple_core::Graph`]s.
//!
//! Formulas are evaluated with the standard backward fixpoint algorithms:
//! each operator maps a formula to the set of states satisfying it, and a
//! property holds for a model when every initial state is in that set.
//!
//! ```
//! use ripple_core::Graph;
//! use ripple_ctl::{CtlChecker, Formula};
//!
//! let mut graph = Graph::new();
//! let idle = graph.add_state("idle", ["free"]);
//! let busy = graph.add_state("busy", Vec::<String>::new());
//! graph.add_edge(idle, busy);
//! graph.add_edge(busy, idle);
//! graph.mark_initial(idle);
//!
//! let checker = CtlChecker::new(&graph);
//! assert!(checker.holds_initially(&Formula::atom("free").ef().ag()));
//! ```

pub mod checker;
pub mod eval;
pub mod formula;
pub mod parser;

pub use checker::{CheckResult, CtlChecker};
pub use eval::{pre_a, pre_e, EvalStats, Evaluator, FixpointOp, FixpointTrace};
pub use formula::Formula;
pub use parser::{parse, ParseError};
