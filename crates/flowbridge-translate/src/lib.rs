//! FlowBridge translation engine.
//!
//! Converts processes between the graph platform and the sequential platform:
//!
//! - **[`linearize`]** -- Node graph to ordered module chain (breadth-first
//!   from the start step, unreachable steps appended).
//! - **[`expand`]** -- Module chain to node graph with one `main` connection
//!   per adjacent pair.
//! - **[`engine`]** -- Whole-process conversion with warnings, batch support
//!   and the [`Translate`] trait.
//!
//! Every entry point is `async` so it composes with the platform clients, but
//! none of them awaits anything internally.

pub mod engine;
pub mod expand;
pub mod linearize;

pub use engine::{GraphToSequence, SequenceToGraph, Translate, TranslationEngine};
pub use expand::{Expanded, Expander};
pub use linearize::{Linearized, Linearizer};
