//! # Symbol Resolution
//!
//! The process-scoped indexes that turn raw, language-level names into
//! qualified names: a symbol registry, an import processor, an inheritance
//! tracker, intra-procedural type inference, and the call-resolution
//! strategy ladder that ties them together.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`registry`] | `SymbolRegistry`: exact/simple-name/prefix lookup over every known QN |
//! | [`imports`] | `ImportProcessor`: per-module `local_name → resolved_qn` mapping |
//! | [`inheritance`] | `InheritanceTracker`: `class_qn → parents` and MRO |
//! | [`type_inference`] | Best-effort `local_var_types` for one function body |
//! | [`call_resolver`] | The 8-strategy ladder resolving a raw call-site string |

pub mod call_resolver;
pub mod imports;
pub mod inheritance;
pub mod registry;
pub mod type_inference;

pub use call_resolver::{resolve, Resolved, ResolverContext};
pub use imports::{ImportProcessor, ModuleImports};
pub use inheritance::InheritanceTracker;
pub use registry::{Kind, SymbolRegistry};
pub use type_inference::{extract_return_type, infer_locals, LocalTypes};
