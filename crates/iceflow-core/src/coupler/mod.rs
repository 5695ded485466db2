//! Runtime-composable boundary-forcing chains.
//!
//! Each physical quantity has one component family: a trait whose provided
//! methods implement the modifier pass-through behavior, terminal models
//! that produce data, and modifiers that wrap exactly one inner component.
//! Chains are assembled by name through a per-family factory; diagnostics
//! and persisted state are aggregated bottom-up by the outermost
//! component.

pub mod diagnostics;
pub mod factory;
pub mod interface;
pub mod ocean;
pub mod surface;

pub use diagnostics::{
    Diagnostic, DiagnosticList, FieldDiagnostic, FieldDiagnosticList, TsDiagnostic,
    TsDiagnosticList,
};
pub use factory::ComponentFactory;
