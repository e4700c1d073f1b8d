//! Wo / energy / LSP quantisers (§4.4/§4.5).

pub mod lsp_quant;
pub mod wo_energy;

pub use lsp_quant::*;
pub use wo_energy::*;
