//! Per-mode bit-layout packing (§6). Each submodule owns the exact field
//! order for its mode family; the codec dispatch layer (`codec.rs`) only
//! ever constructs and reads these frame structs.

pub mod classical;
pub mod newamp1_mode;
pub mod newamp2_mode;
