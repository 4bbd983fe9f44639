//! C ABI boundary for the session/object engine in `bridge-core`.
//!
//! Every exported `C_*` symbol decodes raw Cryptoki pointers/handles into
//! the engine's safe types, calls straight into `bridge-core`, and maps
//! the `Result` back to a `CK_RV` via `macros::cryptoki_fn!`. This crate
//! holds no state of its own beyond the process-wide `Runtime`/host
//! singletons in `runtime_state`; everything else lives in `bridge-core`.

pub mod ck_types;
mod macros;

mod crypto_abi;
mod function_list;
mod host_impl;
mod object_abi;
mod runtime_state;
mod session_abi;
mod slot_abi;
mod unsupported;

pub use function_list::{C_GetFunctionList, FUNCTION_LIST};
