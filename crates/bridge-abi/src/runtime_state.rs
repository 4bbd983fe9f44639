//! Process-wide singleton wiring the engine to the software host.
//!
//! `C_GetFunctionList` can be called before `C_Initialize`, and several
//! Cryptoki entry points (`C_GetSlotList`, `C_GetMechanismList`, ...) are
//! legal pre-initialization too, so the [`Runtime`] and [`SoftwareHost`]
//! are built lazily on first touch rather than inside `C_Initialize`
//! itself; `Runtime::initialize`/`finalize` still gate the calls that the
//! Cryptoki state machine requires to be gated.

use std::sync::OnceLock;

use bridge_core::config::Config;
use bridge_core::mutex_provider::MutexProvider;
use bridge_core::Runtime;

use crate::host_impl::SoftwareHost;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static HOST: OnceLock<SoftwareHost> = OnceLock::new();

pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        let host = host();
        Runtime::new(Config::load(host), MutexProvider::Native)
    })
}

pub fn host() -> &'static SoftwareHost {
    HOST.get_or_init(SoftwareHost::new)
}
