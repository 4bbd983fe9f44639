//! Helper macro for C ABI entry-point generation.

/// Generate a `#[unsafe(no_mangle)] pub unsafe extern "C" fn` that returns
/// `CK_RV`. The body runs inside a closure so `?` on a `BridgeResult`
/// short-circuits straight to the matching `CK_RV`; the whole body is
/// still wrapped in `unsafe` since every Cryptoki entry point dereferences
/// caller-supplied pointers.
///
/// ```ignore
/// cryptoki_fn! {
///     fn C_Example(session: CK_SESSION_HANDLE) {
///         // body returns Result<(), bridge_core::BridgeError>
///         Ok(())
///     }
/// }
/// ```
macro_rules! cryptoki_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> crate::ck_types::CK_RV {
            let outcome: Result<(), bridge_core::BridgeError> = (|| -> Result<(), bridge_core::BridgeError> {
                unsafe { $body }
            })();
            match outcome {
                Ok(()) => bridge_core::constants::CKR_OK,
                Err(err) => err.rv(),
            }
        }
    };
}

pub(crate) use cryptoki_fn;
