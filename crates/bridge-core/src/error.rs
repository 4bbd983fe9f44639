//! Error kinds for the session/object engine.
//!
//! Each entry point returns exactly one [`BridgeError`]; `bridge-abi` maps
//! it to a raw `CK_RV` at the boundary via [`BridgeError::rv`].

use crate::constants::*;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("library not initialized")]
    NotInitialized,
    #[error("library already initialized")]
    AlreadyInitialized,
    #[error("bad arguments")]
    ArgumentsBad,
    #[error("slot id invalid")]
    SlotIdInvalid,
    #[error("token not present")]
    TokenNotPresent,
    #[error("session handle invalid")]
    SessionHandleInvalid,
    #[error("parallel sessions not supported")]
    ParallelNotSupported,
    #[error("object handle invalid")]
    ObjectHandleInvalid,
    #[error("key handle invalid")]
    KeyHandleInvalid,
    #[error("key type inconsistent")]
    KeyTypeInconsistent,
    #[error("key function not permitted")]
    KeyFunctionNotPermitted,
    #[error("mechanism invalid")]
    MechanismInvalid,
    #[error("mechanism parameter invalid")]
    MechanismParamInvalid,
    #[error("data length out of range")]
    DataLenRange,
    #[error("operation already active")]
    OperationActive,
    #[error("operation not initialized")]
    OperationNotInitialized,
    #[error("buffer too small")]
    BufferTooSmall,
    #[error("attribute type invalid")]
    AttributeTypeInvalid,
    #[error("signature invalid")]
    SignatureInvalid,
    #[error("general error")]
    GeneralError,
    #[error("function failed")]
    FunctionFailed,
    #[error("function not supported")]
    FunctionNotSupported,
    #[error("user not logged in")]
    UserNotLoggedIn,
    #[error("pin incorrect")]
    PinIncorrect,
    #[error("token removed")]
    DeviceRemoved,
    #[error("no slot event available")]
    NoEvent,
}

impl BridgeError {
    /// The `CK_RV` numeric code a `bridge-abi` entry point should return.
    #[must_use]
    pub const fn rv(self) -> u64 {
        match self {
            Self::NotInitialized => CKR_CRYPTOKI_NOT_INITIALIZED,
            Self::AlreadyInitialized => CKR_CRYPTOKI_ALREADY_INITIALIZED,
            Self::ArgumentsBad => CKR_ARGUMENTS_BAD,
            Self::SlotIdInvalid => CKR_SLOT_ID_INVALID,
            Self::TokenNotPresent => CKR_TOKEN_NOT_PRESENT,
            Self::SessionHandleInvalid => CKR_SESSION_HANDLE_INVALID,
            Self::ParallelNotSupported => CKR_SESSION_PARALLEL_NOT_SUPPORTED,
            Self::ObjectHandleInvalid => CKR_OBJECT_HANDLE_INVALID,
            Self::KeyHandleInvalid => CKR_KEY_HANDLE_INVALID,
            Self::KeyTypeInconsistent => CKR_KEY_TYPE_INCONSISTENT,
            Self::KeyFunctionNotPermitted => CKR_KEY_FUNCTION_NOT_PERMITTED,
            Self::MechanismInvalid => CKR_MECHANISM_INVALID,
            Self::MechanismParamInvalid => CKR_MECHANISM_PARAM_INVALID,
            Self::DataLenRange => CKR_DATA_LEN_RANGE,
            Self::OperationActive => CKR_OPERATION_ACTIVE,
            Self::OperationNotInitialized => CKR_OPERATION_NOT_INITIALIZED,
            Self::BufferTooSmall => CKR_BUFFER_TOO_SMALL,
            Self::AttributeTypeInvalid => CKR_ATTRIBUTE_TYPE_INVALID,
            Self::SignatureInvalid => CKR_SIGNATURE_INVALID,
            Self::GeneralError => CKR_GENERAL_ERROR,
            Self::FunctionFailed => CKR_FUNCTION_FAILED,
            Self::FunctionNotSupported => CKR_FUNCTION_NOT_SUPPORTED,
            Self::UserNotLoggedIn => CKR_USER_NOT_LOGGED_IN,
            Self::PinIncorrect => CKR_PIN_INCORRECT,
            Self::DeviceRemoved => CKR_DEVICE_REMOVED,
            Self::NoEvent => CKR_NO_EVENT,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rv_mapping_is_stable() {
        assert_eq!(BridgeError::OperationActive.rv(), CKR_OPERATION_ACTIVE);
        assert_eq!(BridgeError::BufferTooSmall.rv(), CKR_BUFFER_TOO_SMALL);
        assert_eq!(
            BridgeError::SignatureInvalid.rv(),
            CKR_SIGNATURE_INVALID
        );
    }
}
