//! # Driver Error Handling
//!
//! This module defines the `NetdevError` enum returned by every operation of
//! the network-device contract, and the `HalError` enum reported by the
//! radio library capability.

use crate::constants::{
    EBUSY, EFAULT, EINVAL, EIO, ENOBUFS, ENODATA, ENODEV, ENOTSUP, EOVERFLOW, EPERM,
};
use thiserror::Error;

/// Status codes reported by the radio library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// A parameter was out of range for the radio
    #[error("invalid parameter")]
    InvalidParameter,

    /// The radio is in a state where the call is not allowed
    #[error("invalid state")]
    InvalidState,

    /// The call is not available in the current configuration
    #[error("invalid call")]
    InvalidCall,

    /// The radio library is suspended
    #[error("suspended")]
    Suspended,

    /// The radio is busy with another operation
    #[error("radio busy")]
    Busy,

    /// Any other library failure
    #[error("radio failure: {0}")]
    Failed(String),
}

impl HalError {
    /// Human readable description of a radio library status code.
    pub fn describe(&self) -> String {
        match self {
            HalError::InvalidParameter => "RAIL_STATUS_INVALID_PARAMETER".to_string(),
            HalError::InvalidState => "RAIL_STATUS_INVALID_STATE".to_string(),
            HalError::InvalidCall => "RAIL_STATUS_INVALID_CALL".to_string(),
            HalError::Suspended => "RAIL_STATUS_SUSPENDED".to_string(),
            HalError::Busy => "RAIL_STATUS_BUSY".to_string(),
            HalError::Failed(msg) => format!("RAIL_STATUS_FAILED ({msg})"),
        }
    }
}

/// Errors returned by the network-device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetdevError {
    /// Option value or argument out of range
    #[error("invalid parameter")]
    InvalidParameter,

    /// Operation not allowed in the current transceiver state
    #[error("operation not permitted")]
    NotPermitted,

    /// Option or operation not handled by this device
    #[error("not supported")]
    NotSupported,

    /// Outbound frame larger than the radio accepts
    #[error("frame too large: {len} bytes, maximum {max}")]
    Overflow { len: usize, max: usize },

    /// Destination buffer too small for the received payload
    #[error("no buffer space: need {needed} bytes, have {available}")]
    NoBufferSpace { needed: usize, available: usize },

    /// The radio library rejected a configuration call
    #[error("radio fault")]
    Fault,

    /// The radio library failed an I/O operation
    #[error("I/O error: {0}")]
    Io(String),

    /// No device behind the handle
    #[error("no device")]
    NoDevice,

    /// A transmission is already in flight
    #[error("device busy")]
    Busy,

    /// No received packet is pending
    #[error("no pending data")]
    NoData,

    /// Bring-up of the radio failed; the device must not be used
    #[error("initialization failed: {0}")]
    Init(HalError),
}

impl NetdevError {
    /// Negative errno value for C-style callers of the netdev contract.
    pub fn errno(&self) -> i32 {
        -match self {
            NetdevError::InvalidParameter => EINVAL,
            NetdevError::NotPermitted => EPERM,
            NetdevError::NotSupported => ENOTSUP,
            NetdevError::Overflow { .. } => EOVERFLOW,
            NetdevError::NoBufferSpace { .. } => ENOBUFS,
            NetdevError::Fault => EFAULT,
            NetdevError::Io(_) => EIO,
            NetdevError::NoDevice => ENODEV,
            NetdevError::Busy => EBUSY,
            NetdevError::NoData => ENODATA,
            NetdevError::Init(_) => EIO,
        }
    }
}

impl From<HalError> for NetdevError {
    fn from(err: HalError) -> Self {
        match err {
            HalError::InvalidParameter => NetdevError::InvalidParameter,
            HalError::InvalidState => NetdevError::NotPermitted,
            HalError::InvalidCall => NetdevError::NotSupported,
            HalError::Suspended | HalError::Busy => NetdevError::Busy,
            HalError::Failed(msg) => NetdevError::Io(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(NetdevError::InvalidParameter.errno(), -22);
        assert_eq!(NetdevError::NotPermitted.errno(), -1);
        assert_eq!(NetdevError::Overflow { len: 200, max: 125 }.errno(), -75);
        assert_eq!(
            NetdevError::NoBufferSpace {
                needed: 19,
                available: 4
            }
            .errno(),
            -105
        );
        assert_eq!(NetdevError::Init(HalError::Busy).errno(), -5);
    }

    #[test]
    fn test_hal_error_conversion() {
        assert_eq!(
            NetdevError::from(HalError::InvalidParameter),
            NetdevError::InvalidParameter
        );
        assert_eq!(NetdevError::from(HalError::InvalidState), NetdevError::NotPermitted);
        assert_eq!(NetdevError::from(HalError::InvalidCall), NetdevError::NotSupported);
        assert_eq!(NetdevError::from(HalError::Suspended), NetdevError::Busy);
        assert!(matches!(
            NetdevError::from(HalError::Failed("pa".into())),
            NetdevError::Io(msg) if msg == "pa"
        ));
    }

    #[test]
    fn test_hal_error_describe() {
        assert_eq!(HalError::InvalidState.describe(), "RAIL_STATUS_INVALID_STATE");
        assert!(HalError::Failed("x".into()).describe().contains('x'));
    }
}
