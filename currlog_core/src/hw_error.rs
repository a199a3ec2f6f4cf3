//! Maps `Box<dyn Error>` from trait boundaries to typed `LoggerError`.
//!
//! The traits in `currlog_traits` use `Box<dyn Error + Send + Sync>` so any
//! bus driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `currlog_hardware::HwError` downcasting.

use crate::error::LoggerError;

/// Map a transport-boundary error to a typed `LoggerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> LoggerError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<currlog_hardware::error::HwError>() {
            return match hw {
                currlog_hardware::error::HwError::Timeout => LoggerError::TransportTimeout,
                other => LoggerError::Transport(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        LoggerError::TransportTimeout
    } else {
        LoggerError::Transport(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_fall_back_to_message() {
        let e: Box<dyn std::error::Error + Send + Sync> = "bus nack".into();
        assert_eq!(
            map_transport_error(e.as_ref()),
            LoggerError::Transport("bus nack".into())
        );
    }

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "read Timeout on bus".into();
        assert_eq!(map_transport_error(e.as_ref()), LoggerError::TransportTimeout);
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_are_downcast() {
        use currlog_hardware::error::HwError;
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::Timeout);
        assert_eq!(map_transport_error(e.as_ref()), LoggerError::TransportTimeout);
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::I2c("nack".into()));
        assert_eq!(
            map_transport_error(e.as_ref()),
            LoggerError::Transport("i2c error: nack".into())
        );
    }
}
