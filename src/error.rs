use core::fmt;

/// BME280 driver errors, generic over the bus error type `E`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// the underlying register bus failed
    Bus(E),
    /// chip ID register never returned 0x60, holds the last byte read
    IdentityMismatch(u8),
    /// a measurement was requested before `init` succeeded
    Uninitialized,
    /// a forced measurement was requested while the sensor runs in Normal mode
    InvalidState,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
            Error::IdentityMismatch(id) => {
                write!(f, "chip id does not match expected value, got {:#04X}", id)
            }
            Error::Uninitialized => write!(f, "driver uninitialized"),
            Error::InvalidState => {
                write!(f, "sensor in normal mode, cannot force measurement")
            }
        }
    }
}
