//! Persistent storage abstractions
//!
//! Provides a trait for small key-value records that survive a reboot.
//! Values are opaque bytes; the credential records are plain UTF-8 text.

/// Storage keys for persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Station SSID (display: home network, sensor: display access point)
    WifiSsid = 0,
    /// Station password
    WifiPassword = 1,
    /// Permanent arm/disarm PIN
    ArmPin = 2,
    /// Touch panel calibration blob (postcard)
    TouchCalibration = 3,
    /// Provisioning access point password (display only)
    ApPassword = 4,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::WifiSsid),
            1 => Some(StorageKey::WifiPassword),
            2 => Some(StorageKey::ArmPin),
            3 => Some(StorageKey::TouchCalibration),
            4 => Some(StorageKey::ApPassword),
            _ => None,
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Underlying flash operation failed
    Flash,
    /// Key not found
    NotFound,
    /// Buffer too small for the stored value
    BufferTooSmall,
    /// Partition content is unreadable
    Corrupted,
    /// Storage is full
    Full,
}

/// Key-value storage trait
///
/// Implementations are expected to be wear-leveled and to keep the previous
/// value readable if a write is interrupted.
pub trait KeyValueStore {
    /// Read a value by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, StorageError>>;

    /// Write a value by key, replacing any previous value
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), StorageError>>;

    /// Erase every record
    ///
    /// Used once at boot when the partition cannot be read at all.
    fn erase_all(&mut self) -> impl core::future::Future<Output = Result<(), StorageError>>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_byte_roundtrip() {
        for key in [
            StorageKey::WifiSsid,
            StorageKey::WifiPassword,
            StorageKey::ArmPin,
            StorageKey::TouchCalibration,
            StorageKey::ApPassword,
        ] {
            assert_eq!(StorageKey::from_u8(key.as_u8()), Some(key));
        }
        assert_eq!(StorageKey::from_u8(5), None);
    }
}
