//! Flash storage driver for ESP32
//!
//! Uses sequential-storage for wear-leveled key-value storage in the NVS
//! partition of the default partition table. The ESP-IDF NVS format is not
//! used; the region is owned entirely by this driver.
//!
//! Implements the `KeyValueStore` trait from `watchpost-hal`.

use core::ops::Range;

use embassy_embedded_hal::adapter::BlockingAsync;
use embedded_storage_async::nor_flash::NorFlash;
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use watchpost_hal::storage::{StorageError, StorageKey};

/// `nvs` entry of the default espflash partition table
pub const STORAGE_PARTITION_START: u32 = 0x9000;
pub const STORAGE_PARTITION_SIZE: u32 = 0x6000;

/// Flash range for the key-value partition
pub const STORAGE_RANGE: Range<u32> =
    STORAGE_PARTITION_START..(STORAGE_PARTITION_START + STORAGE_PARTITION_SIZE);

/// Largest stored item including the key byte
const DATA_BUFFER_LEN: usize = 128;

/// ESP32 flash storage implementation
pub struct EspFlashStorage<'d> {
    flash: BlockingAsync<FlashStorage<'d>>,
}

impl<'d> EspFlashStorage<'d> {
    pub fn new(flash: FLASH<'d>) -> Self {
        Self {
            flash: BlockingAsync::new(FlashStorage::new(flash)),
        }
    }
}

fn storage_error<E>(e: sequential_storage::Error<E>) -> StorageError {
    match e {
        sequential_storage::Error::Corrupted { .. } => StorageError::Corrupted,
        sequential_storage::Error::FullStorage => StorageError::Full,
        sequential_storage::Error::BufferTooSmall(_) => StorageError::BufferTooSmall,
        _ => StorageError::Flash,
    }
}

impl watchpost_hal::KeyValueStore for EspFlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let mut data_buffer = [0u8; DATA_BUFFER_LEN];

        let data = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        )
        .await
        .map_err(storage_error)?
        .ok_or(StorageError::NotFound)?;

        let len = data.len();
        if buffer.len() < len {
            return Err(StorageError::BufferTooSmall);
        }
        buffer[..len].copy_from_slice(data);
        Ok(len)
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut data_buffer = [0u8; DATA_BUFFER_LEN];

        map::store_item(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
            &data,
        )
        .await
        .map_err(storage_error)
    }

    async fn erase_all(&mut self) -> Result<(), StorageError> {
        self.flash
            .erase(STORAGE_RANGE.start, STORAGE_RANGE.end)
            .await
            .map_err(|_| StorageError::Flash)
    }
}
