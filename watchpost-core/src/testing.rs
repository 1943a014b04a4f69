//! Host-side fakes for the HAL traits

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use watchpost_hal::{DatagramSocket, KeyValueStore, NetError, StorageError, StorageKey};
use watchpost_protocol::Endpoint;

/// In-memory key-value store with injectable failures
#[derive(Default)]
pub struct MemStore {
    slots: [Option<Vec<u8>>; 5],
    /// Error returned by every read until cleared by `erase_all`
    pub read_error: Option<StorageError>,
    /// Error returned by every write
    pub write_error: Option<StorageError>,
    pub erase_count: usize,
}

impl MemStore {
    pub fn get(&self, key: StorageKey) -> Option<&[u8]> {
        self.slots[key.as_u8() as usize].as_deref()
    }

    pub fn put(&mut self, key: StorageKey, value: &[u8]) {
        self.slots[key.as_u8() as usize] = Some(value.to_vec());
    }
}

impl KeyValueStore for MemStore {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        if let Some(err) = self.read_error {
            return Err(err);
        }
        let value = self.slots[key.as_u8() as usize]
            .as_ref()
            .ok_or(StorageError::NotFound)?;
        if buffer.len() < value.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buffer[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        if let Some(err) = self.write_error {
            return Err(err);
        }
        self.slots[key.as_u8() as usize] = Some(data.to_vec());
        Ok(())
    }

    async fn erase_all(&mut self) -> Result<(), StorageError> {
        self.erase_count += 1;
        self.slots = Default::default();
        self.read_error = None;
        Ok(())
    }
}

/// Socket that records sends and replays queued datagrams
#[derive(Default)]
pub struct FakeSocket {
    pub sent: Vec<(Endpoint, Vec<u8>)>,
    pub inbox: VecDeque<(Endpoint, Vec<u8>)>,
    pub send_error: Option<NetError>,
}

impl FakeSocket {
    pub fn sent_to(&self, dest: Endpoint) -> usize {
        self.sent.iter().filter(|(ep, _)| *ep == dest).count()
    }

    pub fn deliver(&mut self, from: Endpoint, payload: &[u8]) {
        self.inbox.push_back((from, payload.to_vec()));
    }
}

impl DatagramSocket for FakeSocket {
    fn try_send_to(&mut self, payload: &[u8], dest: Endpoint) -> Result<(), NetError> {
        if let Some(err) = self.send_error {
            return Err(err);
        }
        self.sent.push((dest, payload.to_vec()));
        Ok(())
    }

    fn try_recv_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError> {
        let Some((from, payload)) = self.inbox.pop_front() else {
            return Ok(None);
        };
        if payload.len() > buffer.len() {
            return Err(NetError::Truncated);
        }
        buffer[..payload.len()].copy_from_slice(&payload);
        Ok(Some((payload.len(), from)))
    }
}

/// Delay that returns immediately and records every request
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_ns: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.push(ns);
    }
}
