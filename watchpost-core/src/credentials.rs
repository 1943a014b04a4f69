//! Persistent network credentials
//!
//! Each value is stored as plain UTF-8 under its own [`StorageKey`]. On the
//! first boot the keys do not exist yet and are seeded with placeholder
//! values so later reads always find something.

use heapless::String;
use watchpost_hal::{KeyValueStore, StorageError, StorageKey};

use crate::auth::{Secret, MAX_SECRET_LEN};

/// Value written to unset fields on first boot
pub const PLACEHOLDER: &str = "generic";

pub const MAX_SSID_LEN: usize = 32;
pub const MAX_PASSWORD_LEN: usize = 64;
/// WPA2 passphrase bounds for the provisioning access point
pub const MIN_AP_PASSWORD_LEN: usize = 8;
pub const MAX_AP_PASSWORD_LEN: usize = 63;

pub type Ssid = String<MAX_SSID_LEN>;
pub type Password = String<MAX_PASSWORD_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CredentialError {
    Storage(StorageError),
    /// Value longer than the field allows
    TooLong,
    /// Required value is empty
    Empty,
    /// Value shorter than the field allows
    TooShort,
}

impl From<StorageError> for CredentialError {
    fn from(e: StorageError) -> Self {
        CredentialError::Storage(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: Ssid,
    pub password: Password,
    pub arm_pin: Secret,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str, arm_pin: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            ssid: ssid_from(ssid)?,
            password: bounded(password)?,
            arm_pin: pin_from(arm_pin)?,
        })
    }

    /// Station SSID has not been provisioned yet
    pub fn is_placeholder(&self) -> bool {
        self.ssid.as_str() == PLACEHOLDER
    }
}

fn bounded<const N: usize>(text: &str) -> Result<String<N>, CredentialError> {
    String::try_from(text).map_err(|_| CredentialError::TooLong)
}

fn ssid_from(text: &str) -> Result<Ssid, CredentialError> {
    if text.is_empty() {
        return Err(CredentialError::Empty);
    }
    bounded(text)
}

/// Validate a WPA2 passphrase for the provisioning access point
pub fn ap_password_from(text: &str) -> Result<Password, CredentialError> {
    if text.len() < MIN_AP_PASSWORD_LEN {
        return Err(CredentialError::TooShort);
    }
    if text.len() > MAX_AP_PASSWORD_LEN {
        return Err(CredentialError::TooLong);
    }
    bounded(text)
}

fn pin_from(text: &str) -> Result<Secret, CredentialError> {
    if text.is_empty() {
        return Err(CredentialError::Empty);
    }
    bounded::<MAX_SECRET_LEN>(text)
}

/// What happened while loading credentials at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadReport {
    /// Fields that were missing or unreadable and got the default written
    pub seeded: u8,
    /// The partition was erased after a corruption error
    pub reformatted: bool,
    /// Storage could not be used; in-memory defaults are in effect
    pub fallback: Option<CredentialError>,
}

pub struct CredentialStore<S> {
    store: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load credentials, seeding missing fields from `defaults`
    ///
    /// A corrupted partition is erased once and loading retried. Any other
    /// storage failure leaves the node running on `defaults` for this
    /// session.
    pub async fn load(&mut self, defaults: &Credentials) -> (Credentials, LoadReport) {
        let mut report = LoadReport::default();

        let first = self.load_fields(defaults, &mut report).await;
        let result = match first {
            Err(CredentialError::Storage(StorageError::Corrupted)) => {
                report.reformatted = true;
                match self.store.erase_all().await {
                    Ok(()) => self.load_fields(defaults, &mut report).await,
                    Err(e) => Err(e.into()),
                }
            }
            other => other,
        };

        match result {
            Ok(creds) => (creds, report),
            Err(e) => {
                report.fallback = Some(e);
                (defaults.clone(), report)
            }
        }
    }

    async fn load_fields(
        &mut self,
        defaults: &Credentials,
        report: &mut LoadReport,
    ) -> Result<Credentials, CredentialError> {
        let mut ssid = self
            .read_field::<MAX_SSID_LEN>(StorageKey::WifiSsid, &defaults.ssid, report)
            .await?;
        if ssid.is_empty() {
            self.store
                .write(StorageKey::WifiSsid, defaults.ssid.as_bytes())
                .await?;
            report.seeded += 1;
            ssid = defaults.ssid.clone();
        }
        let password = self
            .read_field::<MAX_PASSWORD_LEN>(StorageKey::WifiPassword, &defaults.password, report)
            .await?;
        let arm_pin = self
            .read_field::<MAX_SECRET_LEN>(StorageKey::ArmPin, &defaults.arm_pin, report)
            .await?;
        Ok(Credentials {
            ssid,
            password,
            arm_pin,
        })
    }

    async fn read_field<const N: usize>(
        &mut self,
        key: StorageKey,
        default: &str,
        report: &mut LoadReport,
    ) -> Result<String<N>, CredentialError> {
        let mut buf = [0u8; N];
        let stored = match self.store.read(key, &mut buf).await {
            // An empty record is a stored value (open network password)
            Ok(len) => core::str::from_utf8(&buf[..len])
                .ok()
                .and_then(|text| String::try_from(text).ok()),
            // Longer than the field allows; replace it
            Err(StorageError::BufferTooSmall) => None,
            Err(StorageError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        match stored {
            Some(value) => Ok(value),
            None => {
                self.store.write(key, default.as_bytes()).await?;
                report.seeded += 1;
                bounded(default)
            }
        }
    }

    /// Overwrite the station SSID and password
    pub async fn save_wifi(&mut self, ssid: &str, password: &str) -> Result<(), CredentialError> {
        ssid_from(ssid)?;
        bounded::<MAX_PASSWORD_LEN>(password)?;
        self.store.write(StorageKey::WifiSsid, ssid.as_bytes()).await?;
        self.store
            .write(StorageKey::WifiPassword, password.as_bytes())
            .await?;
        Ok(())
    }

    /// Overwrite only the station password
    pub async fn save_password(&mut self, password: &str) -> Result<(), CredentialError> {
        bounded::<MAX_PASSWORD_LEN>(password)?;
        self.store
            .write(StorageKey::WifiPassword, password.as_bytes())
            .await?;
        Ok(())
    }

    /// Overwrite the permanent arm PIN
    pub async fn save_pin(&mut self, pin: &str) -> Result<(), CredentialError> {
        pin_from(pin)?;
        self.store.write(StorageKey::ArmPin, pin.as_bytes()).await?;
        Ok(())
    }

    /// Stored access point password, or `default` when none was saved
    ///
    /// Unlike the station fields this record is not seeded: the compiled-in
    /// password stays authoritative until someone changes it.
    pub async fn load_ap_password(&mut self, default: &str) -> Result<Password, CredentialError> {
        let mut buf = [0u8; MAX_PASSWORD_LEN];
        match self.store.read(StorageKey::ApPassword, &mut buf).await {
            Ok(len) => match core::str::from_utf8(&buf[..len]).map(ap_password_from) {
                Ok(Ok(password)) => Ok(password),
                _ => bounded(default),
            },
            Err(StorageError::NotFound) | Err(StorageError::BufferTooSmall) => bounded(default),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the access point password
    pub async fn save_ap_password(&mut self, password: &str) -> Result<(), CredentialError> {
        ap_password_from(password)?;
        self.store
            .write(StorageKey::ApPassword, password.as_bytes())
            .await?;
        Ok(())
    }

    /// Underlying store, for records this type does not manage
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemStore;
    use embassy_futures::block_on;

    fn defaults() -> Credentials {
        Credentials::new(PLACEHOLDER, PLACEHOLDER, "23012").unwrap()
    }

    #[test]
    fn test_first_boot_seeds_placeholders() {
        let mut store = CredentialStore::new(MemStore::default());
        let (creds, report) = block_on(store.load(&defaults()));

        assert!(creds.is_placeholder());
        assert_eq!(creds.password.as_str(), "generic");
        assert_eq!(creds.arm_pin.as_str(), "23012");
        assert_eq!(report.seeded, 3);
        assert_eq!(report.fallback, None);
        assert_eq!(store.store_mut().get(StorageKey::WifiSsid), Some(&b"generic"[..]));
    }

    #[test]
    fn test_credentials_survive_reboot() {
        let mut store = CredentialStore::new(MemStore::default());
        block_on(store.load(&defaults()));
        block_on(store.save_wifi("TestNet", "secret123")).unwrap();

        // Next bring-up reads the same backing store
        let (creds, report) = block_on(store.load(&defaults()));
        assert_eq!(creds.ssid.as_str(), "TestNet");
        assert_eq!(creds.password.as_str(), "secret123");
        assert_eq!(report.seeded, 0);
        assert!(!creds.is_placeholder());
    }

    #[test]
    fn test_corrupted_partition_is_reformatted_once() {
        let mut mem = MemStore::default();
        mem.read_error = Some(StorageError::Corrupted);
        let mut store = CredentialStore::new(mem);

        let (creds, report) = block_on(store.load(&defaults()));
        assert!(report.reformatted);
        assert_eq!(report.fallback, None);
        assert_eq!(store.store_mut().erase_count, 1);
        assert_eq!(creds, defaults());
    }

    #[test]
    fn test_flash_failure_falls_back_to_defaults() {
        let mut mem = MemStore::default();
        mem.read_error = Some(StorageError::Flash);
        let mut store = CredentialStore::new(mem);

        let (creds, report) = block_on(store.load(&defaults()));
        assert_eq!(creds, defaults());
        assert_eq!(
            report.fallback,
            Some(CredentialError::Storage(StorageError::Flash))
        );
        assert!(!report.reformatted);
    }

    #[test]
    fn test_write_failure_while_seeding_falls_back() {
        let mut mem = MemStore::default();
        mem.write_error = Some(StorageError::Full);
        let mut store = CredentialStore::new(mem);

        let (creds, report) = block_on(store.load(&defaults()));
        assert_eq!(creds, defaults());
        assert_eq!(report.fallback, Some(CredentialError::Storage(StorageError::Full)));
    }

    #[test]
    fn test_invalid_utf8_field_is_reseeded() {
        let mut mem = MemStore::default();
        mem.put(StorageKey::WifiSsid, &[0xff, 0xfe]);
        mem.put(StorageKey::WifiPassword, b"pw");
        mem.put(StorageKey::ArmPin, b"1111");
        let mut store = CredentialStore::new(mem);

        let (creds, report) = block_on(store.load(&defaults()));
        assert_eq!(creds.ssid.as_str(), "generic");
        assert_eq!(creds.password.as_str(), "pw");
        assert_eq!(creds.arm_pin.as_str(), "1111");
        assert_eq!(report.seeded, 1);
    }

    #[test]
    fn test_open_network_password_survives_reload() {
        let mut store = CredentialStore::new(MemStore::default());
        block_on(store.load(&defaults()));
        block_on(store.save_wifi("Cafe", "")).unwrap();

        let (creds, report) = block_on(store.load(&defaults()));
        assert_eq!(creds.ssid.as_str(), "Cafe");
        assert_eq!(creds.password.as_str(), "");
        assert_eq!(report.seeded, 0);
        assert_eq!(store.store_mut().get(StorageKey::WifiPassword), Some(&b""[..]));
    }

    #[test]
    fn test_empty_ssid_record_is_reseeded() {
        let mut mem = MemStore::default();
        mem.put(StorageKey::WifiSsid, b"");
        mem.put(StorageKey::WifiPassword, b"pw");
        mem.put(StorageKey::ArmPin, b"1111");
        let mut store = CredentialStore::new(mem);

        let (creds, report) = block_on(store.load(&defaults()));
        assert!(creds.is_placeholder());
        assert_eq!(report.seeded, 1);
        assert_eq!(store.store_mut().get(StorageKey::WifiSsid), Some(&b"generic"[..]));
    }

    #[test]
    fn test_save_rejects_bad_values() {
        let mut store = CredentialStore::new(MemStore::default());
        assert_eq!(
            block_on(store.save_wifi("", "pw")),
            Err(CredentialError::Empty)
        );
        let long = "0123456789012345678901234567890123456789";
        assert_eq!(
            block_on(store.save_wifi(long, "pw")),
            Err(CredentialError::TooLong)
        );
        assert_eq!(block_on(store.save_pin("")), Err(CredentialError::Empty));
        assert_eq!(store.store_mut().get(StorageKey::WifiSsid), None);
    }

    #[test]
    fn test_ap_password_defaults_until_changed() {
        let mut store = CredentialStore::new(MemStore::default());
        let password = block_on(store.load_ap_password("12345678")).unwrap();
        assert_eq!(password.as_str(), "12345678");
        assert_eq!(store.store_mut().get(StorageKey::ApPassword), None);

        block_on(store.save_ap_password("porch-light")).unwrap();
        let password = block_on(store.load_ap_password("12345678")).unwrap();
        assert_eq!(password.as_str(), "porch-light");
    }

    #[test]
    fn test_ap_password_must_be_wpa2_length() {
        let mut store = CredentialStore::new(MemStore::default());
        assert_eq!(
            block_on(store.save_ap_password("short")),
            Err(CredentialError::TooShort)
        );
        let long = "0123456789012345678901234567890123456789012345678901234567890123";
        assert_eq!(
            block_on(store.save_ap_password(long)),
            Err(CredentialError::TooLong)
        );
        assert_eq!(store.store_mut().get(StorageKey::ApPassword), None);
    }

    #[test]
    fn test_save_pin_and_password() {
        let mut store = CredentialStore::new(MemStore::default());
        block_on(store.save_pin("4321")).unwrap();
        block_on(store.save_password("hunter22")).unwrap();
        let (creds, _) = block_on(store.load(&defaults()));
        assert_eq!(creds.arm_pin.as_str(), "4321");
        assert_eq!(creds.password.as_str(), "hunter22");
    }
}
