//! End-to-end command handling with an in-memory store and a fake account SDK
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;

use panthr_core::*;
use panthr_crypto::{Scheme, SecretVault};
use secrecy::SecretString;
use zeroize::Zeroizing;

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<UserId, UserSecretRecord>>,
}

impl MemoryStore {
    fn get(&self, user_id: &UserId) -> Option<UserSecretRecord> {
        self.records.lock().unwrap().get(user_id).cloned()
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl UserStore for MemoryStore {
    fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserSecretRecord>, StoreError> {
        Ok(self.get(user_id))
    }

    fn upsert(&self, record: &UserSecretRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().insert(record.user_id.clone(), record.clone());
        Ok(())
    }
}

/// Derives a deterministic view key and address from the private key suffix
struct FakeAccounts;

impl FakeAccounts {
    fn account(private_key: &str) -> Account {
        let suffix = &private_key["APrivateKey1".len()..];
        Account {
            private_key: Zeroizing::new(private_key.to_string()),
            view_key: format!("AViewKey1{suffix}"),
            address: format!("aleo1{suffix}"),
        }
    }
}

impl AccountProvider for FakeAccounts {
    fn create(&self) -> Result<Account, AccountError> {
        Ok(Self::account("APrivateKey1generated"))
    }

    fn import(&self, private_key: &str) -> Result<Account, AccountError> {
        if !panthr_core::account::looks_like_private_key(private_key) {
            return Err(AccountError::InvalidPrivateKey);
        }
        Ok(Self::account(private_key))
    }
}

fn vault(scheme: Scheme) -> SecretVault {
    SecretVault::new(SecretString::new("testsecret".to_string()))
        .unwrap()
        .with_kdf_iterations(NonZeroU32::new(1_000).unwrap())
        .with_scheme(scheme)
}

fn service() -> WalletService<MemoryStore, FakeAccounts> {
    WalletService::new(vault(Scheme::Aead), MemoryStore::default(), FakeAccounts)
}

fn reply(service: &WalletService<MemoryStore, FakeAccounts>, user: &UserId, text: &str) -> String {
    service.handle(user, text).expect("command should produce a reply")
}

#[test]
fn test_ordinary_text_gets_no_reply() {
    let service = service();
    assert_eq!(service.handle(&UserId::from(1u64), "gm"), None);
}

#[test]
fn test_create_then_view_private_key() {
    let service = service();
    let user = UserId::from(12345u64);

    let created = reply(&service, &user, "/create_wallet");
    assert!(created.contains("Wallet created successfully!"));
    assert!(created.contains("aleo1generated"));
    assert!(!created.contains("APrivateKey1generated"));

    let record = service.store().get(&user).unwrap();
    assert!(!record.envelope.contains("APrivateKey1generated"));
    assert_eq!(record.scheme(), Some(Scheme::Aead));
    assert_eq!(record.public_address, "aleo1generated");

    let viewed = reply(&service, &user, "/view_private_key");
    assert_eq!(viewed, "Your private key is: APrivateKey1generated");
}

#[test]
fn test_create_refuses_to_overwrite() {
    let service = service();
    let user = UserId::from(7u64);
    reply(&service, &user, "/import_wallet APrivateKey1mine");

    let second = reply(&service, &user, "/create_wallet");
    assert!(second.contains("already have a wallet"));
    assert_eq!(service.store().get(&user).unwrap().public_address, "aleo1mine");
}

#[test]
fn test_reimport_replaces_keys_and_keeps_preferences() {
    let service = service();
    let user = UserId::from(42u64);

    reply(&service, &user, "/import_wallet APrivateKey1first");
    reply(&service, &user, "/set_language FR");
    reply(&service, &user, "/toggle_notifications");
    let imported = reply(&service, &user, "/import_wallet APrivateKey1second");
    assert_eq!(imported, "Wallet imported successfully!\nAddress: aleo1second");

    let record = service.store().get(&user).unwrap();
    assert_eq!(service.store().len(), 1);
    assert_eq!(record.view_key, "AViewKey1second");
    assert_eq!(record.language, "fr");
    assert!(record.notifications_enabled);
    assert_eq!(
        reply(&service, &user, "/view_private_key"),
        "Your private key is: APrivateKey1second"
    );
}

#[test]
fn test_invalid_private_key_import() {
    let service = service();
    let user = UserId::from(9u64);
    let response = reply(&service, &user, "/import_wallet not-a-key");
    assert!(response.starts_with("Error importing wallet"));
    assert!(service.store().get(&user).is_none());
}

#[test]
fn test_view_without_wallet() {
    let service = service();
    assert_eq!(
        reply(&service, &UserId::from(1u64), "/view_private_key"),
        "No wallet found. Please create or import a wallet first."
    );
}

#[test]
fn test_envelope_is_bound_to_its_owner() {
    let service = service();
    let alice = UserId::from(1u64);
    let mallory = UserId::from(2u64);
    reply(&service, &alice, "/import_wallet APrivateKey1alice");

    // Mallory's record gets a copy of Alice's envelope
    let mut stolen = service.store().get(&alice).unwrap();
    stolen.user_id = mallory.clone();
    service.store().upsert(&stolen).unwrap();

    let response = reply(&service, &mallory, "/view_private_key");
    assert!(response.contains("wrong key/identity or corrupted data"));
    assert!(!response.contains("APrivateKey1alice"));
}

#[test]
fn test_malformed_record_is_reported_distinctly() {
    let service = service();
    let user = UserId::from(3u64);
    reply(&service, &user, "/import_wallet APrivateKey1three");

    let mut record = service.store().get(&user).unwrap();
    record.envelope = "garbage".into();
    service.store().upsert(&record).unwrap();

    assert_eq!(reply(&service, &user, "/view_private_key"), "Cannot decrypt this record.");
}

#[test]
fn test_legacy_record_is_migrated_on_view() {
    let service = service();
    let user = UserId::new("12345");

    // Envelope written by the first (Node.js) bot release for the same secret and user
    let legacy = UserSecretRecord::new(
        user.clone(),
        "000102030405060708090a0b0c0d0e0f:ef3c76962713909e508eec350843dc34".into(),
        Scheme::LegacyCbc,
        "aleo1legacy".into(),
        "AViewKey1legacy".into(),
    );
    service.store().upsert(&legacy).unwrap();

    assert_eq!(reply(&service, &user, "/view_private_key"), "Your private key is: mySecretKey123");

    let migrated = service.store().get(&user).unwrap();
    assert_eq!(migrated.scheme(), Some(Scheme::Aead));
    assert_ne!(migrated.envelope, legacy.envelope);
    assert_eq!(reply(&service, &user, "/view_private_key"), "Your private key is: mySecretKey123");
}

#[test]
fn test_legacy_configured_service_keeps_legacy_envelopes() {
    let service = WalletService::new(vault(Scheme::LegacyCbc), MemoryStore::default(), FakeAccounts);
    let user = UserId::from(5u64);
    reply(&service, &user, "/import_wallet APrivateKey1five");

    let record = service.store().get(&user).unwrap();
    assert_eq!(record.scheme(), Some(Scheme::LegacyCbc));
    assert_eq!(reply(&service, &user, "/view_private_key"), "Your private key is: APrivateKey1five");
}

#[test]
fn test_language_and_notifications() {
    let service = service();
    let user = UserId::from(11u64);

    assert_eq!(
        reply(&service, &user, "/set_language es"),
        "No wallet found. Please create or import a wallet first."
    );
    reply(&service, &user, "/create_wallet");

    assert_eq!(reply(&service, &user, "/set_language ES"), "Language updated to es.");
    assert!(reply(&service, &user, "/set_language de").starts_with("Language not supported"));
    assert_eq!(service.store().get(&user).unwrap().language, "es");

    assert_eq!(reply(&service, &user, "/toggle_notifications"), "Notifications have been enabled.");
    assert_eq!(reply(&service, &user, "/toggle_notifications"), "Notifications have been disabled.");
}

#[test]
fn test_placeholders_usage_and_unknown() {
    let service = service();
    let user = UserId::from(1u64);

    assert_eq!(reply(&service, &user, "/start"), "Welcome to Panthr-B Aleo Wallet Bot!");
    assert!(reply(&service, &user, "/help").contains("/import_wallet <privateKey>"));
    assert!(reply(&service, &user, "/price").contains("coming soon"));
    assert!(reply(&service, &user, "/balance aleo1xyz").contains("coming soon"));
    assert_eq!(reply(&service, &user, "/balance"), "Usage: /balance <address>");
    assert!(reply(&service, &user, "/moon").starts_with("Unknown command /moon"));
}
