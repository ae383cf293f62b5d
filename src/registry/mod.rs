//! Offline Bluetooth SIG identifier registry.
//!
//! Maps 16-bit company identifiers and service UUIDs to human readable names.
//! The registry is built once from two JSON-ish name tables and is read-only
//! afterwards, so a single instance can be shared between threads behind an
//! [`Arc`]. Broken or missing sources never fail the build: they simply
//! produce empty tables and every lookup returns `None`.

pub mod sanitize;
pub mod table;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use table::{TableEntry, TableKey, load_table};
use tracing::{debug, warn};
use uuid::Uuid;

/// Company identifier table bundled with the crate.
pub const BUNDLED_COMPANIES: &[u8] = include_bytes!("../../assets/sig_companies.json");

/// Service UUID table bundled with the crate.
pub const BUNDLED_SERVICES: &[u8] = include_bytes!("../../assets/sig_services.json");

/// High 64 bits of the Bluetooth Base UUID `00000000-0000-1000-8000-00805F9B34FB`.
const BASE_UUID_HIGH: u64 = 0x0000_0000_0000_1000;
/// Low 64 bits of the Bluetooth Base UUID.
const BASE_UUID_LOW: u64 = 0x8000_0080_5F9B_34FB;
/// Position of a 16-bit short code inside the high 64 bits.
const SHORT_UUID_MASK: u64 = 0x0000_FFFF_0000_0000;

/// Company and service name lookup tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierRegistry {
    companies: HashMap<u16, String>,
    services: HashMap<String, String>,
}

impl IdentifierRegistry {
    /// A registry without any entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from a companies source and a services source.
    ///
    /// Each source is either a JSON object (`{"76": "Apple, Inc."}`) or an
    /// array of `{"code": .., "name": ..}` records. Byte-order marks, smart
    /// quotes, comments, trailing commas and stray escapes are repaired first.
    pub fn from_sources<C: Read, S: Read>(companies: C, services: S) -> Self {
        let registry = Self::from_entries(
            load_table("companies", companies),
            load_table("services", services),
        );
        debug!(
            companies = registry.companies.len(),
            services = registry.services.len(),
            "built identifier registry"
        );
        registry
    }

    /// Build a registry from in-memory sources.
    pub fn from_slices(companies: &[u8], services: &[u8]) -> Self {
        Self::from_sources(companies, services)
    }

    /// Build a registry from the tables bundled with the crate.
    pub fn bundled() -> Self {
        Self::from_slices(BUNDLED_COMPANIES, BUNDLED_SERVICES)
    }

    fn from_entries(companies: Vec<TableEntry>, services: Vec<TableEntry>) -> Self {
        let mut registry = Self::empty();
        for (key, name) in companies {
            let id = match key {
                TableKey::Code(code) => u16::try_from(code).ok(),
                TableKey::Text(text) => parse_company_id(&text),
            };
            match id {
                Some(id) => {
                    registry.companies.insert(id, name);
                }
                None => debug!(?name, "skipping company with invalid identifier"),
            }
        }
        for (key, name) in services {
            match key {
                TableKey::Code(code) => match u16::try_from(code) {
                    Ok(short) => registry.insert_short_service(short, &name),
                    Err(_) => debug!(code, ?name, "skipping service code outside 16-bit range"),
                },
                TableKey::Text(text) => registry.insert_service(&text, &name),
            }
        }
        registry
    }

    fn insert_service(&mut self, key: &str, name: &str) {
        let normalized = normalize_service_key(key);
        if let Some(short) = parse_short_code(&normalized) {
            self.insert_short_service(short, name);
            return;
        }
        match Uuid::parse_str(&normalized) {
            Ok(uuid) => {
                self.services.insert(full_key(&uuid), name.to_string());
                if let Some(short) = short_alias(&uuid) {
                    self.services.insert(short_key(short), name.to_string());
                }
            }
            Err(_) => {
                self.services.insert(normalized, name.to_string());
            }
        }
    }

    fn insert_short_service(&mut self, short: u16, name: &str) {
        self.services.insert(short_key(short), name.to_string());
        self.services
            .insert(full_key(&base_uuid(short)), name.to_string());
    }

    /// Name registered for a company identifier.
    pub fn company_name(&self, company_id: u16) -> Option<&str> {
        self.companies.get(&company_id).map(String::as_str)
    }

    /// Name registered for a service UUID.
    ///
    /// Accepts 16-bit short codes (`"FEED"`) and 128-bit UUIDs in any case.
    /// UUIDs in the Bluetooth Base space are first looked up by their short
    /// code, then by the full UUID.
    pub fn service_name(&self, uuid: &str) -> Option<&str> {
        let normalized = normalize_service_key(uuid);
        if let Some(short) = parse_short_code(&normalized) {
            return self.services.get(&short_key(short)).map(String::as_str);
        }
        if let Ok(parsed) = Uuid::parse_str(&normalized) {
            if let Some(short) = short_alias(&parsed)
                && let Some(name) = self.services.get(&short_key(short))
            {
                return Some(name);
            }
            return self.services.get(&full_key(&parsed)).map(String::as_str);
        }
        self.services.get(&normalized).map(String::as_str)
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    /// Number of service keys, counting short and full aliases separately.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty() && self.services.is_empty()
    }
}

/// Parse a company identifier key.
///
/// An optional `0x` prefix is stripped. The remaining digits are read as
/// hexadecimal only if they contain a hex letter, otherwise as decimal, so
/// `"0x0059"` is company 59 while `"0x004C"` is company 76.
pub fn parse_company_id(raw: &str) -> Option<u16> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let radix = if digits.chars().any(|c| matches!(c, 'a'..='f' | 'A'..='F')) {
        16
    } else {
        10
    };
    u16::from_str_radix(digits, radix).ok()
}

/// Short code of a UUID in the Bluetooth Base space.
///
/// The low 64 bits and every bit outside the 16-bit slot must match the base
/// UUID `0000XXXX-0000-1000-8000-00805F9B34FB`.
pub fn short_alias(uuid: &Uuid) -> Option<u16> {
    let (high, low) = uuid.as_u64_pair();
    if low != BASE_UUID_LOW || high & !SHORT_UUID_MASK != BASE_UUID_HIGH {
        return None;
    }
    u16::try_from((high & SHORT_UUID_MASK) >> 32).ok()
}

/// Expand a 16-bit short code into the Bluetooth Base space.
pub fn base_uuid(short: u16) -> Uuid {
    Uuid::from_u64_pair(BASE_UUID_HIGH | (u64::from(short) << 32), BASE_UUID_LOW)
}

fn normalize_service_key(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.strip_prefix("0X") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

fn parse_short_code(normalized: &str) -> Option<u16> {
    if normalized.len() != 4 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(normalized, 16).ok()
}

fn short_key(short: u16) -> String {
    format!("{short:04X}")
}

fn full_key(uuid: &Uuid) -> String {
    uuid.hyphenated().to_string().to_uppercase()
}

/// Where the registry tables are read from.
///
/// A `None` path selects the bundled table. A path that cannot be opened
/// yields an empty table for that half of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySources {
    pub companies: Option<PathBuf>,
    pub services: Option<PathBuf>,
}

impl RegistrySources {
    /// Read both sources and build the registry. Blocking.
    pub fn load(&self) -> IdentifierRegistry {
        let companies = read_source("companies", self.companies.as_ref(), BUNDLED_COMPANIES);
        let services = read_source("services", self.services.as_ref(), BUNDLED_SERVICES);
        IdentifierRegistry::from_slices(&companies, &services)
    }
}

fn read_source(label: &str, path: Option<&PathBuf>, bundled: &[u8]) -> Vec<u8> {
    let Some(path) = path else {
        return bundled.to_vec();
    };
    let mut bytes = Vec::new();
    match File::open(path).and_then(|mut file| file.read_to_end(&mut bytes)) {
        Ok(_) => bytes,
        Err(e) => {
            warn!(
                source = label,
                path = %path.display(),
                error = %e,
                "cannot read registry source, using empty table"
            );
            Vec::new()
        }
    }
}

/// One-time construction guard around a shared registry.
///
/// The first caller of [`RegistryCell::get_or_build`] builds the registry;
/// concurrent callers block until that single build completes and then all
/// receive the same instance.
#[derive(Debug, Default)]
pub struct RegistryCell {
    cell: OnceLock<Arc<IdentifierRegistry>>,
}

impl RegistryCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the registry, building it with `build` if this is the first call.
    pub fn get_or_build<F>(&self, build: F) -> Arc<IdentifierRegistry>
    where
        F: FnOnce() -> IdentifierRegistry,
    {
        Arc::clone(self.cell.get_or_init(|| Arc::new(build())))
    }

    /// The registry, if it has been built.
    pub fn get(&self) -> Option<Arc<IdentifierRegistry>> {
        self.cell.get().cloned()
    }
}

/// Process-wide registry cell used by the binary.
pub static SHARED: RegistryCell = RegistryCell::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry(companies: &str, services: &str) -> IdentifierRegistry {
        IdentifierRegistry::from_slices(companies.as_bytes(), services.as_bytes())
    }

    #[test]
    fn test_company_keys_decimal_and_hex() {
        let reg = registry(
            r#"{"76": "Apple, Inc.", "0x0075": "Samsung", "0X00E0": "Google", "0499": "Ruuvi", "4C0": "Hex"}"#,
            "{}",
        );
        assert_eq!(reg.company_name(76), Some("Apple, Inc."));
        // No hex letter after the prefix: decimal
        assert_eq!(reg.company_name(75), Some("Samsung"));
        assert_eq!(reg.company_name(0x0075), None);
        assert_eq!(reg.company_name(0x00E0), Some("Google"));
        // No hex letter: decimal even with a leading zero
        assert_eq!(reg.company_name(499), Some("Ruuvi"));
        assert_eq!(reg.company_name(0x04C0), Some("Hex"));
        assert_eq!(reg.company_name(1), None);
    }

    #[test]
    fn test_company_array_format() {
        let reg = registry(
            r#"[{"code": 76, "name": "Apple, Inc."}, {"code": "0x0059", "name": "Nordic"}, {"code": 70000, "name": "Too big"}]"#,
            "[]",
        );
        assert_eq!(reg.company_name(76), Some("Apple, Inc."));
        assert_eq!(reg.company_name(59), Some("Nordic"));
        assert_eq!(reg.company_name(0x59), None);
        assert_eq!(reg.company_count(), 2);
    }

    #[test]
    fn test_company_lookup_is_idempotent() {
        let reg = IdentifierRegistry::bundled();
        let first = reg.company_name(76).map(str::to_owned);
        assert!(first.is_some());
        for _ in 0..3 {
            assert_eq!(reg.company_name(76).map(str::to_owned), first);
        }
    }

    #[test]
    fn test_parse_company_id() {
        assert_eq!(parse_company_id(" 76 "), Some(76));
        assert_eq!(parse_company_id("0x004C"), Some(76));
        // Prefix alone does not make a key hex
        assert_eq!(parse_company_id("0x0059"), Some(59));
        assert_eq!(parse_company_id("0X0075"), Some(75));
        assert_eq!(parse_company_id("004c"), Some(76));
        assert_eq!(parse_company_id("65535"), Some(u16::MAX));
        assert_eq!(parse_company_id("65536"), None);
        assert_eq!(parse_company_id("Apple"), None);
        assert_eq!(parse_company_id(""), None);
    }

    #[test]
    fn test_prefixed_decimal_company_key() {
        let reg = registry(r#"{"0x0059": "Nordic"}"#, "{}");
        assert_eq!(reg.company_name(59), Some("Nordic"));
        assert_eq!(reg.company_name(89), None);
    }

    #[test]
    fn test_short_and_full_service_round_trip() {
        let reg = registry("{}", r#"{"FEED": "Tile"}"#);
        assert_eq!(reg.service_name("FEED"), Some("Tile"));
        assert_eq!(reg.service_name("feed"), Some("Tile"));
        assert_eq!(
            reg.service_name("0000FEED-0000-1000-8000-00805F9B34FB"),
            Some("Tile")
        );
        assert_eq!(
            reg.service_name("0000feed-0000-1000-8000-00805f9b34fb"),
            Some("Tile")
        );
    }

    #[test]
    fn test_full_base_uuid_registers_short_alias() {
        let reg = registry(
            "{}",
            r#"{"0000fe2c-0000-1000-8000-00805f9b34fb": "Google Fast Pair"}"#,
        );
        assert_eq!(reg.service_name("FE2C"), Some("Google Fast Pair"));
        assert_eq!(
            reg.service_name("0000FE2C-0000-1000-8000-00805F9B34FB"),
            Some("Google Fast Pair")
        );
    }

    #[test]
    fn test_integer_service_codes_are_short_codes() {
        let reg = registry("{}", r#"[{"code": 6159, "name": "Battery Service"}]"#);
        assert_eq!(reg.service_name("180F"), Some("Battery Service"));
        assert_eq!(
            reg.service_name("0000180f-0000-1000-8000-00805f9b34fb"),
            Some("Battery Service")
        );
    }

    #[test]
    fn test_vendor_uuid_matches_full_string_only() {
        let vendor = "6E400001-B5A3-F393-E0A9-E50E24DCCA9E";
        let reg = registry("{}", &format!(r#"{{"{vendor}": "Nordic UART"}}"#));
        assert_eq!(reg.service_name(&vendor.to_lowercase()), Some("Nordic UART"));
        assert_eq!(reg.service_name("0001"), None);
    }

    #[test]
    fn test_short_alias_requires_full_template() {
        assert_eq!(short_alias(&base_uuid(0xFEED)), Some(0xFEED));
        let off_template = Uuid::parse_str("0000FEED-0001-1000-8000-00805F9B34FB").unwrap();
        assert_eq!(short_alias(&off_template), None);
        let high_bits = Uuid::parse_str("1234FEED-0000-1000-8000-00805F9B34FB").unwrap();
        assert_eq!(short_alias(&high_bits), None);
        let other_low = Uuid::parse_str("0000FEED-0000-1000-8000-00805F9B34FC").unwrap();
        assert_eq!(short_alias(&other_low), None);
    }

    #[test]
    fn test_base_uuid_string_form() {
        assert_eq!(
            full_key(&base_uuid(0x180F)),
            "0000180F-0000-1000-8000-00805F9B34FB"
        );
    }

    #[test]
    fn test_malformed_sources_build_empty_registry() {
        let reg = registry(r#"{"76": "Apple"#, "[{\"code\": 1");
        assert!(reg.is_empty());
        assert_eq!(reg.company_name(76), None);
        assert_eq!(reg.service_name("FEED"), None);
        assert_eq!(reg.service_name("not a uuid"), None);
    }

    #[test]
    fn test_unreadable_reader_builds_empty_table() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device unplugged"))
            }
        }
        let reg = IdentifierRegistry::from_sources(Broken, r#"{"FEED": "Tile"}"#.as_bytes());
        assert_eq!(reg.company_count(), 0);
        assert_eq!(reg.service_name("FEED"), Some("Tile"));
    }

    #[test]
    fn test_bundled_tables_load() {
        let reg = IdentifierRegistry::bundled();
        assert_eq!(reg.company_name(0x004C), Some("Apple, Inc."));
        assert!(reg.service_name("180F").is_some());
        assert_eq!(reg.service_name("FEED"), Some("Tile, Inc."));
    }

    #[test]
    fn test_sources_from_files() {
        let mut companies = tempfile::NamedTempFile::new().unwrap();
        write!(companies, "// test table\n{{\"89\": \"Nordic Semiconductor ASA\",}}").unwrap();
        let sources = RegistrySources {
            companies: Some(companies.path().to_path_buf()),
            services: Some(PathBuf::from("/nonexistent/sig_services.json")),
        };
        let reg = sources.load();
        assert_eq!(reg.company_name(89), Some("Nordic Semiconductor ASA"));
        assert_eq!(reg.service_count(), 0);
    }

    #[test]
    fn test_default_sources_use_bundled_tables() {
        let reg = RegistrySources::default().load();
        assert_eq!(reg, IdentifierRegistry::bundled());
    }

    #[test]
    fn test_registry_cell_builds_once() {
        let cell = RegistryCell::new();
        let builds = AtomicUsize::new(0);
        assert!(cell.get().is_none());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cell.get_or_build(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        registry(r#"{"76": "Apple, Inc."}"#, "{}")
                    })
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        let first = cell.get_or_build(IdentifierRegistry::empty);
        let second = cell.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.company_name(76), Some("Apple, Inc."));
    }
}
