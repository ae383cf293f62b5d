//! MAC address prefix (OUI) to vendor name lookup.
//!
//! Used only as a fallback when an advertisement carries no manufacturer
//! data. Random and resolvable private addresses, which most phones use,
//! never match.

use crate::mac_address::MacAddress;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in prefixes of common BLE hardware vendors.
const BUILTIN_OUIS: &[(&str, &str)] = &[
    ("00:17:F2", "Apple, Inc."),
    ("3C:22:FB", "Apple, Inc."),
    ("F8:FF:C2", "Apple, Inc."),
    ("A4:83:E7", "Apple, Inc."),
    ("00:12:47", "Samsung Electronics Co.,Ltd"),
    ("24:0A:C4", "Espressif Inc."),
    ("30:AE:A4", "Espressif Inc."),
    ("24:6F:28", "Espressif Inc."),
    ("B8:27:EB", "Raspberry Pi Foundation"),
    ("DC:A6:32", "Raspberry Pi Trading Ltd"),
    ("E4:5F:01", "Raspberry Pi Trading Ltd"),
    ("00:17:88", "Philips Lighting BV"),
    ("50:C7:BF", "TP-LINK Technologies Co.,Ltd."),
    ("00:A0:C9", "Intel Corporation"),
    ("28:6C:07", "XIAOMI Electronics,CO.,LTD"),
];

static BUILTIN: LazyLock<OuiTable> =
    LazyLock::new(|| OuiTable::from_entries(BUILTIN_OUIS.iter().copied()));

/// Vendor names keyed by the first three octets of a MAC address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OuiTable {
    vendors: HashMap<[u8; 3], String>,
}

impl OuiTable {
    /// The built-in table.
    pub fn builtin() -> &'static OuiTable {
        &BUILTIN
    }

    /// Build a table from `("AA:BB:CC", "Vendor")` pairs. Malformed prefixes are skipped.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let vendors = entries
            .into_iter()
            .filter_map(|(prefix, vendor)| Some((parse_prefix(prefix)?, vendor.to_string())))
            .collect();
        Self { vendors }
    }

    /// Vendor for the first three octets of `address`.
    ///
    /// Matching is case-insensitive. A malformed address is simply not found.
    pub fn lookup(&self, address: &str) -> Option<&str> {
        let mac: MacAddress = address.parse().ok()?;
        self.vendors.get(&mac.oui()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

fn parse_prefix(prefix: &str) -> Option<[u8; 3]> {
    let mut octets = [0u8; 3];
    let mut parts = prefix.split([':', '-']);
    for octet in &mut octets {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *octet = u8::from_str_radix(part, 16).ok()?;
    }
    parts.next().is_none().then_some(octets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = OuiTable::builtin();
        assert_eq!(
            table.lookup("B8:27:EB:12:34:56"),
            Some("Raspberry Pi Foundation")
        );
        assert_eq!(table.len(), BUILTIN_OUIS.len());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = OuiTable::from_entries([("dc:a6:32", "Raspberry Pi")]);
        assert_eq!(table.lookup("DC:A6:32:00:00:01"), Some("Raspberry Pi"));
        assert_eq!(table.lookup("dc:a6:32:00:00:01"), Some("Raspberry Pi"));
        assert_eq!(table.lookup("DC-A6-32-00-00-01"), Some("Raspberry Pi"));
    }

    #[test]
    fn test_unknown_prefix() {
        let table = OuiTable::builtin();
        assert_eq!(table.lookup("FF:FF:FF:00:00:00"), None);
    }

    #[test]
    fn test_malformed_addresses_do_not_match() {
        let table = OuiTable::from_entries([("AA:BB:CC", "Acme")]);
        assert_eq!(table.lookup(""), None);
        assert_eq!(table.lookup("AA:BB:CC"), None);
        assert_eq!(table.lookup("AA:BB:CC:DD:EE:GG"), None);
        assert_eq!(table.lookup("not a mac"), None);
    }

    #[test]
    fn test_malformed_prefixes_are_skipped() {
        let table = OuiTable::from_entries([
            ("AA:BB", "Short"),
            ("AA:BB:CC:DD", "Long"),
            ("ZZ:BB:CC", "Hex"),
        ]);
        assert!(table.is_empty());
    }
}
