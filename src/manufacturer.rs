//! Manufacturer specific data selection.
//!
//! An advertisement may carry several manufacturer data entries. Only one is
//! shown per frame: the entry whose company is known to the registry, with
//! the longest payload as the next criterion. Many vendors repeat their
//! 2-byte company identifier at the start of the payload; that copy is
//! stripped before the payload is rendered as hex.

/// The manufacturer data entry chosen for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerInfo {
    pub company_id: u16,
    /// Registry name of the company, if known
    pub company_name: Option<String>,
    /// Vendor payload without a duplicated company identifier, uppercase hex
    pub payload_hex: String,
}

/// Pick the best entry among `entries` and resolve its company name.
///
/// Entries with a known company name win over unknown ones, longer payloads
/// win over shorter ones, and on a full tie the earliest entry wins. The
/// result therefore depends on the iteration order of `entries`.
///
/// Returns `None` when there are no entries.
pub fn resolve<'a, I, F>(entries: I, lookup: F) -> Option<ManufacturerInfo>
where
    I: IntoIterator<Item = (u16, &'a [u8])>,
    F: Fn(u16) -> Option<String>,
{
    let mut best: Option<((bool, usize), u16, &'a [u8], Option<String>)> = None;

    for (company_id, payload) in entries {
        let name = lookup(company_id);
        let score = (name.is_some(), payload.len());
        if best.as_ref().is_none_or(|(best_score, ..)| score > *best_score) {
            best = Some((score, company_id, payload, name));
        }
    }

    let (_, company_id, payload, company_name) = best?;
    Some(ManufacturerInfo {
        company_id,
        company_name,
        payload_hex: to_hex(strip_company_prefix(company_id, payload)),
    })
}

/// Remove a leading copy of `company_id` (either byte order) from `payload`.
///
/// The prefix is only removed when at least one byte remains afterwards.
pub fn strip_company_prefix(company_id: u16, payload: &[u8]) -> &[u8] {
    match payload {
        [b0, b1, rest @ ..] if !rest.is_empty() => {
            let little = u16::from_le_bytes([*b0, *b1]);
            let big = u16::from_be_bytes([*b0, *b1]);
            if little == company_id || big == company_id {
                rest
            } else {
                payload
            }
        }
        _ => payload,
    }
}

/// Uppercase hex rendering without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
