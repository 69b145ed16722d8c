//! Domain Services
//!
//! Pure logic: instruction classification, mint counter decoding, trait
//! derivation from metadata documents.

use crate::domain::entities::{ComicTraits, MintCounters};
use crate::domain::value_objects::{EventKind, TransactionRecord};

/// Mint program (candy-machine style) deployed for comic drops
pub const MINT_PROGRAM_ID: &str = "cndy3Z4yapfJBmL3ShUp5exZKqR3z33thTzeNMm2gRZ";
/// SPL token program
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Token metadata program
pub const TOKEN_METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// One classifiable instruction shape: program plus the leading bytes of
/// its payload.
struct InstructionPattern {
    program_id: &'static str,
    prefix: &'static [u8],
    kind: EventKind,
}

/// Static table of known discriminators.
///
/// Anchor-generated programs use an 8-byte discriminator; the native
/// token programs use a single-byte operation tag.
const KNOWN_INSTRUCTIONS: &[InstructionPattern] = &[
    // mint_nft on the mint program
    InstructionPattern {
        program_id: MINT_PROGRAM_ID,
        prefix: &[211, 57, 6, 167, 15, 219, 35, 251],
        kind: EventKind::Mint,
    },
    // spl-token Transfer
    InstructionPattern {
        program_id: TOKEN_PROGRAM_ID,
        prefix: &[3],
        kind: EventKind::Transfer,
    },
    // spl-token TransferChecked
    InstructionPattern {
        program_id: TOKEN_PROGRAM_ID,
        prefix: &[12],
        kind: EventKind::Transfer,
    },
    // token-metadata UpdateMetadataAccount
    InstructionPattern {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        prefix: &[1],
        kind: EventKind::ComicStateChange,
    },
    // token-metadata UpdateMetadataAccountV2
    InstructionPattern {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        prefix: &[15],
        kind: EventKind::ComicStateChange,
    },
];

/// Classify a record for dispatch.
///
/// Returns the event kind and whether the legacy fallback branch was
/// taken (no tag and no discriminator match).
pub fn classify(record: &TransactionRecord) -> (EventKind, bool) {
    if let Some(kind) = record.kind {
        return (kind, false);
    }

    if let Some(last) = record.instructions.last() {
        for pattern in KNOWN_INSTRUCTIONS {
            if last.program_id == pattern.program_id && last.data.starts_with(pattern.prefix) {
                return (pattern.kind, false);
            }
        }
    }

    // Unclassified records historically turned out to be state changes;
    // the handler tolerates records that are not.
    (EventKind::ComicStateChange, true)
}

/// Mint program account layout: 8-byte discriminator, then the two
/// little-endian supply counters.
const COUNTERS_OFFSET: usize = 8;
const COUNTERS_LEN: usize = 16;

/// Decode supply counters from raw mint program account data.
///
/// Returns `None` for short or missing account data; callers degrade to
/// "supply unknown" instead of failing the event.
pub fn parse_mint_counters(data: &[u8]) -> Option<MintCounters> {
    if data.len() < COUNTERS_OFFSET + COUNTERS_LEN {
        return None;
    }
    let available = u64::from_le_bytes(data[COUNTERS_OFFSET..COUNTERS_OFFSET + 8].try_into().ok()?);
    let redeemed =
        u64::from_le_bytes(data[COUNTERS_OFFSET + 8..COUNTERS_OFFSET + 16].try_into().ok()?);
    Some(MintCounters {
        items_available: available,
        items_redeemed: redeemed,
    })
}

/// Re-derive comic trait flags from a metadata document.
///
/// Looks at the standard `attributes` array; anything missing keeps its
/// default.
pub fn derive_comic_traits(metadata: &serde_json::Value) -> ComicTraits {
    let mut traits = ComicTraits::default();
    let Some(attributes) = metadata.get("attributes").and_then(|a| a.as_array()) else {
        return traits;
    };

    for attribute in attributes {
        let Some(trait_type) = attribute.get("trait_type").and_then(|t| t.as_str()) else {
            continue;
        };
        let value = attribute.get("value");
        match trait_type.to_ascii_lowercase().as_str() {
            "used" => traits.used = truthy(value),
            "signed" => traits.signed = truthy(value),
            "rarity" => {
                traits.rarity = value.and_then(|v| v.as_str()).map(str::to_string);
            }
            _ => {}
        }
    }
    traits
}

fn truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => {
            matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
        }
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::InstructionRecord;
    use chrono::Utc;

    fn record_with_instruction(program_id: &str, data: Vec<u8>) -> TransactionRecord {
        TransactionRecord {
            signature: "sig".into(),
            timestamp: Utc::now(),
            kind: None,
            asset: None,
            instructions: vec![InstructionRecord {
                program_id: program_id.into(),
                data,
                accounts: Vec::new(),
            }],
            token_transfers: Vec::new(),
            native_transfers: Vec::new(),
            amount: None,
            label: None,
            anchor: None,
            metadata_uri: None,
        }
    }

    #[test]
    fn test_tagged_record_wins() {
        let mut record = record_with_instruction(TOKEN_PROGRAM_ID, vec![3]);
        record.kind = Some(EventKind::Sale);
        assert_eq!(classify(&record), (EventKind::Sale, false));
    }

    #[test]
    fn test_discriminator_classification() {
        let record = record_with_instruction(
            MINT_PROGRAM_ID,
            vec![211, 57, 6, 167, 15, 219, 35, 251, 0, 0],
        );
        assert_eq!(classify(&record), (EventKind::Mint, false));

        let record = record_with_instruction(TOKEN_PROGRAM_ID, vec![3, 1, 0]);
        assert_eq!(classify(&record), (EventKind::Transfer, false));

        let record = record_with_instruction(TOKEN_METADATA_PROGRAM_ID, vec![15, 9]);
        assert_eq!(classify(&record), (EventKind::ComicStateChange, false));
    }

    #[test]
    fn test_unknown_falls_back_flagged() {
        let record = record_with_instruction("SomeOtherProgram1111111111111111", vec![0xff]);
        assert_eq!(classify(&record), (EventKind::ComicStateChange, true));

        // Wrong prefix on a known program also falls back
        let record = record_with_instruction(MINT_PROGRAM_ID, vec![1, 2, 3]);
        assert_eq!(classify(&record), (EventKind::ComicStateChange, true));
    }

    #[test]
    fn test_parse_mint_counters() {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&500u64.to_le_bytes());
        data.extend_from_slice(&499u64.to_le_bytes());
        let counters = parse_mint_counters(&data).unwrap();
        assert_eq!(counters.items_available, 500);
        assert_eq!(counters.items_redeemed, 499);
        assert_eq!(counters.remaining(), 1);

        assert!(parse_mint_counters(&[0u8; 10]).is_none());
        assert!(parse_mint_counters(&[]).is_none());
    }

    #[test]
    fn test_derive_comic_traits() {
        let metadata = serde_json::json!({
            "name": "Comic #42",
            "attributes": [
                { "trait_type": "Used", "value": "true" },
                { "trait_type": "Signed", "value": false },
                { "trait_type": "Rarity", "value": "Epic" },
                { "trait_type": "Ink", "value": "black" },
            ],
        });
        let traits = derive_comic_traits(&metadata);
        assert!(traits.used);
        assert!(!traits.signed);
        assert_eq!(traits.rarity.as_deref(), Some("Epic"));
    }

    #[test]
    fn test_derive_comic_traits_missing_attributes() {
        let traits = derive_comic_traits(&serde_json::json!({ "name": "Comic" }));
        assert_eq!(traits, ComicTraits::default());
    }
}
