//! API DTOs (Data Transfer Objects)
//!
//! Wire form of the provider's enriched-transaction payload and its
//! conversion into the domain record. Conversion failures surface as
//! `MalformedRecord` and skip only the offending record.

use crate::domain::value_objects::{
    EventKind, InstructionRecord, NativeTransfer, TokenTransfer, TransactionRecord,
};
use crate::error::{IngestError, IngestResult};
use chrono::DateTime;
use serde::Deserialize;

/// One enriched transaction as delivered by the provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransactionDto {
    pub signature: String,
    /// Unix seconds
    pub timestamp: i64,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub instructions: Vec<InstructionDto>,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransferDto>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransferDto>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub recent_blockhash: Option<String>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDto {
    pub program_id: String,
    /// base58 instruction payload
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub accounts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferDto {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    pub mint: String,
    #[serde(default)]
    pub token_amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransferDto {
    pub from_user_account: String,
    pub to_user_account: String,
    pub amount: u64,
}

impl EnrichedTransactionDto {
    pub fn into_record(self) -> IngestResult<TransactionRecord> {
        let signature = self.signature;
        let timestamp = DateTime::from_timestamp(self.timestamp, 0).ok_or_else(|| {
            IngestError::MalformedRecord(format!(
                "{signature}: timestamp {} out of range",
                self.timestamp
            ))
        })?;

        let instructions = self
            .instructions
            .into_iter()
            .map(|i| {
                let data = bs58::decode(&i.data).into_vec().map_err(|e| {
                    IngestError::MalformedRecord(format!(
                        "{signature}: instruction data is not base58: {e}"
                    ))
                })?;
                Ok(InstructionRecord {
                    program_id: i.program_id,
                    data,
                    accounts: i.accounts,
                })
            })
            .collect::<IngestResult<Vec<_>>>()?;

        Ok(TransactionRecord {
            // Recognized tags map to kinds; anything else falls through to
            // byte-level classification.
            kind: self.event_type.as_deref().and_then(EventKind::from_tag),
            signature,
            timestamp,
            asset: self.asset,
            instructions,
            token_transfers: self
                .token_transfers
                .into_iter()
                .map(|t| TokenTransfer {
                    from: t.from_user_account,
                    to: t.to_user_account,
                    mint: t.mint,
                    amount: t.token_amount,
                })
                .collect(),
            native_transfers: self
                .native_transfers
                .into_iter()
                .map(|t| NativeTransfer {
                    from: t.from_user_account,
                    to: t.to_user_account,
                    lamports: t.amount,
                })
                .collect(),
            amount: self.amount,
            label: self.label,
            anchor: self.recent_blockhash,
            metadata_uri: self.metadata_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record_decodes_payload() {
        let dto: EnrichedTransactionDto = serde_json::from_value(serde_json::json!({
            "signature": "5sig",
            "timestamp": 1_700_000_000,
            "type": "NFT_SALE",
            "instructions": [
                { "programId": "prog", "data": bs58::encode([3u8, 1]).into_string() }
            ],
            "tokenTransfers": [
                { "fromUserAccount": "alice", "toUserAccount": "bob", "mint": "comic", "tokenAmount": 1 }
            ],
            "amount": 5_000_000,
            "recentBlockhash": "anchor-value",
        }))
        .unwrap();

        let record = dto.into_record().unwrap();
        assert_eq!(record.kind, Some(EventKind::Sale));
        assert_eq!(record.instructions[0].data, vec![3, 1]);
        assert_eq!(record.token_transfers[0].to.as_deref(), Some("bob"));
        assert_eq!(record.anchor.as_deref(), Some("anchor-value"));
    }

    #[test]
    fn test_into_record_rejects_bad_data() {
        let dto: EnrichedTransactionDto = serde_json::from_value(serde_json::json!({
            "signature": "5sig",
            "timestamp": 1_700_000_000,
            "instructions": [ { "programId": "prog", "data": "not-base58-0OIl" } ],
        }))
        .unwrap();

        assert!(matches!(
            dto.into_record(),
            Err(IngestError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_unrecognized_tag_leaves_kind_unset() {
        let dto: EnrichedTransactionDto = serde_json::from_value(serde_json::json!({
            "signature": "5sig",
            "timestamp": 1_700_000_000,
            "type": "STAKE_DELEGATE",
        }))
        .unwrap();

        let record = dto.into_record().unwrap();
        assert_eq!(record.kind, None);
    }
}
