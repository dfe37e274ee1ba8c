use alloy_rlp::{BufMut, Encodable, Header};
use revm::primitives::{Address, B256, Bytes, TxKind, U256, keccak256};

use crate::constants::ARBITRUM_RETRY_TX_TYPE;

/// Arbitrum Retry Transaction (type 0x68)
///
/// Scheduled by `ArbRetryableTx.redeem` to replay a retryable ticket. These transactions:
/// - Use the ticket's redeem count as nonce
/// - Carry the donated gas and pay the block base fee
/// - Refund unused gas to `refund_to`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbitrumRetryTx {
    pub chain_id: U256,
    pub nonce: u64,
    pub from: Address,
    pub gas_fee_cap: U256,
    pub gas: u64,
    /// `None` replays a contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub ticket_id: B256,
    pub refund_to: Address,
    pub max_refund: U256,
    pub submission_fee_refund: U256,
}

impl ArbitrumRetryTx {
    /// Transaction type identifier
    pub const TX_TYPE: u8 = ARBITRUM_RETRY_TX_TYPE;

    fn kind(&self) -> TxKind {
        TxKind::from(self.to)
    }

    fn fields_len(&self) -> usize {
        self.chain_id.length()
            + self.nonce.length()
            + self.from.length()
            + self.gas_fee_cap.length()
            + self.gas.length()
            + self.kind().length()
            + self.value.length()
            + self.data.length()
            + self.ticket_id.length()
            + self.refund_to.length()
            + self.max_refund.length()
            + self.submission_fee_refund.length()
    }

    /// Compute the hash of the retry transaction
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(1 + self.length());
        buf.push(Self::TX_TYPE);
        self.encode(&mut buf);
        keccak256(&buf)
    }
}

impl Encodable for ArbitrumRetryTx {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.fields_len(),
        }
        .encode(out);
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.from.encode(out);
        self.gas_fee_cap.encode(out);
        self.gas.encode(out);
        self.kind().encode(out);
        self.value.encode(out);
        self.data.encode(out);
        self.ticket_id.encode(out);
        self.refund_to.encode(out);
        self.max_refund.encode(out);
        self.submission_fee_refund.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.fields_len();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArbitrumRetryTx {
        ArbitrumRetryTx {
            chain_id: U256::from(412_346u64),
            nonce: 1,
            from: Address::repeat_byte(0x11),
            gas_fee_cap: U256::from(100_000_000u64),
            gas: 50_000,
            to: Some(Address::repeat_byte(0x22)),
            value: U256::from(5),
            data: Bytes::from_static(&[1, 2, 3]),
            ticket_id: B256::repeat_byte(0x33),
            refund_to: Address::repeat_byte(0x44),
            max_refund: U256::MAX,
            submission_fee_refund: U256::ZERO,
        }
    }

    #[test]
    fn encoding_is_a_single_list() {
        let tx = sample();
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        assert_eq!(buf.len(), tx.length());

        let header = Header::decode(&mut buf.as_slice()).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length + alloy_rlp::length_of_length(header.payload_length), buf.len());
    }

    #[test]
    fn creation_encodes_empty_destination() {
        let mut call = sample();
        let mut create = sample();
        create.to = None;
        assert_eq!(call.length(), create.length() + 20);
        assert_ne!(call.hash(), create.hash());

        call.nonce += 1;
        assert_ne!(call.hash(), sample().hash());
    }

    #[test]
    fn hash_is_typed() {
        let tx = sample();
        let mut buf = vec![ArbitrumRetryTx::TX_TYPE];
        tx.encode(&mut buf);
        assert_eq!(tx.hash(), keccak256(&buf));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_keeps_the_hash() {
        let tx = sample();
        let json = serde_json::to_string(&tx).unwrap();
        let back: ArbitrumRetryTx = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hash(), tx.hash());
    }
}
