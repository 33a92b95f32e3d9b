use ckb_types::core::{FeeRate, TransactionView};

/// Decides the fee of a transaction draft. The draft already has its final
/// shape, only output capacities may still change.
pub trait FeePolicy: Send + Sync {
    fn fee(&self, tx: &TransactionView) -> u64;
}

/// A constant fee, whatever the transaction looks like
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FixedFee(pub u64);

impl FeePolicy for FixedFee {
    fn fee(&self, _tx: &TransactionView) -> u64 {
        self.0
    }
}

/// Fee by serialized size, `fee_rate` is in shannons per 1000 bytes
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FeeCalculator {
    fee_rate: u64,
}

impl FeeCalculator {
    pub fn new(fee_rate: u64) -> Self {
        Self { fee_rate }
    }

    pub fn fee_rate(&self) -> u64 {
        self.fee_rate
    }

    pub fn fee_with_size(&self, tx_size: u64) -> u64 {
        let fee_rate = FeeRate::from_u64(self.fee_rate);
        fee_rate.fee(tx_size).as_u64()
    }
}

impl FeePolicy for FeeCalculator {
    fn fee(&self, tx: &TransactionView) -> u64 {
        let tx_size = tx.data().as_reader().serialized_size_in_block();
        self.fee_with_size(tx_size as u64)
    }
}
