//! Transaction Builder

use crate::coin::{self, Coin, CoinDiff};
use crate::fee::{self, Fee, FeeAlgorithm};
use crate::tx::{txaux_serialize_size, Tx, TxAux, TxInWitness, TxOut, TxWitness, TxoPointer};
use crate::txutils::OutputPolicy;
use std::iter::Iterator;
use std::{error, fmt, iter, result};

/// the maximum size, in bytes, of a serialized signed transaction
/// accepted by the network.
pub const TX_SIZE_LIMIT: usize = 4096;

// adjusting the change value may change its encoded size and thus the
// fee; the balancing fixpoint is reached well within this bound
const CHANGE_BALANCING_ROUNDS: usize = 8;

/// Transaction Builder composed of inputs, outputs
#[derive(Clone)]
pub struct TxBuilder {
    inputs: Vec<(TxoPointer, Coin)>,
    outputs: Vec<TxOut>,
}

#[derive(Debug)]
pub enum Error {
    TxInvalidNoInput,
    TxInvalidNoOutput,
    TxNotEnoughTotalInput,
    TxOverLimit(usize),
    TxSignaturesExceeded,
    TxSignaturesMismatch,
    CoinError(coin::Error),
    FeeError(fee::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TxInvalidNoInput => write!(f, "Transaction is invalid, no input."),
            Error::TxInvalidNoOutput => write!(f, "Transaction is invalid, no output."),
            Error::TxNotEnoughTotalInput => {
                write!(f, "Transaction inputs do not cover the outputs and fee.")
            }
            Error::TxOverLimit(sz) => write!(
                f,
                "Transaction too big, current size is {} bytes but limit size is {}.",
                sz, TX_SIZE_LIMIT
            ),
            Error::TxSignaturesExceeded => write!(f, "Transaction has already enough signatures"),
            Error::TxSignaturesMismatch => write!(
                f,
                "Number of signatures does not match the number of witnesses"
            ),
            Error::CoinError(_) => write!(f, "Error while performing value operation"),
            Error::FeeError(_) => write!(f, "Error while performing fee operation"),
        }
    }
}
impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match self {
            Error::CoinError(ref err) => Some(err),
            Error::FeeError(ref err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

impl From<coin::Error> for Error {
    fn from(e: coin::Error) -> Error {
        Error::CoinError(e)
    }
}
impl From<fee::Error> for Error {
    fn from(e: fee::Error) -> Error {
        Error::FeeError(e)
    }
}

impl TxBuilder {
    /// Create a new empty transaction builder
    pub fn new() -> Self {
        TxBuilder {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add_input(&mut self, iptr: &TxoPointer, ivalue: Coin) {
        self.inputs.push((iptr.clone(), ivalue))
    }

    pub fn add_output_value(&mut self, o: &TxOut) {
        self.outputs.push(o.clone())
    }

    pub fn calculate_fee<F: FeeAlgorithm>(&self, f: F) -> Result<Fee> {
        let tx = self.clone().make_tx_nocheck();
        let fake_witnesses = self.fake_witnesses();
        let fee = f.calculate_for_txaux_component(&tx, &fake_witnesses)?;
        Ok(fee)
    }

    /// size in bytes of the transaction serialized with one placeholder
    /// witness per input, the same shape the fee is estimated over
    pub fn current_size(&self) -> usize {
        let tx = self.clone().make_tx_nocheck();
        txaux_serialize_size(&tx, &self.fake_witnesses())
    }

    fn fake_witnesses(&self) -> Vec<TxInWitness> {
        iter::repeat(TxInWitness::fake())
            .take(self.inputs.len())
            .collect()
    }

    pub fn get_input_total(&self) -> Result<Coin> {
        let total = self
            .inputs
            .iter()
            .fold(Coin::new(0), |acc, c| acc.and_then(|v| v + c.1))?;
        Ok(total)
    }

    pub fn get_output_total(&self) -> Result<Coin> {
        let total = self
            .outputs
            .iter()
            .fold(Coin::new(0), |acc, c| acc.and_then(|v| v + c.value))?;
        Ok(total)
    }

    /// the signed difference between the inputs and the outputs,
    /// the fee left aside
    pub fn balance_without_fees(&self) -> Result<CoinDiff> {
        let inputs = self.get_input_total()?;
        let outputs = self.get_output_total()?;
        Ok(inputs.differential(outputs))
    }

    /// the signed difference between the inputs and the outputs plus
    /// the fee the transaction would pay in its current shape
    pub fn balance<F: FeeAlgorithm>(&self, f: F) -> Result<CoinDiff> {
        let fee = self.calculate_fee(f)?;
        let inputs = self.get_input_total()?;
        let outputs = self.get_output_total()?;
        let outputs_fees = (outputs + fee.to_coin())?;
        Ok(inputs.differential(outputs_fees))
    }

    /// Assign the leftover value, if any, to an output with the address
    /// of the given policy, leaving the transaction exactly balanced.
    ///
    /// If the transaction is already consuming all inputs in its outputs
    /// and fee, this has no effect. If there is not enough input value
    /// compared to the existing outputs, `TxNotEnoughTotalInput` is
    /// returned. If the leftover is too small to cover the fee increase
    /// of the appended output, or appending it would grow the transaction
    /// beyond `TX_SIZE_LIMIT`, no output is appended and the leftover is
    /// given up to the fee.
    ///
    /// Note: the calculation is not done again if more inputs or outputs
    /// are added after this call; in most typical cases this should be
    /// the last addition to the transaction.
    pub fn add_output_policy<F: FeeAlgorithm>(
        &mut self,
        fee_algorithm: F,
        policy: &OutputPolicy,
    ) -> Result<Vec<TxOut>> {
        let leftover = match self.balance(&fee_algorithm)? {
            CoinDiff::Negative(_) => return Err(Error::TxNotEnoughTotalInput),
            CoinDiff::Zero => return Ok(Vec::new()),
            CoinDiff::Positive(value) => value,
        };

        let OutputPolicy::One(ref change_addr) = *policy;

        let mut change = leftover;
        for _ in 0..CHANGE_BALANCING_ROUNDS {
            let mut candidate = self.clone();
            candidate.add_output_value(&TxOut::new(change_addr.clone(), change));
            if candidate.current_size() > TX_SIZE_LIMIT {
                return Ok(Vec::new());
            }
            match candidate.balance(&fee_algorithm)? {
                CoinDiff::Zero => {
                    let txout = TxOut::new(change_addr.clone(), change);
                    *self = candidate;
                    return Ok(vec![txout]);
                }
                CoinDiff::Negative(delta) => {
                    // the appended output made the fee grow: shrink the
                    // change accordingly, or give the leftover up to the
                    // fee when it cannot cover the growth
                    match change - delta {
                        None => return Ok(Vec::new()),
                        Some(value) if value == Coin::zero() => return Ok(Vec::new()),
                        Some(value) => change = value,
                    }
                }
                CoinDiff::Positive(delta) => {
                    change = (change + delta)?;
                }
            }
        }
        Ok(Vec::new())
    }

    fn make_tx_nocheck(self) -> Tx {
        let inputs = self.inputs.iter().map(|(v, _)| v.clone()).collect();
        Tx::new_with(inputs, self.outputs)
    }

    pub fn make_tx(self) -> Result<Tx> {
        if self.inputs.len() == 0 {
            return Err(Error::TxInvalidNoInput);
        }
        if self.outputs.len() == 0 {
            return Err(Error::TxInvalidNoOutput);
        }
        Ok(self.make_tx_nocheck())
    }
}

/// Transaction finalized, ready to be signed: witnesses are appended
/// in the order of the transaction's inputs
#[derive(Clone)]
pub struct TxFinalized {
    tx: Tx,
    witnesses: TxWitness,
}

impl TxFinalized {
    pub fn new(tx: Tx) -> Self {
        TxFinalized {
            tx: tx,
            witnesses: TxWitness::new(),
        }
    }

    pub fn add_witness(&mut self, witness: TxInWitness) -> Result<()> {
        if self.witnesses.len() >= self.tx.inputs.len() {
            return Err(Error::TxSignaturesExceeded);
        }
        self.witnesses.push(witness);
        Ok(())
    }

    pub fn make_txaux(self) -> Result<TxAux> {
        if self.witnesses.len() != self.tx.inputs.len() {
            return Err(Error::TxSignaturesMismatch);
        }
        let sz = txaux_serialize_size(&self.tx, &(*self.witnesses));
        if sz > TX_SIZE_LIMIT {
            return Err(Error::TxOverLimit(sz));
        }
        let txaux = TxAux::new(self.tx, self.witnesses);
        Ok(txaux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ExtendedAddr;
    use crate::coin::MAX_COIN;
    use crate::config::{NetworkMagic, ProtocolMagic};
    use crate::fee::LinearFee;
    use crate::hdwallet;
    use crate::tx::TxId;

    fn any_address(discriminant: u8) -> ExtendedAddr {
        let seed = hdwallet::Seed::from_bytes([discriminant; hdwallet::SEED_SIZE]);
        let xprv = hdwallet::XPrv::generate_from_seed(&seed);
        ExtendedAddr::new_simple(xprv.public(), NetworkMagic::NoMagic)
    }

    fn any_input() -> TxoPointer {
        TxoPointer::new(TxId::new(&[0; 32]), 1)
    }

    #[test]
    fn add_input_accepts_bounded_values() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        assert_eq!(builder.get_input_total().unwrap(), Coin::new(1000).unwrap());
    }

    #[test]
    fn input_total_overflow() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(MAX_COIN).unwrap());
        builder.add_input(&any_input(), Coin::new(1).unwrap());

        match builder.get_input_total() {
            Err(Error::CoinError(coin::Error::OutOfBound(_))) => (),
            r => panic!("expected an out of bound input total, got {:?}", r),
        }
        match builder.balance(&LinearFee::default()) {
            Err(Error::CoinError(coin::Error::OutOfBound(_))) => (),
            r => panic!("expected an out of bound balance, got {:?}", r),
        }
        match builder.balance_without_fees() {
            Err(Error::CoinError(coin::Error::OutOfBound(_))) => (),
            r => panic!("expected an out of bound balance, got {:?}", r),
        }
    }

    #[test]
    fn output_total_overflow() {
        let mut builder = TxBuilder::new();
        let addr = any_address(1);
        builder.add_output_value(&TxOut::new(addr.clone(), Coin::new(MAX_COIN).unwrap()));
        builder.add_output_value(&TxOut::new(addr, Coin::new(1).unwrap()));

        match builder.get_output_total() {
            Err(Error::CoinError(coin::Error::OutOfBound(_))) => (),
            r => panic!("expected an out of bound output total, got {:?}", r),
        }
    }

    #[test]
    fn finalize_requires_inputs() {
        let mut builder = TxBuilder::new();
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));
        match builder.make_tx() {
            Err(Error::TxInvalidNoInput) => (),
            _ => panic!("expected TxInvalidNoInput"),
        }
    }

    #[test]
    fn finalize_requires_outputs() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        match builder.make_tx() {
            Err(Error::TxInvalidNoOutput) => (),
            _ => panic!("expected TxInvalidNoOutput"),
        }
    }

    #[test]
    fn witness_counting() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));
        let tx = builder.make_tx().unwrap();
        let txid = tx.id();

        let seed = hdwallet::Seed::from_bytes([0; hdwallet::SEED_SIZE]);
        let xprv = hdwallet::XPrv::generate_from_seed(&seed);
        let protocol_magic = ProtocolMagic::from(1);

        let mut finalized = TxFinalized::new(tx);
        finalized
            .add_witness(TxInWitness::new(protocol_magic, &xprv, &txid))
            .unwrap();
        match finalized.add_witness(TxInWitness::new(protocol_magic, &xprv, &txid)) {
            Err(Error::TxSignaturesExceeded) => (),
            _ => panic!("expected TxSignaturesExceeded"),
        }

        assert!(finalized.make_txaux().is_ok());
    }

    #[test]
    fn too_few_witnesses() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        builder.add_input(&TxoPointer::new(TxId::new(&[0; 32]), 2), Coin::new(1000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));
        let tx = builder.make_tx().unwrap();
        let txid = tx.id();

        let seed = hdwallet::Seed::from_bytes([0; hdwallet::SEED_SIZE]);
        let xprv = hdwallet::XPrv::generate_from_seed(&seed);

        let mut finalized = TxFinalized::new(tx);
        finalized
            .add_witness(TxInWitness::new(ProtocolMagic::from(1), &xprv, &txid))
            .unwrap();
        match finalized.make_txaux() {
            Err(Error::TxSignaturesMismatch) => (),
            _ => panic!("expected TxSignaturesMismatch"),
        }
    }

    #[test]
    fn balance_identities() {
        let fee_alg = LinearFee::default();
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1_000_000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));

        // input_total - output_total == balance_without_fees
        match builder.balance_without_fees().unwrap() {
            CoinDiff::Positive(value) => {
                assert_eq!(value, Coin::new(1_000_000 - 1000).unwrap());
            }
            r => panic!("expected a positive balance, got {:?}", r),
        }

        // balance == balance_without_fees - fee
        let fee = builder.calculate_fee(&fee_alg).unwrap();
        match builder.balance(&fee_alg).unwrap() {
            CoinDiff::Positive(value) => {
                let expected = ((Coin::new(1_000_000 - 1000).unwrap()) - fee.to_coin()).unwrap();
                assert_eq!(value, expected);
            }
            r => panic!("expected a positive balance, got {:?}", r),
        }
    }

    #[test]
    fn balance_negative_on_empty_builder() {
        let fee_alg = LinearFee::default();
        let builder = TxBuilder::new();
        match builder.balance(&fee_alg).unwrap() {
            CoinDiff::Negative(value) => {
                assert_eq!(value, fee_alg.estimate(builder.current_size()).unwrap().to_coin());
            }
            r => panic!("expected a negative balance, got {:?}", r),
        }
    }

    #[test]
    fn change_balances_the_transaction() {
        let fee_alg = LinearFee::default();
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(10_000_000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));

        let change = builder
            .add_output_policy(&fee_alg, &OutputPolicy::One(any_address(2)))
            .unwrap();
        assert_eq!(change.len(), 1);

        match builder.balance(&fee_alg).unwrap() {
            CoinDiff::Zero => (),
            r => panic!("expected a balanced transaction, got {:?}", r),
        }

        // output_total + fee == input_total
        let fee = builder.calculate_fee(&fee_alg).unwrap();
        let consumed = (builder.get_output_total().unwrap() + fee.to_coin()).unwrap();
        assert_eq!(consumed, builder.get_input_total().unwrap());
    }

    #[test]
    fn change_requires_enough_inputs() {
        let fee_alg = LinearFee::default();
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));

        match builder.add_output_policy(&fee_alg, &OutputPolicy::One(any_address(2))) {
            Err(Error::TxNotEnoughTotalInput) => (),
            r => panic!("expected TxNotEnoughTotalInput, got {:?}", r.map(|_| ())),
        }
    }

    #[test]
    fn tiny_leftover_goes_to_the_fee() {
        let fee_alg = LinearFee::default();

        let mut trial = TxBuilder::new();
        trial.add_input(&any_input(), Coin::new(10_000_000).unwrap());
        trial.add_output_value(&TxOut::new(any_address(1), Coin::new(1_000_000).unwrap()));
        let leftover = match trial.balance(&fee_alg).unwrap() {
            CoinDiff::Positive(value) => value,
            r => panic!("expected a positive balance, got {:?}", r),
        };

        // shift all but a few coins of the leftover into the output so
        // what remains cannot pay for an extra change output
        let output = (Coin::new(1_000_000).unwrap() + leftover)
            .unwrap()
            .differential(Coin::new(10).unwrap());
        let output = match output {
            CoinDiff::Positive(value) => value,
            r => panic!("expected a positive output value, got {:?}", r),
        };

        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(10_000_000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), output));

        let change = builder
            .add_output_policy(&fee_alg, &OutputPolicy::One(any_address(2)))
            .unwrap();
        assert!(change.is_empty());
    }

    #[test]
    fn signed_tx_fits_the_size_limit() {
        let mut builder = TxBuilder::new();
        builder.add_input(&any_input(), Coin::new(1000).unwrap());
        builder.add_output_value(&TxOut::new(any_address(1), Coin::new(1000).unwrap()));
        let tx = builder.make_tx().unwrap();
        let txid = tx.id();

        let seed = hdwallet::Seed::from_bytes([0; hdwallet::SEED_SIZE]);
        let xprv = hdwallet::XPrv::generate_from_seed(&seed);

        let mut finalized = TxFinalized::new(tx);
        finalized
            .add_witness(TxInWitness::new(ProtocolMagic::from(1), &xprv, &txid))
            .unwrap();
        let txaux = finalized.make_txaux().unwrap();
        assert!(cbor!(&txaux).unwrap().len() <= TX_SIZE_LIMIT);
    }
}
