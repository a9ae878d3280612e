//! The encrypted-integer capability
//!
//! `FheBackend` is the full surface the ledgers and the pool are allowed to
//! use. It never returns plaintext: the only way out of the ciphertext domain
//! is `reencrypt`, which seals the value to a caller-held key.
//!
//! `FheBackendExt` builds every conditional and bounded operation the engine
//! needs (checked arithmetic, min, division, square root) out of the trait
//! primitives alone, so each backend only implements the small core.

use crate::ciphertext::{Ciphertext, EncryptedBool};
use crate::sealed::{EncryptedInput, NetworkPublicKey, ReencryptionPublicKey, SealedValue};
use crate::{FheResult, MAX_AMOUNT};

/// Bits in an amount; quotients and square roots are searched over this width
pub const AMOUNT_BITS: u32 = 32;

/// Homomorphic operations over 64-bit encrypted slots
///
/// `add`, `sub` and `mul` wrap modulo 2^64. Callers keep operands within the
/// 32-bit amount range so that sums and pairwise products never wrap.
pub trait FheBackend: Send + Sync {
    /// Key clients seal their inputs to
    fn network_public_key(&self) -> NetworkPublicKey;

    /// Import a client-encrypted amount into the ciphertext domain
    fn import_input(&self, input: &EncryptedInput) -> FheResult<Ciphertext>;

    /// Trivial (public) encryption of a constant
    fn trivial(&self, value: u64) -> FheResult<Ciphertext>;

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext>;

    fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext>;

    fn mul(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext>;

    /// Encrypted `a >= b`
    fn ge(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<EncryptedBool>;

    fn and(&self, a: &EncryptedBool, b: &EncryptedBool) -> FheResult<EncryptedBool>;

    fn not(&self, a: &EncryptedBool) -> FheResult<EncryptedBool>;

    /// Conditional select: if `cond` then `a` else `b`
    fn select(&self, cond: &EncryptedBool, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext>;

    /// Decrypt under authorization: seal the plaintext to `recipient`
    fn reencrypt(&self, ct: &Ciphertext, recipient: &ReencryptionPublicKey) -> FheResult<SealedValue>;
}

/// Derived encrypted operations
pub trait FheBackendExt: FheBackend {
    fn zero(&self) -> FheResult<Ciphertext> {
        self.trivial(0)
    }

    /// Encrypted `a == 0`
    fn is_zero(&self, a: &Ciphertext) -> FheResult<EncryptedBool> {
        self.ge(&self.zero()?, a)
    }

    fn min(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        let a_ge_b = self.ge(a, b)?;
        self.select(&a_ge_b, b, a)
    }

    /// Bounded addition under the reject policy
    ///
    /// Returns `(a + b, true)` when the sum stays within `MAX_AMOUNT`, and
    /// `(a, false)` otherwise. Both operands must already be amounts.
    fn checked_add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<(Ciphertext, EncryptedBool)> {
        let sum = self.add(a, b)?;
        let fits = self.ge(&self.trivial(MAX_AMOUNT)?, &sum)?;
        let value = self.select(&fits, &sum, a)?;
        Ok((value, fits))
    }

    /// Subtraction that leaves `a` unchanged instead of underflowing
    fn checked_sub(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<(Ciphertext, EncryptedBool)> {
        let enough = self.ge(a, b)?;
        let diff = self.sub(a, b)?;
        let value = self.select(&enough, &diff, a)?;
        Ok((value, enough))
    }

    /// `amount` when `cond` holds, zero otherwise
    fn amount_if(&self, cond: &EncryptedBool, amount: &Ciphertext) -> FheResult<Ciphertext> {
        self.select(cond, amount, &self.zero()?)
    }

    /// Floor division by bitwise restoring search
    ///
    /// `divisor` must be an amount (below 2^32) so every probe product fits
    /// the 64-bit slot. The quotient saturates at `MAX_AMOUNT`; a zero divisor
    /// yields zero.
    fn div(&self, numerator: &Ciphertext, divisor: &Ciphertext) -> FheResult<Ciphertext> {
        let mut quotient = self.zero()?;
        for bit in (0..AMOUNT_BITS).rev() {
            let candidate = self.add(&quotient, &self.trivial(1u64 << bit)?)?;
            let product = self.mul(&candidate, divisor)?;
            let fits = self.ge(numerator, &product)?;
            quotient = self.select(&fits, &candidate, &quotient)?;
        }
        let divisor_is_zero = self.is_zero(divisor)?;
        self.select(&divisor_is_zero, &self.zero()?, &quotient)
    }

    /// Floor square root of a 64-bit value
    fn isqrt(&self, value: &Ciphertext) -> FheResult<Ciphertext> {
        let mut root = self.zero()?;
        for bit in (0..AMOUNT_BITS).rev() {
            let candidate = self.add(&root, &self.trivial(1u64 << bit)?)?;
            let square = self.mul(&candidate, &candidate)?;
            let fits = self.ge(value, &square)?;
            root = self.select(&fits, &candidate, &root)?;
        }
        Ok(root)
    }
}

impl<B: FheBackend + ?Sized> FheBackendExt for B {}
