//! SHADE Authorization Protocol
//!
//! Gates decryption of stored ciphertexts per instance. An account signs a
//! typed, domain-separated message binding its reencryption public key to one
//! instance; the instance's authorizer verifies it and issues a grant; the
//! grant then lets the backend reencrypt that instance's ciphertexts (and,
//! for owned values, only the signer's own) to the caller's key.

pub mod address;
pub mod errors;
pub mod grant;
pub mod signer;
pub mod typed_data;

pub use address::{Account, InstanceId};
pub use errors::{AuthError, AuthResult};
pub use grant::{Authorizer, InstanceInfo, ReencryptionGrant, ScopedCiphertext};
pub use signer::{LocalSigner, Signature};
pub use typed_data::{Domain, Reencrypt, DOMAIN_NAME, DOMAIN_VERSION};
