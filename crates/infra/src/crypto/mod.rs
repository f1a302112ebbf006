//! Token encryption for the KSeF handshake

mod token_encryption;

pub use token_encryption::{
    encrypt_token, load_public_key, parse_public_key, PemFileTokenEncryptor, RsaTokenEncryptor,
};
