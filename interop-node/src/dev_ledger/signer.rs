//! Sender resolution for dev ledger transactions.

use chain_clients_common::{decode_hex, keccak256, ConnectorError, EvmAddress};
use chain_clients_evm::Web3SigningCredential;
use k256::ecdsa::SigningKey;

/// Derives the Ethereum address of a secp256k1 private key:
/// keccak256(uncompressed_public_key)[12:32].
pub fn address_from_private_key(private_key_hex: &str) -> Result<EvmAddress, ConnectorError> {
    let bytes = decode_hex(private_key_hex)
        .map_err(|_| ConnectorError::Rejected("private key is not valid hex".to_string()))?;
    if bytes.len() != 32 {
        return Err(ConnectorError::Rejected(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let signing_key = SigningKey::from_slice(&bytes)
        .map_err(|e| ConnectorError::Rejected(format!("invalid secp256k1 private key: {}", e)))?;

    let public_key_point = signing_key.verifying_key().to_encoded_point(false);
    // Uncompressed format: 0x04 || x (32 bytes) || y (32 bytes)
    let public_key_bytes = public_key_point.as_bytes();
    Ok(EvmAddress::from_hash(&keccak256(&public_key_bytes[1..])))
}

/// Resolves the account a transaction is sent from.
///
/// `PRIVATE_KEY_HEX` credentials must derive to their `ethAccount`. Keychain
/// and keystore credentials are trusted as given. Sends without a credential
/// are rejected.
pub fn resolve_sender(credential: &Web3SigningCredential) -> Result<EvmAddress, ConnectorError> {
    let account = parse_account(credential)?;
    match credential {
        Web3SigningCredential::PrivateKeyHex { secret, .. } => {
            let derived = address_from_private_key(secret)?;
            if derived != account {
                return Err(ConnectorError::Rejected(format!(
                    "private key does not belong to account {}",
                    account
                )));
            }
            Ok(account)
        }
        _ => Ok(account),
    }
}

/// Account a read-only call is made from; the zero address without a credential.
pub fn resolve_caller(credential: &Web3SigningCredential) -> Result<EvmAddress, ConnectorError> {
    match credential {
        Web3SigningCredential::None => Ok(EvmAddress::default()),
        _ => parse_account(credential),
    }
}

fn parse_account(credential: &Web3SigningCredential) -> Result<EvmAddress, ConnectorError> {
    let account = credential
        .eth_account()
        .ok_or_else(|| ConnectorError::Rejected("transaction requires a signing credential".to_string()))?;
    account
        .parse()
        .map_err(|e| ConnectorError::Rejected(format!("invalid ethAccount '{}': {}", account, e)))
}
