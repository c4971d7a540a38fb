use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;
type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;

const AES_BLOCK_SIZE: usize = 16;

/// Key shared by every unit of the device family. Only used for scan and
/// bind, before a device hands out its own session key.
pub const GENERAL_KEY: &[u8; 16] = b"a3K8Bx%2r8Y7#xDh";

/// AES-128/ECB/PKCS7 encrypt `plaintext`, returning standard Base64.
pub fn encrypt(key: &[u8], plaintext: &str) -> Result<String> {
    let cipher = Aes128EcbEnc::new_from_slice(key)
        .map_err(|_| Error::Encryption(format!("key must be 16 bytes, got {}", key.len())))?;

    let bytes = plaintext.as_bytes();
    let padded_len = (bytes.len() / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..bytes.len()].copy_from_slice(bytes);

    let encrypted = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buf, bytes.len())
        .map_err(|_| Error::Encryption("padding buffer too small".to_string()))?;
    Ok(STANDARD.encode(encrypted))
}

/// Inverse of [`encrypt`]. Fails on bad Base64, bad padding, a wrong key
/// length or a plaintext that is not UTF-8.
pub fn decrypt(key: &[u8], ciphertext: &str) -> Result<String> {
    let cipher = Aes128EcbDec::new_from_slice(key)
        .map_err(|_| Error::Decryption(format!("key must be 16 bytes, got {}", key.len())))?;

    let mut buf = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| Error::Decryption(format!("invalid base64: {e}")))?;
    if buf.is_empty() || buf.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::Decryption(format!(
            "ciphertext length {} is not a multiple of {AES_BLOCK_SIZE}",
            buf.len()
        )));
    }

    let decrypted = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| Error::Decryption("invalid padding".to_string()))?;
    String::from_utf8(decrypted.to_vec())
        .map_err(|e| Error::Decryption(format!("plaintext is not UTF-8: {e}")))
}
