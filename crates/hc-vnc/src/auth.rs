//! Autenticación VNC (security type 2).
//!
//! Etapas: `ChallengeReceived -> ChallengeEncrypted -> ResponseSent`. El
//! servidor manda 16 bytes aleatorios; la contraseña se copia a una clave de
//! 8 bytes rellena con ceros, cada byte se invierte bit a bit (rareza
//! histórica del protocolo, no opcional) y cada mitad de 8 bytes se cifra con
//! DES de forma independiente (ECB, sin encadenar).

use std::fmt;
use std::io::{Read, Write};

use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;
use log::debug;

use crate::VncError;

pub const SECURITY_TYPE_VNC: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    ChallengeReceived,
    ChallengeEncrypted,
    ResponseSent,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        AuthStage::ChallengeReceived => "reading the challenge",
                        AuthStage::ChallengeEncrypted => "encrypting the challenge",
                        AuthStage::ResponseSent => "sending the response",
                    })
    }
}

fn reverse_bits(x: u8) -> u8 {
    let x = (x & 0x55) << 1 | (x & 0xAA) >> 1;
    let x = (x & 0x33) << 2 | (x & 0xCC) >> 2;
    (x & 0x0F) << 4 | (x & 0xF0) >> 4
}

/// Respuesta al desafío para `password`. Sólo se usan los primeros 8 bytes.
pub fn encrypt_challenge(password: &str, challenge: &[u8; 16]) -> [u8; 16] {
    let mut key = [0u8; 8];
    for (k, b) in key.iter_mut().zip(password.as_bytes()) {
        *k = reverse_bits(*b);
    }
    let cipher = Des::new(GenericArray::from_slice(&key));

    let mut response = *challenge;
    for half in response.chunks_exact_mut(8) {
        cipher.encrypt_block(GenericArray::from_mut_slice(half));
    }
    response
}

/// Handshake de password VNC sobre un stream ya en la fase de seguridad.
pub struct VncAuth<'a> {
    password: &'a str,
}

impl<'a> VncAuth<'a> {
    pub fn new(password: &'a str) -> Self {
        Self { password }
    }

    /// Lee el desafío, escribe la respuesta. Cualquier error de I/O corta el
    /// handshake sin reintentos.
    pub fn handshake<S: Read + Write>(&self, stream: &mut S) -> Result<AuthStage, VncError> {
        let mut challenge = [0u8; 16];
        stream.read_exact(&mut challenge)
              .map_err(|source| VncError::Auth { stage: AuthStage::ChallengeReceived,
                                                 source })?;
        let response = encrypt_challenge(self.password, &challenge);
        debug!("vnc challenge encrypted");
        stream.write_all(&response)
              .and_then(|_| stream.flush())
              .map_err(|source| VncError::Auth { stage: AuthStage::ResponseSent,
                                                 source })?;
        Ok(AuthStage::ResponseSent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reversal() {
        assert_eq!(reverse_bits(0b0000_0001), 0b1000_0000);
        assert_eq!(reverse_bits(0b1100_1010), 0b0101_0011);
        assert_eq!(reverse_bits(0xFF), 0xFF);
    }

    #[test]
    fn known_vector() {
        let challenge: [u8; 16] = core::array::from_fn(|i| i as u8);
        let expected = [0xee, 0x22, 0x53, 0x9f, 0x33, 0xa5, 0x98, 0x3e, 0xc1, 0x2f, 0x9c, 0x2e, 0xdb, 0xc9, 0x95, 0xdd];
        assert_eq!(encrypt_challenge("secret", &challenge), expected);
    }

    #[test]
    fn halves_are_not_chained() {
        let mut challenge = [7u8; 16];
        let a = encrypt_challenge("pw", &challenge);
        challenge[0] = 8;
        let b = encrypt_challenge("pw", &challenge);
        assert_ne!(a[..8], b[..8]);
        assert_eq!(a[8..], b[8..]);
    }

    #[test]
    fn only_first_eight_password_bytes_matter() {
        let c = [3u8; 16];
        assert_eq!(encrypt_challenge("12345678", &c), encrypt_challenge("123456789abc", &c));
    }
}
