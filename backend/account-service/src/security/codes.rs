//! Activation code generation

use crate::models::activation::ACTIVATION_CODE_LENGTH;
use rand::rngs::OsRng;
use rand::RngCore;

/// 10^6 possible codes
const CODE_SPACE: u32 = 1_000_000;

/// Largest multiple of `CODE_SPACE` that fits in a u32; draws at or above it
/// are rejected so that `draw % CODE_SPACE` stays uniform.
const ACCEPT_BELOW: u32 = u32::MAX - (u32::MAX % CODE_SPACE);

/// Source of activation codes
pub trait CodeGenerator: Send + Sync {
    /// A fresh zero-padded 6-digit code
    fn generate(&self) -> Result<String, rand::Error>;
}

/// Draws codes from the operating system CSPRNG
#[derive(Debug, Clone, Default)]
pub struct OsRngCodeGenerator;

impl CodeGenerator for OsRngCodeGenerator {
    fn generate(&self) -> Result<String, rand::Error> {
        let mut buf = [0u8; 4];
        loop {
            OsRng.try_fill_bytes(&mut buf)?;
            let draw = u32::from_le_bytes(buf);
            if draw < ACCEPT_BELOW {
                return Ok(format!(
                    "{:0width$}",
                    draw % CODE_SPACE,
                    width = ACTIVATION_CODE_LENGTH
                ));
            }
        }
    }
}
