//! Key derivation: Argon2i password → master key

use std::time::Duration;

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};

use onionlink_core::consts::{ARGON2_MIN_TIME_COST, ARGON2_SALT_LENGTH, SYMMETRIC_KEY_LENGTH};
use onionlink_core::{Error, FatalKind, Result};

use crate::keys::SymmetricKey;

/// Rounds of measurement before calibration gives up.
const MAX_CALIBRATION_ROUNDS: usize = 32;

/// Argon2i cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Time cost / iterations
    pub time_cost: u32,
    /// Memory cost in KiB
    pub memory_cost_kib: u32,
    /// Lanes (and threads)
    pub parallelism: u32,
}

impl KdfParams {
    fn validate(&self) -> Result<()> {
        if self.time_cost == 0 {
            return Err(Error::fatal(
                FatalKind::InvalidParameter,
                "time cost must be greater than zero",
            ));
        }
        if self.memory_cost_kib == 0 {
            return Err(Error::fatal(
                FatalKind::InvalidParameter,
                "memory cost must be greater than zero",
            ));
        }
        if self.parallelism == 0 {
            return Err(Error::fatal(
                FatalKind::InvalidParameter,
                "parallelism must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Derive a 256-bit key from a password and a 32-byte salt using Argon2i.
///
/// Argon2i's memory access pattern does not depend on the password, which
/// keeps the derivation free of cache-timing side channels.
pub fn argon2_kdf(
    password: &SecretString,
    salt: &[u8],
    params: &KdfParams,
) -> Result<SymmetricKey> {
    if salt.len() != ARGON2_SALT_LENGTH {
        return Err(Error::fatal(
            FatalKind::InvalidLength,
            format!(
                "invalid salt length ({} bytes), expected {ARGON2_SALT_LENGTH} bytes",
                salt.len()
            ),
        ));
    }
    if password.expose_secret().is_empty() {
        return Err(Error::fatal(
            FatalKind::InvalidParameter,
            "password cannot be empty",
        ));
    }
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(SYMMETRIC_KEY_LENGTH),
    )
    .map_err(|e| Error::fatal(FatalKind::InvalidParameter, format!("invalid Argon2i params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2i, Version::V0x13, argon2_params);

    let mut key = [0u8; SYMMETRIC_KEY_LENGTH];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| Error::fatal(FatalKind::CryptoFailure, format!("Argon2i key derivation failed: {e}")))?;

    Ok(SymmetricKey::from_bytes(key))
}

/// Find a time cost whose derivation time falls inside `[min, max]`.
///
/// `measure` runs (or simulates) one derivation at the given time cost and
/// reports how long it took. The search grows the time cost proportionally
/// while derivation is too fast and bisects once it has overshot. If even the
/// minimum time cost is too slow, the minimum is returned; if the window is
/// narrower than one step, the faster-than-max side is abandoned in favour of
/// the slower candidate.
pub fn calibrate_time_cost<F>(start: u32, min: Duration, max: Duration, mut measure: F) -> Result<u32>
where
    F: FnMut(u32) -> Result<Duration>,
{
    if min > max {
        return Err(Error::fatal(
            FatalKind::InvalidParameter,
            "minimum derivation time exceeds maximum",
        ));
    }

    let target = (min + max) / 2;
    // largest time cost known to be too fast, smallest known to be too slow
    let mut too_fast: Option<u32> = None;
    let mut too_slow: Option<u32> = None;
    let mut time_cost = start.max(ARGON2_MIN_TIME_COST);

    for _ in 0..MAX_CALIBRATION_ROUNDS {
        let elapsed = measure(time_cost)?;
        tracing::debug!(
            time_cost,
            elapsed_ms = elapsed.as_millis() as u64,
            "measured key derivation"
        );

        time_cost = if elapsed < min {
            too_fast = Some(time_cost);
            match too_slow {
                Some(hi) if hi - time_cost <= 1 => return Ok(hi),
                Some(hi) => time_cost + (hi - time_cost) / 2,
                None => {
                    let secs = elapsed.as_secs_f64().max(0.001);
                    let estimate = (f64::from(time_cost) * target.as_secs_f64() / secs).ceil();
                    (estimate.min(f64::from(u32::MAX)) as u32).max(time_cost.saturating_add(1))
                }
            }
        } else if elapsed > max {
            too_slow = Some(time_cost);
            match too_fast {
                Some(lo) if time_cost - lo <= 1 => return Ok(time_cost),
                Some(lo) => lo + (time_cost - lo) / 2,
                None if time_cost <= ARGON2_MIN_TIME_COST => {
                    tracing::warn!(
                        "key derivation exceeds the time target even at the minimum time cost"
                    );
                    return Ok(time_cost);
                }
                None => (time_cost / 2).max(ARGON2_MIN_TIME_COST),
            }
        } else {
            return Ok(time_cost);
        };
    }

    Err(Error::fatal(
        FatalKind::InvalidParameter,
        "key derivation time calibration did not converge",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams {
            time_cost: 1,
            memory_cost_kib: 1024,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let password = SecretString::from("test-password-123");
        let salt = [1u8; ARGON2_SALT_LENGTH];

        let key1 = argon2_kdf(&password, &salt, &fast_params()).unwrap();
        let key2 = argon2_kdf(&password, &salt, &fast_params()).unwrap();

        assert_eq!(key1.as_bytes().len(), SYMMETRIC_KEY_LENGTH);
        assert_eq!(key1, key2, "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_different_passwords() {
        let salt = [1u8; ARGON2_SALT_LENGTH];
        let key1 = argon2_kdf(&SecretString::from("password-a"), &salt, &fast_params()).unwrap();
        let key2 = argon2_kdf(&SecretString::from("password-b"), &salt, &fast_params()).unwrap();
        assert_ne!(key1, key2, "different passwords must produce different keys");
    }

    #[test]
    fn test_kdf_different_salts() {
        let password = SecretString::from("same-password");
        let key1 = argon2_kdf(&password, &[1u8; ARGON2_SALT_LENGTH], &fast_params()).unwrap();
        let key2 = argon2_kdf(&password, &[2u8; ARGON2_SALT_LENGTH], &fast_params()).unwrap();
        assert_ne!(key1, key2, "different salts must produce different keys");
    }

    #[test]
    fn test_kdf_rejects_bad_salt() {
        let err = argon2_kdf(&SecretString::from("pw"), &[0u8; 16], &fast_params()).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidLength));
    }

    #[test]
    fn test_kdf_rejects_empty_password() {
        let err = argon2_kdf(&SecretString::from(""), &[0u8; 32], &fast_params()).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidParameter));
    }

    #[test]
    fn test_kdf_rejects_zero_costs() {
        let salt = [0u8; ARGON2_SALT_LENGTH];
        let password = SecretString::from("pw");
        for params in [
            KdfParams { time_cost: 0, ..fast_params() },
            KdfParams { memory_cost_kib: 0, ..fast_params() },
            KdfParams { parallelism: 0, ..fast_params() },
        ] {
            let err = argon2_kdf(&password, &salt, &params).unwrap_err();
            assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidParameter));
        }
    }

    #[test]
    fn test_calibrate_scales_up() {
        let t = calibrate_time_cost(1, Duration::from_secs(3), Duration::from_secs(4), |t| {
            Ok(Duration::from_millis(700 * u64::from(t)))
        })
        .unwrap();
        let elapsed = Duration::from_millis(700 * u64::from(t));
        assert!(elapsed >= Duration::from_secs(3) && elapsed <= Duration::from_secs(4));
    }

    #[test]
    fn test_calibrate_narrow_window_picks_slower() {
        let t = calibrate_time_cost(
            1,
            Duration::from_millis(2500),
            Duration::from_millis(2600),
            |t| Ok(Duration::from_secs(u64::from(t))),
        )
        .unwrap();
        assert_eq!(t, 3);
    }

    #[test]
    fn test_calibrate_scales_down() {
        let t = calibrate_time_cost(40, Duration::from_secs(3), Duration::from_secs(4), |t| {
            Ok(Duration::from_millis(500 * u64::from(t)))
        })
        .unwrap();
        assert!((6..=8).contains(&t), "got {t}");
    }

    #[test]
    fn test_calibrate_minimum_too_slow() {
        let t = calibrate_time_cost(1, Duration::from_secs(3), Duration::from_secs(4), |_| {
            Ok(Duration::from_secs(10))
        })
        .unwrap();
        assert_eq!(t, ARGON2_MIN_TIME_COST);
    }

    #[test]
    fn test_calibrate_propagates_measure_error() {
        let err = calibrate_time_cost(1, Duration::from_secs(3), Duration::from_secs(4), |_| {
            Err(Error::fatal(FatalKind::CryptoFailure, "boom"))
        })
        .unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::CryptoFailure));
    }
}
