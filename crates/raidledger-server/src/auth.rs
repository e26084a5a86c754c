//! Shared-secret verification for the webhook.
//!
//! The addon authenticates with a single shared secret, supplied either as a
//! URL path segment or as the `apiKey` body field. There is no user model —
//! one secret guards the whole surface.

use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// The secret accepted as valid for this server instance.
#[derive(Clone)]
pub struct SharedSecret(String);

impl SharedSecret {
  pub fn new(secret: impl Into<String>) -> Self {
    Self(secret.into())
  }

  /// Check a candidate secret. `None` (no secret supplied anywhere) and an
  /// empty configured secret both reject — a misconfigured server must not
  /// become an open endpoint.
  ///
  /// Both sides are hashed before comparison so the equality test does not
  /// early-exit on a shared prefix of the raw secret bytes.
  pub fn verify(&self, candidate: Option<&str>) -> Result<(), Error> {
    let candidate = candidate.ok_or(Error::Unauthorized)?;
    if self.0.is_empty() {
      return Err(Error::Unauthorized);
    }

    let expected = Sha256::digest(self.0.as_bytes());
    let presented = Sha256::digest(candidate.as_bytes());
    if expected == presented {
      Ok(())
    } else {
      Err(Error::Unauthorized)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn correct_secret_passes() {
    let secret = SharedSecret::new("hunter2");
    assert!(secret.verify(Some("hunter2")).is_ok());
  }

  #[test]
  fn wrong_secret_fails() {
    let secret = SharedSecret::new("hunter2");
    assert!(matches!(secret.verify(Some("hunter3")), Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_secret_fails() {
    let secret = SharedSecret::new("hunter2");
    assert!(matches!(secret.verify(None), Err(Error::Unauthorized)));
  }

  #[test]
  fn unconfigured_secret_rejects_everything() {
    let secret = SharedSecret::new("");
    assert!(matches!(secret.verify(Some("")), Err(Error::Unauthorized)));
    assert!(matches!(secret.verify(Some("anything")), Err(Error::Unauthorized)));
  }
}
