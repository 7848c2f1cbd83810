//! Property-based tests for access token minting and validation
//!
//! These tests verify:
//! - Minted tokens roundtrip to the same identity for any user
//! - Malformed tokens never cause panics and are always rejected
//! - Any change to the signature is detected
//! - Signing key length validation

mod common;

use planner_auth_core::{AuthConfig, AuthError, SigningKey, TokenIssuer};
use planner_types::{Role, SessionId, UserId, UserProfile};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use common::TEST_SECRET;

const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn issuer() -> TokenIssuer {
    TokenIssuer::new(Arc::new(AuthConfig::try_new(TEST_SECRET).unwrap()))
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Admin)]
}

/// Generate arbitrary user profiles
fn arb_profile() -> impl Strategy<Value = UserProfile> {
    (
        any::<[u8; 16]>(),
        "\\PC{0,40}",                             // any printable user name
        "[a-z0-9_.+-]+@[a-z0-9.-]+\\.[a-z]{2,4}", // email regex
        arb_role(),
    )
        .prop_map(|(id_bytes, user_name, email, role)| UserProfile {
            id: UserId(uuid::Uuid::from_bytes(id_bytes)),
            user_name,
            email,
            role,
        })
}

/// Generate malformed token strings
fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        // No dots
        "[a-zA-Z0-9_-]{0,60}",
        // Wrong number of segments
        "[a-zA-Z0-9_-]{1,20}\\.[a-zA-Z0-9_-]{1,20}",
        "[a-zA-Z0-9_-]{1,20}(\\.[a-zA-Z0-9_-]{1,20}){3,5}",
        // Right shape, random content
        "[a-zA-Z0-9_-]{1,40}\\.[a-zA-Z0-9_-]{1,80}\\.[a-zA-Z0-9_-]{1,43}",
        // Not base64 at all
        "[!@#$%^&*() ]{1,30}\\.[!@#$%^&*() ]{1,30}\\.[!@#$%^&*() ]{1,30}",
        // Anything
        "\\PC*",
    ]
}

// ============================================================================
// Token Properties
// ============================================================================

proptest! {
    /// Property: Any profile survives mint -> validate -> extract unchanged
    #[test]
    fn prop_mint_validate_roundtrip(profile in arb_profile(), session in any::<[u8; 16]>()) {
        let issuer = issuer();
        let session_id = SessionId(uuid::Uuid::from_bytes(session));

        let token = issuer.mint(&profile, session_id).unwrap();
        let claims = issuer.validate(&token).unwrap();
        let (extracted, binding) = TokenIssuer::extract_identity(&claims);

        prop_assert_eq!(extracted, profile.clone());
        prop_assert_eq!(binding.session_id, session_id);
        prop_assert_eq!(binding.user_id, profile.id);
    }

    /// Property: Token lifetime is exactly the configured duration
    #[test]
    fn prop_lifetime_matches_config(secs in 1u64..(30 * 24 * 3600), profile in arb_profile()) {
        let config = AuthConfig::try_new(TEST_SECRET)
            .unwrap()
            .with_access_token_duration(Duration::from_secs(secs));
        let issuer = TokenIssuer::new(Arc::new(config));

        let token = issuer.mint(&profile, SessionId::new()).unwrap();
        let claims = issuer.validate(&token).unwrap();
        prop_assert_eq!(claims.exp - claims.iat, secs as i64);
    }

    /// Property: Malformed tokens are rejected without panicking
    #[test]
    fn prop_malformed_tokens_rejected(token in arb_malformed_token()) {
        let result = issuer().validate(&token);
        prop_assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    /// Property: Changing any signature character is detected
    #[test]
    fn prop_signature_tampering_detected(
        profile in arb_profile(),
        position in any::<prop::sample::Index>(),
        replacement in any::<prop::sample::Index>(),
    ) {
        let issuer = issuer();
        let token = issuer.mint(&profile, SessionId::new()).unwrap();
        let (rest, signature) = token.rsplit_once('.').unwrap();

        let mut sig = signature.as_bytes().to_vec();
        let i = position.index(sig.len());
        let candidate = URL_SAFE_ALPHABET[replacement.index(URL_SAFE_ALPHABET.len())];
        sig[i] = if candidate == sig[i] {
            if candidate == b'A' { b'B' } else { b'A' }
        } else {
            candidate
        };
        let tampered = format!("{rest}.{}", String::from_utf8(sig).unwrap());

        prop_assert!(matches!(
            issuer.validate(&tampered),
            Err(AuthError::InvalidSignature)
        ));
    }

    /// Property: A token minted under another key never validates
    #[test]
    fn prop_foreign_key_rejected(profile in arb_profile(), secret in "[a-zA-Z0-9]{32,64}") {
        prop_assume!(secret != TEST_SECRET);
        let foreign = TokenIssuer::new(Arc::new(AuthConfig::try_new(&secret).unwrap()));

        let token = foreign.mint(&profile, SessionId::new()).unwrap();
        prop_assert!(matches!(
            issuer().validate(&token),
            Err(AuthError::InvalidSignature)
        ));
    }
}

// ============================================================================
// Signing Key Validation Properties
// ============================================================================

proptest! {
    /// Property: Keys of 32+ bytes are accepted
    #[test]
    fn prop_valid_key_accepted(key in prop::collection::vec(any::<u8>(), 32..128)) {
        prop_assert!(SigningKey::new(&key).is_ok());
    }

    /// Property: Keys under 32 bytes are rejected
    #[test]
    fn prop_short_key_rejected(key in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assert!(SigningKey::new(&key).is_err());
        prop_assert!(matches!(
            AuthConfig::try_new(&key),
            Err(AuthError::Configuration(_))
        ));
    }
}
