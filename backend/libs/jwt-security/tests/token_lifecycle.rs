//! Integration tests for the token lifecycle and the gate decision
//!
//! Issue -> verify -> gate, plus the attacks the authority must withstand.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use jwt_security::{
    AccessPolicy, AuthError, AuthGate, TokenAuthority, UserIdentity, UserRole,
};
use std::time::Duration;

const SECRET: &str = "y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6Wq8Lj5BtNu1Zp0MkYhVgCxFbAsSdQwEr";
const VALIDITY_SECS: u64 = 900;

fn authority() -> TokenAuthority {
    TokenAuthority::new(SECRET, "fleet-auth", Duration::from_secs(VALIDITY_SECS))
}

fn identity(user_id: u32, role: UserRole) -> UserIdentity {
    UserIdentity {
        user_id,
        first_name: "Test".into(),
        last_name: format!("User{}", user_id),
        username: format!("user{}", user_id),
        email: format!("user{}@example.com", user_id),
        role,
        user_agent: Some("integration-test".into()),
        ip: Some("198.51.100.7".into()),
    }
}

fn segments(token: &str) -> Vec<String> {
    token.split('.').map(str::to_string).collect()
}

#[test]
fn test_round_trip_preserves_application_fields() {
    let authority = authority();

    for (user_id, role) in [
        (1, UserRole::Admin),
        (2, UserRole::Operator),
        (3, UserRole::Viewer),
        (u32::MAX, UserRole::Unspecified),
    ] {
        let input = identity(user_id, role);
        let token = authority.issue(&input).expect("Failed to issue token");
        let claims = authority.verify(&token).expect("Token should verify");

        assert_eq!(claims.user_id(), input.user_id);
        assert_eq!(claims.username(), input.username);
        assert_eq!(claims.email(), input.email);
        assert_eq!(claims.role(), input.role);
        assert_eq!(claims.user_agent(), input.user_agent.as_deref());
        assert_eq!(claims.ip(), input.ip.as_deref());
        assert_eq!(claims.subject(), input.display_name());
    }
}

#[test]
fn test_expired_at_and_after_validity() {
    let authority = authority();
    let issued = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
    let token = authority
        .issue_at(&identity(5, UserRole::Viewer), issued)
        .unwrap();

    for offset in [VALIDITY_SECS as i64, VALIDITY_SECS as i64 + 1, 86_400] {
        let now = issued + ChronoDuration::seconds(offset);
        assert!(
            matches!(authority.verify_at(&token, now), Err(AuthError::ExpiredToken)),
            "token should be expired {offset}s after issue"
        );
    }
}

#[test]
fn test_token_issued_in_the_past_is_expired_now() {
    let authority = authority();
    let long_ago = Utc::now() - ChronoDuration::hours(2);
    let token = authority
        .issue_at(&identity(5, UserRole::Viewer), long_ago)
        .unwrap();

    assert!(matches!(authority.verify(&token), Err(AuthError::ExpiredToken)));
}

#[test]
fn test_any_signature_bit_flip_is_rejected() {
    let authority = authority();
    let token = authority.issue(&identity(9, UserRole::Admin)).unwrap();
    let parts = segments(&token);
    let signature = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();

    for byte in 0..signature.len() {
        for bit in 0..8 {
            let mut tampered = signature.clone();
            tampered[byte] ^= 1 << bit;
            let forged = format!(
                "{}.{}.{}",
                parts[0],
                parts[1],
                URL_SAFE_NO_PAD.encode(&tampered)
            );

            assert!(
                matches!(authority.verify(&forged), Err(AuthError::Signature(_))),
                "flipping bit {bit} of byte {byte} must invalidate the token"
            );
        }
    }
}

#[test]
fn test_payload_tampering_is_rejected() {
    let authority = authority();
    let token = authority.issue(&identity(9, UserRole::Viewer)).unwrap();
    let parts = segments(&token);

    let mut payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
    payload["rl"] = serde_json::json!(1); // escalate to admin
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    assert!(matches!(authority.verify(&forged), Err(AuthError::Signature(_))));
}

#[test]
fn test_alg_none_is_rejected() {
    let authority = authority();
    let token = authority.issue(&identity(3, UserRole::Admin)).unwrap();
    let parts = segments(&token);
    let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);

    for signature in ["", parts[2].as_str()] {
        let forged = format!("{}.{}.{}", none_header, parts[1], signature);
        assert!(matches!(
            authority.verify(&forged),
            Err(AuthError::Signature(_))
        ));
    }
}

#[test]
fn test_asymmetric_alg_header_is_rejected() {
    let authority = authority();
    let token = authority.issue(&identity(3, UserRole::Admin)).unwrap();
    let parts = segments(&token);

    for alg in ["RS256", "ES256", "PS512", "EdDSA"] {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
        let forged = format!("{}.{}.{}", header, parts[1], parts[2]);
        assert!(
            matches!(authority.verify(&forged), Err(AuthError::Signature(_))),
            "{alg} header must be rejected"
        );
    }
}

#[test]
fn test_gate_admin_only_endpoint() {
    const ENDPOINT: &str = "/fleet.v1.DeviceService/Reboot";
    let authority = authority();
    let gate = AuthGate::new(AccessPolicy::new(authority.clone()).allow(ENDPOINT, [UserRole::Admin]));

    let viewer = authority.issue(&identity(1, UserRole::Viewer)).unwrap();
    assert!(matches!(
        gate.authorize(ENDPOINT, Some(&viewer)),
        Err(AuthError::RoleMismatch)
    ));

    let admin = authority.issue(&identity(2, UserRole::Admin)).unwrap();
    let claims = gate
        .authorize(ENDPOINT, Some(&admin))
        .unwrap()
        .expect("admin should be authorized");
    assert_eq!(claims.user_id(), 2);
}

#[test]
fn test_gate_missing_token_distinct_from_invalid() {
    const ENDPOINT: &str = "/fleet.v1.DeviceService/Reboot";
    let gate = AuthGate::new(AccessPolicy::new(authority()).allow(ENDPOINT, [UserRole::Admin]));

    let missing = gate.authorize(ENDPOINT, None).unwrap_err();
    let invalid = gate.authorize(ENDPOINT, Some("x.y.z")).unwrap_err();

    assert!(matches!(missing, AuthError::MissingToken));
    assert!(!matches!(invalid, AuthError::MissingToken));

    let missing: tonic::Status = missing.into();
    let invalid: tonic::Status = invalid.into();
    assert_eq!(missing.code(), tonic::Code::Unauthenticated);
    assert_eq!(invalid.code(), tonic::Code::Unauthenticated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_resolve_independently() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    const ENDPOINT: &str = "/fleet.v1.TelemetryService/Query";
    const ROLES: [UserRole; 3] = [UserRole::Admin, UserRole::Operator, UserRole::Viewer];

    let authority = authority();
    let gate = AuthGate::new(
        AccessPolicy::new(authority.clone()).allow(ENDPOINT, [UserRole::Admin, UserRole::Operator]),
    );

    let mut handles = Vec::new();
    for user_id in 0..64u32 {
        let role = ROLES[user_id as usize % ROLES.len()];
        let token = authority.issue(&identity(user_id, role)).unwrap();
        let gate = gate.clone();

        handles.push(tokio::spawn(async move {
            (user_id, role, gate.authorize(ENDPOINT, Some(&token)))
        }));
    }

    for handle in handles {
        let (user_id, role, result) = handle.await.expect("task panicked");
        match role {
            UserRole::Viewer => assert!(matches!(result, Err(AuthError::RoleMismatch))),
            _ => {
                let claims = result.unwrap().expect("claims attached");
                assert_eq!(claims.user_id(), user_id);
                assert_eq!(claims.role(), role);
            }
        }
    }
}
