//! Deployment parameter validation.
//!
//! Rules run in a fixed order and the first violated rule is reported. No rule touches
//! the chain or the store.

use std::str::FromStr;

use alloy_core::primitives::{Address, U256};
use uuid::Uuid;

use crate::types::{DeploymentRequest, OnChainSalt, ValidatedRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("salt must be a UUID (8-4-4-4-12 hex digits), got '{0}'")]
    InvalidSalt(String),

    #[error("token name is required")]
    MissingName,

    #[error("token symbol is required")]
    MissingSymbol,

    #[error("initial supply must be an integer, got '{0}'")]
    MalformedSupply(String),

    #[error("initial supply must be greater than zero")]
    NonPositiveSupply,

    #[error("at least one claim topic is required")]
    MissingClaimTopics,

    #[error("claim topics must be positive integers, got {0}")]
    InvalidClaimTopic(String),

    #[error("at least one trusted issuer is required")]
    MissingTrustedIssuers,

    #[error("malformed {field} address '{value}': expected 0x-prefixed 40 hex chars")]
    MalformedAddress { field: &'static str, value: String },
}

/// Validate a deployment request, returning its typed form.
pub fn validate(request: &DeploymentRequest) -> Result<ValidatedRequest, ValidationError> {
    let salt = request.salt.trim();
    let uuid = parse_salt(salt)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let symbol = request.symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::MissingSymbol);
    }

    let initial_supply = parse_supply(&request.initial_supply)?;

    if request.claim_topics.is_empty() {
        return Err(ValidationError::MissingClaimTopics);
    }
    let claim_topics = request
        .claim_topics
        .iter()
        .map(|topic| {
            topic
                .as_u64()
                .filter(|topic| *topic > 0)
                .ok_or_else(|| ValidationError::InvalidClaimTopic(topic.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if request.trusted_issuers.is_empty() {
        return Err(ValidationError::MissingTrustedIssuers);
    }

    let trusted_issuers = request
        .trusted_issuers
        .iter()
        .map(|addr| parse_address("trusted issuer", addr))
        .collect::<Result<Vec<_>, _>>()?;
    let compliance_modules = request
        .compliance_modules
        .iter()
        .map(|addr| parse_address("compliance module", addr))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedRequest {
        salt: salt.to_string(),
        onchain_salt: OnChainSalt::from_uuid(&uuid),
        name: name.to_string(),
        symbol: symbol.to_string(),
        initial_supply,
        claim_topics,
        trusted_issuers,
        compliance_modules,
    })
}

/// Validate the address that signs the deployment transaction.
pub fn validate_deployer(deployer: &str) -> Result<Address, ValidationError> {
    parse_address("deployer", deployer)
}

fn parse_salt(salt: &str) -> Result<Uuid, ValidationError> {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let groups: Vec<&str> = salt.split('-').collect();
    let well_formed = groups.len() == GROUPS.len()
        && groups
            .iter()
            .zip(GROUPS)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()));

    if !well_formed {
        return Err(ValidationError::InvalidSalt(salt.to_string()));
    }

    Uuid::parse_str(salt).map_err(|_| ValidationError::InvalidSalt(salt.to_string()))
}

fn parse_supply(supply: &str) -> Result<U256, ValidationError> {
    let supply = supply.trim();
    if supply.is_empty() {
        return Err(ValidationError::MalformedSupply(String::new()));
    }
    if supply.starts_with('-') {
        return Err(ValidationError::NonPositiveSupply);
    }

    let value = U256::from_str(supply)
        .map_err(|_| ValidationError::MalformedSupply(supply.to_string()))?;
    if value.is_zero() {
        return Err(ValidationError::NonPositiveSupply);
    }
    Ok(value)
}

/// Parse an address in the canonical `0x` + 40 hex chars form.
fn parse_address(field: &'static str, addr: &str) -> Result<Address, ValidationError> {
    let malformed = || ValidationError::MalformedAddress {
        field,
        value: addr.to_string(),
    };

    let Some(hex_part) = addr.strip_prefix("0x") else {
        return Err(malformed());
    };
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    Address::from_str(addr).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_request() -> DeploymentRequest {
        DeploymentRequest {
            property_id: None,
            salt: "a1b2c3d4-e5f6-47a8-89ab-cdef01234567".to_string(),
            name: "Example Tower".to_string(),
            symbol: "EXT".to_string(),
            initial_supply: "1000000".to_string(),
            claim_topics: vec![1.into(), 2.into(), 7.into()],
            trusted_issuers: vec![format!("0x{}", "1".repeat(40))],
            compliance_modules: vec![],
        }
    }

    #[test]
    fn test_example_request_is_valid() {
        let validated = validate(&example_request()).unwrap();
        assert_eq!(validated.salt, "a1b2c3d4-e5f6-47a8-89ab-cdef01234567");
        assert_eq!(validated.initial_supply, U256::from(1_000_000u64));
        assert_eq!(validated.trusted_issuers, vec![Address::repeat_byte(0x11)]);
        assert!(validated.compliance_modules.is_empty());

        let deployer = validate_deployer(&format!("0x{}", "2".repeat(40))).unwrap();
        assert_eq!(deployer, Address::repeat_byte(0x22));
    }

    #[test]
    fn test_salt_is_case_insensitive() {
        let mut req = example_request();
        req.salt = "A1B2C3D4-E5F6-47A8-89AB-CDEF01234567".to_string();
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_bad_salt() {
        for salt in [
            "",
            "not-a-uuid",
            "a1b2c3d4e5f647a889abcdef01234567",
            "a1b2c3d4-e5f6-47a8-89ab-cdef0123456",
            "g1b2c3d4-e5f6-47a8-89ab-cdef01234567",
            "{a1b2c3d4-e5f6-47a8-89ab-cdef01234567}",
        ] {
            let mut req = example_request();
            req.salt = salt.to_string();
            assert!(
                matches!(validate(&req), Err(ValidationError::InvalidSalt(_))),
                "salt '{salt}' should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_name_and_symbol() {
        let mut req = example_request();
        req.name = "   ".to_string();
        assert_eq!(validate(&req), Err(ValidationError::MissingName));

        let mut req = example_request();
        req.symbol = "".to_string();
        assert_eq!(validate(&req), Err(ValidationError::MissingSymbol));
    }

    #[test]
    fn test_supply_must_be_positive() {
        for supply in ["0", "-1", "-1000000", "0x0"] {
            let mut req = example_request();
            req.initial_supply = supply.to_string();
            assert_eq!(
                validate(&req),
                Err(ValidationError::NonPositiveSupply),
                "supply '{supply}'"
            );
        }

        for supply in ["", "ten", "1.5"] {
            let mut req = example_request();
            req.initial_supply = supply.to_string();
            assert!(matches!(
                validate(&req),
                Err(ValidationError::MalformedSupply(_))
            ));
        }
    }

    #[test]
    fn test_supply_is_arbitrary_precision() {
        let mut req = example_request();
        req.initial_supply = "1000000000000000000000000000000".to_string();
        let validated = validate(&req).unwrap();
        assert_eq!(
            validated.initial_supply,
            U256::from(10u64).pow(U256::from(30u64))
        );
    }

    #[test]
    fn test_claim_topics_required() {
        let mut req = example_request();
        req.claim_topics = vec![];
        let err = validate(&req).unwrap_err();
        assert_eq!(err, ValidationError::MissingClaimTopics);
        assert!(err.to_string().contains("at least one claim topic is required"));

        let mut req = example_request();
        req.claim_topics = vec![1.into(), 0.into()];
        assert_eq!(
            validate(&req),
            Err(ValidationError::InvalidClaimTopic("0".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_claim_topics_reach_the_validator() {
        let mut json = serde_json::to_value(example_request()).unwrap();

        json["claimTopics"] = serde_json::json!([1, -3]);
        let req: DeploymentRequest = serde_json::from_value(json.clone()).unwrap();
        let err = validate(&req).unwrap_err();
        assert_eq!(err, ValidationError::InvalidClaimTopic("-3".to_string()));
        assert!(err.to_string().contains("positive integers, got -3"));

        json["claimTopics"] = serde_json::json!([2.5]);
        let req: DeploymentRequest = serde_json::from_value(json).unwrap();
        assert_eq!(
            validate(&req),
            Err(ValidationError::InvalidClaimTopic("2.5".to_string()))
        );
    }

    #[test]
    fn test_trusted_issuers_required() {
        let mut req = example_request();
        req.trusted_issuers = vec![];
        assert_eq!(validate(&req), Err(ValidationError::MissingTrustedIssuers));
    }

    #[test]
    fn test_malformed_trusted_issuer() {
        let mut req = example_request();
        req.trusted_issuers = vec!["not-an-address".to_string()];
        let err = validate(&req).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedAddress { .. }));
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn test_malformed_compliance_module() {
        let mut req = example_request();
        req.compliance_modules = vec![format!("0x{}", "z".repeat(40))];
        assert!(matches!(
            validate(&req),
            Err(ValidationError::MalformedAddress {
                field: "compliance module",
                ..
            })
        ));
    }

    #[test]
    fn test_address_format() {
        assert!(parse_address("t", "0x70997970C51812dc3A010C7d01b50e0d17dc79C8").is_ok());
        assert!(parse_address("t", "0x0000000000000000000000000000000000000000").is_ok());
        assert!(parse_address("t", "0x1234").is_err());
        assert!(parse_address("t", "1234567890abcdef1234567890abcdef12345678").is_err());
        assert!(parse_address("t", "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG").is_err());
        assert!(parse_address("t", "").is_err());
        assert!(validate_deployer("0x12").is_err());
    }

    #[test]
    fn test_first_failure_wins() {
        let mut req = example_request();
        req.salt = "bad".to_string();
        req.name = String::new();
        req.claim_topics = vec![];
        assert!(matches!(
            validate(&req),
            Err(ValidationError::InvalidSalt(_))
        ));

        let mut req = example_request();
        req.claim_topics = vec![];
        req.trusted_issuers = vec!["nope".to_string()];
        assert_eq!(validate(&req), Err(ValidationError::MissingClaimTopics));
    }
}
