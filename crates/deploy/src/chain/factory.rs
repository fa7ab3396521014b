//! Calls against the suite factory contract.

use alloy_core::primitives::{Address, U256};

use crate::{
    abi::{Token, encode_call},
    resolver::SuiteContract,
    types::{OnChainSalt, ValidatedRequest},
};

use super::ContractCall;

/// Canonical signature of the suite deployment function.
pub const DEPLOY_SUITE_SIGNATURE: &str =
    "deploySuite(bytes32,string,string,uint8,uint256,uint256[],address[],address[])";

/// Decimals of every token deployed through the factory.
pub const TOKEN_DECIMALS: u8 = 18;

/// Build the `deploySuite` call for a validated request.
pub fn deploy_suite_call(factory: Address, request: &ValidatedRequest) -> ContractCall {
    let calldata = encode_call(
        DEPLOY_SUITE_SIGNATURE,
        &[
            Token::FixedBytes(*request.onchain_salt),
            Token::String(request.name.clone()),
            Token::String(request.symbol.clone()),
            Token::Uint(U256::from(TOKEN_DECIMALS)),
            Token::Uint(request.initial_supply),
            Token::UintArray(request.claim_topics.iter().map(|t| U256::from(*t)).collect()),
            Token::AddressArray(request.trusted_issuers.clone()),
            Token::AddressArray(request.compliance_modules.clone()),
        ],
    );

    ContractCall {
        to: factory,
        function: "deploySuite",
        calldata,
    }
}

/// Build the getter call returning the address of one suite contract.
pub fn getter_call(factory: Address, contract: SuiteContract, salt: OnChainSalt) -> ContractCall {
    let getter = contract.getter();
    ContractCall {
        to: factory,
        function: getter,
        calldata: encode_call(&format!("{getter}(bytes32)"), &[Token::FixedBytes(*salt)]),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use uuid::Uuid;

    use super::*;
    use crate::abi::selector;

    fn validated() -> ValidatedRequest {
        let uuid = Uuid::from_str("a1b2c3d4-e5f6-47a8-89ab-cdef01234567").unwrap();
        ValidatedRequest {
            salt: uuid.to_string(),
            onchain_salt: OnChainSalt::from_uuid(&uuid),
            name: "Example Tower".to_string(),
            symbol: "EXT".to_string(),
            initial_supply: U256::from(1_000_000u64),
            claim_topics: vec![1, 2, 7],
            trusted_issuers: vec![Address::repeat_byte(0x11)],
            compliance_modules: vec![],
        }
    }

    #[test]
    fn test_deploy_suite_call_layout() {
        let factory = Address::repeat_byte(0xfa);
        let request = validated();
        let call = deploy_suite_call(factory, &request);

        assert_eq!(call.to, factory);
        assert_eq!(call.function, "deploySuite");
        assert_eq!(&call.calldata[..4], &selector(DEPLOY_SUITE_SIGNATURE));
        // The salt is the first static word, right after the selector.
        assert_eq!(&call.calldata[4..36], request.onchain_salt.as_slice());
        // Decimals are the fourth head word.
        assert_eq!(call.calldata[4 + 3 * 32 + 31], TOKEN_DECIMALS);
    }

    #[test]
    fn test_getter_call() {
        let factory = Address::repeat_byte(0xfa);
        let salt = validated().onchain_salt;
        let call = getter_call(factory, SuiteContract::IdentityRegistryStorage, salt);

        assert_eq!(call.function, "getIdentityRegistryStorage");
        assert_eq!(call.calldata.len(), 4 + 32);
        assert_eq!(
            &call.calldata[..4],
            &selector("getIdentityRegistryStorage(bytes32)")
        );
        assert_eq!(&call.calldata[4..], salt.as_slice());
    }
}
