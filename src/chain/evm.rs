// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM implementation of [`ChainClient`] over an alloy HTTP provider.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    signers::local::PrivateKeySigner,
    sol,
    sol_types::SolCall,
};
use async_trait::async_trait;

use super::types::*;
use super::ChainClient;

// Define the soulbound token interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface ISoulboundToken {
        function mint(address to, uint256 tokenId, string tokenValue) external;
        function transferOwnership(uint256 tokenId, address from, address to) external;
        function ownerOf(uint256 tokenId) external view returns (address);
        function isNonTransferable(uint256 tokenId) external view returns (bool);
    }
}

/// HTTP provider type with signing capabilities (all fillers + wallet).
type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Interval between receipt polls while awaiting confirmation.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Chain client for the deployed soulbound token contract.
#[derive(Debug)]
pub struct EvmChainClient {
    provider: SigningProvider,
    contract_address: Address,
}

impl EvmChainClient {
    /// Create a client for the given endpoint, signing credential, and
    /// deployed contract address.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP RPC endpoint
    /// * `private_key_hex` - Hex-encoded signing key (with or without 0x)
    /// * `contract_address` - Deployed contract address (0x + 40 hex chars)
    pub fn new(
        rpc_url: &str,
        private_key_hex: &str,
        contract_address: &str,
    ) -> Result<Self, ChainClientError> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            ChainClientError::Unavailable(format!("invalid RPC URL: {e}"))
        })?;

        let key_bytes = alloy::hex::decode(private_key_hex.trim_start_matches("0x"))
            .map_err(|e| ChainClientError::Signing(e.to_string()))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| ChainClientError::Signing(e.to_string()))?;
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        let contract_address = Address::from_str(contract_address)
            .map_err(|e| ChainClientError::InvalidAddress(e.to_string()))?;

        Ok(Self {
            provider,
            contract_address,
        })
    }

    /// ABI-encode a contract call into raw calldata.
    fn encode_call(call: &ContractCall) -> Result<Vec<u8>, ChainClientError> {
        match call {
            ContractCall::Mint {
                token_id,
                to,
                value,
            } => {
                let to = parse_address(to)?;
                Ok(ISoulboundToken::mintCall {
                    to,
                    tokenId: U256::from(*token_id),
                    tokenValue: value.clone(),
                }
                .abi_encode())
            }
            ContractCall::Transfer { token_id, from, to } => {
                let from = parse_address(from)?;
                let to = parse_address(to)?;
                Ok(ISoulboundToken::transferOwnershipCall {
                    tokenId: U256::from(*token_id),
                    from,
                    to,
                }
                .abi_encode())
            }
        }
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn submit(&self, call: ContractCall) -> Result<PendingTx, ChainClientError> {
        let data = Self::encode_call(&call)?;

        let tx = alloy::rpc::types::TransactionRequest::default()
            .to(self.contract_address)
            .input(data.into());

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainClientError::Submission(e.to_string()))?;

        Ok(PendingTx {
            tx_hash: format!("{:?}", pending.tx_hash()),
        })
    }

    async fn await_confirmation(
        &self,
        pending: &PendingTx,
        timeout: Duration,
    ) -> Result<ChainReceipt, ChainClientError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(receipt) = self.receipt(&pending.tx_hash).await? {
                return Ok(receipt);
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(ChainClientError::ConfirmationTimeout(timeout));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<ChainReceipt>, ChainClientError> {
        let hash = tx_hash
            .parse()
            .map_err(|e| ChainClientError::Rpc(format!("invalid tx hash: {e}")))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ChainClientError::Unavailable(e.to_string()))?;

        Ok(receipt.map(|r| ChainReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: r.block_number.unwrap_or(0),
            success: r.status(),
        }))
    }

    async fn call_read_only(
        &self,
        query: ContractQuery,
    ) -> Result<ChainValue, ChainClientError> {
        let contract = ISoulboundToken::new(self.contract_address, self.provider.clone());

        match query {
            ContractQuery::OwnerOf(token_id) => {
                let owner = contract
                    .ownerOf(U256::from(token_id))
                    .call()
                    .await
                    .map_err(|e| ChainClientError::Unavailable(e.to_string()))?;
                Ok(ChainValue::Address(format!("{owner:#x}")))
            }
            ContractQuery::IsNonTransferable(token_id) => {
                let flag = contract
                    .isNonTransferable(U256::from(token_id))
                    .call()
                    .await
                    .map_err(|e| ChainClientError::Unavailable(e.to_string()))?;
                Ok(ChainValue::Bool(flag))
            }
        }
    }
}

/// Parse an address string, mapping failures to `InvalidAddress`.
fn parse_address(address: &str) -> Result<Address, ChainClientError> {
    Address::from_str(address).map_err(|e| ChainClientError::InvalidAddress(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RPC: &str = "http://localhost:8545";
    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";
    const CONTRACT: &str = "0x5425890298aed601595a70AB815c96711a31Bc65";

    #[test]
    fn constructor_rejects_bad_key() {
        let err = EvmChainClient::new(RPC, "not-hex", CONTRACT).unwrap_err();
        assert!(matches!(err, ChainClientError::Signing(_)));
    }

    #[test]
    fn constructor_rejects_bad_contract_address() {
        let err = EvmChainClient::new(RPC, KEY, "0x123").unwrap_err();
        assert!(matches!(err, ChainClientError::InvalidAddress(_)));
    }

    #[test]
    fn mint_calldata_uses_mint_selector() {
        let data = EvmChainClient::encode_call(&ContractCall::Mint {
            token_id: 7,
            to: CONTRACT.to_string(),
            value: "credential-abc".to_string(),
        })
        .unwrap();
        assert_eq!(&data[..4], ISoulboundToken::mintCall::SELECTOR);
    }

    #[test]
    fn transfer_calldata_uses_transfer_selector() {
        let data = EvmChainClient::encode_call(&ContractCall::Transfer {
            token_id: 7,
            from: CONTRACT.to_string(),
            to: CONTRACT.to_string(),
        })
        .unwrap();
        assert_eq!(&data[..4], ISoulboundToken::transferOwnershipCall::SELECTOR);
    }

    #[test]
    fn encode_rejects_invalid_recipient() {
        let err = EvmChainClient::encode_call(&ContractCall::Mint {
            token_id: 7,
            to: "not-an-address".to_string(),
            value: "v".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ChainClientError::InvalidAddress(_)));
    }
}
