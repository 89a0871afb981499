//! Operation building and confirmation monitoring.
//!
//! # Responsibilities
//! - Build manager operations (reveal when needed, contract calls)
//! - Assign counters and fees
//! - Monitor inclusion and confirmation depth

use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::TezosClient;
use crate::blockchain::michelson::Micheline;
use crate::blockchain::types::{
    ConfirmationStatus, ContractCall, Mutez, OperationHash, TezosError, TezosResult,
};
use crate::config::schema::FeeConfig;

/// Entrypoint parameters of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameters {
    pub entrypoint: String,
    pub value: Micheline,
}

/// One manager operation content, in the node's JSON encoding.
/// Numeric fields are decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationContent {
    Reveal {
        source: String,
        fee: String,
        counter: String,
        gas_limit: String,
        storage_limit: String,
        public_key: String,
    },
    Transaction {
        source: String,
        fee: String,
        counter: String,
        gas_limit: String,
        storage_limit: String,
        amount: String,
        destination: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameters: Option<Parameters>,
    },
}

/// An operation ready to be forged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsignedOperation {
    pub branch: String,
    pub contents: Vec<OperationContent>,
}

/// Operation builder for contract calls.
pub struct OperationBuilder<'a> {
    client: &'a TezosClient,
    fees: &'a FeeConfig,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(client: &'a TezosClient, fees: &'a FeeConfig) -> Self {
        Self { client, fees }
    }

    /// Build an operation batch for `source`, prepending a reveal if the
    /// account's key is not yet on chain.
    pub async fn build(
        &self,
        source: &str,
        public_key: &str,
        calls: &[ContractCall],
    ) -> TezosResult<UnsignedOperation> {
        let branch = self.client.get_head_header().await?.hash;
        let counter = self.client.get_counter(source).await?;
        let revealed = self.client.get_manager_key(source).await?.is_some();

        let operation = assemble(branch, source, public_key, counter, revealed, calls, self.fees);

        tracing::debug!(
            source = %source,
            contents = operation.contents.len(),
            reveal = !revealed,
            "Operation built"
        );
        Ok(operation)
    }
}

/// Lay out operation contents with consecutive counters after `counter`.
pub fn assemble(
    branch: String,
    source: &str,
    public_key: &str,
    counter: u64,
    revealed: bool,
    calls: &[ContractCall],
    fees: &FeeConfig,
) -> UnsignedOperation {
    let mut next_counter = counter;
    let mut contents = Vec::with_capacity(calls.len() + 1);

    if !revealed {
        next_counter += 1;
        contents.push(OperationContent::Reveal {
            source: source.to_string(),
            fee: fees.reveal_fee_mutez.to_string(),
            counter: next_counter.to_string(),
            gas_limit: fees.reveal_gas_limit.to_string(),
            storage_limit: "0".to_string(),
            public_key: public_key.to_string(),
        });
    }

    for call in calls {
        next_counter += 1;
        contents.push(OperationContent::Transaction {
            source: source.to_string(),
            fee: fees.fee_mutez.to_string(),
            counter: next_counter.to_string(),
            gas_limit: fees.gas_limit.to_string(),
            storage_limit: fees.storage_limit.to_string(),
            amount: call.amount.to_string(),
            destination: call.destination.clone(),
            parameters: Some(Parameters {
                entrypoint: call.entrypoint.clone(),
                value: call.value.clone(),
            }),
        });
    }

    UnsignedOperation { branch, contents }
}

/// Total amount attached to a batch, fees excluded.
pub fn total_amount(calls: &[ContractCall]) -> Mutez {
    Mutez(calls.iter().map(|c| c.amount.0).sum())
}

/// Classify an operation given the level it was included at (if any).
/// Inclusion in the head block counts as one confirmation.
pub fn confirmation_status(included: Option<u64>, head_level: u64, required: u32) -> ConfirmationStatus {
    let Some(block_level) = included else {
        return ConfirmationStatus::Pending;
    };
    let confirmations = head_level.saturating_sub(block_level).saturating_add(1) as u32;
    if confirmations >= required {
        ConfirmationStatus::Confirmed { block_level }
    } else {
        ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        }
    }
}

/// Polls the node until an injected operation is confirmed.
pub struct ConfirmationWatcher {
    client: TezosClient,
}

impl ConfirmationWatcher {
    pub fn new(client: TezosClient) -> Self {
        Self { client }
    }

    /// Wait for `hash` to reach the configured confirmation depth.
    pub async fn wait(&self, hash: &OperationHash) -> TezosResult<u64> {
        let config = self.client.config();
        let required = config.confirmation_blocks.max(1);
        let timeout_duration = Duration::from_secs(config.confirmation_timeout_secs);
        let poll_interval = Duration::from_millis(config.confirmation_poll_ms.max(1));

        let start_level = self.client.get_head_header().await?.level;

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);
            let mut next_level = start_level;
            let mut included = None;

            loop {
                ticker.tick().await;

                let head_level = self.client.get_head_header().await?.level;

                while included.is_none() && next_level <= head_level {
                    let operations = self.client.get_manager_operations(next_level).await?;
                    if let Some(op) = operations.iter().find(|op| op.hash == hash.as_str()) {
                        if let Some(reason) = op.failure() {
                            return Err(TezosError::OperationFailed(reason));
                        }
                        included = Some(next_level);
                    }
                    next_level += 1;
                }

                match confirmation_status(included, head_level, required) {
                    ConfirmationStatus::Confirmed { block_level } => return Ok(block_level),
                    ConfirmationStatus::Pending => {
                        tracing::debug!(operation = %hash, head_level, "Operation pending");
                    }
                    ConfirmationStatus::Confirming { current, required } => {
                        tracing::debug!(
                            operation = %hash,
                            confirmations = current,
                            required = required,
                            "Waiting for confirmations"
                        );
                    }
                }
            }
        })
        .await;

        match result {
            Ok(level) => level,
            Err(_) => Err(TezosError::ConfirmationTimeout(config.confirmation_timeout_secs)),
        }
    }
}
