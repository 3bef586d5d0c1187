use async_trait::async_trait;
use serde_json::Value;

use crate::NormalizeError;

/// Reshapes a decoded upstream body into one of the gateway's output shapes.
#[async_trait]
pub trait Normalizer: Send + Sync {
    type Output: Send;

    async fn normalize(&self, body: Value) -> Result<Self::Output, NormalizeError>;
}

/// Adapter for normalizers that never touch the network.
pub struct Pure<T> {
    transform: fn(&Value) -> Result<T, NormalizeError>,
}

impl<T> Pure<T> {
    pub const fn new(transform: fn(&Value) -> Result<T, NormalizeError>) -> Self {
        Self { transform }
    }
}

#[async_trait]
impl<T: Send + 'static> Normalizer for Pure<T> {
    type Output = T;

    async fn normalize(&self, body: Value) -> Result<T, NormalizeError> {
        (self.transform)(&body)
    }
}

/// Decides whether a URL answers with HTTP 200.
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Checker used when article URL probing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeReachable;

#[async_trait]
impl ReachabilityChecker for AssumeReachable {
    async fn is_reachable(&self, _url: &str) -> bool {
        true
    }
}
