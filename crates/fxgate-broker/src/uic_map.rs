//! Bidirectional symbol / UIC mapping with lazy API resolution.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::BrokerClient;
use crate::error::BrokerResult;

/// Cache mapping symbols to numeric UICs and back.
///
/// Lookups hit the reference-data endpoint on a cache miss and remember
/// both directions of every successful resolution.
#[derive(Debug, Default)]
pub struct UicMap {
    uic_by_symbol: HashMap<String, u32>,
    symbol_by_uic: HashMap<u32, String>,
}

impl UicMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a known mapping without a network lookup.
    pub fn insert(&mut self, symbol: impl Into<String>, uic: u32) {
        let symbol = symbol.into();
        self.uic_by_symbol.insert(symbol.clone(), uic);
        self.symbol_by_uic.insert(uic, symbol);
    }

    /// Cached UIC for a symbol, if any.
    pub fn cached_uic(&self, symbol: &str) -> Option<u32> {
        self.uic_by_symbol.get(symbol).copied()
    }

    /// Cached symbol for a UIC, if any.
    pub fn cached_symbol(&self, uic: u32) -> Option<&str> {
        self.symbol_by_uic.get(&uic).map(String::as_str)
    }

    /// UIC for a symbol, resolving through the client on a miss.
    pub async fn get_uic(
        &mut self,
        client: &BrokerClient,
        symbol: &str,
    ) -> BrokerResult<Option<u32>> {
        if let Some(uic) = self.cached_uic(symbol) {
            debug!(symbol, uic, "UIC cache hit");
            return Ok(Some(uic));
        }

        match client.find_uic(symbol).await? {
            Some(uic) => {
                self.insert(symbol, uic);
                Ok(Some(uic))
            }
            None => {
                warn!(symbol, "UIC not found for symbol");
                Ok(None)
            }
        }
    }

    /// Symbol for a UIC, resolving through the client on a miss.
    pub async fn get_symbol(
        &mut self,
        client: &BrokerClient,
        uic: u32,
    ) -> BrokerResult<Option<String>> {
        if let Some(symbol) = self.cached_symbol(uic) {
            debug!(uic, symbol, "Symbol cache hit");
            return Ok(Some(symbol.to_string()));
        }

        match client.find_symbol(uic).await? {
            Some(symbol) => {
                self.insert(symbol.clone(), uic);
                Ok(Some(symbol))
            }
            None => {
                warn!(uic, "Symbol not found for UIC");
                Ok(None)
            }
        }
    }
}
