use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::TickerResolver;

const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("TCS", "TCS.NS"),
    ("INFOSYS", "INFY.NS"),
    ("WIPRO", "WIPRO.NS"),
    ("HDFC BANK", "HDFCBANK.NS"),
    ("RELIANCE", "RELIANCE.NS"),
    ("ICICI BANK", "ICICIBANK.NS"),
    ("BHARTI AIRTEL", "BHARTIARTL.NS"),
    ("APPLE", "AAPL"),
    ("MICROSOFT", "MSFT"),
    ("AMAZON", "AMZN"),
    ("GOOGLE", "GOOG"),
    ("META", "META"),
    ("TESLA", "TSLA"),
    ("BERKSHIRE HATHAWAY", "BRK-A"),
    ("VISA", "V"),
    ("JPMORGAN CHASE", "JPM"),
    ("JOHNSON & JOHNSON", "JNJ"),
    ("WALMART", "WMT"),
    ("PROCTER & GAMBLE", "PG"),
    ("MASTERCARD", "MA"),
    ("BANK OF AMERICA", "BAC"),
    ("NVIDIA", "NVDA"),
    ("HOME DEPOT", "HD"),
    ("ADOBE", "ADBE"),
    ("CISCO", "CSCO"),
    ("NETFLIX", "NFLX"),
    ("PEPSICO", "PEP"),
    ("LARSEN & TOUBRO", "LT.NS"),
    ("AXIS BANK", "AXISBANK.NS"),
    ("KOTAK MAHINDRA BANK", "KOTAKBANK.NS"),
    ("ULTRATECH CEMENT", "ULTRACEMCO.NS"),
    ("HCL TECHNOLOGIES", "HCLTECH.NS"),
    ("MARUTI SUZUKI", "MARUTI.NS"),
    ("TATA MOTORS", "TATAMOTORS.NS"),
    ("TATA STEEL", "TATASTEEL.NS"),
    ("MAHINDRA & MAHINDRA", "M&M.NS"),
    ("ASIAN PAINTS", "ASIANPAINT.NS"),
    ("SUN PHARMACEUTICAL", "SUNPHARMA.NS"),
    ("DIVI'S LABORATORIES", "DIVISLAB.NS"),
    ("BRITANNIA INDUSTRIES", "BRITANNIA.NS"),
    ("NESTLE INDIA", "NESTLEIND.NS"),
    ("ADANI PORTS", "ADANIPORTS.NS"),
    ("STATE BANK OF INDIA", "SBIN.NS"),
    ("POWER GRID", "POWERGRID.NS"),
    ("SHREE CEMENT", "SHREECEM.NS"),
    ("INDUSIND BANK", "INDUSINDBK.NS"),
    ("BAJAJ FINANCE", "BAJFINANCE.NS"),
];

/// Trimmed and upper-cased lookup key; `None` for blank input.
pub fn normalize_name(name: &str) -> Option<String> {
    let key = name.trim().to_uppercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Built-in table of well-known company names.
#[derive(Debug, Clone)]
pub struct StaticTickerMap {
    entries: HashMap<String, String>,
}

impl StaticTickerMap {
    pub fn new() -> Self {
        let entries = KNOWN_COMPANIES
            .iter()
            .map(|(name, symbol)| (name.to_string(), symbol.to_string()))
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        let key = normalize_name(name)?;
        self.entries.get(&key).map(String::as_str)
    }
}

impl Default for StaticTickerMap {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickerResolver for StaticTickerMap {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lookup(name).map(str::to_string))
    }
}

/// Checks the built-in table first, then asks the remote resolver.
/// Remote failures are logged and treated as "not found".
pub struct FallbackResolver<R> {
    local: StaticTickerMap,
    remote: R,
}

impl<R: TickerResolver> FallbackResolver<R> {
    pub fn new(remote: R) -> Self {
        Self { local: StaticTickerMap::new(), remote }
    }
}

#[async_trait]
impl<R: TickerResolver> TickerResolver for FallbackResolver<R> {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        let Some(key) = normalize_name(name) else {
            return Ok(None);
        };

        if let Some(symbol) = self.local.lookup(&key) {
            debug!("Resolved '{}' from built-in table: {}", key, symbol);
            return Ok(Some(symbol.to_string()));
        }

        match self.remote.resolve(&key).await {
            Ok(symbol) => Ok(symbol),
            Err(e) => {
                warn!("Ticker search for '{}' failed: {}", key, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockTickerResolver;
    use mockall::predicate::eq;

    #[test]
    fn test_static_lookup_is_case_insensitive() {
        let map = StaticTickerMap::new();
        assert_eq!(map.lookup("  tcs "), Some("TCS.NS"));
        assert_eq!(map.lookup("Apple"), Some("AAPL"));
        assert_eq!(map.lookup("unknown co"), None);
        assert_eq!(map.lookup("   "), None);
        assert_eq!(map.lookup("Mahindra & Mahindra"), Some("M&M.NS"));
    }

    #[tokio::test]
    async fn test_fallback_prefers_local_table() {
        let mut remote = MockTickerResolver::new();
        remote.expect_resolve().never();

        let resolver = FallbackResolver::new(remote);
        assert_eq!(resolver.resolve("infosys").await.unwrap(), Some("INFY.NS".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_queries_remote_with_normalized_name() {
        let mut remote = MockTickerResolver::new();
        remote
            .expect_resolve()
            .with(eq("ACME WIDGETS"))
            .times(1)
            .returning(|_| Ok(Some("ACME".to_string())));

        let resolver = FallbackResolver::new(remote);
        assert_eq!(resolver.resolve(" acme widgets").await.unwrap(), Some("ACME".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_swallows_remote_errors() {
        let mut remote = MockTickerResolver::new();
        remote
            .expect_resolve()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let resolver = FallbackResolver::new(remote);
        assert_eq!(resolver.resolve("nowhere inc").await.unwrap(), None);
        assert_eq!(resolver.resolve("").await.unwrap(), None);
    }
}
