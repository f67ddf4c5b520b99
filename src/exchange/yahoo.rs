use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{PriceHistorySource, TickerResolver};
use crate::settings::DataSettings;
use crate::types::{PriceHistory, PricePoint, PriceSeries};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: String,
}

/// Yahoo Finance chart and search endpoints.
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    search_url: String,
}

impl YahooFinanceClient {
    pub fn new(settings: &DataSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.yahoo_base_url.trim_end_matches('/').to_string(),
            search_url: settings.yahoo_search_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full daily history up to `end_date`.
    pub async fn get_daily_closes(&self, symbol: &str, end_date: NaiveDate) -> Result<PriceHistory> {
        let period2 = (end_date + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| anyhow!("Invalid end date {}", end_date))?;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        info!("Fetching daily closes for {} up to {}", symbol, end_date);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", "0".to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        // Unknown symbols come back as 404 with a "Not Found" chart error body
        if resp.status() == StatusCode::NOT_FOUND {
            warn!("No chart found for {}", symbol);
            return Ok(PriceHistory::empty(symbol));
        }
        let resp: ChartResponse = resp.error_for_status()?.json().await?;

        let mut history = parse_chart(symbol, resp)?;
        history.series.truncate_after(end_date);

        info!("Fetched {} closes for {}", history.series.len(), symbol);
        Ok(history)
    }

    /// First symbol Yahoo's search returns for `query`.
    pub async fn search_symbol(&self, query: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/finance/search", self.search_url);
        let resp: SearchResponse = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let symbol = resp.quotes.into_iter().next().map(|q| q.symbol);
        debug!("Search for '{}' returned {:?}", query, symbol);
        Ok(symbol)
    }
}

fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<PriceHistory> {
    if let Some(err) = resp.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            warn!("No chart found for {}: {}", symbol, err.description);
            return Ok(PriceHistory::empty(symbol));
        }
        return Err(anyhow!("Yahoo chart error for {}: {} ({})", symbol, err.description, err.code));
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceHistory::empty(symbol));
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut points: Vec<PricePoint> = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0;
    for (ts, close) in result.timestamp.iter().zip(closes.iter()) {
        let Some(close) = close.filter(|c| c.is_finite() && *c > 0.0) else {
            skipped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0).map(|dt| dt.date_naive()) else {
            skipped += 1;
            continue;
        };
        // Yahoo sometimes repeats the current session as a second row
        if let Some(last) = points.last_mut() {
            if last.date == date {
                last.close = close;
                continue;
            }
        }
        points.push(PricePoint::new(date, close));
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a usable close for {}", skipped, symbol);
    }

    Ok(PriceHistory {
        symbol: symbol.to_string(),
        currency: result.meta.currency,
        series: PriceSeries::new(points)?,
    })
}

#[async_trait]
impl PriceHistorySource for YahooFinanceClient {
    async fn fetch(&self, symbol: &str, end_date: NaiveDate) -> Result<PriceHistory> {
        self.get_daily_closes(symbol, end_date).await
    }
}

#[async_trait]
impl TickerResolver for YahooFinanceClient {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        self.search_symbol(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"currency": "USD", "symbol": "AAPL", "gmtoffset": -14400},
                    "timestamp": [1709562600, 1709649000, 1709735400, 1709735500],
                    "indicators": {"quote": [{"close": [175.1, null, 169.12, 170.0]}]}
                }],
                "error": null
            }
        }"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let history = parse_chart("AAPL", resp).unwrap();

        assert_eq!(history.currency.as_deref(), Some("USD"));
        assert_eq!(history.series.len(), 2);
        assert_eq!(history.series.closes(), vec![175.1, 170.0]);
        assert_eq!(history.series.last_date(), NaiveDate::from_ymd_opt(2024, 3, 6));
    }

    #[test]
    fn test_parse_chart_unknown_symbol_is_empty() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let history = parse_chart("BADSYM", resp).unwrap();
        assert_eq!(history.symbol, "BADSYM");
        assert!(history.series.is_empty());
    }

    #[test]
    fn test_parse_chart_other_errors_propagate() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(parse_chart("NOPE", resp).is_err());
    }

    #[test]
    fn test_parse_chart_without_result_is_empty() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let history = parse_chart("EMPTY", resp).unwrap();
        assert!(history.series.is_empty());
    }
}
