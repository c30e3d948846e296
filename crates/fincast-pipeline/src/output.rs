//! Parsing of the synthesizer's raw text into a typed forecast.
//!
//! Models often wrap JSON in Markdown fences, so those are stripped first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use fincast_core::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    pub trends: BTreeMap<String, serde_json::Value>,
    pub management_outlook: serde_json::Value,
    pub risks: Vec<Risk>,
    pub opportunities: Vec<Opportunity>,
    #[serde(default)]
    pub assumptions: serde_json::Value,
    pub overall_forecast: OverallForecast,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Risk {
    #[serde(alias = "risk")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    #[serde(alias = "opportunity")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallForecast {
    pub summary: String,
    pub confidence_level: Confidence,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

/// Removes a leading ```` ```json ```` (or bare ```` ``` ````) fence and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

pub fn parse_forecast(raw: &str) -> Result<Forecast> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| Error::MalformedForecast(e.to_string()))
}
