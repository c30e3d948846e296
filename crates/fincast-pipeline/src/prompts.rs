//! Prompt templates for the enrichment tasks and the final synthesis.
//!
//! Templates are plain `format!` strings so that user-supplied text (task,
//! retrieved context) is inserted exactly once and never re-interpreted.

use fincast_core::MarketSnapshot;

/// Retrieval intent prepended to the task for financial extraction.
pub const FINANCIAL_INTENT: &str = "Extract key financial metrics from the latest reports for task:";

/// Retrieval intent prepended to the task for transcript analysis.
pub const QUALITATIVE_INTENT: &str = "Extract qualitative insights from the latest 2-3 earnings call transcripts for task:";

pub fn financial_query(task: &str) -> String {
    format!("{FINANCIAL_INTENT} {task}.")
}

pub fn qualitative_query(task: &str) -> String {
    format!("{QUALITATIVE_INTENT} {task}.")
}

pub fn financial_prompt(context: &str, task: &str) -> String {
    format!(
        "You are a financial analyst. From the following quarterly financial report context, \
extract key forecastable business metrics with exact values, units (if any) and periods. \
If a metric is missing, report it as 'N/A'.\n\n\
Context:\n{context}\n\n\
End goal:\n{task}\n\n\
Metrics to extract:\n\
- quarter\n\
- total_revenue\n\
- net_profit\n\
- operating_margin\n\
- ebitda\n\
- earnings_per_share (EPS)\n\
- pe_ratio\n\
- roe (Return on Equity)\n\
- total_expenses\n\
- finance_costs\n\
- depreciation_amortization\n\
- tax_expense\n\
- free_cash_flow\n\
- any other metric relevant to financial performance\n\n\
Make sure every extracted value and comment is usable for forecasting future quarters."
    )
}

pub fn qualitative_prompt(context: &str, task: &str) -> String {
    format!(
        "You are a financial analyst. Perform a qualitative analysis of the following context taken \
from the latest earnings call transcripts and extract:\n\
1. Recurring Themes: topics, strategic initiatives or challenges raised across several calls, \
especially those relevant to future business performance.\n\
2. Management Sentiment: the overall tone about performance and outlook, classified as one of \
'optimistic', 'cautious', 'neutral', 'negative'.\n\
3. Forward-Looking Statements: any specific outlook, guidance or expectation for future periods \
(e.g. 'expect revenue growth to moderate', 'target 20% increase').\n\
4. Risks & Opportunities: external or internal factors that could affect future performance, \
each marked as short-term or long-term.\n\n\
Context:\n{context}\n\n\
End goal:\n{task}\n\n\
Return the findings as structured JSON, including any qualitative metric or analysis that could \
inform a forecast for future quarters."
    )
}

/// Renders the market snapshot as a JSON object; `{}` when empty.
pub fn render_market(market: &MarketSnapshot) -> String {
    serde_json::to_string_pretty(market).unwrap_or_else(|_| "{}".to_string())
}

pub fn synthesis_prompt(task: &str, financials: &str, qualitative: &str, market: &MarketSnapshot) -> String {
    let market = render_market(market);
    format!(
        r#"You are a senior financial analyst preparing a forecast for the upcoming quarter.

Inputs:
- Financial Metrics (latest quarterly reports):
{financials}

- Earnings Call Insights:
{qualitative}

- Market Data:
{market}

Task:
{task}

Using these inputs, write a clear and concise forecast in JSON with the sections below. You may perform analytical calculations and extrapolations to estimate next quarter's performance.

1. trends: key financial trends such as revenue growth, margin changes, cost variations.
2. management_outlook: management sentiment and forward guidance.
3. risks: main risks, each with a short description and estimated impact (high/medium/low).
4. opportunities: main opportunities, each with a short description and estimated benefit.
5. assumptions: the assumptions behind the forecast (market conditions, cost stability, regulatory environment, ...).
6. overall_forecast: a summary with numeric estimates where possible and a confidence level ('high', 'medium' or 'low').

Respond with JSON only, without commentary outside the JSON.

Example output:
{{
  "trends": {{
    "revenue_growth": "12% YoY",
    "operating_margin": "14%",
    "cost_increase": "3% due to supply chain"
  }},
  "management_outlook": {{
    "sentiment": "cautiously optimistic",
    "forward_guidance": [
      "Expect revenue growth of 10-15%",
      "Target operating margin around 14%"
    ]
  }},
  "risks": [
    {{"risk": "raw material price volatility", "impact": "medium"}},
    {{"risk": "regulatory delays", "impact": "low"}}
  ],
  "opportunities": [
    {{"opportunity": "expansion into Asia market", "benefit": "increase revenue by 5%"}},
    {{"opportunity": "new product launch", "benefit": "boost net profit margin"}}
  ],
  "assumptions": [
    "Stable currency exchange rates",
    "No major change in client IT budgets"
  ],
  "overall_forecast": {{
    "summary": "Strong revenue growth expected from new products and market expansion, balanced by supply chain risks.",
    "confidence_level": "medium"
  }}
}}
"#
    )
}
