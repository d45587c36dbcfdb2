use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsPoint {
    pub ts: f64,
    pub value: f64,
}

/// One forecast step with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub ts: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mae: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_mape: Option<f64>,
}

/// Forecast for a node or a pod; scope fields are set according to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    pub history_minutes: u32,
    pub horizon_minutes: u32,
    pub step: u32,
    #[serde(default)]
    pub history: Vec<TsPoint>,
    #[serde(default)]
    pub forecast: Vec<BandPoint>,
    #[serde(default)]
    pub metrics: ErrorMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ForecastResponse {
    /// Highest upper band value over the horizon, if any points exist.
    pub fn peak_upper(&self) -> Option<f64> {
        self.forecast
            .iter()
            .map(|p| p.yhat_upper)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pod_forecast_decodes_without_node() {
        let resp: ForecastResponse = serde_json::from_value(json!({
            "namespace": "default", "pod": "api-0",
            "history_minutes": 240, "horizon_minutes": 120, "step": 60,
            "history": [{"ts": 1.0, "value": 0.4}],
            "forecast": [
                {"ts": 2.0, "yhat": 0.5, "yhat_lower": 0.4, "yhat_upper": 0.7},
                {"ts": 3.0, "yhat": 0.6, "yhat_lower": 0.5, "yhat_upper": 0.9}
            ],
            "metrics": {"mape": 0.12},
            "meta": {"unit": "mcpu", "limit_mcpu": null}
        }))
        .unwrap();
        assert!(resp.node.is_none());
        assert_eq!(resp.metrics.mape, Some(0.12));
        assert_eq!(resp.peak_upper(), Some(0.9));
    }
}
