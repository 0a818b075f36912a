use serde::Serialize;

/// Identity half of the lookup response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityResponse {
    pub name: Option<String>,
    pub registered: bool,
}

/// Staking analytics half of the lookup response. Token amounts are in whole tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingAnalytics {
    pub staked_balance: f64,
    #[serde(rename = "stakedBalanceUSD")]
    pub staked_balance_usd: f64,
    pub total_supply: f64,
    pub voting_power: f64,
    pub holding_period_days: i64,
    pub network: String,
}

/// Wire envelope: `{"data": ...}` on success, `{"msg": ...}` for rejected input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Data { data: T },
    Invalid { msg: String },
}

impl<T> ApiResponse<T> {
    pub fn is_invalid(&self) -> bool {
        matches!(self, ApiResponse::Invalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analytics_wire_format() {
        let response = ApiResponse::Data {
            data: StakingAnalytics {
                staked_balance: 10.0,
                staked_balance_usd: 0.5,
                total_supply: 1000.0,
                voting_power: 10.0,
                holding_period_days: 42,
                network: "mainnet".into(),
            },
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "data": {
                    "stakedBalance": 10.0,
                    "stakedBalanceUSD": 0.5,
                    "totalSupply": 1000.0,
                    "votingPower": 10.0,
                    "holdingPeriodDays": 42,
                    "network": "mainnet"
                }
            })
        );
    }

    #[test]
    fn test_invalid_envelope() {
        let response: ApiResponse<IdentityResponse> = ApiResponse::Invalid {
            msg: "Address is not valid!".into(),
        };
        assert!(response.is_invalid());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "msg": "Address is not valid!" })
        );
    }
}
