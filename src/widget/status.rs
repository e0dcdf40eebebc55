//! Connectivity snapshot reported by the backend's status endpoint.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::StatusResponse;

/// A backend dependency shown in the status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Crypto market data MCP server.
    Crypto,
    /// Binance futures MCP server.
    Binance,
    /// LLM provider.
    OpenAi,
}

impl Service {
    pub const ALL: [Self; 3] = [Self::Crypto, Self::Binance, Self::OpenAi];

    /// Element id of the service's status row.
    #[must_use]
    pub fn status_id(self) -> &'static str {
        match self {
            Self::Crypto => "crypto-status",
            Self::Binance => "binance-status",
            Self::OpenAi => "openai-status",
        }
    }

    /// Element id of the service's tool-count row.
    #[must_use]
    pub fn tools_id(self) -> &'static str {
        match self {
            Self::Crypto => "crypto-tools",
            Self::Binance => "binance-tools",
            Self::OpenAi => "openai-tools",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Crypto => "Crypto MCP",
            Self::Binance => "Binance Futures MCP",
            Self::OpenAi => "OpenAI",
        }
    }
}

/// Per-service state in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub connected: bool,
    /// `None` for services that do not expose tools.
    pub tool_count: Option<u32>,
}

/// Latest connectivity snapshot. Only the most recent one is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityStatus {
    pub services: BTreeMap<Service, ServiceStatus>,
    pub model: Option<String>,
}

impl ConnectivityStatus {
    #[must_use]
    pub fn get(&self, service: Service) -> Option<ServiceStatus> {
        self.services.get(&service).copied()
    }
}

impl From<StatusResponse> for ConnectivityStatus {
    fn from(resp: StatusResponse) -> Self {
        let services = BTreeMap::from([
            (
                Service::Crypto,
                ServiceStatus {
                    connected: resp.crypto_connected,
                    tool_count: Some(resp.crypto_tools_count),
                },
            ),
            (
                Service::Binance,
                ServiceStatus {
                    connected: resp.binance_connected,
                    tool_count: Some(resp.binance_tools_count),
                },
            ),
            (
                Service::OpenAi,
                ServiceStatus {
                    connected: resp.openai_connected,
                    tool_count: None,
                },
            ),
        ]);

        Self {
            services,
            model: resp.llm_model.filter(|m| !m.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_reports_tools_for_mcp_services_only() {
        let status = ConnectivityStatus::from(StatusResponse {
            crypto_connected: true,
            binance_connected: false,
            openai_connected: true,
            crypto_tools_count: 5,
            binance_tools_count: 0,
            llm_model: Some("gpt-4o".into()),
        });

        assert_eq!(
            status.get(Service::Crypto),
            Some(ServiceStatus {
                connected: true,
                tool_count: Some(5)
            })
        );
        assert_eq!(status.get(Service::Binance).unwrap().tool_count, Some(0));
        assert_eq!(status.get(Service::OpenAi).unwrap().tool_count, None);
        assert_eq!(status.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn blank_model_is_dropped() {
        let status = ConnectivityStatus::from(StatusResponse {
            llm_model: Some(String::new()),
            ..StatusResponse::default()
        });
        assert_eq!(status.model, None);
    }
}
