#![allow(dead_code)]

// Shared mock transport for integration tests
// Records every call and can be told to fail specific primitives

use async_trait::async_trait;
use nearby_sync::{
    AdvertisingOptions, DeviceId, DiscoveryOptions, NearbyError, Result, Transport,
};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    StartAdvertising {
        local_name: String,
        service_id: String,
    },
    StopAdvertising,
    StartDiscovery {
        service_id: String,
    },
    StopDiscovery,
    RequestConnection {
        local_name: String,
        target_id: String,
    },
    AcceptConnection {
        id: String,
    },
    DisconnectFromEndpoint {
        id: String,
    },
    SendPayload {
        id: String,
        payload: Vec<u8>,
    },
}

#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    request_failures: Mutex<u32>,
    send_failure: Mutex<Option<String>>,
    discovery_failure: Mutex<Option<String>>,
    advertising_failure: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` connection requests with an SDK-style diagnostic
    pub fn fail_next_requests(&self, count: u32) {
        *self.request_failures.lock().unwrap() = count;
    }

    pub fn fail_sends(&self, diagnostic: &str) {
        *self.send_failure.lock().unwrap() = Some(diagnostic.to_string());
    }

    pub fn fail_discovery(&self, diagnostic: &str) {
        *self.discovery_failure.lock().unwrap() = Some(diagnostic.to_string());
    }

    pub fn fail_advertising(&self, diagnostic: &str) {
        *self.advertising_failure.lock().unwrap() = Some(diagnostic.to_string());
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// All `(local_name, target_id)` pairs passed to `request_connection`
    pub fn connection_requests(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::RequestConnection {
                    local_name,
                    target_id,
                } => Some((local_name, target_id)),
                _ => None,
            })
            .collect()
    }

    pub fn start_discovery_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::StartDiscovery { .. }))
            .count()
    }

    pub fn start_advertising_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::StartAdvertising { .. }))
            .count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn start_advertising(
        &self,
        local_name: &str,
        service_id: &str,
        _options: AdvertisingOptions,
    ) -> Result<()> {
        self.record(TransportCall::StartAdvertising {
            local_name: local_name.to_string(),
            service_id: service_id.to_string(),
        });
        match self.advertising_failure.lock().unwrap().as_ref() {
            Some(diagnostic) => Err(NearbyError::AdvertisingFailed(diagnostic.clone())),
            None => Ok(()),
        }
    }

    async fn stop_advertising(&self) -> Result<()> {
        self.record(TransportCall::StopAdvertising);
        Ok(())
    }

    async fn start_discovery(&self, service_id: &str, _options: DiscoveryOptions) -> Result<()> {
        self.record(TransportCall::StartDiscovery {
            service_id: service_id.to_string(),
        });
        match self.discovery_failure.lock().unwrap().as_ref() {
            Some(diagnostic) => Err(NearbyError::DiscoveryFailed(diagnostic.clone())),
            None => Ok(()),
        }
    }

    async fn stop_discovery(&self) -> Result<()> {
        self.record(TransportCall::StopDiscovery);
        Ok(())
    }

    async fn request_connection(&self, local_name: &str, target_id: &DeviceId) -> Result<()> {
        self.record(TransportCall::RequestConnection {
            local_name: local_name.to_string(),
            target_id: target_id.clone(),
        });

        let mut failures = self.request_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(NearbyError::ConnectionFailed(
                "8012: STATUS_ENDPOINT_IO_ERROR".to_string(),
            ));
        }
        Ok(())
    }

    async fn accept_connection(&self, id: &DeviceId) -> Result<()> {
        self.record(TransportCall::AcceptConnection { id: id.clone() });
        Ok(())
    }

    async fn disconnect_from_endpoint(&self, id: &DeviceId) -> Result<()> {
        self.record(TransportCall::DisconnectFromEndpoint { id: id.clone() });
        Ok(())
    }

    async fn send_payload(&self, id: &DeviceId, payload: &[u8]) -> Result<()> {
        self.record(TransportCall::SendPayload {
            id: id.clone(),
            payload: payload.to_vec(),
        });
        match self.send_failure.lock().unwrap().as_ref() {
            Some(diagnostic) => Err(NearbyError::SendMessageFailed(diagnostic.clone())),
            None => Ok(()),
        }
    }
}
