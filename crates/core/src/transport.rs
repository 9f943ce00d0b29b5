//! One HTTP POST per remote operation, with telemetry.
//!
//! Latency is measured from just before the request is sent until the response headers
//! arrive, and is sampled for every call whatever its outcome. A call counts as a success
//! only once its reply has decoded, carried an `OK` result and been accepted by the caller's
//! completion step; everything else, including cancellation, counts as a failure.

use crate::config::GatewayConfig;
use crate::constants::{SOAP_ACTION_HEADER, SOAP_CONTENT_TYPE};
use crate::context::CallContext;
use crate::telemetry::Telemetry;
use crate::{ErxError, ErxResult};
use erx_wire::{decode_reply, encode_request, WireError, WireReply, WireRequest};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Instant;

/// Pooled SOAP client shared by every call of a gateway.
#[derive(Debug)]
pub struct SoapTransport {
    client: Client,
    soap_endpoint: Url,
    api_endpoint: String,
    telemetry: Arc<Telemetry>,
}

impl SoapTransport {
    pub fn new(config: &GatewayConfig, telemetry: Arc<Telemetry>) -> ErxResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ErxError::Transport)?;

        Ok(Self {
            client,
            soap_endpoint: config.soap_endpoint().clone(),
            api_endpoint: config.api_endpoint().to_owned(),
            telemetry,
        })
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Perform `request` and return its reply, which is guaranteed to carry an `OK` result.
    pub async fn call<R>(&self, cx: &CallContext, request: &R) -> ErxResult<R::Reply>
    where
        R: WireRequest + Sync,
        R::Reply: Send,
    {
        self.call_with(cx, request, Ok).await
    }

    /// Perform `request` and fold its `OK` reply through `finish`.
    ///
    /// The call is counted once `finish` has run, so an error it raises counts as a failure.
    pub async fn call_with<R, T, F>(
        &self,
        cx: &CallContext,
        request: &R,
        finish: F,
    ) -> ErxResult<T>
    where
        R: WireRequest + Sync,
        R::Reply: Send,
        F: FnOnce(R::Reply) -> ErxResult<T> + Send,
    {
        let metrics = self.telemetry.operation(R::OPERATION);
        let result = self.exchange(cx, request).await.and_then(finish);

        match &result {
            Ok(_) => metrics.total.inc(),
            Err(e) => {
                metrics.failed.inc();
                match e {
                    ErxError::Remote {
                        code, description, ..
                    } => tracing::warn!(
                        operation = %R::OPERATION,
                        code = %code,
                        "remote rejected call: {}",
                        description
                    ),
                    ErxError::Cancelled => {
                        tracing::debug!(operation = %R::OPERATION, "call cancelled")
                    }
                    ErxError::MirrorDivergence { field } => tracing::warn!(
                        operation = %R::OPERATION,
                        field = %field,
                        "remote mirror does not match the local record"
                    ),
                    other => tracing::error!(operation = %R::OPERATION, "call failed: {}", other),
                }
            }
        }
        result
    }

    async fn exchange<R>(&self, cx: &CallContext, request: &R) -> ErxResult<R::Reply>
    where
        R: WireRequest + Sync,
        R::Reply: Send,
    {
        let operation = R::OPERATION;
        let document = encode_request(request);

        let started = Instant::now();
        let sent = cx
            .race(async {
                self.client
                    .post(self.soap_endpoint.clone())
                    .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
                    .header(SOAP_ACTION_HEADER, operation.soap_action(&self.api_endpoint))
                    .body(document)
                    .send()
                    .await
                    .map_err(ErxError::Transport)
            })
            .await;
        let elapsed = started.elapsed();
        self.telemetry
            .operation(operation)
            .latency
            .record_duration(elapsed);
        tracing::debug!(
            operation = %operation,
            latency_us = elapsed.as_micros() as u64,
            "reply headers received"
        );

        let response = sent?;
        let status = response.status();
        let body = cx
            .race(async { response.text().await.map_err(ErxError::Transport) })
            .await?;

        if !status.is_success() {
            // SOAP 1.1 carries faults on HTTP 500; surface them as the remote's rejection.
            if let Err(fault @ WireError::Fault { .. }) =
                decode_reply::<R::Reply>(operation, &body)
            {
                return Err(ErxError::from_wire(operation, fault));
            }
            return Err(ErxError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
            });
        }

        let reply: R::Reply =
            decode_reply(operation, &body).map_err(|e| ErxError::from_wire(operation, e))?;

        let result = reply.status();
        if !result.is_ok() {
            return Err(ErxError::Remote {
                operation,
                code: result.code.clone(),
                description: result.description.clone(),
            });
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryRegistry;
    use crate::test_support::{reply_document, test_config, CannedReply, FakeSoapServer};
    use erx_types::ClinicKey;
    use erx_wire::messages::prescriptions::IgnoreAlertRequest;
    use erx_wire::{Operation, SingleSignOn};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn ignore_alert() -> IgnoreAlertRequest {
        IgnoreAlertRequest {
            sso: SingleSignOn::generate(&ClinicKey::new("secret").unwrap(), 456, 123),
            prescription_id: 5504,
        }
    }

    const OK_BODY: &str = "<IgnoreAlertResult><Result><ResultCode>OK</ResultCode></Result></IgnoreAlertResult>";

    fn transport(server: &FakeSoapServer, registry: &InMemoryRegistry) -> SoapTransport {
        let telemetry = Arc::new(Telemetry::new(Some(registry)));
        SoapTransport::new(&test_config(&server.url()), telemetry).unwrap()
    }

    #[tokio::test]
    async fn posts_soap_with_action_header() {
        let server = FakeSoapServer::start(vec![CannedReply::ok(reply_document(OK_BODY))]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap();

        let captured = server.requests().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(
            captured[0].header("soapaction"),
            Some("http://www.dosespot.com/API/11/IgnoreAlert")
        );
        assert_eq!(
            captured[0].header("content-type"),
            Some("text/xml; charset=utf-8")
        );
        assert!(captured[0].body.starts_with("<?xml"));
        assert!(captured[0].body.contains("<PrescriptionId>5504</PrescriptionId>"));

        assert_eq!(registry.counter_value("requests/total/IgnoreAlert"), 1);
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 0);
        let latency = registry.histogram("requests/latency/IgnoreAlert").unwrap();
        assert_eq!(latency.count(), 1);
    }

    #[tokio::test]
    async fn non_ok_result_counts_as_failure() {
        let body = "<IgnoreAlertResult><Result><ResultCode>ERROR</ResultCode>\
                    <ResultDescription>unknown prescription</ResultDescription></Result></IgnoreAlertResult>";
        let server = FakeSoapServer::start(vec![CannedReply::ok(reply_document(body))]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap_err();

        match err {
            ErxError::Remote {
                operation,
                code,
                description,
            } => {
                assert_eq!(operation, Operation::IgnoreAlert);
                assert_eq!(code, "ERROR");
                assert_eq!(description, "unknown prescription");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.counter_value("requests/total/IgnoreAlert"), 0);
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
    }

    #[tokio::test]
    async fn malformed_reply_is_a_decode_error() {
        let server =
            FakeSoapServer::start(vec![CannedReply::ok("<not-soap>".to_owned())]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap_err();
        assert!(matches!(err, ErxError::Decode { .. }));
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
    }

    #[tokio::test]
    async fn rejected_completion_counts_as_failure() {
        let server = FakeSoapServer::start(vec![CannedReply::ok(reply_document(OK_BODY))]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call_with(&CallContext::background(), &ignore_alert(), |_| {
                Err::<(), _>(ErxError::divergence("first_name"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ErxError::MirrorDivergence { .. }));
        assert_eq!(registry.counter_value("requests/total/IgnoreAlert"), 0);
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
        let latency = registry.histogram("requests/latency/IgnoreAlert").unwrap();
        assert_eq!(latency.count(), 1);
    }

    #[tokio::test]
    async fn http_fault_maps_to_remote_error() {
        let fault = "<soap:Fault><faultcode>soap:Client</faultcode>\
                     <faultstring>bad single sign on</faultstring></soap:Fault>";
        let server = FakeSoapServer::start(vec![CannedReply::status(500, reply_document(fault))]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap_err();
        match err {
            ErxError::Remote { description, .. } => assert_eq!(description, "bad single sign on"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_http_errors_are_unexpected_status() {
        let server =
            FakeSoapServer::start(vec![CannedReply::status(503, "busy".to_owned())]).await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ErxError::UnexpectedStatus { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn cancellation_is_sampled_and_counted() {
        let server = FakeSoapServer::start(vec![CannedReply::ok(reply_document(OK_BODY))
            .delayed(Duration::from_secs(10))])
        .await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = transport
            .call(&CallContext::with_token(token), &ignore_alert())
            .await
            .unwrap_err();

        assert!(matches!(err, ErxError::Cancelled));
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
        assert_eq!(registry.counter_value("requests/total/IgnoreAlert"), 0);
        let latency = registry.histogram("requests/latency/IgnoreAlert").unwrap();
        assert_eq!(latency.count(), 1);
    }

    #[tokio::test]
    async fn deadline_cancels_slow_exchange() {
        let server = FakeSoapServer::start(vec![CannedReply::ok(reply_document(OK_BODY))
            .delayed(Duration::from_secs(10))])
        .await;
        let registry = InMemoryRegistry::new();
        let transport = transport(&server, &registry);

        let err = transport
            .call(
                &CallContext::with_timeout(Duration::from_millis(50)),
                &ignore_alert(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ErxError::Cancelled));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api.asmx", listener.local_addr().unwrap());
        drop(listener);

        let registry = InMemoryRegistry::new();
        let telemetry = Arc::new(Telemetry::new(Some(&registry)));
        let transport = SoapTransport::new(&test_config(&url), telemetry).unwrap();

        let err = transport
            .call(&CallContext::background(), &ignore_alert())
            .await
            .unwrap_err();
        assert!(matches!(err, ErxError::Transport(_)));
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
    }
}
