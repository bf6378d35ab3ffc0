//! [Hosttech](https://api.ns1.hosttech.eu/api/documentation/) DNS provider.

use std::fmt::{Display, Formatter};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, IntoUrl, Method, RequestBuilder, StatusCode, Url};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use crate::dns::{Batch, Provider, Record};

pub mod records;

use records::{CodecError, Envelope, HosttechRecord};

pub const API_HOST: &str = "https://api.ns1.hosttech.eu/api/user/v1";

#[derive(Debug, Clone)]
pub struct HosttechProvider {
    base_url: Url,
    api_token: String,
    client: Client,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Append,
    Set,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Append => "append",
            Operation::Set => "set",
            Operation::Delete => "delete",
        })
    }
}

impl HosttechProvider {
    pub fn new(api_token: impl Into<String>) -> Result<Self, HosttechError> {
        Self::with_base_url(api_token, API_HOST)
    }

    pub fn with_base_url<U: IntoUrl>(
        api_token: impl Into<String>,
        url: U,
    ) -> Result<Self, HosttechError> {
        Self::with_client(Client::new(), api_token, url)
    }

    pub fn with_client<U: IntoUrl>(
        client: Client,
        api_token: impl Into<String>,
        url: U,
    ) -> Result<Self, HosttechError> {
        let base_url = url.into_url()?;

        if base_url.cannot_be_a_base() {
            Err(HosttechError::BadBaseUrl)
        } else {
            Ok(Self {
                base_url,
                api_token: api_token.into(),
                client,
            })
        }
    }

    /// `{base}/zones/{zone}/records[/{id}]`
    fn endpoint(&self, zone: &str, id: Option<&str>) -> Result<Url, HosttechError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut()
                .map_err(|_| HosttechError::BadBaseUrl)?;
            segments.pop_if_empty().extend(["zones", zone, "records"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Performs one API call and returns the response body.
    ///
    /// Resolves to [`HosttechError::Cancelled`] as soon as `cancel` fires,
    /// dropping the in-flight request.
    async fn call(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: Url,
        body: Option<&HosttechRecord>,
    ) -> Result<String, HosttechError> {
        if cancel.is_cancelled() {
            return Err(HosttechError::Cancelled);
        }

        debug!(%method, %url, "calling Hosttech API");
        let mut request = self.client.request(method, url)
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HosttechError::Cancelled),
            res = exchange(request) => res,
        }
    }

    /// Sends the call for one record of a batch. Encoding and id checks
    /// happen before anything goes over the wire.
    async fn send(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        operation: Operation,
        record: &Record,
    ) -> Result<String, HosttechError> {
        let (method, url, payload) = match operation {
            Operation::Append => {
                let payload = HosttechRecord::from_record(record, records::provenance_comment())?;
                (Method::POST, self.endpoint(zone, None)?, Some(payload))
            }
            Operation::Set => {
                let id = required_id(record)?;
                let payload = HosttechRecord::from_record(record, records::provenance_comment())?;
                (Method::PUT, self.endpoint(zone, Some(id))?, Some(payload))
            }
            Operation::Delete => {
                let id = required_id(record)?;
                (Method::DELETE, self.endpoint(zone, Some(id))?, None)
            }
        };

        self.call(cancel, method, url, payload.as_ref()).await
    }

    async fn batch(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        operation: Operation,
        records: &[Record],
    ) -> Batch<HosttechError> {
        let mut batch = Batch::default();

        for record in records {
            let result = match self.send(cancel, zone, operation, record).await {
                // The API accepted the record, so it counts as done even if
                // the response can't be read back.
                Ok(body) => read_back(operation, record, &body).map_err(|e| {
                    batch.records.push(record.clone());
                    e
                }),
                Err(e) => Err(e),
            };

            match result {
                Ok(done) => batch.records.push(done),
                Err(e) => {
                    error!(
                        name = %record.name,
                        record_type = %record.record_type,
                        completed = batch.records.len(),
                        "{} failed: {}", operation, e
                    );
                    batch.error = Some(e);
                    break;
                }
            }
        }

        batch
    }
}

/// Turns a successful response into the record the provider now holds.
/// Responses without a record (deletes, empty bodies, empty `data`) report
/// the record that was sent.
fn read_back(operation: Operation, record: &Record, body: &str) -> Result<Record, HosttechError> {
    if matches!(operation, Operation::Delete) || body.trim().is_empty() {
        return Ok(record.clone());
    }

    let mut decoded = decode(body)?;
    match decoded.len() {
        0 => Ok(record.clone()),
        1 => Ok(decoded.remove(0)),
        n => Err(HosttechError::UnexpectedRecords(n)),
    }
}

async fn exchange(request: RequestBuilder) -> Result<String, HosttechError> {
    let response = request.send().await?;
    let status = response.status();
    debug!(%status, "Hosttech API responded");

    if !status.is_success() {
        return Err(HosttechError::Status(status));
    }
    Ok(response.text().await?)
}

fn required_id(record: &Record) -> Result<&str, HosttechError> {
    if record.id.is_empty() {
        Err(HosttechError::MissingId(record.name.clone()))
    } else {
        Ok(&record.id)
    }
}

fn decode(body: &str) -> Result<Vec<Record>, HosttechError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    Ok(envelope.into_records()?)
}

#[async_trait::async_trait]
impl Provider for HosttechProvider {
    type Error = HosttechError;

    #[tracing::instrument(skip(self, cancel))]
    async fn list_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
    ) -> Result<Vec<Record>, Self::Error> {
        let url = self.endpoint(zone, None)?;
        let body = self.call(cancel, Method::GET, url, None).await?;
        let records = decode(&body)?;

        debug!("got {} records from Hosttech", records.len());
        Ok(records)
    }

    #[tracing::instrument(skip(self, cancel, records), fields(count = records.len()))]
    async fn append_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error> {
        self.batch(cancel, zone, Operation::Append, records).await
    }

    #[tracing::instrument(skip(self, cancel, records), fields(count = records.len()))]
    async fn set_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error> {
        self.batch(cancel, zone, Operation::Set, records).await
    }

    #[tracing::instrument(skip(self, cancel, records), fields(count = records.len()))]
    async fn delete_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error> {
        self.batch(cancel, zone, Operation::Delete, records).await
    }
}

#[derive(Debug, Error)]
pub enum HosttechError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("call to API was not successful, returned the status code '{0}'")]
    Status(StatusCode),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("expected one record in response, got {0}")]
    UnexpectedRecords(usize),
    #[error("record \"{0}\" has no provider id")]
    MissingId(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("bad base url")]
    BadBaseUrl,
}
