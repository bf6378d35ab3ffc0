use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod hosttech;

/// A provider-agnostic DNS record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Provider-assigned identifier. Empty until the record is persisted.
    pub id: String,
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    pub ttl: Duration,
    /// Only meaningful for MX and SRV records.
    pub priority: u16,
    /// Only meaningful for SRV records.
    pub weight: u16,
    /// Only meaningful for SRV records.
    pub port: u16,
}

impl Record {
    pub fn new(record_type: RecordType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RecordType {
    #[default]
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    TXT,
    TLSA,
    CAA,
    PTR,
    SRV,
    /// Any record type without a dedicated variant, e.g. `SOA`.
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::MX => "MX",
            RecordType::NS => "NS",
            RecordType::TXT => "TXT",
            RecordType::TLSA => "TLSA",
            RecordType::CAA => "CAA",
            RecordType::PTR => "PTR",
            RecordType::SRV => "SRV",
            RecordType::Other(s) => s,
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "CNAME" => RecordType::CNAME,
            "MX" => RecordType::MX,
            "NS" => RecordType::NS,
            "TXT" => RecordType::TXT,
            "TLSA" => RecordType::TLSA,
            "CAA" => RecordType::CAA,
            "PTR" => RecordType::PTR,
            "SRV" => RecordType::SRV,
            _ => RecordType::Other(s.to_owned()),
        })
    }
}

/// Outcome of a per-record operation that stops at the first failure.
///
/// `records` holds every record that was processed successfully before
/// `error` occurred, in input order.
#[derive(Debug)]
pub struct Batch<E> {
    pub records: Vec<Record>,
    pub error: Option<E>,
}

impl<E> Batch<E> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discards the completed records if the batch failed.
    pub fn into_result(self) -> Result<Vec<Record>, E> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}

impl<E> Default for Batch<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            error: None,
        }
    }
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    type Error: std::error::Error + Send;

    /// Lists all records of `zone`.
    async fn list_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Creates `records` in `zone`, returning them as the provider stored them.
    async fn append_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error>;

    /// Updates existing records, identified by their `id`.
    async fn set_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error>;

    /// Deletes records by `id`, returning the input records that were removed.
    async fn delete_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: &[Record],
    ) -> Batch<Self::Error>;
}
