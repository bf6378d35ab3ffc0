//! Hosttech record payloads and their mapping onto [`Record`].
//!
//! Every record the API returns carries a `type` discriminator. Payloads are
//! decoded in two steps: the discriminator first, then the full variant.

use crate::dns::{Record, RecordType};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Fields shared by every record type. The `type` key is written by
/// [`HosttechRecord`]'s tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Base {
    fn from_record(record: &Record, comment: String) -> Result<Self, CodecError> {
        let id = if record.id.is_empty() {
            None
        } else {
            let id = record.id.parse::<u64>()
                .map_err(|_| CodecError::InvalidId(record.id.clone()))?;
            Some(id)
        };

        Ok(Self {
            id,
            ttl: u32::try_from(record.ttl.as_secs()).unwrap_or(u32::MAX),
            comment,
        })
    }

    fn into_record(self, record_type: RecordType, name: String, value: String) -> Record {
        Record {
            id: self.id.map(|id| id.to_string()).unwrap_or_default(),
            record_type,
            name,
            value,
            ttl: Duration::from_secs(self.ttl.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ARecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub ipv4: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AAAARecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub ipv6: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CNAMERecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub cname: String,
}

/// `ownername` is the owner of the record, `name` the mail server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MXRecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub ownername: String,
    pub pref: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NSRecord {
    #[serde(flatten)]
    pub base: Base,
    pub ownername: String,
    pub targetname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TXTRecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TLSARecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CAARecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub flag: u8,
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PTRRecord {
    #[serde(flatten)]
    pub base: Base,
    pub name: String,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SRVRecord {
    #[serde(flatten)]
    pub base: Base,
    pub service: String,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum HosttechRecord {
    A(ARecord),
    AAAA(AAAARecord),
    CNAME(CNAMERecord),
    MX(MXRecord),
    NS(NSRecord),
    TXT(TXTRecord),
    TLSA(TLSARecord),
    CAA(CAARecord),
    PTR(PTRRecord),
    SRV(SRVRecord),
}

const CAA_DEFAULT_TAG: &str = "issue";

#[derive(Deserialize)]
struct Discriminator {
    #[serde(rename = "type")]
    record_type: String,
}

impl HosttechRecord {
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        let Discriminator { record_type } =
            Discriminator::deserialize(&value).map_err(CodecError::MissingType)?;

        let record = match record_type.as_str() {
            "A" => HosttechRecord::A(variant(value, &record_type)?),
            "AAAA" => HosttechRecord::AAAA(variant(value, &record_type)?),
            "CNAME" => HosttechRecord::CNAME(variant(value, &record_type)?),
            "MX" => HosttechRecord::MX(variant(value, &record_type)?),
            "NS" => HosttechRecord::NS(variant(value, &record_type)?),
            "TXT" => HosttechRecord::TXT(variant(value, &record_type)?),
            "TLSA" => HosttechRecord::TLSA(variant(value, &record_type)?),
            "CAA" => HosttechRecord::CAA(variant(value, &record_type)?),
            "PTR" => HosttechRecord::PTR(variant(value, &record_type)?),
            "SRV" => HosttechRecord::SRV(variant(value, &record_type)?),
            _ => return Err(CodecError::UnknownType(record_type)),
        };
        Ok(record)
    }

    /// Builds the payload for a create or update call.
    pub fn from_record(record: &Record, comment: String) -> Result<Self, CodecError> {
        let base = Base::from_record(record, comment)?;
        let name = record.name.clone();
        let value = record.value.clone();

        Ok(match &record.record_type {
            RecordType::A => HosttechRecord::A(ARecord { base, name, ipv4: value }),
            RecordType::AAAA => HosttechRecord::AAAA(AAAARecord { base, name, ipv6: value }),
            RecordType::CNAME => HosttechRecord::CNAME(CNAMERecord { base, name, cname: value }),
            RecordType::MX => HosttechRecord::MX(MXRecord {
                base,
                name: value,
                ownername: name,
                pref: record.priority,
            }),
            RecordType::NS => HosttechRecord::NS(NSRecord {
                base,
                ownername: name,
                targetname: value,
            }),
            RecordType::TXT => HosttechRecord::TXT(TXTRecord { base, name, text: value }),
            RecordType::TLSA => HosttechRecord::TLSA(TLSARecord { base, name, text: value }),
            RecordType::CAA => HosttechRecord::CAA(CAARecord {
                base,
                name,
                flag: 0,
                tag: CAA_DEFAULT_TAG.to_owned(),
                value,
            }),
            RecordType::PTR => HosttechRecord::PTR(PTRRecord { base, name, origin: value }),
            RecordType::SRV => HosttechRecord::SRV(SRVRecord {
                base,
                service: name,
                priority: record.priority,
                weight: record.weight,
                port: record.port,
                target: value,
            }),
            RecordType::Other(_) => {
                return Err(CodecError::Unsupported(record.record_type.clone()))
            }
        })
    }
}

fn variant<T: DeserializeOwned>(value: Value, record_type: &str) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(|source| CodecError::Malformed {
        record_type: record_type.to_owned(),
        source,
    })
}

impl From<HosttechRecord> for Record {
    fn from(record: HosttechRecord) -> Self {
        match record {
            HosttechRecord::A(r) => r.base.into_record(RecordType::A, r.name, r.ipv4),
            HosttechRecord::AAAA(r) => r.base.into_record(RecordType::AAAA, r.name, r.ipv6),
            HosttechRecord::CNAME(r) => r.base.into_record(RecordType::CNAME, r.name, r.cname),
            HosttechRecord::MX(r) => r.base
                .into_record(RecordType::MX, r.ownername, r.name)
                .with_priority(r.pref),
            HosttechRecord::NS(r) => r.base.into_record(RecordType::NS, r.ownername, r.targetname),
            HosttechRecord::TXT(r) => r.base.into_record(RecordType::TXT, r.name, r.text),
            HosttechRecord::TLSA(r) => r.base.into_record(RecordType::TLSA, r.name, r.text),
            HosttechRecord::CAA(r) => r.base.into_record(RecordType::CAA, r.name, r.value),
            HosttechRecord::PTR(r) => r.base.into_record(RecordType::PTR, r.name, r.origin),
            HosttechRecord::SRV(r) => Record {
                priority: r.priority,
                weight: r.weight,
                port: r.port,
                ..r.base.into_record(RecordType::SRV, r.service, r.target)
            },
        }
    }
}

/// The `{"data": ...}` wrapper around every response. Collection endpoints
/// return an array, single-record endpoints an object.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    data: Data,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Data {
    Many(Vec<Value>),
    One(Value),
}

impl Envelope {
    pub fn into_records(self) -> Result<Vec<Record>, CodecError> {
        let values = match self.data {
            Data::Many(values) => values,
            Data::One(value) => vec![value],
        };

        values.into_iter()
            .map(|v| HosttechRecord::from_value(v).map(Record::from))
            .collect()
    }
}

pub fn provenance_comment() -> String {
    format!(
        "This record was created with hosttech-dns at {} UTC",
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("record type \"{0}\" is not supported")]
    UnknownType(String),
    #[error("record has no type: {0}")]
    MissingType(#[source] serde_json::Error),
    #[error("malformed {record_type} record: {source}")]
    Malformed {
        record_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported record type {0}")]
    Unsupported(RecordType),
    #[error("invalid record id \"{0}\"")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Record {
        HosttechRecord::from_value(value).unwrap().into()
    }

    #[test]
    fn mx_maps_ownername_to_name() {
        let record = decode(json!({
            "type": "MX",
            "ownername": "example.com",
            "name": "mail.example.com",
            "pref": 10,
            "ttl": 3600,
            "id": 5,
        }));

        assert_eq!(record, Record {
            id: "5".to_owned(),
            record_type: RecordType::MX,
            name: "example.com".to_owned(),
            value: "mail.example.com".to_owned(),
            ttl: Duration::from_secs(3600),
            priority: 10,
            ..Default::default()
        });
    }

    #[test]
    fn ptr_has_no_priority() {
        let record = decode(json!({
            "type": "PTR",
            "id": 7,
            "name": "1.2.0.192.in-addr.arpa",
            "origin": "host.example.com",
            "priority": 20,
            "ttl": 600,
        }));

        assert_eq!(record.priority, 0);
        assert_eq!(record.value, "host.example.com");
    }

    #[test]
    fn srv_keeps_weight_and_port() {
        let record = decode(json!({
            "type": "SRV",
            "id": 9,
            "service": "_sip._tcp",
            "priority": 10,
            "weight": 60,
            "port": 5060,
            "target": "sip.example.com",
            "ttl": 3600,
        }));

        assert_eq!(record.name, "_sip._tcp");
        assert_eq!(record.value, "sip.example.com");
        assert_eq!((record.priority, record.weight, record.port), (10, 60, 5060));
    }

    #[test]
    fn round_trips_every_type() {
        let payloads = [
            json!({"type": "A", "id": 1, "ttl": 3600, "comment": "c", "name": "www", "ipv4": "192.0.2.1"}),
            json!({"type": "AAAA", "id": 2, "ttl": 3600, "comment": "c", "name": "www", "ipv6": "2001:db8::1"}),
            json!({"type": "CNAME", "id": 3, "ttl": 600, "comment": "c", "name": "blog", "cname": "www.example.com"}),
            json!({"type": "MX", "id": 4, "ttl": 3600, "comment": "c", "name": "mail.example.com", "ownername": "example.com", "pref": 10}),
            json!({"type": "NS", "id": 5, "ttl": 86400, "comment": "c", "ownername": "sub", "targetname": "ns1.example.com"}),
            json!({"type": "TXT", "id": 6, "ttl": 300, "comment": "c", "name": "", "text": "v=spf1 -all"}),
            json!({"type": "TLSA", "id": 7, "ttl": 300, "comment": "c", "name": "_443._tcp", "text": "3 1 1 abcdef"}),
            json!({"type": "CAA", "id": 8, "ttl": 3600, "comment": "c", "name": "", "flag": 0, "tag": "issue", "value": "letsencrypt.org"}),
            json!({"type": "PTR", "id": 9, "ttl": 3600, "comment": "c", "name": "1", "origin": "host.example.com"}),
            json!({"type": "SRV", "id": 10, "ttl": 3600, "comment": "c", "service": "_sip._tcp", "priority": 10, "weight": 60, "port": 5060, "target": "sip.example.com"}),
        ];

        for payload in payloads {
            let record = decode(payload.clone());
            let encoded = HosttechRecord::from_record(&record, "c".to_owned()).unwrap();
            assert_eq!(serde_json::to_value(&encoded).unwrap(), payload);
        }
    }

    #[test]
    fn ttl_is_seconds_both_ways() {
        let record = Record::new(RecordType::A, "www", "192.0.2.1")
            .with_ttl(Duration::from_secs(7200));
        let encoded = serde_json::to_value(
            HosttechRecord::from_record(&record, String::new()).unwrap()
        ).unwrap();

        assert_eq!(encoded["ttl"], 7200);
        assert_eq!(decode(encoded).ttl, Duration::from_secs(7200));
    }

    #[test]
    fn zero_ttl_is_left_to_the_provider() {
        let record = Record::new(RecordType::A, "www", "192.0.2.1");
        let encoded = serde_json::to_value(
            HosttechRecord::from_record(&record, String::new()).unwrap()
        ).unwrap();

        assert!(encoded.get("ttl").is_none());
    }

    #[test]
    fn srv_encodes_from_builders() {
        let record = Record::new(RecordType::SRV, "_sip._tcp", "sip.example.com")
            .with_priority(10)
            .with_weight(60)
            .with_port(5060);
        let encoded = serde_json::to_value(
            HosttechRecord::from_record(&record, String::new()).unwrap()
        ).unwrap();

        assert_eq!(encoded, json!({
            "type": "SRV",
            "service": "_sip._tcp",
            "priority": 10,
            "weight": 60,
            "port": 5060,
            "target": "sip.example.com",
        }));
    }

    #[test]
    fn new_records_omit_id() {
        let record = Record::new(RecordType::TXT, "", "hello");
        let encoded = serde_json::to_value(
            HosttechRecord::from_record(&record, provenance_comment()).unwrap()
        ).unwrap();

        assert!(encoded.get("id").is_none());
        assert_eq!(encoded["type"], "TXT");
        assert!(encoded["comment"].as_str().unwrap().starts_with("This record was created with"));
    }

    #[test]
    fn unknown_type_is_named() {
        let err = HosttechRecord::from_value(json!({"type": "SOA", "id": 1})).unwrap_err();
        assert!(matches!(&err, CodecError::UnknownType(t) if t == "SOA"));
        assert!(err.to_string().contains("SOA"));
    }

    #[test]
    fn malformed_variant_names_type() {
        let err = HosttechRecord::from_value(json!({"type": "MX", "id": 1, "name": "mx", "ownername": "o", "pref": "high"}))
            .unwrap_err();
        assert!(matches!(&err, CodecError::Malformed { record_type, .. } if record_type == "MX"));
    }

    #[test]
    fn missing_type_is_an_error() {
        let err = HosttechRecord::from_value(json!({"id": 1, "name": "www"})).unwrap_err();
        assert!(matches!(err, CodecError::MissingType(_)));
    }

    #[test]
    fn encoding_rejects_unsupported_types() {
        let record = Record::new(RecordType::Other("SOA".to_owned()), "", "ns1");
        let err = HosttechRecord::from_record(&record, String::new()).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(RecordType::Other(_))));
    }

    #[test]
    fn encoding_rejects_non_numeric_ids() {
        let record = Record::new(RecordType::A, "www", "192.0.2.1").with_id("abc");
        let err = HosttechRecord::from_record(&record, String::new()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidId(id) if id == "abc"));
    }

    #[test]
    fn envelope_accepts_object_and_array() {
        let one: Envelope = serde_json::from_value(json!({
            "data": {"type": "A", "id": 1, "name": "www", "ipv4": "192.0.2.1", "ttl": 60}
        })).unwrap();
        assert_eq!(one.into_records().unwrap().len(), 1);

        let many: Envelope = serde_json::from_value(json!({
            "data": [
                {"type": "A", "id": 1, "name": "www", "ipv4": "192.0.2.1", "ttl": 60},
                {"type": "NS", "id": 2, "ownername": "", "targetname": "ns1.example.com", "ttl": 60},
            ]
        })).unwrap();
        let records = many.into_records().unwrap();
        assert_eq!(records[1].record_type, RecordType::NS);
        assert_eq!(records[1].value, "ns1.example.com");
    }
}
