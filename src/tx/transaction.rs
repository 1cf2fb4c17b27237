//! Transaction structures and the signed envelope

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::codec::{
    self, CodecResult, Decoder, Encoder, FieldReader, FieldSpec, FieldWriter, HexBytes, Name, Pack, PackStruct,
    Signature, StructSchema, TimePointSec, Unpack, Varuint32,
};
use crate::error::TxKitResult;
use crate::impl_pack_struct;

use super::actions::ActionPayload;

pub const ACTIVE_PERMISSION: Name = Name::constant("active");

/// `actor@permission`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }

    /// The `active` permission of an account
    pub fn active(actor: Name) -> Self {
        Self::new(actor, ACTIVE_PERMISSION)
    }
}

impl PackStruct for PermissionLevel {
    const SCHEMA: StructSchema =
        StructSchema::new("permission_level", &[FieldSpec::required("actor"), FieldSpec::required("permission")]);

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.actor)?;
        fields.field(&self.permission)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            actor: fields.field()?,
            permission: fields.field()?,
        })
    }
}

/// Action arguments: either a known struct or bytes that are already packed
///
/// Equality compares the packed bytes, so a decoded `Raw` value equals the
/// `Payload` it was packed from.
#[derive(Debug, Clone)]
pub enum ActionData {
    Payload(ActionPayload),
    Raw(HexBytes),
}

impl Default for ActionData {
    fn default() -> Self {
        ActionData::Raw(HexBytes::default())
    }
}

impl ActionData {
    /// The packed argument bytes
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        match self {
            ActionData::Payload(payload) => codec::to_bytes(payload),
            ActionData::Raw(bytes) => Ok(bytes.0.clone()),
        }
    }

    /// Re-parse raw bytes into a known payload for the given action name
    pub fn decode(&self, name: Name) -> CodecResult<Option<ActionPayload>> {
        match self {
            ActionData::Payload(payload) => Ok(Some(payload.clone())),
            ActionData::Raw(bytes) => ActionPayload::decode(name, bytes.as_bytes()),
        }
    }
}

impl PartialEq for ActionData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ActionData::Payload(a), ActionData::Payload(b)) => a == b,
            (ActionData::Raw(a), ActionData::Raw(b)) => a == b,
            _ => match (self.to_bytes(), other.to_bytes()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Pack for ActionData {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        match self {
            ActionData::Payload(payload) => enc.write_bytes(&codec::to_bytes(payload)?),
            ActionData::Raw(bytes) => enc.write_bytes(bytes.as_bytes()),
        }
        Ok(())
    }
}

impl Unpack for ActionData {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(ActionData::Raw(HexBytes::unpack(dec)?))
    }
}

impl Serialize for ActionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = self.to_bytes().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex::encode(bytes))
    }
}

impl<'de> Deserialize<'de> for ActionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HexBytes::deserialize(deserializer).map(ActionData::Raw)
    }
}

/// A contract call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    pub data: ActionData,
}

impl Action {
    pub fn new(account: Name, payload: ActionPayload, authorization: Vec<PermissionLevel>) -> Self {
        Self {
            account,
            name: payload.action_name(),
            authorization,
            data: ActionData::Payload(payload),
        }
    }

    /// Known payload of this action, decoding raw data if needed
    pub fn payload(&self) -> CodecResult<Option<ActionPayload>> {
        self.data.decode(self.name)
    }
}

impl PackStruct for Action {
    const SCHEMA: StructSchema = StructSchema::new(
        "action",
        &[
            FieldSpec::required("account"),
            FieldSpec::required("name"),
            FieldSpec::required("authorization"),
            FieldSpec::required("data"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.account)?;
        fields.field(&self.name)?;
        fields.field(&self.authorization)?;
        fields.field(&self.data)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            account: fields.field()?,
            name: fields.field()?,
            authorization: fields.field()?,
            data: fields.field()?,
        })
    }
}

/// Transaction extension (`u16` type, bytes)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(rename = "type")]
    pub kind: u16,
    pub data: HexBytes,
}

impl PackStruct for Extension {
    const SCHEMA: StructSchema = StructSchema::new("extension", &[FieldSpec::required("type"), FieldSpec::required("data")]);

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.kind)?;
        fields.field(&self.data)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            kind: fields.field()?,
            data: fields.field()?,
        })
    }
}

/// Expiration, TaPoS reference and resource limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: Varuint32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: Varuint32,
}

impl PackStruct for TransactionHeader {
    const SCHEMA: StructSchema = StructSchema::new(
        "transaction_header",
        &[
            FieldSpec::required("expiration"),
            FieldSpec::required("ref_block_num"),
            FieldSpec::required("ref_block_prefix"),
            FieldSpec::required("max_net_usage_words"),
            FieldSpec::required("max_cpu_usage_ms"),
            FieldSpec::required("delay_sec"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.expiration)?;
        fields.field(&self.ref_block_num)?;
        fields.field(&self.ref_block_prefix)?;
        fields.field(&self.max_net_usage_words)?;
        fields.field(&self.max_cpu_usage_ms)?;
        fields.field(&self.delay_sec)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            expiration: fields.field()?,
            ref_block_num: fields.field()?,
            ref_block_prefix: fields.field()?,
            max_net_usage_words: fields.field()?,
            max_cpu_usage_ms: fields.field()?,
            delay_sec: fields.field()?,
        })
    }
}

/// Unsigned transaction body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(flatten)]
    pub header: TransactionHeader,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Vec<Extension>,
}

impl Transaction {
    pub fn new(header: TransactionHeader) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    pub fn expiration(&self) -> TimePointSec {
        self.header.expiration
    }

    pub fn set_expiration(&mut self, expiration: TimePointSec) {
        self.header.expiration = expiration;
    }

    /// Packed body, the `packed_trx` of the envelope
    pub fn pack(&self) -> TxKitResult<Vec<u8>> {
        Ok(codec::to_bytes(self)?)
    }

    /// SHA-256 of the packed body
    pub fn id(&self) -> TxKitResult<String> {
        Ok(hex::encode(Sha256::digest(self.pack()?)))
    }
}

impl PackStruct for Transaction {
    const SCHEMA: StructSchema = StructSchema::new(
        "transaction",
        &[
            FieldSpec::required("header"),
            FieldSpec::required("context_free_actions"),
            FieldSpec::required("actions"),
            FieldSpec::required("transaction_extensions"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.header)?;
        fields.field(&self.context_free_actions)?;
        fields.field(&self.actions)?;
        fields.field(&self.transaction_extensions)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            header: fields.field()?,
            context_free_actions: fields.field()?,
            actions: fields.field()?,
            transaction_extensions: fields.field()?,
        })
    }
}

/// Envelope compression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    None,
    Zlib,
}

impl Pack for CompressionType {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_u8(match self {
            CompressionType::None => 0,
            CompressionType::Zlib => 1,
        });
        Ok(())
    }
}

impl Unpack for CompressionType {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        match dec.read_u8()? {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zlib),
            other => Err(codec::CodecError::Unsupported(format!("compression type {}", other))),
        }
    }
}

/// Signed transaction ready for `push_transaction`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedTransaction {
    pub signatures: Vec<Signature>,
    pub compression: CompressionType,
    pub packed_context_free_data: HexBytes,
    pub packed_trx: HexBytes,
}

impl PackedTransaction {
    pub fn new(transaction: &Transaction, signatures: Vec<Signature>, context_free_data: &[u8]) -> TxKitResult<Self> {
        Ok(Self {
            signatures,
            compression: CompressionType::None,
            packed_context_free_data: HexBytes(context_free_data.to_vec()),
            packed_trx: HexBytes(transaction.pack()?),
        })
    }

    /// Transaction id (hex SHA-256 of `packed_trx`)
    pub fn id(&self) -> String {
        hex::encode(Sha256::digest(self.packed_trx.as_bytes()))
    }

    /// Decode the body back out of the envelope
    pub fn transaction(&self) -> TxKitResult<Transaction> {
        Ok(codec::from_bytes(self.packed_trx.as_bytes())?)
    }

    pub fn to_json(&self) -> TxKitResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> TxKitResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PackStruct for PackedTransaction {
    const SCHEMA: StructSchema = StructSchema::new(
        "packed_transaction",
        &[
            FieldSpec::required("signatures"),
            FieldSpec::required("compression"),
            FieldSpec::required("packed_context_free_data"),
            FieldSpec::required("packed_trx"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.signatures)?;
        fields.field(&self.compression)?;
        fields.field(&self.packed_context_free_data)?;
        fields.field(&self.packed_trx)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            signatures: fields.field()?,
            compression: fields.field()?,
            packed_context_free_data: fields.field()?,
            packed_trx: fields.field()?,
        })
    }
}

impl_pack_struct!(PermissionLevel, Action, Extension, TransactionHeader, Transaction, PackedTransaction);
