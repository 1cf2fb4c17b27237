//! Token and system contract action payloads

use serde::{Deserialize, Serialize};

use crate::codec::{
    self, AccountName, Asset, CodecResult, Encoder, FieldReader, FieldSpec, FieldWriter, Name, Pack, PackStruct,
    StructSchema,
};
use crate::impl_pack_struct;

use super::transaction::{Action, PermissionLevel};

pub const TRANSFER: Name = Name::constant("transfer");
pub const BUY_RAM_BYTES: Name = Name::constant("buyrambytes");
pub const SELL_RAM: Name = Name::constant("sellram");
pub const DELEGATE_BW: Name = Name::constant("delegatebw");
pub const UNDELEGATE_BW: Name = Name::constant("undelegatebw");
pub const REFUND: Name = Name::constant("refund");

/// `transfer` on a token contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountName,
    pub to: AccountName,
    pub quantity: Asset,
    pub memo: String,
}

impl PackStruct for Transfer {
    const SCHEMA: StructSchema = StructSchema::new(
        "transfer",
        &[
            FieldSpec::required("from"),
            FieldSpec::required("to"),
            FieldSpec::required("quantity"),
            FieldSpec::required("memo"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.from)?;
        fields.field(&self.to)?;
        fields.field(&self.quantity)?;
        fields.field(&self.memo)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            from: fields.field()?,
            to: fields.field()?,
            quantity: fields.field()?,
            memo: fields.field()?,
        })
    }
}

/// `buyrambytes`: `payer` buys `bytes` of RAM for `receiver`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyRamBytes {
    pub payer: AccountName,
    pub receiver: AccountName,
    pub bytes: u32,
}

impl PackStruct for BuyRamBytes {
    const SCHEMA: StructSchema = StructSchema::new(
        "buyrambytes",
        &[FieldSpec::required("payer"), FieldSpec::required("receiver"), FieldSpec::required("bytes")],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.payer)?;
        fields.field(&self.receiver)?;
        fields.field(&self.bytes)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            payer: fields.field()?,
            receiver: fields.field()?,
            bytes: fields.field()?,
        })
    }
}

/// `sellram`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellRam {
    pub account: AccountName,
    pub bytes: i64,
}

impl PackStruct for SellRam {
    const SCHEMA: StructSchema =
        StructSchema::new("sellram", &[FieldSpec::required("account"), FieldSpec::required("bytes")]);

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.account)?;
        fields.field(&self.bytes)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            account: fields.field()?,
            bytes: fields.field()?,
        })
    }
}

/// `delegatebw`: stake tokens for NET and CPU
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegateBw {
    pub from: AccountName,
    pub receiver: AccountName,
    pub stake_net_quantity: Asset,
    pub stake_cpu_quantity: Asset,
    pub transfer: bool,
}

impl PackStruct for DelegateBw {
    const SCHEMA: StructSchema = StructSchema::new(
        "delegatebw",
        &[
            FieldSpec::required("from"),
            FieldSpec::required("receiver"),
            FieldSpec::required("stake_net_quantity"),
            FieldSpec::required("stake_cpu_quantity"),
            FieldSpec::required("transfer"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.from)?;
        fields.field(&self.receiver)?;
        fields.field(&self.stake_net_quantity)?;
        fields.field(&self.stake_cpu_quantity)?;
        fields.field(&self.transfer)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            from: fields.field()?,
            receiver: fields.field()?,
            stake_net_quantity: fields.field()?,
            stake_cpu_quantity: fields.field()?,
            transfer: fields.field()?,
        })
    }
}

/// `undelegatebw`: start the unstaking delay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndelegateBw {
    pub from: AccountName,
    pub receiver: AccountName,
    pub unstake_net_quantity: Asset,
    pub unstake_cpu_quantity: Asset,
}

impl PackStruct for UndelegateBw {
    const SCHEMA: StructSchema = StructSchema::new(
        "undelegatebw",
        &[
            FieldSpec::required("from"),
            FieldSpec::required("receiver"),
            FieldSpec::required("unstake_net_quantity"),
            FieldSpec::required("unstake_cpu_quantity"),
        ],
    );

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.from)?;
        fields.field(&self.receiver)?;
        fields.field(&self.unstake_net_quantity)?;
        fields.field(&self.unstake_cpu_quantity)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self {
            from: fields.field()?,
            receiver: fields.field()?,
            unstake_net_quantity: fields.field()?,
            unstake_cpu_quantity: fields.field()?,
        })
    }
}

/// `refund`: claim tokens whose unstaking delay has passed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub owner: AccountName,
}

impl PackStruct for Refund {
    const SCHEMA: StructSchema = StructSchema::new("refund", &[FieldSpec::required("owner")]);

    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()> {
        fields.field(&self.owner)
    }

    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self> {
        Ok(Self { owner: fields.field()? })
    }
}

impl_pack_struct!(Transfer, BuyRamBytes, SellRam, DelegateBw, UndelegateBw, Refund);

/// Payloads this crate knows how to build and re-parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "lowercase")]
pub enum ActionPayload {
    Transfer(Transfer),
    BuyRamBytes(BuyRamBytes),
    SellRam(SellRam),
    DelegateBw(DelegateBw),
    UndelegateBw(UndelegateBw),
    Refund(Refund),
}

impl ActionPayload {
    pub fn action_name(&self) -> Name {
        match self {
            ActionPayload::Transfer(_) => TRANSFER,
            ActionPayload::BuyRamBytes(_) => BUY_RAM_BYTES,
            ActionPayload::SellRam(_) => SELL_RAM,
            ActionPayload::DelegateBw(_) => DELEGATE_BW,
            ActionPayload::UndelegateBw(_) => UNDELEGATE_BW,
            ActionPayload::Refund(_) => REFUND,
        }
    }

    /// Parse packed action data by action name; `None` for unknown actions
    pub fn decode(name: Name, data: &[u8]) -> CodecResult<Option<Self>> {
        let payload = match name {
            TRANSFER => ActionPayload::Transfer(codec::from_bytes(data)?),
            BUY_RAM_BYTES => ActionPayload::BuyRamBytes(codec::from_bytes(data)?),
            SELL_RAM => ActionPayload::SellRam(codec::from_bytes(data)?),
            DELEGATE_BW => ActionPayload::DelegateBw(codec::from_bytes(data)?),
            UNDELEGATE_BW => ActionPayload::UndelegateBw(codec::from_bytes(data)?),
            REFUND => ActionPayload::Refund(codec::from_bytes(data)?),
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }
}

impl Pack for ActionPayload {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        match self {
            ActionPayload::Transfer(p) => p.pack(enc),
            ActionPayload::BuyRamBytes(p) => p.pack(enc),
            ActionPayload::SellRam(p) => p.pack(enc),
            ActionPayload::DelegateBw(p) => p.pack(enc),
            ActionPayload::UndelegateBw(p) => p.pack(enc),
            ActionPayload::Refund(p) => p.pack(enc),
        }
    }
}

// Constructors: each action is authorised by the `active` permission of
// the account that pays for it.

pub fn transfer(contract: Name, from: Name, to: Name, quantity: Asset, memo: &str) -> Action {
    Action::new(
        contract,
        ActionPayload::Transfer(Transfer {
            from,
            to,
            quantity,
            memo: memo.to_string(),
        }),
        vec![PermissionLevel::active(from)],
    )
}

pub fn buy_ram_bytes(system: Name, payer: Name, receiver: Name, bytes: u32) -> Action {
    Action::new(
        system,
        ActionPayload::BuyRamBytes(BuyRamBytes { payer, receiver, bytes }),
        vec![PermissionLevel::active(payer)],
    )
}

pub fn sell_ram(system: Name, account: Name, bytes: i64) -> Action {
    Action::new(
        system,
        ActionPayload::SellRam(SellRam { account, bytes }),
        vec![PermissionLevel::active(account)],
    )
}

pub fn delegate_bw(system: Name, from: Name, receiver: Name, net: Asset, cpu: Asset) -> Action {
    Action::new(
        system,
        ActionPayload::DelegateBw(DelegateBw {
            from,
            receiver,
            stake_net_quantity: net,
            stake_cpu_quantity: cpu,
            transfer: false,
        }),
        vec![PermissionLevel::active(from)],
    )
}

pub fn undelegate_bw(system: Name, from: Name, receiver: Name, net: Asset, cpu: Asset) -> Action {
    Action::new(
        system,
        ActionPayload::UndelegateBw(UndelegateBw {
            from,
            receiver,
            unstake_net_quantity: net,
            unstake_cpu_quantity: cpu,
        }),
        vec![PermissionLevel::active(from)],
    )
}

pub fn refund(system: Name, owner: Name) -> Action {
    Action::new(system, ActionPayload::Refund(Refund { owner }), vec![PermissionLevel::active(owner)])
}
