use concordium_std::{
    collections::BTreeMap, fmt::Debug, schema, AccountAddress, Amount, SchemaType, Serial, Write,
};

pub mod error;
pub mod types;

use types::{ContractTokenAmount, GrantIndex, ParamKind};

// ---------------------------------------

/// Tag for the Purchase event.
pub const PURCHASE_EVENT_TAG: u8 = 1u8;
pub const RELEASE_EVENT_TAG: u8 = 2u8;
pub const PARAM_CHANGE_EVENT_TAG: u8 = 3u8;
pub const FINALIZE_EVENT_TAG: u8 = 4u8;
pub const UNSOLD_WITHDRAW_EVENT_TAG: u8 = 5u8;

/// A settled purchase. `grant` references the vesting grant the allocation
/// went into, or is `None` for a direct transfer.
#[derive(Debug, Serial, SchemaType)]
pub struct PurchaseEvent {
    pub payer: AccountAddress,
    pub payment: Amount,
    pub tokens: ContractTokenAmount,
    pub grant: Option<GrantIndex>,
}

/// A nonzero release out of one vesting account.
#[derive(Debug, Serial, SchemaType)]
pub struct ReleaseEvent {
    pub beneficiary: AccountAddress,
    pub grant_index: GrantIndex,
    pub amount: ContractTokenAmount,
}

/// One administrative parameter changed. `value` is the raw new value
/// (millisecond timestamp, price, cap or limit depending on `kind`).
#[derive(Debug, Serial, SchemaType)]
pub struct ParamChangeEvent {
    pub kind: ParamKind,
    pub value: u64,
}

#[derive(Debug, Serial, SchemaType)]
pub struct FinalizeEvent {
    pub unsold: ContractTokenAmount,
}

#[derive(Debug, Serial, SchemaType)]
pub struct UnsoldWithdrawEvent {
    pub to: AccountAddress,
    pub amount: ContractTokenAmount,
}

/// Tagged events to be serialized for the event log.
#[derive(Debug)]
pub enum SaleEvent {
    Purchase(PurchaseEvent),
    Release(ReleaseEvent),
    ParamChange(ParamChangeEvent),
    Finalize(FinalizeEvent),
    UnsoldWithdraw(UnsoldWithdrawEvent),
}

impl Serial for SaleEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            SaleEvent::Purchase(event) => {
                out.write_u8(PURCHASE_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Release(event) => {
                out.write_u8(RELEASE_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::ParamChange(event) => {
                out.write_u8(PARAM_CHANGE_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::Finalize(event) => {
                out.write_u8(FINALIZE_EVENT_TAG)?;
                event.serial(out)
            }
            SaleEvent::UnsoldWithdraw(event) => {
                out.write_u8(UNSOLD_WITHDRAW_EVENT_TAG)?;
                event.serial(out)
            }
        }
    }
}

impl schema::SchemaType for SaleEvent {
    fn get_type() -> schema::Type {
        let mut event_map = BTreeMap::new();
        event_map.insert(
            PURCHASE_EVENT_TAG,
            (
                "Purchase".to_string(),
                schema::Fields::Named(vec![
                    (String::from("payer"), AccountAddress::get_type()),
                    (String::from("payment"), Amount::get_type()),
                    (String::from("tokens"), ContractTokenAmount::get_type()),
                    (String::from("grant"), Option::<GrantIndex>::get_type()),
                ]),
            ),
        );
        event_map.insert(
            RELEASE_EVENT_TAG,
            (
                "Release".to_string(),
                schema::Fields::Named(vec![
                    (String::from("beneficiary"), AccountAddress::get_type()),
                    (String::from("grant_index"), GrantIndex::get_type()),
                    (String::from("amount"), ContractTokenAmount::get_type()),
                ]),
            ),
        );
        event_map.insert(
            PARAM_CHANGE_EVENT_TAG,
            (
                "ParamChange".to_string(),
                schema::Fields::Named(vec![
                    (String::from("kind"), ParamKind::get_type()),
                    (String::from("value"), u64::get_type()),
                ]),
            ),
        );
        event_map.insert(
            FINALIZE_EVENT_TAG,
            (
                "Finalize".to_string(),
                schema::Fields::Named(vec![(
                    String::from("unsold"),
                    ContractTokenAmount::get_type(),
                )]),
            ),
        );
        event_map.insert(
            UNSOLD_WITHDRAW_EVENT_TAG,
            (
                "UnsoldWithdraw".to_string(),
                schema::Fields::Named(vec![
                    (String::from("to"), AccountAddress::get_type()),
                    (String::from("amount"), ContractTokenAmount::get_type()),
                ]),
            ),
        );
        schema::Type::TaggedEnum(event_map)
    }
}
