//! # Chain Registry
//!
//! Wormhole-style 16-bit chain identifiers. The wire format carries the raw
//! `u16`, so `ChainId` is a transparent newtype: decoding never fails on an
//! unknown value and validation decides whether the value is registered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ChainIdError;

/// A 16-bit chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u16);

macro_rules! chain_registry {
    ($($name:ident = $value:literal => $label:literal,)*) => {
        impl ChainId {
            $(
                #[allow(missing_docs)]
                pub const $name: ChainId = ChainId($value);
            )*

            /// Every registered chain, in ascending id order.
            pub const KNOWN: &'static [ChainId] = &[$(ChainId::$name,)*];

            /// Canonical name of a registered chain.
            pub fn name(&self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some($label),)*
                    _ => None,
                }
            }

            /// Resolve a canonical name.
            pub fn from_name(name: &str) -> Result<Self, ChainIdError> {
                match name {
                    $($label => Ok(ChainId::$name),)*
                    _ => Err(ChainIdError::UnknownChainName(name.to_string())),
                }
            }
        }
    };
}

chain_registry! {
    SOLANA = 1 => "solana",
    ETHEREUM = 2 => "ethereum",
    TERRA = 3 => "terra",
    BSC = 4 => "bsc",
    POLYGON = 5 => "polygon",
    AVALANCHE = 6 => "avalanche",
    OASIS = 7 => "oasis",
    ALGORAND = 8 => "algorand",
    AURORA = 9 => "aurora",
    FANTOM = 10 => "fantom",
    KARURA = 11 => "karura",
    ACALA = 12 => "acala",
    KLAYTN = 13 => "klaytn",
    CELO = 14 => "celo",
    NEAR = 15 => "near",
    MOONBEAM = 16 => "moonbeam",
    TERRA2 = 18 => "terra2",
    INJECTIVE = 19 => "injective",
    OSMOSIS = 20 => "osmosis",
    SUI = 21 => "sui",
    APTOS = 22 => "aptos",
    ARBITRUM = 23 => "arbitrum",
    OPTIMISM = 24 => "optimism",
    GNOSIS = 25 => "gnosis",
    PYTHNET = 26 => "pythnet",
    XPLA = 28 => "xpla",
    BTC = 29 => "btc",
    BASE = 30 => "base",
    FILECOIN = 31 => "filecoin",
    SEI = 32 => "sei",
    ROOTSTOCK = 33 => "rootstock",
    SCROLL = 34 => "scroll",
    MANTLE = 35 => "mantle",
    BLAST = 36 => "blast",
    XLAYER = 37 => "xlayer",
    LINEA = 38 => "linea",
    BERACHAIN = 39 => "berachain",
    SEIEVM = 40 => "seievm",
    ECLIPSE = 41 => "eclipse",
    BOB = 42 => "bob",
    SNAXCHAIN = 43 => "snaxchain",
    UNICHAIN = 44 => "unichain",
    WORLDCHAIN = 45 => "worldchain",
    INK = 46 => "ink",
    HYPEREVM = 47 => "hyperevm",
    MONAD = 48 => "monad",
    MOVEMENT = 49 => "movement",
    MEZO = 50 => "mezo",
    FOGO = 51 => "fogo",
    AZTEC = 52 => "aztec",
    WORMCHAIN = 3104 => "wormchain",
    COSMOSHUB = 4000 => "cosmoshub",
    EVMOS = 4001 => "evmos",
    KUJIRA = 4002 => "kujira",
    NEUTRON = 4003 => "neutron",
    CELESTIA = 4004 => "celestia",
    STARGAZE = 4005 => "stargaze",
    SEDA = 4006 => "seda",
    DYMENSION = 4007 => "dymension",
    PROVENANCE = 4008 => "provenance",
    NOBLE = 4009 => "noble",
    SEPOLIA = 10002 => "sepolia",
    ARBITRUM_SEPOLIA = 10003 => "arbitrum_sepolia",
    BASE_SEPOLIA = 10004 => "base_sepolia",
    OPTIMISM_SEPOLIA = 10005 => "optimism_sepolia",
    HOLESKY = 10006 => "holesky",
    POLYGON_SEPOLIA = 10007 => "polygon_sepolia",
}

impl ChainId {
    /// The unset chain. Marks off-chain requests in a response publication.
    pub const UNSET: ChainId = ChainId(0);

    /// True if this id is a registered chain. `UNSET` is never known.
    pub fn is_known(&self) -> bool {
        self.name().is_some()
    }

    /// Resolve a raw value, rejecting unregistered chains.
    pub fn known_from_u16(value: u16) -> Result<Self, ChainIdError> {
        let id = ChainId(value);
        if id.is_known() {
            Ok(id)
        } else {
            Err(ChainIdError::UnknownChainId(value))
        }
    }
}

impl From<u16> for ChainId {
    fn from(value: u16) -> Self {
        ChainId(value)
    }
}

impl From<ChainId> for u16 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None if *self == ChainId::UNSET => f.write_str("unset"),
            None => write!(f, "unknown chain ID: {}", self.0),
        }
    }
}

impl FromStr for ChainId {
    type Err = ChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<u16>() {
            return ChainId::known_from_u16(value);
        }
        ChainId::from_name(s)
    }
}
