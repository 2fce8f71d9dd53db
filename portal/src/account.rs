//! On-chain state of the GIF Portal program.

use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

use crate::idl::{Discriminator, DISCRIMINATOR_LEN};

/// Name of the account type in the program’s IDL.
pub const BASE_ACCOUNT: &str = "BaseAccount";


/// The shared account holding the list of submitted GIFs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseAccount {
    /// Number of GIFs ever added as counted by the program.
    pub total_gifs: u64,
    /// Submitted GIFs in insertion order.
    pub gif_list: Vec<GifItem>,
}

/// A single submitted GIF link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GifItem {
    pub gif_link: String,
    /// Wallet which submitted the link.
    pub user_address: Pubkey,
}

impl GifItem {
    pub fn new(gif_link: impl Into<String>, user_address: Pubkey) -> Self {
        Self { gif_link: gif_link.into(), user_address }
    }
}


/// Borsh layout of the account as written by the program.
#[derive(BorshDeserialize)]
struct RawBaseAccount {
    total_gifs: u64,
    gif_list: Vec<RawItem>,
}

#[derive(BorshDeserialize)]
struct RawItem {
    gif_link: String,
    user_address: [u8; 32],
}


impl BaseAccount {
    /// Decodes account data.
    ///
    /// The data must start with the `discriminator` of the account type.
    /// The program allocates more space than the state needs so any trailing
    /// bytes after the serialised state are ignored.
    pub fn decode(
        discriminator: &Discriminator,
        data: &[u8],
    ) -> Result<Self, DecodeError> {
        let (head, mut rest) = data
            .split_at_checked(DISCRIMINATOR_LEN)
            .ok_or(DecodeError::TooShort)?;
        if head != discriminator {
            return Err(DecodeError::BadDiscriminator);
        }
        let raw = RawBaseAccount::deserialize(&mut rest)
            .map_err(DecodeError::Borsh)?;
        Ok(Self {
            total_gifs: raw.total_gifs,
            gif_list: raw
                .gif_list
                .into_iter()
                .map(|item| GifItem {
                    gif_link: item.gif_link,
                    user_address: Pubkey::new_from_array(item.user_address),
                })
                .collect(),
        })
    }
}


#[derive(Debug, derive_more::Display)]
pub enum DecodeError {
    #[display("account data too short")]
    TooShort,
    #[display("account discriminator mismatch")]
    BadDiscriminator,
    #[display("malformed account data: {_0}")]
    Borsh(std::io::Error),
}

impl std::error::Error for DecodeError {}
