//! Anchor interface description of the GIF Portal program.
//!
//! Only the parts of the IDL the client needs are parsed: instruction names
//! with their account lists and the program address stored in the metadata.
//! Discriminators follow Anchor’s convention of taking the first eight bytes
//! of SHA-256 over a namespaced name.

use core::str::FromStr;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};

type Result<T = (), E = IdlError> = core::result::Result<T, E>;

/// IDL of the program the client was written against.
const BUNDLED: &str = include_str!("../idl.json");

/// Length of an Anchor instruction or account discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

pub type Discriminator = [u8; DISCRIMINATOR_LEN];


#[derive(Clone, Debug, Deserialize)]
pub struct Idl {
    pub name: String,
    pub instructions: Vec<IdlInstruction>,
    #[serde(default)]
    pub accounts: Vec<IdlTypeDef>,
    #[serde(default)]
    pub metadata: Option<IdlMetadata>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdlInstruction {
    pub name: String,
    pub accounts: Vec<IdlAccountItem>,
    #[serde(default)]
    pub args: Vec<IdlField>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlAccountItem {
    pub name: String,
    pub is_mut: bool,
    pub is_signer: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdlTypeDef {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdlMetadata {
    pub address: Option<String>,
}


impl Idl {
    /// Returns the IDL bundled with the crate.
    pub fn bundled() -> Result<Self> { Self::from_json(BUNDLED) }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(IdlError::from)
    }

    /// Reads IDL from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Returns address of the program as recorded in IDL’s metadata.
    pub fn program_id(&self) -> Result<Pubkey> {
        let address = self
            .metadata
            .as_ref()
            .and_then(|meta| meta.address.as_deref())
            .ok_or(IdlError::MissingAddress)?;
        Ok(Pubkey::from_str(address)?)
    }

    /// Looks up an instruction by its IDL (camelCase) name.
    pub fn instruction(&self, name: &str) -> Result<&IdlInstruction> {
        self.instructions
            .iter()
            .find(|ix| ix.name == name)
            .ok_or_else(|| IdlError::UnknownInstruction(name.into()))
    }

    /// Returns discriminator of an account type declared in the IDL.
    pub fn account_discriminator(&self, name: &str) -> Result<Discriminator> {
        if self.accounts.iter().any(|acc| acc.name == name) {
            Ok(discriminator("account", name))
        } else {
            Err(IdlError::UnknownAccount(name.into()))
        }
    }
}

impl IdlInstruction {
    /// Anchor discriminator of the instruction, i.e. the prefix of its
    /// instruction data.
    pub fn discriminator(&self) -> Discriminator {
        discriminator("global", &snake_case(&self.name))
    }

    /// Builds account metas in the order the instruction declares them.
    ///
    /// `accounts` maps IDL account names to addresses.  Writable and signer
    /// flags are taken from the IDL.  Every account the instruction declares
    /// must be present; extra entries are ignored.
    pub fn account_metas(
        &self,
        accounts: &[(&str, Pubkey)],
    ) -> Result<Vec<AccountMeta>> {
        self.accounts
            .iter()
            .map(|item| {
                let pubkey = accounts
                    .iter()
                    .find(|(name, _)| *name == item.name)
                    .map(|(_, key)| *key)
                    .ok_or_else(|| IdlError::MissingAccount {
                        instruction: self.name.clone(),
                        account: item.name.clone(),
                    })?;
                Ok(if item.is_mut {
                    AccountMeta::new(pubkey, item.is_signer)
                } else {
                    AccountMeta::new_readonly(pubkey, item.is_signer)
                })
            })
            .collect()
    }
}


/// Computes `sha256("<namespace>:<name>")[..8]`.
fn discriminator(namespace: &str, name: &str) -> Discriminator {
    let hash = Sha256::new()
        .chain_update(namespace)
        .chain_update(b":")
        .chain_update(name)
        .finalize();
    let mut out = [0; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

/// Converts camelCase IDL name into snake_case Rust method name.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.char_indices() {
        if ch.is_ascii_uppercase() {
            if idx != 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}


#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum IdlError {
    #[display("io: {_0}")]
    Io(std::io::Error),
    #[display("malformed IDL: {_0}")]
    Json(serde_json::Error),
    #[display("IDL has no program address in its metadata")]
    #[from(ignore)]
    MissingAddress,
    #[display("invalid program address: {_0}")]
    BadAddress(ParsePubkeyError),
    #[display("IDL has no instruction named {_0}")]
    #[from(ignore)]
    UnknownInstruction(String),
    #[display("IDL has no account type named {_0}")]
    #[from(ignore)]
    UnknownAccount(String),
    #[display("instruction {instruction} requires account {account}")]
    #[from(ignore)]
    MissingAccount { instruction: String, account: String },
}

impl std::error::Error for IdlError {}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!("start_stuff_off", snake_case("startStuffOff"));
        assert_eq!("add_gif", snake_case("addGif"));
        assert_eq!("initialize", snake_case("initialize"));
    }

    #[test]
    fn test_bundled() {
        let idl = Idl::bundled().unwrap();
        assert_eq!("solana_anchor_gif_portal", idl.name);
        assert_eq!(
            solana_sdk::pubkey!("8HDmM8Tr2krtoD25JNrYFv2BogQJ9aK2Q3k9tJnr1TW7"),
            idl.program_id().unwrap()
        );
        let add_gif = idl.instruction("addGif").unwrap();
        assert_eq!(1, add_gif.args.len());
        assert_eq!("gifLink", add_gif.args[0].name);
        assert!(matches!(
            idl.instruction("removeGif"),
            Err(IdlError::UnknownInstruction(_))
        ));
    }

    #[test]
    fn test_discriminators() {
        let idl = Idl::bundled().unwrap();
        let want: Discriminator = {
            let hash = Sha256::digest(b"global:add_gif");
            hash[..8].try_into().unwrap()
        };
        assert_eq!(want, idl.instruction("addGif").unwrap().discriminator());

        let want: Discriminator = {
            let hash = Sha256::digest(b"account:BaseAccount");
            hash[..8].try_into().unwrap()
        };
        assert_eq!(want, idl.account_discriminator("BaseAccount").unwrap());
        assert!(idl.account_discriminator("ItemStruct").is_err());
    }

    #[test]
    fn test_account_metas() {
        let idl = Idl::bundled().unwrap();
        let base = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let system = solana_system_interface::program::ID;

        let ix = idl.instruction("startStuffOff").unwrap();
        let metas = ix
            .account_metas(&[
                ("user", user),
                ("systemProgram", system),
                ("baseAccount", base),
            ])
            .unwrap();
        assert_eq!(
            vec![
                AccountMeta::new(base, true),
                AccountMeta::new(user, true),
                AccountMeta::new_readonly(system, false),
            ],
            metas
        );

        let err = ix.account_metas(&[("baseAccount", base)]).unwrap_err();
        assert_eq!(
            "instruction startStuffOff requires account user",
            err.to_string()
        );
    }
}
