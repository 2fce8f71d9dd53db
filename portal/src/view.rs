//! What the portal shows for a given state.

use core::fmt;

use crate::state::{GifList, Session, ViewState};

pub const HEADER: &str = "GIF Portal";
pub const SUB_TEXT: &str = "View a GIF Collection in the Metaverse";
pub const CONNECT_BUTTON: &str = "Connect to Wallet";
pub const CREATE_ACCOUNT_BUTTON: &str =
    "Do One-Time Initialization for GIF Program Account";
pub const INPUT_PLACEHOLDER: &str = "Enter GIF Link";
pub const SUBMIT_BUTTON: &str = "Submit";


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    /// Wallet not connected; only the connect button is shown.
    NotConnected,
    /// Connected, waiting for the first fetch of the list.
    Loading,
    /// Connected but the shared account doesn’t exist; only the
    /// initialisation button is shown.
    CreateAccount,
    /// Submission form and the grid of GIFs.
    Ready { input: String, gifs: Vec<String> },
}

impl View {
    pub fn render(state: &ViewState) -> Self {
        if !matches!(state.session, Session::Connected(_)) {
            return Self::NotConnected;
        }
        match &state.gif_list {
            GifList::NotFetched => Self::Loading,
            GifList::NotInitialized => Self::CreateAccount,
            GifList::Loaded { items, .. } => Self::Ready {
                input: state.input.clone(),
                gifs: items.iter().map(|item| item.gif_link.clone()).collect(),
            },
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, fmtr: &mut fmt::Formatter) -> fmt::Result {
        writeln!(fmtr, "{HEADER}")?;
        writeln!(fmtr, "{SUB_TEXT}")?;
        writeln!(fmtr)?;
        match self {
            Self::NotConnected => writeln!(fmtr, "[ {CONNECT_BUTTON} ]"),
            Self::Loading => writeln!(fmtr, "Loading…"),
            Self::CreateAccount => {
                writeln!(fmtr, "[ {CREATE_ACCOUNT_BUTTON} ]")
            }
            Self::Ready { input, gifs } => {
                let input = match input.as_str() {
                    "" => INPUT_PLACEHOLDER,
                    input => input,
                };
                writeln!(fmtr, "[ {input} ] [ {SUBMIT_BUTTON} ]")?;
                for (idx, gif) in gifs.iter().enumerate() {
                    writeln!(fmtr, "{:>4}. {gif}", idx + 1)?;
                }
                Ok(())
            }
        }
    }
}
