//! State the controller keeps and the view is derived from.

use solana_sdk::pubkey::Pubkey;

use crate::account::{BaseAccount, GifItem};


/// Connection to the wallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Disconnected,
    /// Connection request is in flight.
    Connecting,
    Connected(Pubkey),
}

impl Session {
    pub fn public_key(&self) -> Option<&Pubkey> {
        match self {
            Self::Connected(pubkey) => Some(pubkey),
            _ => None,
        }
    }
}


/// What the client knows about the shared account’s list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GifList {
    /// The account hasn’t been fetched yet.
    #[default]
    NotFetched,
    /// Fetching failed; most likely the account hasn’t been created.
    NotInitialized,
    /// The account exists.  The list may be empty.
    Loaded { total_gifs: u64, items: Vec<GifItem> },
}

impl GifList {
    pub fn items(&self) -> Option<&[GifItem]> {
        match self {
            Self::Loaded { items, .. } => Some(items),
            _ => None,
        }
    }
}

impl From<BaseAccount> for GifList {
    fn from(account: BaseAccount) -> Self {
        Self::Loaded { total_gifs: account.total_gifs, items: account.gif_list }
    }
}


/// Stage of the portal’s flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    /// Connected but the shared account doesn’t exist or hasn’t been fetched.
    ConnectedUninitialized,
    ConnectedReady,
}


#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub session: Session,
    pub gif_list: GifList,
    /// Value of the link input field.
    pub input: String,
    /// Message shown to the user in a blocking alert.
    pub alert: Option<String>,
}

impl ViewState {
    pub fn wallet_address(&self) -> Option<&Pubkey> {
        self.session.public_key()
    }

    pub fn phase(&self) -> Phase {
        match (&self.session, &self.gif_list) {
            (Session::Disconnected, _) => Phase::Disconnected,
            (Session::Connecting, _) => Phase::Connecting,
            (Session::Connected(_), GifList::Loaded { .. }) => {
                Phase::ConnectedReady
            }
            (Session::Connected(_), _) => Phase::ConnectedUninitialized,
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_phase() {
        let mut state = ViewState::default();
        assert_eq!(Phase::Disconnected, state.phase());
        state.session = Session::Connecting;
        assert_eq!(Phase::Connecting, state.phase());
        state.session = Session::Connected(Pubkey::new_unique());
        assert_eq!(Phase::ConnectedUninitialized, state.phase());
        state.gif_list = GifList::NotInitialized;
        assert_eq!(Phase::ConnectedUninitialized, state.phase());
        state.gif_list = BaseAccount::default().into();
        assert_eq!(Phase::ConnectedReady, state.phase());
        assert_eq!(Some(&[][..]), state.gif_list.items());
    }
}
