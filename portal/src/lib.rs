// gif-portal — client for the GIF Portal Solana program
// © 2025 by Michał Nazarewicz <mina86@mina86.com>
//
// This program is free software; you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation; either version 2 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program; if not, see <https://www.gnu.org/licenses/>.

//! Client for the GIF Portal Solana program.
//!
//! The GIF Portal program keeps a list of GIF links in a single shared
//! account.  Anyone with a wallet may append to the list once the account has
//! been created.  This library connects a [`wallet::Wallet`] to the program
//! and drives the flow through [`controller::Controller`]:
//!
//! 1. on start the controller silently reconnects to a wallet which approved
//!    the portal before ([`controller::Controller::detect_and_reconnect`]) or
//!    waits for the user to connect one
//!    ([`controller::Controller::connect_wallet`]),
//! 2. once connected it fetches the shared account; if it doesn’t exist the
//!    user is offered to create it
//!    ([`controller::Controller::create_account`]),
//! 3. with the account in place links can be submitted
//!    ([`controller::Controller::send_entry`]).
//!
//! The program is described by its Anchor IDL ([`idl`]).  The IDL bundled
//! with the crate is used unless configured otherwise ([`config`]).

pub mod account;
pub mod config;
pub mod controller;
pub mod idl;
pub mod keypair;
pub mod program;
pub mod state;
pub mod view;
pub mod wallet;

pub use config::{Config, Settings};
pub use controller::{Controller, Error};
pub use program::{GifProgram, Network, RpcNetwork};
pub use state::{GifList, Phase, ViewState};
pub use view::View;
pub use wallet::{KeypairWallet, TrustStore, Wallet};
