//! Tonkeeper deeplink builder for the TonCAST NFT contracts.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use toncast_core::{boc, message, Address, CellRef, DeepLink, Metadata, StateInit};

#[derive(Parser)]
#[command(name = "toncast")]
#[command(about = "Builds Tonkeeper deeplinks for NFT collection operations")]
struct Cli {
    /// Print machine-readable JSON instead of labeled lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a collection deploy deeplink (carries a StateInit)
    Deploy {
        /// Collection owner address
        #[arg(long)]
        owner: String,

        /// Compiled collection code, hex-encoded bag of cells
        #[arg(long)]
        collection_code: PathBuf,

        /// Compiled item code, hex-encoded bag of cells
        #[arg(long)]
        item_code: PathBuf,

        /// Collection name
        #[arg(long)]
        name: Option<String>,

        /// Collection description
        #[arg(long)]
        description: Option<String>,

        /// Collection image URL
        #[arg(long)]
        image: Option<String>,

        /// Collection cover image URL
        #[arg(long)]
        cover_image: Option<String>,

        /// Social link, repeatable
        #[arg(long = "social-link")]
        social_links: Vec<String>,

        /// Message value in nanotons
        #[arg(long, default_value_t = 100_000_000)]
        amount: u128,

        /// Render the destination address bounceable
        #[arg(long)]
        bounceable: bool,
    },

    /// Build an item mint deeplink
    Mint {
        /// Collection address
        #[arg(long)]
        collection: String,

        /// Item owner address
        #[arg(long)]
        owner: String,

        /// Item index within the collection
        #[arg(long, default_value_t = 0)]
        index: u128,

        /// Query id
        #[arg(long, default_value_t = 0)]
        query_id: u64,

        /// Nanotons forwarded to the item contract
        #[arg(long, default_value_t = 20_000_000)]
        item_amount: u128,

        /// Message value in nanotons
        #[arg(long, default_value_t = 50_000_000)]
        amount: u128,

        /// Item name
        #[arg(long)]
        name: Option<String>,

        /// Item description
        #[arg(long)]
        description: Option<String>,

        /// Item image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Build an item transfer deeplink
    Transfer {
        /// Item contract address
        #[arg(long)]
        nft: String,

        /// New owner address, or "none" for addr_none
        #[arg(long)]
        new_owner: Option<String>,

        /// Response destination address
        #[arg(long)]
        response: Option<String>,

        /// Query id
        #[arg(long, default_value_t = 0)]
        query_id: u64,

        /// Nanotons forwarded to the new owner
        #[arg(long, default_value_t = 30_000_000)]
        forward: u128,

        /// Forward payload, hex-encoded
        #[arg(long)]
        payload: Option<String>,

        /// Message value in nanotons
        #[arg(long, default_value_t = 50_000_000)]
        amount: u128,
    },

    /// Build a collection owner change deeplink
    ChangeOwner {
        /// Collection address
        #[arg(long)]
        collection: String,

        /// New owner address
        #[arg(long)]
        new_owner: String,

        /// Query id
        #[arg(long, default_value_t = 0)]
        query_id: u64,

        /// Message value in nanotons
        #[arg(long, default_value_t = 50_000_000)]
        amount: u128,
    },
}

#[derive(Serialize)]
struct Report {
    address: String,
    deeplink: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Deploy {
            owner,
            collection_code,
            item_code,
            name,
            description,
            image,
            cover_image,
            social_links,
            amount,
            bounceable,
        } => {
            let owner = Address::parse(&owner)?;
            let codes = message::NftCodes {
                collection: load_code(&collection_code)?,
                item: load_code(&item_code)?,
            };
            let metadata = Metadata {
                name,
                description,
                image,
                cover_image,
                social_links,
            };
            let data = message::collection_data(&owner, &metadata, codes.item)?;
            let init = StateInit::new(codes.collection, data);
            let address = message::contract_address(0, &init)?;
            let deeplink = DeepLink::new(address, amount)
                .bounceable(bounceable)
                .with_state_init(init.to_cell()?)
                .to_url()?;
            Report {
                address: address.to_string_with(bounceable, false),
                deeplink,
            }
        }

        Command::Mint {
            collection,
            owner,
            index,
            query_id,
            item_amount,
            amount,
            name,
            description,
            image,
        } => {
            let collection = Address::parse(&collection)?;
            let owner = Address::parse(&owner)?;
            let metadata = Metadata {
                name,
                description,
                image,
                ..Default::default()
            };
            let body = message::mint_body(
                query_id,
                index,
                item_amount,
                &owner,
                metadata.to_cell()?,
            )?;
            let deeplink = DeepLink::new(collection, amount)
                .with_body(body)
                .to_url()?;
            Report {
                address: collection.to_string_with(false, false),
                deeplink,
            }
        }

        Command::Transfer {
            nft,
            new_owner,
            response,
            query_id,
            forward,
            payload,
            amount,
        } => {
            let nft = Address::parse(&nft)?;
            let new_owner = match new_owner.as_deref() {
                None | Some("none") => None,
                Some(s) => Some(Address::parse(s)?),
            };
            let response = response.as_deref().map(Address::parse).transpose()?;
            let payload = payload.as_deref().map(hex::decode).transpose()?;
            let body = message::transfer_body(
                query_id,
                new_owner.as_ref(),
                response.as_ref(),
                forward,
                payload.as_deref(),
            )?;
            let deeplink = DeepLink::new(nft, amount).with_body(body).to_url()?;
            Report {
                address: nft.to_string_with(false, false),
                deeplink,
            }
        }

        Command::ChangeOwner {
            collection,
            new_owner,
            query_id,
            amount,
        } => {
            let collection = Address::parse(&collection)?;
            let new_owner = Address::parse(&new_owner)?;
            let body = message::change_owner_body(query_id, &new_owner)?;
            let deeplink = DeepLink::new(collection, amount)
                .with_body(body)
                .to_url()?;
            Report {
                address: collection.to_string_with(false, false),
                deeplink,
            }
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Address: {}", report.address);
        println!("Deeplink: {}", report.deeplink);
    }
    Ok(())
}

/// Loads a compiled contract cell from a hex-encoded bag-of-cells file,
/// as emitted by the contract build step.
fn load_code(path: &PathBuf) -> Result<CellRef, Box<dyn std::error::Error>> {
    let hex_text = fs::read_to_string(path)?;
    let bytes = hex::decode(hex_text.trim())?;
    Ok(boc::parse(&bytes)?)
}
