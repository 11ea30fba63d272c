//! DAO Registry - Binary Entry Point
//!
//! Runs a short walkthrough on the in-process chain: register a DAO and its
//! token, deposit, trade one lot against the quote token, and print the
//! resulting tables and state root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dao_registry::config::RegistryConfig;
use dao_registry::host::{Chain, TokenAction, Transaction, TransactionAction, TransactionTrace};
use dao_registry::registry::Action;
use dao_registry::types::{Asset, Name, OfferType, Symbol};

#[derive(Parser)]
#[command(name = "dao-registry")]
#[command(version)]
#[command(about = "DAO registry with a custodial token ledger and offer book", long_about = None)]
struct Cli {
    /// Registry config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG and the config file
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RegistryConfig::default(),
    };

    let filter = match &cli.log {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_filter))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("===========================================");
    println!("  DAO Registry");
    println!("===========================================");
    println!();

    let mut chain = Chain::new(&config).context("starting chain")?;
    let demo = Demo::new(&config)?;
    demo.run(&mut chain)?;

    let registry = chain.registry();
    println!("DAOs:");
    for dao in registry.daos() {
        println!("{}", serde_json::to_string_pretty(dao)?);
    }
    println!();

    for owner in [demo.creator, demo.bob, demo.alice] {
        println!("Balances of {owner}:");
        println!("{}", serde_json::to_string_pretty(&registry.balances(owner))?);
    }
    println!();

    println!("Offers of DAO 1:");
    println!("{}", serde_json::to_string_pretty(&registry.offers(1))?);
    println!();

    let root = registry.state_root()?;
    println!("State root: {}", hex::encode(root));

    Ok(())
}

/// Accounts and amounts used by the walkthrough.
struct Demo {
    quote_contract: Name,
    quote_symbol: Symbol,
    dao_token: Name,
    registry: Name,
    creator: Name,
    bob: Name,
    alice: Name,
}

impl Demo {
    fn new(config: &RegistryConfig) -> Result<Self> {
        Ok(Self {
            quote_contract: config.system_token.contract,
            quote_symbol: config.system_token.symbol,
            dao_token: "token.c".parse()?,
            registry: config.account,
            creator: "creator".parse()?,
            bob: "bob".parse()?,
            alice: "alice".parse()?,
        })
    }

    fn quote(&self, amount: u64) -> Asset {
        Asset::new(amount * self.quote_symbol.unit(), self.quote_symbol)
    }

    fn run(&self, chain: &mut Chain) -> Result<()> {
        let dtk: Symbol = "4,DTK".parse()?;
        chain.deploy_token(self.dao_token);

        // Token supply
        self.token(chain, self.quote_contract, self.quote_contract, TokenAction::Create {
            issuer: self.quote_contract,
            maximum_supply: self.quote(1_000_000),
        })?;
        self.token(chain, self.quote_contract, self.quote_contract, TokenAction::Issue {
            to: self.quote_contract,
            quantity: self.quote(1_000),
            memo: String::new(),
        })?;
        self.token(chain, self.dao_token, self.dao_token, TokenAction::Create {
            issuer: self.creator,
            maximum_supply: "1000000.0000 DTK".parse()?,
        })?;
        self.token(chain, self.dao_token, self.creator, TokenAction::Issue {
            to: self.creator,
            quantity: "1000.0000 DTK".parse()?,
            memo: String::new(),
        })?;
        for account in [self.bob, self.alice] {
            chain.push(Transaction::transfer(
                self.quote_contract,
                self.quote_contract,
                account,
                self.quote(10),
                "",
            ))?;
        }
        chain.push(Transaction::transfer(
            self.dao_token,
            self.creator,
            self.bob,
            "5.0000 DTK".parse()?,
            "",
        ))?;

        // Register the DAO and its token
        let dao: Name = "firstdao".parse()?;
        self.registry_action(chain, self.creator, Action::Create {
            dao,
            creator: self.creator,
            ipfs: "QmDaoMetadata".into(),
        })?;
        self.registry_action(chain, self.creator, Action::Addtoken {
            dao_id: 1,
            token_contract: self.dao_token,
            token: dtk,
        })?;
        info!(%dao, "DAO registered");

        // Deposits
        chain.push(Transaction::transfer(
            self.dao_token,
            self.creator,
            self.registry,
            "100.0000 DTK".parse()?,
            "1",
        ))?;
        chain.push(Transaction::transfer(
            self.dao_token,
            self.bob,
            self.registry,
            "5.0000 DTK".parse()?,
            "1",
        ))?;
        chain.push(Transaction::transfer(
            self.quote_contract,
            self.alice,
            self.registry,
            self.quote(1),
            "0",
        ))?;

        // bob sells, alice buys the same lot
        let price: Asset = "0.1000 TLOS".parse()?;
        self.registry_action(chain, self.bob, Action::Createoffer {
            dao_id: 1,
            creator: self.bob,
            quantity: "1.0000 DTK".parse()?,
            price_per_unit: price,
            offer_type: OfferType::Sell,
        })?;
        chain.advance_time(1);
        let trace = self.registry_action(chain, self.alice, Action::Createoffer {
            dao_id: 1,
            creator: self.alice,
            quantity: "1.0000 DTK".parse()?,
            price_per_unit: price,
            offer_type: OfferType::Buy,
        })?;
        if let Some(settlement) = trace.last().and_then(|receipt| receipt.settlement()) {
            info!(total = %settlement.total, "Offer 0 settled");
        }

        // bob takes his proceeds out
        self.registry_action(chain, self.bob, Action::Withdraw {
            account: self.bob,
            token_contract: self.quote_contract,
            amount: price,
        })?;

        Ok(())
    }

    fn token(&self, chain: &mut Chain, contract: Name, signer: Name, action: TokenAction) -> Result<()> {
        chain
            .push(Transaction::new(signer, TransactionAction::Token { contract, action }))
            .with_context(|| format!("token action on {contract}"))?;
        Ok(())
    }

    fn registry_action(&self, chain: &mut Chain, signer: Name, action: Action) -> Result<TransactionTrace> {
        let name = action.name();
        chain
            .push(Transaction::new(signer, action))
            .with_context(|| format!("registry action {name}"))
    }
}
