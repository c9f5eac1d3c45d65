use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cosmwasm_std::{Binary, Decimal, Uint128};
use reqwest::blocking::Client;
use royalty_common::{KnownAddresses, OwnershipRecord};
use royalty_distributor::msg::{
    AssetInfo, ExecuteMsg, InstantiateMsg, MarketplaceQueryMsg, MigrateMsg,
};
use royalty_distributor::state::Config as RoyaltyConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use royalty_ops::config::{
    self, GasPrice, Network, DEFAULT_DENOM, DEFAULT_FEE_DENOM, LISTINGS_URL, MANTLE_URL,
};
use royalty_ops::distributor::{plan_distribution, BatchDistributor, TxSink, UnsignedTxWriter};
use royalty_ops::fetcher::{SnapshotConfig, SnapshotFetcher, DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE};
use royalty_ops::indexer::MantleIndexer;
use royalty_ops::lcd::{LcdClient, SignedTxFile};
use royalty_ops::listings::ListingsClient;
use royalty_ops::retry::RetryPolicy;
use royalty_ops::tx::{GasSettings, TxMsg, DEFAULT_GAS_PER_MSG};

const CONTRACT_LABEL: &str = "royalty-distributor";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target network
    #[arg(long, env = "NETWORK", value_enum, default_value_t = Network::Localterra, global = true)]
    network: Network,

    /// Override the network's LCD endpoint
    #[arg(long, env = "LCD_URL", global = true)]
    lcd_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the owner of every token and write the snapshot file
    Snapshot(SnapshotArgs),
    /// Pull royalties accrued on marketplace A into the royalty contract
    Claim(ClaimArgs),
    /// Split the royalty contract balance across eligible holders
    Distribute(DistributeArgs),
    /// Upload the contract wasm
    StoreCode(StoreCodeArgs),
    /// Instantiate the royalty contract
    Instantiate(InstantiateArgs),
    /// Migrate the royalty contract to a new code id
    Migrate(MigrateArgs),
    /// Broadcast signed transactions in order
    Broadcast(BroadcastArgs),
}

#[derive(Args)]
struct TxArgs {
    /// Signer address
    #[arg(long, env = "DEPLOYER_ADDRESS")]
    sender: String,

    /// Where to write the unsigned transaction
    #[arg(long, default_value = "unsigned_tx.json")]
    out: PathBuf,

    /// Gas price such as 0.15uusd; fetched from the network when omitted
    #[arg(long)]
    gas_price: Option<String>,

    /// Denom to pay fees in when the gas price is fetched
    #[arg(long, default_value = DEFAULT_FEE_DENOM)]
    fee_denom: String,

    #[arg(long, default_value_t = DEFAULT_GAS_PER_MSG)]
    gas_per_msg: u64,

    #[arg(long, default_value = "1.4")]
    gas_adjustment: Decimal,

    #[arg(long, default_value = "")]
    memo: String,
}

#[derive(Args)]
struct KnownArgs {
    #[arg(long, default_value = config::UNMINTED_WALLET)]
    unminted_wallet: String,

    #[arg(long, default_value = config::MARKETPLACE_A_CUSTODY)]
    marketplace_a_custody: String,

    #[arg(long, default_value = config::MARKETPLACE_B_CUSTODY)]
    marketplace_b_custody: String,

    #[arg(long, default_value = config::PROTOCOL_WALLET)]
    protocol_wallet: String,
}

impl From<KnownArgs> for KnownAddresses {
    fn from(args: KnownArgs) -> Self {
        KnownAddresses {
            unminted: args.unminted_wallet,
            marketplace_a_custody: args.marketplace_a_custody,
            marketplace_b_custody: args.marketplace_b_custody,
            protocol_wallet: args.protocol_wallet,
        }
    }
}

#[derive(Args)]
struct SnapshotArgs {
    #[arg(long, env = "NFT_CONTRACT_ADDRESS")]
    nft_contract: String,

    /// Total supply; token ids are 1..=N
    #[arg(long, env = "NFT_COUNT")]
    nft_count: u32,

    #[arg(long, default_value = "owners.json")]
    out: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: u32,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    #[arg(long, env = "MANTLE_URL", default_value = MANTLE_URL)]
    mantle_url: String,

    #[arg(long, env = "LISTINGS_URL", default_value = LISTINGS_URL)]
    listings_url: String,

    #[arg(long, default_value = config::MARKETPLACE_A_CUSTODY)]
    marketplace_a_custody: String,
}

#[derive(Args)]
struct ClaimArgs {
    #[arg(long, env = "ROYALTY_CONTRACT_ADDRESS")]
    contract: String,

    /// Marketplace A rewards contract
    #[arg(long, env = "RANDOM_EARTH_REWARDS_CONTRACT_ADDRESS")]
    rewards_contract: String,

    #[arg(long, default_value = DEFAULT_DENOM)]
    denom: String,

    #[command(flatten)]
    tx: TxArgs,
}

#[derive(Args)]
struct DistributeArgs {
    #[arg(long, env = "ROYALTY_CONTRACT_ADDRESS")]
    contract: String,

    #[arg(long, default_value = "owners.json")]
    snapshot: PathBuf,

    #[arg(long, env = "NFT_COUNT")]
    nft_count: u32,

    /// Distribution epoch; must exceed the last one recorded on-chain
    #[arg(long)]
    epoch: u64,

    #[arg(long, default_value_t = royalty_common::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Log the plan without writing a transaction
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    known: KnownArgs,

    #[command(flatten)]
    tx: TxArgs,
}

#[derive(Args)]
struct StoreCodeArgs {
    #[arg(long, default_value = "artifacts/royalty_distributor.wasm")]
    wasm: PathBuf,

    #[command(flatten)]
    tx: TxArgs,
}

#[derive(Args)]
struct InstantiateArgs {
    #[arg(long)]
    code_id: u64,

    #[arg(long, default_value_t = 0)]
    nft_count: u32,

    #[arg(long)]
    denom: Option<String>,

    #[command(flatten)]
    tx: TxArgs,
}

#[derive(Args)]
struct MigrateArgs {
    #[arg(long, env = "ROYALTY_CONTRACT_ADDRESS")]
    contract: String,

    #[arg(long)]
    code_id: u64,

    #[command(flatten)]
    tx: TxArgs,
}

#[derive(Args)]
struct BroadcastArgs {
    /// Signed transaction files, broadcast in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Pause between broadcasts so the signer's sequence advances
    #[arg(long, default_value_t = 2_000)]
    delay_ms: u64,
}

struct Ops {
    network: Network,
    http: Client,
    lcd: LcdClient,
}

impl Ops {
    fn gas_settings(&self, args: &TxArgs) -> Result<GasSettings> {
        let price = match &args.gas_price {
            Some(raw) => raw.parse::<GasPrice>()?,
            None => self
                .lcd
                .gas_price(self.network, &args.fee_denom)
                .context("fetching gas price")?,
        };
        info!(%price, "using gas price");
        Ok(GasSettings {
            gas_per_msg: args.gas_per_msg,
            adjustment: args.gas_adjustment,
            price,
        })
    }

    fn write_tx(&self, args: &TxArgs, messages: Vec<TxMsg>) -> Result<()> {
        let mut writer = UnsignedTxWriter::new(args.out.clone(), self.gas_settings(args)?);
        writer.memo = args.memo.clone();
        writer.submit(messages)?;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let http = Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
        .context("building HTTP client")?;
    let lcd_url = cli
        .lcd_url
        .clone()
        .unwrap_or_else(|| cli.network.lcd_url().to_string());
    info!(network = %cli.network, chain_id = cli.network.chain_id(), %lcd_url, "created LCD client");

    let ctx = Ops {
        network: cli.network,
        lcd: LcdClient::new(http.clone(), lcd_url),
        http,
    };

    match cli.command {
        Commands::Snapshot(args) => snapshot(&ctx, args),
        Commands::Claim(args) => claim(&ctx, args),
        Commands::Distribute(args) => distribute(&ctx, args),
        Commands::StoreCode(args) => store_code(&ctx, args),
        Commands::Instantiate(args) => instantiate(&ctx, args),
        Commands::Migrate(args) => migrate(&ctx, args),
        Commands::Broadcast(args) => broadcast(&ctx, args),
    }
}

fn snapshot(ctx: &Ops, args: SnapshotArgs) -> Result<()> {
    let config = SnapshotConfig {
        batch_size: args.batch_size,
        page_size: args.page_size,
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            ..RetryPolicy::default()
        },
        ..SnapshotConfig::new(args.nft_contract, args.nft_count, args.marketplace_a_custody)
    };
    let index = MantleIndexer::new(ctx.http.clone(), args.mantle_url);
    let listings = ListingsClient::new(ctx.http.clone(), args.listings_url);

    let record = SnapshotFetcher::new(&config, &index, &listings).fetch()?;
    let json = serde_json::to_string_pretty(&record)?;
    fs::write(&args.out, json).with_context(|| format!("writing {}", args.out.display()))?;
    info!(
        path = %args.out.display(),
        tokens = record.len(),
        digest = %record.digest(),
        "wrote snapshot"
    );
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<OwnershipRecord> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let record = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(record)
}

fn claim(ctx: &Ops, args: ClaimArgs) -> Result<()> {
    let pool = ctx.lcd.balance(&args.contract, &args.denom)?;
    info!(contract = %args.contract, %pool, denom = %args.denom, "current reward pool");

    let accrued: String = ctx.lcd.query_smart(
        &args.rewards_contract,
        &MarketplaceQueryMsg::Balance {
            address: args.contract.clone(),
            asset_info: AssetInfo::NativeToken {
                denom: args.denom.clone(),
            },
        },
    )?;
    let accrued: Uint128 = accrued
        .parse()
        .with_context(|| format!("marketplace balance {accrued:?} is not an integer"))?;
    info!(%accrued, denom = %args.denom, "royalties held by marketplace A");
    if accrued.is_zero() {
        warn!("nothing to claim");
        return Ok(());
    }

    let msg = TxMsg::execute(
        &args.tx.sender,
        &args.contract,
        &ExecuteMsg::WithdrawMarketplace {
            address: args.rewards_contract.clone(),
            amount: accrued,
        },
    )?;
    ctx.write_tx(&args.tx, vec![msg])
}

fn distribute(ctx: &Ops, args: DistributeArgs) -> Result<()> {
    let record = read_snapshot(&args.snapshot)?;
    let digest = record.digest();
    info!(path = %args.snapshot.display(), tokens = record.len(), %digest, "loaded snapshot");

    let config: RoyaltyConfig = ctx
        .lcd
        .query_smart(&args.contract, &royalty_distributor::msg::QueryMsg::Config {})
        .context("querying royalty contract config")?;
    if config.nft_count != 0 && config.nft_count != args.nft_count {
        bail!(
            "royalty contract expects {} tokens but --nft-count is {}",
            config.nft_count,
            args.nft_count
        );
    }
    let pool = ctx.lcd.balance(&args.contract, &config.denom)?;
    if pool.is_zero() {
        bail!("royalty contract {} holds no {}", args.contract, config.denom);
    }

    let known = KnownAddresses::from(args.known);
    let plan = plan_distribution(&record, &known, args.nft_count, pool)?;

    let messages = BatchDistributor::new(&args.contract, &args.tx.sender)
        .with_chunk_size(args.chunk_size)
        .messages(args.epoch, &digest, &plan.recipients)?;
    info!(
        epoch = args.epoch,
        recipients = plan.recipients.len(),
        messages = messages.len(),
        "prepared distribution"
    );

    if args.dry_run {
        for recipient in &plan.recipients {
            info!(addr = %recipient.addr, amount = %recipient.amount, "payout");
        }
        return Ok(());
    }
    ctx.write_tx(&args.tx, messages)
}

fn store_code(ctx: &Ops, args: StoreCodeArgs) -> Result<()> {
    let wasm = fs::read(&args.wasm).with_context(|| format!("reading {}", args.wasm.display()))?;
    info!(path = %args.wasm.display(), bytes = wasm.len(), "storing code");
    let msg = TxMsg::StoreCode {
        sender: args.tx.sender.clone(),
        wasm_byte_code: Binary::from(wasm),
    };
    ctx.write_tx(&args.tx, vec![msg])
}

fn instantiate(ctx: &Ops, args: InstantiateArgs) -> Result<()> {
    let msg = TxMsg::instantiate(
        &args.tx.sender,
        args.code_id,
        CONTRACT_LABEL,
        &InstantiateMsg {
            owner: args.tx.sender.clone(),
            nft_count: args.nft_count,
            denom: args.denom,
        },
    )?;
    ctx.write_tx(&args.tx, vec![msg])
}

fn migrate(ctx: &Ops, args: MigrateArgs) -> Result<()> {
    let msg = TxMsg::migrate(&args.tx.sender, &args.contract, args.code_id, &MigrateMsg {})?;
    ctx.write_tx(&args.tx, vec![msg])
}

fn broadcast(ctx: &Ops, args: BroadcastArgs) -> Result<()> {
    for (i, path) in args.files.iter().enumerate() {
        if i > 0 {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let signed = SignedTxFile::parse(&raw).with_context(|| format!("parsing {}", path.display()))?;

        let tx = ctx
            .lcd
            .broadcast(&signed.tx_bytes)
            .with_context(|| format!("broadcasting {}", path.display()))?;
        info!(path = %path.display(), txhash = %tx.txhash, height = %tx.height, "transaction included");

        if let Some(code_id) = tx.event_attribute("store_code", "code_id") {
            info!(code_id, "stored code");
        }
        if let Some(address) = tx.event_attribute("instantiate", "_contract_address") {
            info!(contract_address = address, "instantiated contract");
        }
    }
    Ok(())
}
