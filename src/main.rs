use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use adwatch::models::{
    snapshots::FinancialSnapshot,
    transactions::{DepositMethod, NewWithdrawal, PayoutMethod},
    users::{Preferences, Theme, UserProfile},
};
use adwatch::repositories::{
    api::{HttpWatchApi, WatchApi},
    media::MediaRepository,
    store::{FileStore, KeyValueStore, MemoryStore},
};
use adwatch::services::{
    accounts::{AccountService, DepositForm},
    playback::PlaybackService,
    referrals,
    rewards::{ClaimOutcome, RewardService},
    session::SessionCache,
    sync::{start_sync_service, SyncClient},
    watch::RemoteStatus,
};
use adwatch::settings::Settings;
use adwatch::utils;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "adwatch.toml")]
    config: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
    /// Keep the session in memory for this run only
    #[arg(long)]
    no_persist: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session locally
    Login {
        email: String,
        #[arg(long, env = "ADWATCH_PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ADWATCH_PASSWORD")]
        password: String,
        #[arg(long)]
        phone: String,
        /// Invite code or a referral link containing one
        #[arg(long)]
        invite: Option<String>,
    },
    Logout,
    /// Show the cached profile
    Profile,
    /// Change display preferences
    Preferences {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
    },
    /// Balance, withdrawals, deposits and referrals
    Dashboard {
        #[arg(long)]
        refresh: bool,
    },
    /// List ads available to watch
    Ads {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Watch an ad and claim its reward
    Watch {
        ad_id: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Refresh everything and replay unconfirmed credits
    Sync,
    /// Submit a deposit
    Deposit {
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "easypaisa")]
        method: DepositMethod,
        #[arg(long)]
        transaction_id: String,
        #[arg(long)]
        sender_name: String,
        #[arg(long)]
        sender_phone: String,
        #[arg(long)]
        screenshot_url: Option<String>,
    },
    /// Accounts that accept deposits
    Accounts,
    /// Request a withdrawal
    Withdraw {
        #[arg(long)]
        amount: f64,
        /// bank, mobile or card
        #[arg(long)]
        method: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        bank_name: Option<String>,
        #[arg(long)]
        account_holder: Option<String>,
        #[arg(long)]
        account_number: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show your invite code and referral link
    Referral,
    /// Show the members you invited
    Team {
        #[arg(long)]
        refresh: bool,
    },
    /// Ad earnings history
    Earnings,
}

struct App {
    settings: Settings,
    session: SessionCache,
    accounts: AccountService,
    rewards: RewardService,
}

impl App {
    fn new(settings: Settings, persist: bool) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = if persist {
            let dir = settings.storage_dir();
            Arc::new(
                FileStore::open(&dir)
                    .with_context(|| format!("Could not open storage at {}", dir.display()))?,
            )
        } else {
            log::info!("Using in-memory storage");
            Arc::new(MemoryStore::new())
        };
        let api: Arc<dyn WatchApi> = Arc::new(
            HttpWatchApi::new(&settings.api.base_url, settings.api.timeout())
                .context("Could not create API client")?,
        );

        let session = SessionCache::new(store.clone(), api.clone());
        let accounts = AccountService::new(session.clone(), api.clone());
        let rewards = RewardService::new(session.clone(), store, api, settings.rewards.clone());

        Ok(App {
            settings,
            session,
            accounts,
            rewards,
        })
    }

    fn sync_client(&self) -> SyncClient {
        start_sync_service(self.session.clone(), self.rewards.clone())
    }

    fn require_profile(&self) -> Result<UserProfile> {
        self.session
            .get_profile()
            .context("Not logged in. Run `adwatch login <email>` first.")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    init_logging(&args.log4rs)?;
    let settings = Settings::load(&args.config).context("Failed to load settings.")?;
    log::info!("Using API at {}", settings.api.base_url);

    let app = App::new(settings, !args.no_persist)?;
    run(&app, args.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let profile = app.accounts.login(&email, &password).await?;
            println!("Welcome back, {}!", profile.display_name());
            print_profile(&profile);
        }
        Command::Signup {
            name,
            email,
            password,
            phone,
            invite,
        } => {
            let invite = invite.map(|value| {
                referrals::extract_referral_code(&value).unwrap_or(value)
            });
            match app
                .accounts
                .signup(&name, &email, &password, &phone, invite.as_deref())
                .await?
            {
                Some(profile) => println!("Account created. Welcome, {}!", profile.display_name()),
                None => println!("Account created. Log in to continue."),
            }
        }
        Command::Logout => {
            app.accounts.logout()?;
            println!("Logged out.");
        }
        Command::Profile => print_profile(&app.require_profile()?),
        Command::Preferences {
            theme,
            language,
            notifications,
        } => {
            let theme = match theme.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None => None,
                Some("light") => Some(Theme::Light),
                Some("dark") => Some(Theme::Dark),
                Some(other) => anyhow::bail!("Unknown theme: {}", other),
            };
            let profile = app
                .session
                .update_preferences(Preferences {
                    theme,
                    language,
                    notifications,
                })?
                .context("Not logged in.")?;
            let preferences = profile.effective_preferences();
            println!(
                "Theme: {:?}, language: {}, notifications: {}",
                preferences.theme.unwrap_or_default(),
                preferences.language.unwrap_or_default(),
                preferences.notifications.unwrap_or(true)
            );
        }
        Command::Dashboard { refresh } => dashboard(app, refresh).await?,
        Command::Ads { page } => {
            let watch_page = app.rewards.enter_page(page).await?;
            if let Some(notice) = &watch_page.bonus {
                println!("{}", notice.message);
            }
            if !watch_page.eligible {
                println!("Watching ads requires a pro plan. Upgrade to start earning.");
                return Ok(());
            }
            if let Some(error) = &watch_page.ads_error {
                println!("{}", error);
            }
            println!(
                "Watched today: {}/{}",
                watch_page.watch_count, watch_page.daily_cap
            );
            for ad in &watch_page.ads {
                println!("  {:<26} {} ({}s)", ad.id, ad.name, ad.duration_secs);
            }
            if let Some(pagination) = &watch_page.pagination {
                println!(
                    "Page {} of {} ({} ads)",
                    pagination.current_page, pagination.total_pages, pagination.total_ads
                );
            }
        }
        Command::Watch { ad_id, page } => watch(app, &ad_id, page).await?,
        Command::Sync => {
            app.require_profile()?;
            let client = app.sync_client();
            let profile = client.refresh_profile().await;
            let snapshot = client.refresh_financials(true).await;
            let report = client.reconcile().await?;

            match profile {
                Ok(profile) => println!("Balance: {}", profile.balance_display()),
                Err(e) => println!("Profile refresh failed: {}", e),
            }
            if let Err(e) = snapshot {
                println!("Financial refresh failed: {}", e);
            }
            println!(
                "Pending credits: {} confirmed, {} still pending, {} dropped",
                report.confirmed, report.retained, report.dropped
            );
        }
        Command::Deposit {
            amount,
            method,
            transaction_id,
            sender_name,
            sender_phone,
            screenshot_url,
        } => {
            let message = app
                .accounts
                .submit_deposit(DepositForm {
                    amount,
                    method,
                    transaction_id,
                    sender_name,
                    sender_phone,
                    screenshot_url,
                })
                .await?;
            println!("{}", message);
        }
        Command::Accounts => {
            for account in app.accounts.deposit_accounts().await? {
                println!(
                    "{}: {} ({})",
                    account.bank_name, account.account_number, account.account_holder_name
                );
            }
        }
        Command::Withdraw {
            amount,
            method,
            email,
            bank_name,
            account_holder,
            account_number,
            phone,
        } => {
            let method = match method.to_ascii_lowercase().as_str() {
                "bank" => PayoutMethod::Bank {
                    bank_name: bank_name.unwrap_or_default(),
                    account_holder_name: account_holder.unwrap_or_default(),
                    account_number: account_number.unwrap_or_default(),
                },
                "mobile" => PayoutMethod::Mobile {
                    phone_number: phone.unwrap_or_default(),
                },
                "card" => PayoutMethod::Card,
                other => anyhow::bail!("Unknown withdrawal method: {}", other),
            };
            let message = app
                .accounts
                .submit_withdrawal(NewWithdrawal {
                    amount,
                    method,
                    email_address: email,
                })
                .await?;
            println!("{}", message);
        }
        Command::Referral => {
            let code = referrals::invite_code(&app.session)?;
            println!("Invite code: {}", referrals::format_referral_code(&code));
            println!(
                "Referral link: {}",
                referrals::referral_link(&site_url(&app.settings.api.base_url), &code)
            );
        }
        Command::Team { refresh } => {
            let team = referrals::team(&app.session, refresh).await?;
            println!(
                "Team {}: {} members, {} active, earnings {}",
                team.leader_code,
                team.total_members,
                team.active_members,
                utils::format_amount(team.total_earnings)
            );
            for member in &team.members {
                println!(
                    "  {:<30} {:<10?} joined {}",
                    member.name.as_deref().unwrap_or(&member.email),
                    member.status,
                    member.joined_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Earnings => {
            let earnings = app.rewards.earnings().await?;
            let total: f64 = earnings.iter().map(|earning| earning.amount).sum();
            for earning in &earnings {
                println!(
                    "  {} {:<26} +{}",
                    earning.watched_at.format("%Y-%m-%d %H:%M"),
                    earning.ad_id,
                    utils::format_amount(earning.amount)
                );
            }
            println!("Total from ads: {}", utils::format_amount(total));
        }
    }

    Ok(())
}

/// Renders cached data first, then whatever the sync service brings back.
async fn dashboard(app: &App, refresh: bool) -> Result<()> {
    let profile = app.require_profile()?;
    print_profile(&profile);

    let cached = app.session.cached_snapshot();
    if let Some(snapshot) = &cached {
        print_snapshot(snapshot);
    }

    let needs_fetch = refresh
        || cached
            .as_ref()
            .map(|snapshot| snapshot.is_stale(Utc::now()))
            .unwrap_or(true);
    if !needs_fetch {
        return Ok(());
    }

    let client = app.sync_client();
    if let Ok(profile) = client.refresh_profile().await {
        println!("Balance: {}", profile.balance_display());
    }
    match client.refresh_financials(refresh).await {
        Ok(snapshot) if cached.as_ref() != Some(&snapshot) => {
            println!("-- updated --");
            print_snapshot(&snapshot);
        }
        Ok(_) => {}
        Err(e) => println!("Could not load financial data: {}", e),
    }

    Ok(())
}

async fn watch(app: &App, ad_id: &str, page: Option<u32>) -> Result<()> {
    let watch_page = app.rewards.enter_page(page).await?;
    if let Some(notice) = &watch_page.bonus {
        println!("{}", notice.message);
    }
    if !watch_page.eligible {
        anyhow::bail!("Watching ads requires a pro plan.");
    }

    let ad = watch_page
        .ads
        .into_iter()
        .find(|ad| ad.id == ad_id)
        .with_context(|| format!("Ad {} is not on this page", ad_id))?;

    let mut session = app.rewards.select_ad(ad, Utc::now())?;
    println!("Watching {}...", session.ad().name);

    let playback = PlaybackService::new(MediaRepository::new(app.settings.api.timeout())?);
    let mut last_step = 0;
    playback
        .watch(&mut session, |progress| {
            let step = (progress / 25.0) as u32;
            if step > last_step {
                last_step = step;
                println!("  {:>3.0}%", progress);
            }
        })
        .await?;

    match app.rewards.claim(&mut session, Utc::now()).await? {
        ClaimOutcome::Credited {
            amount,
            remote,
            balance,
        } => {
            println!(
                "Reward claimed: +{}. Balance: {}",
                utils::format_amount(amount),
                utils::display_amount(balance.as_deref())
            );
            if remote == RemoteStatus::Failed {
                println!("The server has not confirmed this credit yet; run `adwatch sync` later.");
            }
        }
        ClaimOutcome::AlreadyClaimed => println!("Reward already claimed."),
        ClaimOutcome::NotClaimable => println!("Finish the ad to claim its reward."),
    }

    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!(
        "[{}] {} <{}>",
        profile.initials(),
        profile.display_name(),
        profile.email.as_deref().unwrap_or("-")
    );
    println!(
        "Plan: {:?}  Level: {}  Balance: {}  Withdrawn: {}",
        profile.plan(),
        profile.level.as_deref().unwrap_or("-"),
        profile.balance_display(),
        utils::display_amount(profile.total_withdrawals.as_deref())
    );
}

fn print_snapshot(snapshot: &FinancialSnapshot) {
    println!(
        "Withdrawals: {}  Deposits: {}  Referrals: {} (earned {})",
        snapshot.withdrawals.len(),
        snapshot.deposits.len(),
        snapshot.referrals.total_referrals,
        utils::format_amount(snapshot.referrals.total_earnings)
    );
    for withdrawal in snapshot.withdrawals.iter().take(5) {
        println!(
            "  withdrawal {} {:?} {}",
            utils::format_amount(withdrawal.amount),
            withdrawal.status,
            withdrawal.created_at.format("%Y-%m-%d")
        );
    }
    for deposit in snapshot.deposits.iter().take(5) {
        println!(
            "  deposit    {} {:?} {}",
            utils::format_amount(deposit.amount),
            deposit.status,
            deposit.created_at.format("%Y-%m-%d")
        );
    }
    println!(
        "Last updated: {}",
        snapshot.last_updated.format("%Y-%m-%d %H:%M:%S")
    );
}

/// The web front end lives at the API host without the `/api` suffix.
fn site_url(api_base: &str) -> String {
    api_base
        .trim_end_matches('/')
        .trim_end_matches("/api")
        .to_string()
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    if Path::new(path).exists() {
        return log4rs::init_file(path, Default::default())
            .map_err(|e| anyhow::anyhow!("Could not initialize logging: {}", e));
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(config)?;

    Ok(())
}
