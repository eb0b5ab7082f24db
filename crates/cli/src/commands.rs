//! CLI commands

use anyhow::{Result, anyhow, bail};
use clap::Subcommand;
use portal_client::{AuthSession, PortalClient, RecordingNavigator, RouteContext};
use portal_core::{
    AppStore, GateDecision, LeadStatus, LoginRequest, PortalConfig, ProfileUpdate,
    RegisterRequest, ResourceId, SessionGate,
};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config;
use crate::state::CookieFile;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in to the portal
    Login {
        #[arg(long, env = "PORTAL_EMAIL")]
        email: String,

        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a lender account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeat of the password; defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        location: String,
    },

    /// Sign out and drop the saved session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List your bids
    Bids,

    /// Bid on a loan estimate
    Bid {
        /// Loan estimate id
        estimate: String,

        amount: f64,
    },

    /// List your leads
    Leads,

    /// Update the status of a lead
    Lead {
        id: String,

        status: LeadStatus,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Update profile details
    Profile {
        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },

    /// List loan estimates, or show one
    Estimates { id: Option<String> },

    /// Show what the session gate decides for a page
    Gate { path: String },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Output file path (defaults to PORTAL_STATE_DIR/portal.json)
        output: Option<PathBuf>,
    },
}

/// Everything a command needs to talk to the backend
struct Portal {
    session: AuthSession,
    navigator: RecordingNavigator,
    gate: SessionGate,
    cookies: CookieFile,
}

impl Portal {
    fn open(config: &PortalConfig, data_dir: &std::path::Path) -> Result<Self> {
        let navigator = RecordingNavigator::new();
        let client = PortalClient::from_config(config)
            .navigator(Arc::new(navigator.clone()))
            .build()?;

        let cookies = CookieFile::new(data_dir);
        if let Some(header) = cookies.load()? {
            debug!("restoring saved session cookies");
            client.restore_cookies(&header);
        }

        Ok(Self {
            session: AuthSession::with_routes(client, AppStore::new(), &config.routes),
            navigator,
            gate: SessionGate::new(config.routes.clone()),
            cookies,
        })
    }

    const fn client(&self) -> &PortalClient {
        self.session.client()
    }

    /// Run the gate for the page a command stands for
    fn enter(&self, page: &str) -> Result<RouteContext> {
        match self.gate.decide(page, self.client().has_session()) {
            GateDecision::Allow => Ok(RouteContext::new(page)),
            GateDecision::Redirect(target) if target == self.gate.config().login_path => {
                bail!("Not signed in. Run `portal login` first.")
            }
            GateDecision::Redirect(_) => {
                bail!("Already signed in. Run `portal logout` to switch accounts.")
            }
        }
    }

    /// Persist cookies and report a forced redirect to the login page
    fn finish(&self) -> Result<()> {
        self.cookies.save(self.client().cookie_header().as_deref())?;

        let login = &self.gate.config().login_path;
        if self.navigator.visits().iter().any(|visit| visit == login) {
            warn!("backend rejected the session");
            eprintln!("Your session is no longer valid. Run `portal login` to sign in again.");
        }
        Ok(())
    }
}

impl Commands {
    /// Page of the portal this command corresponds to
    const fn page(&self) -> &'static str {
        match self {
            Self::Login { .. } => "/login",
            Self::Register { .. } => "/register",
            Self::Bids | Self::Bid { .. } => "/bids",
            Self::Leads | Self::Lead { .. } => "/leads",
            Self::Profile { .. } => "/profile",
            Self::Estimates { .. } => "/estimates",
            Self::Logout | Self::Whoami | Self::Gate { .. } | Self::Config { .. } => "/dashboard",
        }
    }

    /// Run the command; `timeout` bounds the backend calls only, so the
    /// session cookies are saved even when the deadline passes
    pub async fn execute(
        self,
        config_file: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let data_dir = config::data_dir(data_dir);

        if let Self::Config { command } = self {
            return command.execute(config_file, data_dir);
        }

        let config = config::load_config(config_file.as_deref(), &data_dir)?;
        let portal = Portal::open(&config, &data_dir)?;

        if let Self::Gate { path } = &self {
            let decision = portal.gate.decide(path, portal.client().has_session());
            match decision {
                GateDecision::Allow => println!("allow {path}"),
                GateDecision::Redirect(target) => println!("redirect {path} -> {target}"),
            }
            return Ok(());
        }

        let route = portal.enter(self.page())?;
        let outcome = within(timeout, self.run(&portal, &route)).await;
        portal.finish()?;
        outcome
    }

    async fn run(self, portal: &Portal, route: &RouteContext) -> Result<()> {
        let session = &portal.session;
        let client = portal.client();

        match self {
            Self::Login { email, password } => {
                let signed_in = session
                    .login(route, &LoginRequest { email, password })
                    .await?;
                info!("Signed in as {}", signed_in.user.display_name());
                print_json(&signed_in.user)
            }
            Self::Register {
                email,
                password,
                confirm_password,
                first_name,
                last_name,
                company,
                phone,
                location,
            } => {
                let registration = RegisterRequest {
                    email,
                    password2: confirm_password.unwrap_or_else(|| password.clone()),
                    password1: password,
                    first_name,
                    last_name,
                    company_name: company,
                    phone_number: phone,
                    location,
                };
                let signed_in = session.register(route, &registration).await?;
                info!("Registered {}", signed_in.user.display_name());
                print_json(&signed_in.user)
            }
            Self::Logout => {
                let response = session.logout(route).await?;
                println!("{}", response.message);
                Ok(())
            }
            Self::Whoami => match session.load_user(route).await? {
                Some(user) => print_json(&user),
                None => bail!("Not signed in."),
            },
            Self::Bids => print_json(&client.my_bids(route).await?),
            Self::Bid { estimate, amount } => {
                if !amount.is_finite() || amount <= 0.0 {
                    bail!("Bid amount must be a positive number");
                }
                let bid = client
                    .place_bid(route, ResourceId::new(estimate), amount)
                    .await?;
                print_json(&bid)
            }
            Self::Leads => print_json(&client.my_leads(route).await?),
            Self::Lead { id, status, notes } => {
                let lead = client
                    .update_lead(route, &ResourceId::new(id), status, notes)
                    .await?;
                print_json(&lead)
            }
            Self::Profile {
                company,
                phone,
                location,
            } => {
                let update = ProfileUpdate {
                    company_name: company,
                    phone_number: phone,
                    location,
                };
                if update.is_empty() {
                    bail!("Nothing to update; pass --company, --phone or --location");
                }
                let response = client.update_profile(route, &update).await?;
                println!("{}", response.message);
                Ok(())
            }
            Self::Estimates { id: Some(id) } => {
                print_json(&client.loan_estimate(route, &ResourceId::new(id)).await?)
            }
            Self::Estimates { id: None } => print_json(&client.loan_estimates(route).await?),
            Self::Gate { .. } | Self::Config { .. } => Ok(()),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, config_file: Option<PathBuf>, data_dir: PathBuf) -> Result<()> {
        match self {
            Self::Show => {
                let config = config::load_config(config_file.as_deref(), &data_dir)?;
                print_json(&config)
            }
            Self::Init { output } => {
                let config_path = output.unwrap_or_else(|| config::default_config_path(&data_dir));

                // Create parent directory if it doesn't exist
                if let Some(parent) = config_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                config::generate_default_config(&config_path)?;
                println!(
                    "Generated portal configuration at: {}",
                    config_path.display()
                );
                Ok(())
            }
        }
    }
}

async fn within<F>(limit: Option<Duration>, work: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, work).await.unwrap_or_else(|_| {
            Err(anyhow!(
                "Command timed out after {} seconds",
                limit.as_secs()
            ))
        }),
        None => work.await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_follow_gate_classification() {
        let gate = SessionGate::default();
        let login = Commands::Login {
            email: String::new(),
            password: String::new(),
        };
        assert_eq!(gate.decide(login.page(), false), GateDecision::Allow);
        assert_eq!(
            gate.decide(Commands::Leads.page(), false),
            GateDecision::Redirect("/login".into())
        );
        assert!(gate.decide(Commands::Whoami.page(), true).is_allow());
    }

    #[test]
    fn test_enter_without_session_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let portal = Portal::open(&PortalConfig::default(), dir.path()).unwrap();

        let error = portal.enter("/leads").unwrap_err();
        assert!(error.to_string().contains("portal login"));
        assert!(portal.enter("/login").is_ok());
    }

    #[test]
    fn test_enter_with_saved_session() {
        let dir = tempfile::tempdir().unwrap();
        CookieFile::new(dir.path())
            .save(Some("sessionid=abc"))
            .unwrap();
        let portal = Portal::open(&PortalConfig::default(), dir.path()).unwrap();

        assert_eq!(portal.enter("/leads").unwrap().path(), "/leads");
        let error = portal.enter("/login").unwrap_err();
        assert!(error.to_string().contains("Already signed in"));
    }

    #[tokio::test]
    async fn test_cookies_saved_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let portal = Portal::open(&PortalConfig::default(), dir.path()).unwrap();

        let work = async {
            portal.client().restore_cookies("sessionid=rotated");
            std::future::pending::<Result<()>>().await
        };
        let outcome = within(Some(Duration::from_millis(20)), work).await;
        portal.finish().unwrap();

        assert!(outcome.unwrap_err().to_string().contains("timed out"));
        assert_eq!(
            CookieFile::new(dir.path()).load().unwrap().as_deref(),
            Some("sessionid=rotated")
        );
    }

    #[tokio::test]
    async fn test_no_limit_waits_for_work() {
        let outcome = within(None, async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(())
        })
        .await;
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_finish_persists_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let portal = Portal::open(&PortalConfig::default(), dir.path()).unwrap();

        portal.client().restore_cookies("sessionid=xyz");
        portal.finish().unwrap();

        assert_eq!(
            CookieFile::new(dir.path()).load().unwrap().as_deref(),
            Some("sessionid=xyz")
        );
    }
}
