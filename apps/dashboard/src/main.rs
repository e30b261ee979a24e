use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings_from, ApiClient, ContentProvider, LocalContentProvider, NoticeLevel,
    RemoteContentProvider, SessionContext, Workspace, WorkspaceEvent,
};
use shared::{
    domain::{CampaignId, SocialPlatform, Template},
    protocol::{Campaign, NewsQuery},
};
use storage::Storage;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Awareness campaign dashboard")]
struct Cli {
    #[arg(long, default_value = "client.toml")]
    config: PathBuf,
    /// Overrides the configured backend base url.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    credential_db: Option<String>,
    /// Use the in-process content provider and an in-memory session.
    #[arg(long)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        id_token: String,
    },
    Whoami,
    Logout,
    News {
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    Topics,
    Generate {
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },
    List,
    Show {
        id: String,
    },
    Edit {
        id: String,
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Regenerate {
        id: String,
    },
    Delete {
        id: String,
    },
    Download {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Template {
        name: String,
    },
    Share {
        platform: String,
    },
    /// Reads commands from stdin against one workspace.
    Shell,
}

struct Dashboard {
    workspace: Arc<Workspace>,
    provider: Arc<dyn ContentProvider>,
    api: Option<ApiClient>,
    news_query: NewsQuery,
    events: broadcast::Receiver<WorkspaceEvent>,
}

impl Dashboard {
    async fn open(cli: &Cli) -> Result<Self> {
        let mut settings = load_settings_from(&cli.config);
        if let Some(url) = &cli.api_url {
            settings.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(db) = &cli.credential_db {
            settings.credential_db_url = db.clone();
        }

        let (session, api, provider): (_, _, Arc<dyn ContentProvider>) = if cli.offline {
            info!("dashboard: running offline");
            (
                SessionContext::in_memory(),
                None,
                Arc::new(LocalContentProvider::new()),
            )
        } else {
            let storage = Storage::new(&settings.credential_db_url)
                .await
                .with_context(|| format!("opening {}", settings.credential_db_url))?;
            let session = SessionContext::new(Arc::new(storage));
            let api = ApiClient::from_settings(&settings, session.clone())?;
            info!(api = %api.base_url(), "dashboard: using remote backend");
            (
                session,
                Some(api.clone()),
                Arc::new(RemoteContentProvider::new(api)),
            )
        };

        let news_query = settings.news_query();
        let workspace = Workspace::new(provider.clone(), session, news_query.clone());
        let events = workspace.subscribe_events();
        Ok(Self {
            workspace,
            provider,
            api,
            news_query,
            events,
        })
    }

    fn api(&self) -> Result<&ApiClient> {
        self.api
            .as_ref()
            .ok_or_else(|| anyhow!("this command needs the remote backend; drop --offline"))
    }

    fn flush_notices(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                WorkspaceEvent::Notice(notice) => {
                    let tag = match notice.level {
                        NoticeLevel::Info => "ok",
                        NoticeLevel::Error => "error",
                    };
                    eprintln!("[{tag}] {}: {}", notice.title, notice.description);
                }
                WorkspaceEvent::LoggedOut => eprintln!("[ok] Signed out"),
            }
        }
    }

    async fn run(&mut self, command: Command) -> Result<()> {
        let result = self.dispatch(command).await;
        self.flush_notices();
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Register {
                name,
                email,
                password,
            } => {
                let envelope = self.api()?.register(&name, &email, &password).await?;
                let user = envelope
                    .into_payload()?
                    .user
                    .ok_or_else(|| anyhow!("backend returned no user"))?;
                println!("registered uid={}", user.uid);
            }
            Command::Login { id_token } => {
                let envelope = self.api()?.login(&id_token).await?;
                let payload = envelope.into_payload()?;
                match payload.user {
                    Some(user) => println!("signed in as {}", user.email.unwrap_or(user.uid)),
                    None => println!("signed in"),
                }
            }
            Command::Whoami => {
                let user = self
                    .api()?
                    .current_user()
                    .await?
                    .into_payload()?
                    .user
                    .ok_or_else(|| anyhow!("backend returned no user"))?;
                println!(
                    "uid={} email={} name={}",
                    user.uid,
                    user.email.as_deref().unwrap_or("-"),
                    user.display_name.as_deref().unwrap_or("-")
                );
            }
            Command::Logout => self.workspace.logout().await?,
            Command::News {
                topic,
                page,
                page_size,
            } => {
                let query = NewsQuery {
                    topic: topic.unwrap_or_else(|| self.news_query.topic.clone()),
                    page,
                    page_size: page_size.unwrap_or(self.news_query.page_size),
                };
                self.workspace.refresh_news(&query).await?;
                for item in self.workspace.snapshot().await.news {
                    let published = item
                        .published_at
                        .map(|at| at.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".into());
                    println!("{published}  {}  ({})", item.headline, item.source.name);
                    println!("    {}", item.link);
                }
            }
            Command::Topics => {
                for topic in self.provider.topics().await? {
                    println!("{:<14} {}", topic.id, topic.name);
                }
            }
            Command::Generate { topic } => {
                self.workspace.set_topic(topic.join(" ")).await;
                let campaign = self.workspace.generate().await?;
                print_campaign(&campaign);
            }
            Command::List => {
                self.workspace.refresh_campaigns().await?;
                let campaigns = self.workspace.snapshot().await.campaigns;
                if campaigns.is_empty() {
                    println!("no campaigns yet");
                }
                for campaign in campaigns {
                    println!(
                        "{:<28} {}  {}",
                        campaign.id,
                        campaign.created_at.format("%Y-%m-%d %H:%M"),
                        campaign.topic
                    );
                }
            }
            Command::Show { id } => {
                let campaign = self.workspace.load(&CampaignId::from(id)).await?;
                print_campaign(&campaign);
            }
            Command::Edit { id, text, file } => {
                let text = match (text, file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?,
                    (None, None) => bail!("pass --text or --file"),
                };
                self.workspace.load(&CampaignId::from(id)).await?;
                self.workspace.edit_draft(text).await;
                if let Some(saved) = self.workspace.save().await? {
                    print_campaign(&saved);
                }
            }
            Command::Regenerate { id } => {
                self.workspace.load(&CampaignId::from(id)).await?;
                let campaign = self.workspace.regenerate().await?;
                print_campaign(&campaign);
            }
            Command::Delete { id } => {
                self.workspace.delete(&CampaignId::from(id)).await?;
            }
            Command::Download { id, out } => {
                self.workspace.load(&CampaignId::from(id)).await?;
                let export = self.workspace.download().await?;
                let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
                tokio::fs::write(&path, export.contents)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("wrote {}", path.display());
            }
            Command::Template { name } => {
                let template = Template::from_name(&name)
                    .ok_or_else(|| anyhow!("unknown template '{name}'"))?;
                self.workspace.select_template(template).await;
                self.workspace.apply_template().await;
            }
            Command::Share { platform } => {
                let platform = SocialPlatform::from_name(&platform)
                    .ok_or_else(|| anyhow!("unknown platform '{platform}'"))?;
                self.workspace.share(platform).await;
            }
            Command::Shell => bail!("already in a shell"),
        }
        Ok(())
    }

    async fn shell(&mut self) -> Result<()> {
        let summary = self.workspace.mount().await;
        self.flush_notices();
        println!(
            "news {} / campaigns {}. type 'help' or 'quit'",
            if summary.news_loaded { "loaded" } else { "unavailable" },
            if summary.campaigns_loaded {
                "loaded"
            } else {
                "unavailable"
            }
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let command = match parse_shell_line(&line) {
                Ok(ShellInput::Blank) => continue,
                Ok(ShellInput::Quit) => break,
                Ok(ShellInput::Command(command)) => command,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };
            let logged_out = matches!(command, Command::Logout);
            if let Err(err) = self.run(command).await {
                eprintln!("error: {err:#}");
            }
            if logged_out {
                break;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
enum ShellInput {
    Blank,
    Quit,
    Command(Command),
}

/// Splits a shell line with POSIX quoting, so `--text "two words"` stays one
/// argument, then parses it as a subcommand.
fn parse_shell_line(line: &str) -> Result<ShellInput, String> {
    let words = shell_words::split(line).map_err(|err| format!("error: {err}"))?;
    match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => return Ok(ShellInput::Blank),
        ["quit" | "exit"] => return Ok(ShellInput::Quit),
        _ => {}
    }
    ShellLine::try_parse_from(words)
        .map(|parsed| ShellInput::Command(parsed.command))
        .map_err(|err| err.render().to_string())
}

fn print_campaign(campaign: &Campaign) {
    println!("id:    {}", campaign.id);
    println!("topic: {}", campaign.topic);
    if let Some(image) = &campaign.image_url {
        println!("image: {image}");
    }
    println!();
    println!("{}", campaign.text);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut dashboard = Dashboard::open(&cli).await?;
    match cli.command {
        Command::Shell => dashboard.shell().await,
        command => dashboard.run(command).await,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
