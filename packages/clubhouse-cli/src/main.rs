//! Clubhouse CLI
//!
//! Small front end over `clubhouse-core`:
//!
//! 1. **tokenize / render**: run the mention pipeline against the profile
//!    table of a local database.
//!
//! 2. **search**: show the condition set a query builds, and optionally run
//!    it against a forum.
//!
//! 3. **access**: evaluate the forum permission rules for a role and level.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_json::json;

use clubhouse_core::community::{ClubRole, ForumAction, PermissionEvaluator, PermissionLevel};
use clubhouse_core::mention::segments_to_display_text;
use clubhouse_core::storage::ContentStore;
use clubhouse_core::{
    CoreConfig, Database, IdentifierCharset, MentionConfig, MentionRenderer, MentionTokenizer,
    Profile, SearchConditionBuilder,
};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "clubhouse", version, about = "Clubhouse mention and forum tools")]
struct Args {
    /// SQLite database path (in-memory when unset)
    #[arg(long, env = "CLUBHOUSE_DB", global = true)]
    db: Option<String>,

    /// Username charset: "ascii" or "ascii-hangul"
    #[arg(long, default_value = "ascii", env = "CLUBHOUSE_MENTION_CHARSET", global = true)]
    charset: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert @username mentions into stored tokens
    Tokenize {
        /// Raw authored text
        text: String,
    },

    /// Render stored text into display segments
    Render {
        /// Stored text
        text: String,

        /// Highlight this query in plain text runs
        #[arg(long)]
        highlight: Option<String>,
    },

    /// Build search conditions for a query
    Search {
        /// Free-text query
        query: String,

        /// Run the conditions against this forum
        #[arg(long)]
        forum: Option<String>,
    },

    /// Evaluate forum access for a role
    Access {
        /// Club role (general_member, full_member, leader); anything else is a non-member
        #[arg(long, default_value = "none")]
        role: String,

        /// Forum permission level (public, member, full_member, leader); others are rejected
        #[arg(long)]
        level: String,

        /// Actor owns the club
        #[arg(long)]
        owner: bool,

        /// Only evaluate this action (read or write)
        #[arg(long)]
        action: Option<String>,
    },

    /// Add a profile to the database
    AddProfile {
        /// Profile ID
        #[arg(long)]
        id: String,

        /// Unique username
        #[arg(long)]
        username: String,

        /// Full name
        #[arg(long, default_value = "")]
        full_name: String,
    },
}

fn load_config(args: &Args) -> Result<CoreConfig> {
    let charset = IdentifierCharset::parse(&args.charset)
        .ok_or_else(|| eyre!("unknown charset {:?}", args.charset))?;
    Ok(CoreConfig {
        mentions: MentionConfig { charset },
        database_path: args.db.clone(),
    })
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clubhouse=info,clubhouse_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::Access {
            role,
            level,
            owner,
            action,
        } => access(&role, &level, owner, action.as_deref()),
        command => run(command, &config).await,
    }
}

async fn run(command: Command, config: &CoreConfig) -> Result<()> {
    let db = clubhouse_core::storage::init(config).wrap_err("failed to open database")?;
    let db = Arc::new(db);
    tracing::debug!(path = ?config.database_path, "Database ready");

    match command {
        Command::Tokenize { text } => {
            let tokenizer = MentionTokenizer::new(&config.mentions);
            let outcome = tokenizer.tokenize_with_mentions(&text, db.as_ref()).await;
            print_json(&json!({
                "text": outcome.text,
                "mentioned": outcome.mentioned,
            }))
        }
        Command::Render { text, highlight } => {
            let rendered = MentionRenderer::new()
                .render_batch(&[text.as_str()], db.as_ref(), highlight.as_deref())
                .await;
            let segments = rendered.into_iter().next().unwrap_or_default();
            print_json(&json!({
                "display": segments_to_display_text(&segments),
                "segments": segments,
            }))
        }
        Command::Search { query, forum } => search(&db, &query, forum.as_deref()).await,
        Command::AddProfile {
            id,
            username,
            full_name,
        } => {
            let profile = Profile::new(id.as_str(), &username, &full_name);
            db.insert_profile(&profile)
                .wrap_err_with(|| format!("failed to add profile @{}", username))?;
            tracing::info!(id = id.as_str(), username = username.as_str(), "Profile added");
            print_json(&json!(profile))
        }
        Command::Access { .. } => Err(eyre!("access does not use the database")),
    }
}

async fn search(db: &Database, query: &str, forum: Option<&str>) -> Result<()> {
    let conditions = SearchConditionBuilder::build(query, db).await;
    let posts = match forum {
        Some(forum_id) => Some(db.find_posts(forum_id, conditions.conditions()).await?),
        None => None,
    };
    print_json(&json!({
        "conditions": conditions,
        "posts": posts,
    }))
}

fn access(role: &str, level: &str, owner: bool, action: Option<&str>) -> Result<()> {
    print_json(&access_report(role, level, owner, action)?)
}

fn access_report(
    role: &str,
    level: &str,
    owner: bool,
    action: Option<&str>,
) -> Result<serde_json::Value> {
    let role = ClubRole::parse(role);
    let level = PermissionLevel::parse(level).ok_or_else(|| eyre!("unknown level {:?}", level))?;
    let actions = match action {
        Some(a) => vec![ForumAction::parse(a).ok_or_else(|| eyre!("unknown action {:?}", a))?],
        None => vec![ForumAction::Read, ForumAction::Write],
    };

    let mut result = serde_json::Map::new();
    for action in actions {
        let allowed = PermissionEvaluator::allows(action, role, owner, level);
        result.insert(action.as_str().to_string(), json!(allowed));
    }
    Ok(json!({
        "role": role,
        "level": level,
        "owner": owner,
        "allowed": result,
    }))
}
